//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Listing page and HTTP settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Record boundaries and label vocabulary
    #[serde(default)]
    pub parser: ParserConfig,

    /// Where snapshots, deltas and change logs are written
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or the defaults when `path` does not exist.
    ///
    /// A file that exists but cannot be read or parsed is a configuration error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path).map_err(|e| AppError::config(format!("{}: {}", path.display(), e)))
    }

    /// Base URL used to build tour links (`parser.base_url`, else `source.url`).
    pub fn base_url(&self) -> &str {
        self.parser.base_url.as_deref().unwrap_or(&self.source.url)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.source.url)?;
        if let Some(base) = &self.parser.base_url {
            Url::parse(base)?;
        }
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.parser.record_tag.trim().is_empty() || self.parser.record_style.trim().is_empty() {
            return Err(AppError::validation(
                "parser.record_tag and parser.record_style must not be empty",
            ));
        }
        if self.parser.anchor_prefix.is_empty() || self.parser.detail_prefix.is_empty() {
            return Err(AppError::validation(
                "parser.anchor_prefix and parser.detail_prefix must not be empty",
            ));
        }
        self.parser.labels.validate()?;
        if self.storage.snapshot_key.trim().is_empty() || self.storage.delta_key.trim().is_empty()
        {
            return Err(AppError::validation("storage keys must not be empty"));
        }
        Ok(())
    }
}

/// Listing page and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Tour listing page
    #[serde(default = "defaults::source_url")]
    pub url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: defaults::source_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Settings for locating tours and their fields in the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Base for tour links; falls back to `source.url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Element name of a tour header block
    #[serde(default = "defaults::record_tag")]
    pub record_tag: String,

    /// Inline style marking a tour header block
    #[serde(default = "defaults::record_style")]
    pub record_style: String,

    /// Prefix of the tour anchor name (`t` in `t7138`)
    #[serde(default = "defaults::anchor_prefix")]
    pub anchor_prefix: String,

    /// Prefix of the detail block id (`b` in `b7138`)
    #[serde(default = "defaults::detail_prefix")]
    pub detail_prefix: String,

    #[serde(default)]
    pub labels: LabelMap,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            record_tag: defaults::record_tag(),
            record_style: defaults::record_style(),
            anchor_prefix: defaults::anchor_prefix(),
            detail_prefix: defaults::detail_prefix(),
            labels: LabelMap::default(),
        }
    }
}

/// Label texts that introduce each optional field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelMap {
    #[serde(default = "defaults::leader")]
    pub leader: LabelRule,
    #[serde(default = "defaults::registration")]
    pub registration: LabelRule,
    #[serde(default = "defaults::location")]
    pub location: LabelRule,
    #[serde(default = "defaults::requirements")]
    pub requirements: LabelRule,
    #[serde(default = "defaults::max_participants")]
    pub max_participants: LabelRule,
    #[serde(default = "defaults::meeting_point")]
    pub meeting_point: LabelRule,
    #[serde(default = "defaults::registration_deadline")]
    pub registration_deadline: LabelRule,
    #[serde(default = "defaults::course_fee")]
    pub course_fee: LabelRule,
    #[serde(default = "defaults::pre_meeting")]
    pub pre_meeting: LabelRule,
    #[serde(default = "defaults::equipment")]
    pub equipment: LabelRule,
}

impl Default for LabelMap {
    fn default() -> Self {
        Self {
            leader: defaults::leader(),
            registration: defaults::registration(),
            location: defaults::location(),
            requirements: defaults::requirements(),
            max_participants: defaults::max_participants(),
            meeting_point: defaults::meeting_point(),
            registration_deadline: defaults::registration_deadline(),
            course_fee: defaults::course_fee(),
            pre_meeting: defaults::pre_meeting(),
            equipment: defaults::equipment(),
        }
    }
}

impl LabelMap {
    fn rules(&self) -> [(&'static str, &LabelRule); 10] {
        [
            ("leader", &self.leader),
            ("registration", &self.registration),
            ("location", &self.location),
            ("requirements", &self.requirements),
            ("max_participants", &self.max_participants),
            ("meeting_point", &self.meeting_point),
            ("registration_deadline", &self.registration_deadline),
            ("course_fee", &self.course_fee),
            ("pre_meeting", &self.pre_meeting),
            ("equipment", &self.equipment),
        ]
    }

    fn validate(&self) -> Result<()> {
        for (name, rule) in self.rules() {
            if rule.labels.is_empty() || rule.labels.iter().any(|l| l.trim().is_empty()) {
                return Err(AppError::validation(format!(
                    "parser.labels.{name} needs at least one non-empty label"
                )));
            }
        }
        Ok(())
    }
}

/// One field's label alternatives.
///
/// Matching is case-sensitive against the start of the paragraph text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRule {
    pub labels: Vec<String>,

    /// Keep the label in the extracted value
    #[serde(default)]
    pub keep_label: bool,
}

impl LabelRule {
    pub fn new(labels: &[&str]) -> Self {
        Self {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            keep_label: false,
        }
    }

    pub fn keeping_label(mut self) -> Self {
        self.keep_label = true;
        self
    }

    /// The first label `text` starts with.
    pub fn matching_label(&self, text: &str) -> Option<&str> {
        self.labels
            .iter()
            .map(String::as_str)
            .find(|label| text.starts_with(label))
    }

    /// The first label contained anywhere in `text`.
    pub fn contained_label(&self, text: &str) -> Option<&str> {
        self.labels
            .iter()
            .map(String::as_str)
            .find(|label| text.contains(label))
    }
}

/// Storage locations, relative to `dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::storage_dir")]
    pub dir: PathBuf,

    #[serde(default = "defaults::snapshot_key")]
    pub snapshot_key: String,

    #[serde(default = "defaults::delta_key")]
    pub delta_key: String,

    /// Directory for daily markdown change logs
    #[serde(default = "defaults::changes_dir")]
    pub changes_dir: String,

    #[serde(default = "defaults::write_changelog")]
    pub write_changelog: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: defaults::storage_dir(),
            snapshot_key: defaults::snapshot_key(),
            delta_key: defaults::delta_key(),
            changes_dir: defaults::changes_dir(),
            write_changelog: defaults::write_changelog(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    use super::LabelRule;

    // Source defaults
    pub fn source_url() -> String {
        "https://www.alpenverein-heidelberg.de/index.php?inhalt=tourensucheergebnis".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; tour-tracker/0.1; +https://www.alpenverein-heidelberg.de)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Parser defaults
    pub fn record_tag() -> String {
        "p".into()
    }
    pub fn record_style() -> String {
        "background-color:silver".into()
    }
    pub fn anchor_prefix() -> String {
        "t".into()
    }
    pub fn detail_prefix() -> String {
        "b".into()
    }

    // Label defaults
    pub fn leader() -> LabelRule {
        LabelRule::new(&["Leitung:"])
    }
    pub fn registration() -> LabelRule {
        LabelRule::new(&["Anmeldestatus:"])
    }
    pub fn location() -> LabelRule {
        LabelRule::new(&["Ort:"])
    }
    pub fn requirements() -> LabelRule {
        LabelRule::new(&["Anforderungen:"])
    }
    pub fn max_participants() -> LabelRule {
        LabelRule::new(&["max. Teilnehmerzahl:"])
    }
    pub fn meeting_point() -> LabelRule {
        LabelRule::new(&["Treffpunkt:"])
    }
    pub fn registration_deadline() -> LabelRule {
        LabelRule::new(&["Anmeldeschluss:"])
    }
    pub fn course_fee() -> LabelRule {
        LabelRule::new(&["Kursgeb"]).keeping_label()
    }
    pub fn pre_meeting() -> LabelRule {
        LabelRule::new(&["Vorbesprechung:"])
    }
    pub fn equipment() -> LabelRule {
        LabelRule::new(&["Ausrüstung:", "Ausruestung:"])
    }

    // Storage defaults
    pub fn storage_dir() -> PathBuf {
        PathBuf::from("data")
    }
    pub fn snapshot_key() -> String {
        "tours.json".into()
    }
    pub fn delta_key() -> String {
        "tours_delta.json".into()
    }
    pub fn changes_dir() -> String {
        "changes".into()
    }
    pub fn write_changelog() -> bool {
        true
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
