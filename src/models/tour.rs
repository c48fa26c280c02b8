//! Tour data structure.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A tour scraped from the listing page.
///
/// `id` is the diff key. Dates are kept in the source's `DD.MM.YY` text form.
/// Every optional field is present only when the page carried it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tour {
    /// Anchor name assigned by the source (e.g. `t7138`)
    pub id: String,

    /// First day of the tour
    pub begin_date: String,

    /// Last day of the tour (equal to `begin_date` for single-day tours)
    pub end_date: String,

    /// Tour name
    pub title: String,

    /// Category label (e.g. `Ausbildungskurs-7138`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tour_type: Option<String>,

    /// Listing URL with the tour anchor as fragment
    pub url: String,

    /// Primary leader (mailto link text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader: Option<String>,

    /// Whole leader line, including co-leaders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader_full: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_status: Option<RegistrationStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_point: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_deadline: Option<String>,

    /// Fee line including its label (the label carries the reduced-fee qualifier)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_fee: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_meeting: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,

    /// Detail block as plain text, one line per text node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_full: Option<String>,

    /// Detail block inner markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_html: Option<String>,
}

impl Tour {
    /// Create a tour with only the mandatory fields set.
    pub fn new(
        id: impl Into<String>,
        begin_date: impl Into<String>,
        end_date: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            begin_date: begin_date.into(),
            end_date: end_date.into(),
            title: title.into(),
            tour_type: None,
            url: url.into(),
            leader: None,
            leader_full: None,
            registration_status: None,
            registration_text: None,
            location: None,
            requirements: None,
            max_participants: None,
            meeting_point: None,
            registration_deadline: None,
            course_fee: None,
            pre_meeting: None,
            equipment: None,
            description_full: None,
            description_html: None,
        }
    }

    /// All fields as `(name, value)` pairs, in serialization order.
    ///
    /// Used for field-level change reports; absent optional fields yield `None`.
    pub fn fields(&self) -> Vec<(&'static str, Option<&str>)> {
        vec![
            ("id", Some(self.id.as_str())),
            ("begin_date", Some(self.begin_date.as_str())),
            ("end_date", Some(self.end_date.as_str())),
            ("title", Some(self.title.as_str())),
            ("tour_type", self.tour_type.as_deref()),
            ("url", Some(self.url.as_str())),
            ("leader", self.leader.as_deref()),
            ("leader_full", self.leader_full.as_deref()),
            (
                "registration_status",
                self.registration_status.as_ref().map(RegistrationStatus::as_str),
            ),
            ("registration_text", self.registration_text.as_deref()),
            ("location", self.location.as_deref()),
            ("requirements", self.requirements.as_deref()),
            ("max_participants", self.max_participants.as_deref()),
            ("meeting_point", self.meeting_point.as_deref()),
            ("registration_deadline", self.registration_deadline.as_deref()),
            ("course_fee", self.course_fee.as_deref()),
            ("pre_meeting", self.pre_meeting.as_deref()),
            ("equipment", self.equipment.as_deref()),
            ("description_full", self.description_full.as_deref()),
            ("description_html", self.description_html.as_deref()),
        ]
    }

    /// One-line label used in change logs: `id · begin–end · title`.
    pub fn headline(&self) -> String {
        format!(
            "{} · {}–{} · {}",
            self.id, self.begin_date, self.end_date, self.title
        )
    }
}

/// Registration traffic light shown next to each tour.
///
/// Serialized as the source token, so unknown codes survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RegistrationStatus {
    /// Enough places left (`gruen`)
    Open,
    /// Few places left (`gelb`)
    Limited,
    /// Waiting list only (`orange`)
    Waitlist,
    /// Registration closed or fully booked (`rot`)
    Closed,
    /// Unrecognized token, kept verbatim
    Other(String),
}

impl RegistrationStatus {
    /// Classify a raw token. Matching ignores case and surrounding whitespace.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "gruen" | "grün" | "green" => Self::Open,
            "gelb" | "yellow" => Self::Limited,
            "orange" => Self::Waitlist,
            "rot" | "red" => Self::Closed,
            _ => Self::Other(token.trim().to_string()),
        }
    }

    /// Source token for this status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "gruen",
            Self::Limited => "gelb",
            Self::Waitlist => "orange",
            Self::Closed => "rot",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for RegistrationStatus {
    fn from(token: String) -> Self {
        Self::from_token(&token)
    }
}

impl From<RegistrationStatus> for String {
    fn from(status: RegistrationStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tour() -> Tour {
        let mut tour = Tour::new(
            "t7138",
            "04.02.26",
            "04.02.26",
            "Skitouren Planung Theorie",
            "https://example.com/tours#t7138",
        );
        tour.tour_type = Some("Ausbildungskurs-7138".to_string());
        tour.location = Some("Vereinsheim DAV Heidelberg".to_string());
        tour
    }

    #[test]
    fn test_registration_status_vocabulary() {
        assert_eq!(RegistrationStatus::from_token("gruen"), RegistrationStatus::Open);
        assert_eq!(RegistrationStatus::from_token("Grün"), RegistrationStatus::Open);
        assert_eq!(RegistrationStatus::from_token(" gelb "), RegistrationStatus::Limited);
        assert_eq!(RegistrationStatus::from_token("orange"), RegistrationStatus::Waitlist);
        assert_eq!(RegistrationStatus::from_token("ROT"), RegistrationStatus::Closed);
    }

    #[test]
    fn test_registration_status_unknown_passthrough() {
        let status = RegistrationStatus::from_token("blau");
        assert_eq!(status, RegistrationStatus::Other("blau".to_string()));
        assert!(!status.is_known());
        assert_eq!(status.as_str(), "blau");
    }

    #[test]
    fn test_serialization_skips_absent_fields() {
        let json = serde_json::to_value(sample_tour()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("location"));
        assert!(!obj.contains_key("leader"));
        assert!(!obj.contains_key("description_html"));
    }

    #[test]
    fn test_registration_status_serializes_as_token() {
        let mut tour = sample_tour();
        tour.registration_status = Some(RegistrationStatus::Open);
        let json = serde_json::to_value(&tour).unwrap();
        assert_eq!(json["registration_status"], "gruen");

        let back: Tour = serde_json::from_value(json).unwrap();
        assert_eq!(back, tour);
    }

    #[test]
    fn test_fields_cover_optional_values() {
        let tour = sample_tour();
        let fields = tour.fields();
        assert_eq!(fields.len(), 20);
        assert!(fields.contains(&("location", Some("Vereinsheim DAV Heidelberg"))));
        assert!(fields.contains(&("leader", None)));
    }

    #[test]
    fn test_headline() {
        assert_eq!(
            sample_tour().headline(),
            "t7138 · 04.02.26–04.02.26 · Skitouren Planung Theorie"
        );
    }
}
