// src/services/parser.rs

//! Tour listing parser.
//!
//! A tour starts at a header block carrying the configured inline style. The
//! header holds a bold date token, the title with the tour anchor, and the
//! category line, separated by `<br>`. Leader and registration paragraphs
//! follow the header directly; the remaining fields live in a detail block
//! elsewhere in the page whose id shares the anchor's numeric suffix.
//!
//! Each header is parsed on its own: a header that cannot be identified is
//! skipped and the rest of the page is still read.

use std::collections::HashMap;
use std::fmt;

use scraper::{ElementRef, Html, Node, Selector};

use crate::error::Result;
use crate::models::{Config, ParserConfig, Tour};
use crate::services::fields::{FieldExtractor, element_text};
use crate::services::parse_selector;
use crate::utils::{normalize_whitespace, parse_date_range, strip_leading_date, tour_url};

/// Tours found in one page plus counters for what was left out.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub tours: Vec<Tour>,
    /// Headers dropped because they could not form a tour
    pub skipped: usize,
    /// Headers whose id was already seen (the later one replaced the earlier)
    pub duplicates: usize,
}

/// Why a header did not produce a tour.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SkipReason {
    MissingAnchor,
    MissingDate { id: String },
    EmptyTitle { id: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingAnchor => write!(f, "no tour anchor"),
            SkipReason::MissingDate { id } => write!(f, "{id}: no leading date"),
            SkipReason::EmptyTitle { id } => write!(f, "{id}: empty title"),
        }
    }
}

/// One `<br>`-separated line of a header block.
#[derive(Debug, Default)]
struct HeaderLine {
    text: String,
    /// The date token was read from this line's plain text
    is_date: bool,
}

/// Raw pieces collected from a header block.
#[derive(Debug, Default)]
struct HeaderParts {
    lines: Vec<HeaderLine>,
    date_token: Option<String>,
    /// Anchor names in document order with the line they sit on
    anchors: Vec<(String, usize)>,
    category: Option<String>,
}

impl HeaderParts {
    fn current(&mut self) -> &mut HeaderLine {
        if self.lines.is_empty() {
            self.lines.push(HeaderLine::default());
        }
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    fn break_line(&mut self) {
        self.lines.push(HeaderLine::default());
    }

    fn add_anchors(&mut self, ids: Vec<String>) {
        if ids.is_empty() {
            return;
        }
        self.current();
        let line = self.lines.len() - 1;
        for id in ids {
            if !self.anchors.iter().any(|(known, _)| *known == id) {
                self.anchors.push((id, line));
            }
        }
    }
}

/// Parses the tour listing page into tours.
pub struct TourParser {
    base_url: String,
    config: ParserConfig,
    /// `record_style` without whitespace, lowercased
    style_marker: String,
    fields: FieldExtractor,
    header_sel: Selector,
    detail_sel: Selector,
    anchor_sel: Selector,
}

impl TourParser {
    /// Create a parser that links tours under `base_url`.
    pub fn new(base_url: impl Into<String>, config: ParserConfig) -> Result<Self> {
        let header_sel = parse_selector(&format!("{}[style]", config.record_tag.trim()))?;
        let fields = FieldExtractor::new(config.labels.clone())?;

        Ok(Self {
            base_url: base_url.into(),
            style_marker: compact_style(&config.record_style),
            fields,
            header_sel,
            detail_sel: parse_selector("div[id]")?,
            anchor_sel: parse_selector("a[name], a[id]")?,
            config,
        })
    }

    /// Create a parser from the application configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.base_url(), config.parser.clone())
    }

    /// Parse all tours in page order.
    pub fn parse(&self, html: &str) -> Vec<Tour> {
        self.parse_outcome(html).tours
    }

    /// Parse all tours and report skipped and duplicate headers.
    ///
    /// Duplicate ids resolve last-wins: the later tour replaces the earlier
    /// one at the earlier one's position.
    pub fn parse_outcome(&self, html: &str) -> ParseOutcome {
        let document = Html::parse_document(html);
        let details = self.index_detail_blocks(&document);

        let mut outcome = ParseOutcome::default();
        let mut positions: HashMap<String, usize> = HashMap::new();

        let headers = document
            .select(&self.header_sel)
            .filter(|el| self.is_record_header(*el));

        for header in headers {
            match self.parse_record(header, &details) {
                Ok(tour) => match positions.get(&tour.id) {
                    Some(&index) => {
                        log::warn!("Duplicate tour id {}, keeping the later entry", tour.id);
                        outcome.duplicates += 1;
                        outcome.tours[index] = tour;
                    }
                    None => {
                        positions.insert(tour.id.clone(), outcome.tours.len());
                        outcome.tours.push(tour);
                    }
                },
                Err(reason) => {
                    log::debug!("Skipping tour header: {}", reason);
                    outcome.skipped += 1;
                }
            }
        }

        outcome
    }

    fn parse_record(
        &self,
        header: ElementRef,
        details: &HashMap<String, ElementRef>,
    ) -> std::result::Result<Tour, SkipReason> {
        let parts = self.collect_header(header);

        let (id, anchor_line) = self
            .tour_anchor(&parts.anchors)
            .ok_or(SkipReason::MissingAnchor)?;

        let (begin_date, end_date) = parts
            .date_token
            .as_deref()
            .and_then(parse_date_range)
            .ok_or_else(|| SkipReason::MissingDate { id: id.clone() })?;

        let lines: Vec<(usize, String)> = parts
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.is_date)
            .map(|(i, line)| (i, normalize_whitespace(&line.text)))
            .filter(|(_, text)| !text.is_empty())
            .collect();

        let title_pos = lines
            .iter()
            .position(|(i, _)| *i == anchor_line)
            .or(if lines.is_empty() { None } else { Some(0) })
            .ok_or_else(|| SkipReason::EmptyTitle { id: id.clone() })?;
        let title = lines[title_pos].1.clone();

        let tour_type = parts
            .category
            .clone()
            .or_else(|| lines.get(title_pos + 1).map(|(_, text)| text.clone()));

        let mut tour = Tour::new(
            id.clone(),
            begin_date,
            end_date,
            title,
            tour_url(&self.base_url, &id),
        );
        tour.tour_type = tour_type;

        for paragraph in self.following_paragraphs(header) {
            self.fields.apply_header_paragraph(paragraph, &mut tour);
        }

        if let Some(block) = details.get(&self.detail_id(&id)) {
            self.fields.apply_detail_block(*block, &mut tour);
        }

        Ok(tour)
    }

    /// Split a header into lines and pick out date, anchor and category.
    fn collect_header(&self, header: ElementRef) -> HeaderParts {
        let mut parts = HeaderParts::default();

        for child in header.children() {
            match child.value() {
                Node::Text(text) => parts.current().text.push_str(text),
                Node::Element(element) => {
                    let Some(child_ref) = ElementRef::wrap(child) else {
                        continue;
                    };
                    match element.name() {
                        "br" => parts.break_line(),
                        "b" | "strong" if parts.date_token.is_none() => {
                            let text = element_text(child_ref);
                            if parse_date_range(&text).is_some() {
                                parts.date_token = Some(text);
                            } else {
                                parts.add_anchors(self.anchor_ids(child_ref));
                                parts.current().text.push_str(&text);
                            }
                        }
                        "span"
                            if parts.category.is_none()
                                && (element.attr("class").is_some()
                                    || element.attr("style").is_some()) =>
                        {
                            let text = element_text(child_ref);
                            if !text.is_empty() {
                                parts.category = Some(text);
                            }
                        }
                        _ => {
                            parts.add_anchors(self.anchor_ids(child_ref));
                            let text: String = child_ref.text().collect();
                            parts.current().text.push_str(&text);
                        }
                    }
                }
                _ => {}
            }
        }

        // No bold date: fall back to the first line that starts with one. Text
        // after the date stays on the line as a title candidate.
        if parts.date_token.is_none() {
            for line in parts.lines.iter_mut() {
                let text = normalize_whitespace(&line.text);
                if let Some(rest) = strip_leading_date(&text) {
                    line.is_date = rest.is_empty();
                    line.text = rest.to_string();
                    parts.date_token = Some(text);
                    break;
                }
            }
        }

        parts
    }

    /// The tour's anchor and its line: the first name carrying the anchor
    /// prefix, else the first anchor at all.
    fn tour_anchor(&self, anchors: &[(String, usize)]) -> Option<(String, usize)> {
        anchors
            .iter()
            .find(|(id, _)| id.starts_with(&self.config.anchor_prefix))
            .or_else(|| anchors.first())
            .cloned()
    }

    /// Anchor names of `element` and of anchors nested in it.
    fn anchor_ids(&self, element: ElementRef) -> Vec<String> {
        let own = (element.value().name() == "a").then_some(element);
        own.into_iter()
            .chain(element.select(&self.anchor_sel))
            .filter_map(|a| {
                a.value()
                    .attr("name")
                    .or_else(|| a.value().attr("id"))
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
            })
            .collect()
    }

    /// Paragraphs directly after a header, up to the next header or non-paragraph.
    fn following_paragraphs<'a>(&self, header: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let mut paragraphs = Vec::new();
        for sibling in header.next_siblings() {
            let Some(element) = ElementRef::wrap(sibling) else {
                continue;
            };
            if element.value().name() != "p" || self.is_record_header(element) {
                break;
            }
            paragraphs.push(element);
        }
        paragraphs
    }

    fn is_record_header(&self, element: ElementRef) -> bool {
        element
            .value()
            .attr("style")
            .is_some_and(|style| compact_style(style).contains(&self.style_marker))
    }

    /// `b7138` for `t7138`; ids without the anchor prefix keep their full text.
    fn detail_id(&self, id: &str) -> String {
        let suffix = id.strip_prefix(&self.config.anchor_prefix).unwrap_or(id);
        format!("{}{}", self.config.detail_prefix, suffix)
    }

    /// Detail blocks by id; the first block with a given id wins.
    fn index_detail_blocks<'a>(&self, document: &'a Html) -> HashMap<String, ElementRef<'a>> {
        let mut index = HashMap::new();
        for block in document.select(&self.detail_sel) {
            if let Some(id) = block.value().attr("id") {
                index.entry(id.to_string()).or_insert(block);
            }
        }
        index
    }
}

fn compact_style(style: &str) -> String {
    style
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
