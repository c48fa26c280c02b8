//! Label-pair field extraction.
//!
//! Every extractor takes an HTML fragment and returns `None` when its label
//! is not there. Text is taken from the parsed tree, so entities are already
//! decoded and nested markup never makes an extractor fail.

use scraper::{ElementRef, Selector, node::Element};

use crate::error::Result;
use crate::models::{LabelMap, LabelRule, RegistrationStatus, Tour};
use crate::services::parse_selector;
use crate::utils::normalize_whitespace;

/// Optional fields read from the detail block, one labeled paragraph each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Location,
    Requirements,
    MaxParticipants,
    MeetingPoint,
    RegistrationDeadline,
    CourseFee,
    PreMeeting,
    Equipment,
}

impl DetailField {
    pub const ALL: [DetailField; 8] = [
        DetailField::Location,
        DetailField::Requirements,
        DetailField::MaxParticipants,
        DetailField::MeetingPoint,
        DetailField::RegistrationDeadline,
        DetailField::CourseFee,
        DetailField::PreMeeting,
        DetailField::Equipment,
    ];

    fn rule(self, labels: &LabelMap) -> &LabelRule {
        match self {
            DetailField::Location => &labels.location,
            DetailField::Requirements => &labels.requirements,
            DetailField::MaxParticipants => &labels.max_participants,
            DetailField::MeetingPoint => &labels.meeting_point,
            DetailField::RegistrationDeadline => &labels.registration_deadline,
            DetailField::CourseFee => &labels.course_fee,
            DetailField::PreMeeting => &labels.pre_meeting,
            DetailField::Equipment => &labels.equipment,
        }
    }

    fn slot(self, tour: &mut Tour) -> &mut Option<String> {
        match self {
            DetailField::Location => &mut tour.location,
            DetailField::Requirements => &mut tour.requirements,
            DetailField::MaxParticipants => &mut tour.max_participants,
            DetailField::MeetingPoint => &mut tour.meeting_point,
            DetailField::RegistrationDeadline => &mut tour.registration_deadline,
            DetailField::CourseFee => &mut tour.course_fee,
            DetailField::PreMeeting => &mut tour.pre_meeting,
            DetailField::Equipment => &mut tour.equipment,
        }
    }
}

/// Extracts labeled values from header paragraphs and detail blocks.
pub struct FieldExtractor {
    labels: LabelMap,
    paragraph_sel: Selector,
    mailto_sel: Selector,
}

impl FieldExtractor {
    pub fn new(labels: LabelMap) -> Result<Self> {
        Ok(Self {
            labels,
            paragraph_sel: parse_selector("p")?,
            mailto_sel: parse_selector(r#"a[href^="mailto:"]"#)?,
        })
    }

    /// Fill leader and registration fields from a paragraph following a tour header.
    pub fn apply_header_paragraph(&self, paragraph: ElementRef, tour: &mut Tour) {
        let text = element_text(paragraph);

        if self.labels.leader.matching_label(&text).is_some() {
            tour.leader_full = labeled_value(&self.labels.leader, &text);
            tour.leader = self.leader(paragraph);
        } else if self.labels.registration.contained_label(&text).is_some() {
            tour.registration_status = self.registration_status(paragraph);
            tour.registration_text = self.registration_text(paragraph);
        }
    }

    /// Fill optional fields and descriptions from a tour's detail block.
    pub fn apply_detail_block(&self, block: ElementRef, tour: &mut Tour) {
        tour.description_full = description_text(block);
        tour.description_html = description_html(block);

        for paragraph in block.select(&self.paragraph_sel) {
            let text = element_text(paragraph);
            for field in DetailField::ALL {
                if let Some(value) = labeled_value(field.rule(&self.labels), &text) {
                    *field.slot(tour) = Some(value);
                    break;
                }
            }
        }
    }

    /// Value of a single detail field within `fragment`.
    pub fn detail_field(&self, field: DetailField, fragment: ElementRef) -> Option<String> {
        let rule = field.rule(&self.labels);
        std::iter::once(fragment)
            .chain(fragment.select(&self.paragraph_sel))
            .find_map(|p| labeled_value(rule, &element_text(p)))
    }

    /// Leader name: the mailto link text, or the whole value without one.
    pub fn leader(&self, fragment: ElementRef) -> Option<String> {
        let text = element_text(fragment);
        let value = labeled_value(&self.labels.leader, &text)?;
        let linked = fragment
            .select(&self.mailto_sel)
            .map(element_text)
            .find(|name| !name.is_empty());
        Some(linked.unwrap_or(value))
    }

    /// Status code from the status paragraph's image, classes or colors.
    pub fn registration_status(&self, fragment: ElementRef) -> Option<RegistrationStatus> {
        let text = element_text(fragment);
        self.labels.registration.contained_label(&text)?;
        status_token(fragment)
    }

    /// Human-readable status text next to the status code.
    pub fn registration_text(&self, fragment: ElementRef) -> Option<String> {
        let text = element_text(fragment);
        let label = self.labels.registration.contained_label(&text)?;
        let value = normalize_whitespace(&text.replacen(label, "", 1));
        (!value.is_empty()).then_some(value)
    }
}

/// Whitespace-normalized text of an element and its descendants.
pub fn element_text(element: ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Value following a label at the start of `text`.
///
/// Returns `None` when no label matches or the value is empty. With
/// `keep_label` the whole text is returned.
pub fn labeled_value(rule: &LabelRule, text: &str) -> Option<String> {
    let label = rule.matching_label(text)?;
    let value = if rule.keep_label {
        text.trim()
    } else {
        text[label.len()..].trim()
    };
    (!value.is_empty()).then(|| value.to_string())
}

/// Plain text of a detail block, one trimmed text node per line.
pub fn description_text(block: ElementRef) -> Option<String> {
    let lines: Vec<&str> = block
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

/// Inner markup of a detail block, whitespace included.
///
/// The markup is serialized from the parsed tree, so entities and attribute
/// quoting come out normalized. `None` for a block holding only whitespace.
pub fn description_html(block: ElementRef) -> Option<String> {
    let html = block.inner_html();
    (!html.trim().is_empty()).then_some(html)
}

/// Find a registration code inside `fragment`.
///
/// Any recognized token wins. Otherwise the first raw code in document order
/// (image `alt`, color value or `status-*` class) is passed through verbatim.
fn status_token(fragment: ElementRef) -> Option<RegistrationStatus> {
    let mut fallback = None;

    for element in fragment.descendants().filter_map(ElementRef::wrap) {
        let value = element.value();
        for candidate in status_candidates(value) {
            let status = RegistrationStatus::from_token(&candidate);
            if status.is_known() {
                return Some(status);
            }
        }
        if fallback.is_none() {
            fallback = raw_status_code(value).map(RegistrationStatus::Other);
        }
    }

    fallback
}

/// Unrecognized code carried by `element`, if it carries one at all.
fn raw_status_code(element: &Element) -> Option<String> {
    let alt = (element.name() == "img")
        .then(|| element.attr("alt"))
        .flatten()
        .map(str::to_string);

    let color = || color_values(element).into_iter().next();

    let class = || {
        element.attr("class").and_then(|classes| {
            classes.split_whitespace().find_map(|class| {
                let code = class
                    .strip_prefix("status")?
                    .trim_start_matches(['-', '_']);
                (!code.is_empty()).then(|| code.to_string())
            })
        })
    };

    alt.or_else(color)
        .or_else(class)
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
}

fn color_values(element: &Element) -> Vec<String> {
    let Some(style) = element.attr("style") else {
        return Vec::new();
    };
    style
        .split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .filter(|(property, _)| property.trim().ends_with("color"))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

fn status_candidates(element: &Element) -> Vec<String> {
    let mut candidates = Vec::new();

    for attr in ["alt", "title"] {
        if let Some(value) = element.attr(attr) {
            candidates.push(value.to_string());
        }
    }

    let word_attrs = [element.attr("class"), element.attr("src")];
    for value in word_attrs.into_iter().flatten() {
        candidates.extend(
            value
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .map(str::to_string),
        );
    }

    candidates.extend(color_values(element));
    candidates
}
