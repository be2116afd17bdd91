//! Structure normalization: any candidate in, a valid outline out.
//!
//! The candidate comes from the structure analyzer and cannot be trusted: it
//! may be JSON text, JSON text wrapped in chatter, an already-parsed value of
//! the wrong shape, or nothing at all. Whatever arrives, the result is a
//! [`DocumentOutline`] satisfying its invariants. When the candidate is
//! unusable the outline is rebuilt from the raw text by
//! [`super::fallback::build_outline`], and the reason is recorded in
//! [`OutlineSource`].

use super::extract::parse_candidate_text;
use super::fallback::{build_outline, split_paragraphs};
use crate::config::DeckConfig;
use crate::error::StructureIssue;
use crate::images::value_kind;
use crate::outline::{
    DocumentOutline, ImageInfo, Importance, PresentationStyle, Section, SectionType,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Title of the section derived from raw text when the candidate has none.
pub const MAIN_CONTENT_TITLE: &str = "Main Content";

/// A candidate structure as produced upstream.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    /// Model output, expected to contain a JSON object.
    Text(String),
    /// An already-parsed value of unknown shape.
    Json(Value),
    /// Nothing was produced.
    Absent,
}

impl From<&str> for Candidate {
    fn from(s: &str) -> Self {
        Candidate::Text(s.to_string())
    }
}

impl From<String> for Candidate {
    fn from(s: String) -> Self {
        Candidate::Text(s)
    }
}

impl From<Value> for Candidate {
    fn from(v: Value) -> Self {
        Candidate::Json(v)
    }
}

impl<T: Into<Candidate>> From<Option<T>> for Candidate {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Candidate::Absent)
    }
}

/// Where an outline's structure came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutlineSource {
    /// The candidate was a usable object.
    Analyzer,
    /// The candidate was discarded and the raw text scanned instead.
    Heuristic { reason: StructureIssue },
}

/// Result of [`normalize_structure`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub outline: DocumentOutline,
    pub source: OutlineSource,
}

impl Normalized {
    pub fn used_fallback(&self) -> bool {
        matches!(self.source, OutlineSource::Heuristic { .. })
    }
}

/// Normalize with default settings, discarding provenance.
pub fn normalize(
    candidate: impl Into<Candidate>,
    document_name: &str,
    original_text: &str,
) -> DocumentOutline {
    normalize_structure(candidate.into(), document_name, original_text, &DeckConfig::default())
        .outline
}

/// Turn `candidate` into a valid outline. Never fails.
pub fn normalize_structure(
    candidate: Candidate,
    document_name: &str,
    original_text: &str,
    config: &DeckConfig,
) -> Normalized {
    let heuristic = |reason: StructureIssue| {
        warn!("Falling back to heuristic outline: {}", reason);
        Normalized {
            outline: build_outline(original_text, document_name, &config.limits),
            source: OutlineSource::Heuristic { reason },
        }
    };

    let value = match candidate {
        Candidate::Absent => return heuristic(StructureIssue::NoCandidate),
        Candidate::Text(text) | Candidate::Json(Value::String(text)) => {
            match parse_candidate_text(&text, config.strictness) {
                Ok(value) => value,
                Err(issue) => return heuristic(issue),
            }
        }
        Candidate::Json(value) => value,
    };

    let map = match value {
        Value::Object(map) => map,
        other => {
            return heuristic(StructureIssue::NotAnObject {
                found: value_kind(&other).to_string(),
            })
        }
    };

    Normalized {
        outline: outline_from_map(&map, document_name, original_text, config),
        source: OutlineSource::Analyzer,
    }
}

fn outline_from_map(
    map: &Map<String, Value>,
    document_name: &str,
    original_text: &str,
    config: &DeckConfig,
) -> DocumentOutline {
    let title = text_field(map, "title").unwrap_or_default();
    let mut outline = DocumentOutline::new(&title, document_name);
    outline.subtitle = text_field(map, "subtitle").unwrap_or_default();
    outline.version = text_field(map, "version").unwrap_or_default();
    outline.date = text_field(map, "date").unwrap_or_default();

    match map.get("sections") {
        Some(Value::Array(items)) if !items.is_empty() => {
            for (i, item) in items.iter().enumerate() {
                match section_from_value(item) {
                    Some(section) => outline.push_section(section),
                    None => debug!("Dropping section {}: not an object or no content", i),
                }
            }
        }
        _ => {
            let paragraphs: Vec<String> = split_paragraphs(original_text)
                .into_iter()
                .take(config.limits.max_document_paragraphs)
                .collect();
            if let Some(section) = Section::new(MAIN_CONTENT_TITLE, paragraphs) {
                debug!("Candidate has no sections; derived {} paragraphs", section.content.len());
                outline.push_section(
                    section
                        .with_importance(Importance::High)
                        .with_kind(SectionType::Overview),
                );
            }
        }
    }

    outline
}

/// Strings are trimmed; numbers (e.g. `"version": 2.1`) are rendered as text.
fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn section_from_value(item: &Value) -> Option<Section> {
    let obj = item.as_object()?;

    let content: Vec<&str> = match obj.get("content") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    let title = obj.get("title").and_then(Value::as_str).unwrap_or_default();

    let mut section = Section::new(title, content)?
        .with_importance(
            obj.get("importance")
                .and_then(Value::as_str)
                .map(Importance::parse)
                .unwrap_or_default(),
        )
        .with_kind(
            obj.get("type")
                .and_then(Value::as_str)
                .map(SectionType::parse)
                .unwrap_or_default(),
        );

    if let Some(info) = obj.get("image_info").and_then(Value::as_object) {
        section = section.with_image_info(image_info_from_map(info));
    }
    if let Some(flag) = obj.get("has_images").and_then(Value::as_bool) {
        section.has_images = flag;
    }
    Some(section)
}

/// Read image hints; indices that are not non-negative integers are dropped.
pub(crate) fn image_info_from_map(map: &Map<String, Value>) -> ImageInfo {
    let relevant_images = map
        .get("relevant_images")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_u64)
                .filter_map(|i| usize::try_from(i).ok())
                .collect()
        })
        .unwrap_or_default();
    let image_references = map
        .get("image_references")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let presentation_style = map
        .get("presentation_style")
        .and_then(Value::as_str)
        .map(PresentationStyle::parse)
        .unwrap_or_default();

    ImageInfo {
        relevant_images,
        image_references,
        presentation_style,
    }
}
