//! Merge the analyzer's image analysis into an outline.

use super::extract::parse_candidate_text;
use super::normalize::image_info_from_map;
use crate::config::JsonStrictness;
use crate::images::value_kind;
use crate::outline::{DocumentOutline, ImageInfo};
use serde_json::Value;
use tracing::{debug, warn};

/// Per-section image hints keyed by section title.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageAnalysis {
    pub sections: Vec<(String, ImageInfo)>,
}

impl ImageAnalysis {
    /// Parse `{"sections": [{"title", "relevant_images", ...}]}` from model
    /// output. Entries without a title are skipped; `None` when the text is
    /// not a usable object.
    pub fn parse(text: &str, strictness: JsonStrictness) -> Option<Self> {
        let value = match parse_candidate_text(text, strictness) {
            Ok(v) => v,
            Err(issue) => {
                warn!("Ignoring image analysis: {}", issue);
                return None;
            }
        };
        let Some(map) = value.as_object() else {
            warn!("Ignoring image analysis: got a JSON {}", value_kind(&value));
            return None;
        };

        let sections = map
            .get("sections")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .filter_map(|obj| {
                        let title = obj.get("title")?.as_str()?.trim();
                        (!title.is_empty()).then(|| (title.to_string(), image_info_from_map(obj)))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(Self { sections })
    }

    /// Hints for the section titled exactly `title`. The first entry wins.
    pub fn find(&self, title: &str) -> Option<&ImageInfo> {
        self.sections
            .iter()
            .find(|(t, _)| t == title)
            .map(|(_, info)| info)
    }
}

impl DocumentOutline {
    /// Attach image hints to the sections they name.
    ///
    /// Sections matched by exact title get the hints and `has_images = true`;
    /// every other section gets `has_images = false`.
    pub fn with_image_analysis(mut self, analysis: &ImageAnalysis) -> Self {
        let mut matched = 0;
        for section in &mut self.sections {
            match analysis.find(&section.title) {
                Some(info) => {
                    section.image_info = Some(info.clone());
                    section.has_images = true;
                    matched += 1;
                }
                None => section.has_images = false,
            }
        }
        debug!(
            "Image analysis matched {}/{} sections",
            matched,
            self.sections.len()
        );
        self
    }
}
