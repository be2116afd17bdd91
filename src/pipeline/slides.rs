//! Slide planning: decide how each section is laid out.

use crate::images::{select_image, ImageDescriptor};
use crate::outline::{DocumentOutline, PresentationStyle, Section};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Lines needed before a single bullet is treated as a table.
const MIN_TABLE_LINES: usize = 3;

static RE_COLUMN_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t|\s{3,}").unwrap());

/// The slide planned for one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlidePlan {
    /// Position of the section in the outline.
    pub section_index: usize,
    pub title: String,
    pub kind: SlideKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum SlideKind {
    /// Title plus bullets.
    Bullets,
    /// Bullets with one image.
    WithImage {
        image: ImageDescriptor,
        style: PresentationStyle,
    },
    /// A grid of cells parsed from a tabular bullet.
    Table { rows: Vec<Vec<String>> },
}

/// One slide per section, in outline order.
///
/// `images` must be the filtered, size-sorted list that image indices refer
/// to (see [`crate::images::prepare_images`]).
pub fn plan_slides(outline: &DocumentOutline, images: &[ImageDescriptor]) -> Vec<SlidePlan> {
    outline
        .sections
        .iter()
        .enumerate()
        .map(|(section_index, section)| SlidePlan {
            section_index,
            title: section.title.clone(),
            kind: slide_kind(section, images),
        })
        .collect()
}

fn slide_kind(section: &Section, images: &[ImageDescriptor]) -> SlideKind {
    if let [only] = section.content.as_slice() {
        if looks_like_table(only) {
            return SlideKind::Table {
                rows: table_rows(only),
            };
        }
    }
    match select_image(section, images) {
        Some(image) => SlideKind::WithImage {
            image: image.clone(),
            style: section
                .image_info
                .as_ref()
                .map(|info| info.presentation_style)
                .unwrap_or_default(),
        },
        None => SlideKind::Bullets,
    }
}

fn is_table_line(line: &str) -> bool {
    RE_COLUMN_GAP.is_match(line) || line.matches('|').count() >= 2
}

/// Three or more lines that are split into columns by tabs, wide gaps or pipes.
pub fn looks_like_table(text: &str) -> bool {
    text.trim().lines().filter(|l| is_table_line(l)).count() >= MIN_TABLE_LINES
}

/// Split tabular text into rows of non-empty cells. Lines without column
/// separators and markdown rule rows (`|---|---|`) are skipped.
pub fn table_rows(text: &str) -> Vec<Vec<String>> {
    text.trim()
        .lines()
        .filter_map(|line| {
            let cells: Vec<String> = if RE_COLUMN_GAP.is_match(line) {
                RE_COLUMN_GAP
                    .split(line)
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            } else if line.matches('|').count() >= 2 {
                line.split('|')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            } else {
                return None;
            };
            let rule = cells
                .iter()
                .all(|c| c.chars().all(|ch| matches!(ch, '-' | ':')));
            (!cells.is_empty() && !rule).then_some(cells)
        })
        .collect()
}
