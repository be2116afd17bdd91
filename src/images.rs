//! Image descriptors and image-to-section association.
//!
//! Extraction happens upstream; this module only sees descriptors
//! (`path`, `page_number`, `width`, `height`). Association is a pure lookup:
//! indices suggested by the analyzer win in the order given, and a keyword
//! hit in the bullets falls back to the largest image.

use crate::config::ImageFilter;
use crate::error::Pdf2DeckError;
use crate::outline::Section;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Words in a section's bullets that suggest it refers to a picture.
pub const IMAGE_KEYWORDS: [&str; 5] = ["figure", "image", "graphic", "diagram", "illustration"];

/// An image extracted from the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    #[serde(alias = "identifier")]
    pub path: PathBuf,
    /// 0-indexed page the image was found on.
    #[serde(alias = "page_num", default)]
    pub page_number: u32,
    pub width: u32,
    pub height: u32,
}

impl ImageDescriptor {
    pub fn new(path: impl Into<PathBuf>, page_number: u32, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            page_number,
            width,
            height,
        }
    }

    /// Pixel area, used to rank images.
    pub fn size(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Describe an image file already written to disk, probing its dimensions.
    pub fn from_file(path: impl AsRef<Path>, page_number: u32) -> Result<Self, Pdf2DeckError> {
        let path = path.as_ref();
        let (width, height) =
            image::image_dimensions(path).map_err(|e| Pdf2DeckError::ImageReadFailed {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        Ok(Self::new(path, page_number, width, height))
    }

    /// Read descriptors from untyped upstream data.
    ///
    /// A value that is not an array means "no images" and is logged. Entries
    /// that do not describe a non-empty image are skipped.
    pub fn list_from_value(value: &Value) -> Vec<Self> {
        let Some(items) = value.as_array() else {
            warn!(
                "Ignoring image list: expected an array, got {}",
                value_kind(value)
            );
            return Vec::new();
        };
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| match serde_json::from_value::<Self>(item.clone()) {
                Ok(d) if d.width > 0 && d.height > 0 => Some(d),
                Ok(_) => {
                    debug!("Skipping image entry {}: zero-sized", i);
                    None
                }
                Err(e) => {
                    debug!("Skipping image entry {}: {}", i, e);
                    None
                }
            })
            .collect()
    }
}

/// Drop images below the size thresholds and sort the rest largest first.
///
/// The sort is stable, so images of equal size keep their extraction order.
/// Indices in [`crate::outline::ImageInfo::relevant_images`] refer to the
/// list returned here.
pub fn prepare_images(images: Vec<ImageDescriptor>, filter: &ImageFilter) -> Vec<ImageDescriptor> {
    let before = images.len();
    let mut kept: Vec<ImageDescriptor> = images
        .into_iter()
        .filter(|img| {
            img.width >= filter.min_side
                && img.height >= filter.min_side
                && img.size() >= filter.min_area
        })
        .collect();
    kept.sort_by(|a, b| b.size().cmp(&a.size()));
    debug!("Kept {}/{} images after size filter", kept.len(), before);
    kept
}

/// Pick at most one image for `section`.
///
/// 1. No image when the section does not want one or there are none.
/// 2. Suggested indices: the first one inside `images` wins; none in range
///    means no image (no keyword guessing).
/// 3. Without suggestions, a keyword in the bullets selects `images[0]`.
pub fn select_image<'a>(section: &Section, images: &'a [ImageDescriptor]) -> Option<&'a ImageDescriptor> {
    if !section.has_images || images.is_empty() {
        return None;
    }

    let relevant = section.relevant_images();
    if !relevant.is_empty() {
        return relevant.iter().find_map(|&idx| images.get(idx));
    }

    let text = section.content_text_lower();
    if IMAGE_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        return images.first();
    }
    None
}

/// Like [`select_image`], but an image whose file has disappeared counts as
/// no image.
pub fn select_existing_image<'a>(
    section: &Section,
    images: &'a [ImageDescriptor],
) -> Option<&'a ImageDescriptor> {
    let image = select_image(section, images)?;
    if image.path.exists() {
        Some(image)
    } else {
        warn!(
            "Image for section '{}' is missing: {}",
            section.title,
            image.path.display()
        );
        None
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
