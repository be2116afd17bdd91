//! The canonical document outline handed to renderers.
//!
//! Every default lives in a constructor here rather than at call sites: a
//! [`DocumentOutline`] always has a non-empty title and a [`Section`] always
//! has at least one non-empty bullet. [`DocumentOutline::new`] and
//! [`Section::new`] enforce this, and deserialization goes through them too,
//! so a saved plan with an empty section is rejected on load. The fields stay
//! public for renderers; code that edits them keeps the invariant itself.

use serde::{Deserialize, Serialize};

/// Title used when neither the candidate nor the caller supplies one.
pub const DEFAULT_DOCUMENT_TITLE: &str = "Document";

/// Title given to sections that arrive without one.
pub const UNTITLED_SECTION: &str = "Untitled Section";

/// A presentation outline derived from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawOutline")]
pub struct DocumentOutline {
    pub title: String,
    pub subtitle: String,
    pub version: String,
    pub date: String,
    pub sections: Vec<Section>,
}

impl DocumentOutline {
    /// Create an empty outline. Blank titles fall back to `fallback_title`,
    /// then to [`DEFAULT_DOCUMENT_TITLE`].
    pub fn new(title: &str, fallback_title: &str) -> Self {
        let title = [title, fallback_title]
            .iter()
            .map(|t| t.trim())
            .find(|t| !t.is_empty())
            .unwrap_or(DEFAULT_DOCUMENT_TITLE)
            .to_string();
        Self {
            title,
            subtitle: String::new(),
            version: String::new(),
            date: String::new(),
            sections: Vec::new(),
        }
    }

    /// Append a section. Sections are only ever built with content.
    pub fn push_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Subtitle line for the title slide: subtitle, version and date joined
    /// with `" | "`, skipping whatever is empty.
    pub fn display_subtitle(&self) -> String {
        let version = if self.version.is_empty() {
            String::new()
        } else {
            format!("Version: {}", self.version)
        };
        [self.subtitle.as_str(), version.as_str(), self.date.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// One content slide's worth of the outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSection")]
pub struct Section {
    pub title: String,
    pub content: Vec<String>,
    pub importance: Importance,
    #[serde(rename = "type")]
    pub kind: SectionType,
    pub has_images: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_info: Option<ImageInfo>,
}

impl Section {
    /// Build a section from raw bullets.
    ///
    /// Bullets are trimmed and empty ones dropped. Returns `None` when nothing
    /// is left, so empty sections never reach an outline.
    pub fn new<I, S>(title: &str, content: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let content: Vec<String> = content
            .into_iter()
            .map(|item| item.as_ref().trim().to_string())
            .filter(|item| !item.is_empty())
            .collect();
        if content.is_empty() {
            return None;
        }
        let title = title.trim();
        Some(Self {
            title: if title.is_empty() {
                UNTITLED_SECTION.to_string()
            } else {
                title.to_string()
            },
            content,
            importance: Importance::default(),
            kind: SectionType::default(),
            has_images: false,
            image_info: None,
        })
    }

    pub fn with_importance(mut self, importance: Importance) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_kind(mut self, kind: SectionType) -> Self {
        self.kind = kind;
        self
    }

    /// Attach image hints and mark the section as wanting an image.
    pub fn with_image_info(mut self, info: ImageInfo) -> Self {
        self.image_info = Some(info);
        self.has_images = true;
        self
    }

    /// Bullets joined into one lower-cased string, for keyword matching.
    pub fn content_text_lower(&self) -> String {
        self.content.join(" ").to_lowercase()
    }

    /// Image indices suggested upstream, empty when there are none.
    pub fn relevant_images(&self) -> &[usize] {
        self.image_info
            .as_ref()
            .map(|info| info.relevant_images.as_slice())
            .unwrap_or(&[])
    }
}

// ── Deserialization ──────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawOutline {
    #[serde(default)]
    title: String,
    #[serde(default)]
    subtitle: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    sections: Vec<Section>,
}

impl From<RawOutline> for DocumentOutline {
    fn from(raw: RawOutline) -> Self {
        let mut outline = DocumentOutline::new(&raw.title, "");
        outline.subtitle = raw.subtitle;
        outline.version = raw.version;
        outline.date = raw.date;
        outline.sections = raw.sections;
        outline
    }
}

#[derive(Deserialize)]
struct RawSection {
    #[serde(default)]
    title: String,
    content: Vec<String>,
    #[serde(default)]
    importance: Importance,
    #[serde(default, rename = "type")]
    kind: SectionType,
    #[serde(default)]
    has_images: bool,
    #[serde(default)]
    image_info: Option<ImageInfo>,
}

impl TryFrom<RawSection> for Section {
    type Error = String;

    fn try_from(raw: RawSection) -> Result<Self, Self::Error> {
        let mut section = Section::new(&raw.title, &raw.content)
            .ok_or_else(|| format!("section {:?} has no content", raw.title))?
            .with_importance(raw.importance)
            .with_kind(raw.kind);
        section.has_images = raw.has_images;
        section.image_info = raw.image_info;
        Ok(section)
    }
}

/// How prominent a section should be in the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    #[default]
    Medium,
    Low,
}

impl Importance {
    /// Case-insensitive parse; anything unknown is [`Importance::Medium`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

/// What a section is about, which drives its visual treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    #[default]
    Overview,
    Procedure,
    Warning,
    Summary,
}

impl SectionType {
    /// Case-insensitive parse; anything unknown is [`SectionType::Overview`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "procedure" => Self::Procedure,
            "warning" => Self::Warning,
            "summary" => Self::Summary,
            _ => Self::Overview,
        }
    }
}

/// Image hints produced by the analyzer for one section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Indices into the image list of the current document, in priority order.
    pub relevant_images: Vec<usize>,
    /// Textual references such as "Figure 1".
    pub image_references: Vec<String>,
    pub presentation_style: PresentationStyle,
}

/// How a slide should place its image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresentationStyle {
    #[default]
    SideBySide,
    Background,
    Standalone,
}

impl PresentationStyle {
    /// Accepts `side-by-side`, `side_by_side` and `side by side`; unknown
    /// styles become [`PresentationStyle::SideBySide`].
    pub fn parse(s: &str) -> Self {
        let normalised: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();
        match normalised.as_str() {
            "background" => Self::Background,
            "standalone" => Self::Standalone,
            _ => Self::SideBySide,
        }
    }
}
