//! Configuration types for PDF-to-deck planning.
//!
//! All pipeline behaviour is controlled through [`DeckConfig`], built via its
//! [`DeckConfigBuilder`]. The heuristic knobs live in [`HeuristicLimits`] and
//! [`ImageFilter`] so the pure stages (normalizer, fallback builder, image
//! filter) can be driven without touching any LLM setting.

use crate::error::Pdf2DeckError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for turning extracted document text into a deck plan.
///
/// # Example
/// ```rust
/// use edgequake_pdf2deck::{DeckConfig, JsonStrictness};
///
/// let config = DeckConfig::builder()
///     .model("gpt-4.1-nano")
///     .strictness(JsonStrictness::Strict)
///     .max_retries(1)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct DeckConfig {
    /// LLM model identifier, e.g. "gpt-4.1-nano", "llama3".
    /// If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, uses `ProviderFactory::from_env()`.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the LLM completion. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per call. Default: 4096.
    pub max_tokens: usize,

    /// Maximum retry attempts on a failed LLM call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled after each attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-LLM-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Characters of document text sent for structure analysis. Default: 8000.
    pub analysis_char_limit: usize,

    /// Characters of document text sent alongside the image list. Default: 2000.
    pub image_context_char_limit: usize,

    /// Images described to the model when relating images to sections. Default: 10.
    pub max_prompt_images: usize,

    /// Ask the model to clean OCR artefacts before structure analysis. Default: false.
    pub clean_text: bool,

    /// Ask the model which images belong to which sections. Default: true.
    pub analyze_images: bool,

    /// Minimum trimmed text length accepted by the planner. Default: 50.
    pub min_text_chars: usize,

    /// How forgiving candidate JSON parsing is. Default: [`JsonStrictness::Lenient`].
    pub strictness: JsonStrictness,

    /// Bounds used by the heuristic outline builders.
    pub limits: HeuristicLimits,

    /// Size thresholds applied to extracted images.
    pub image_filter: ImageFilter,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 4096,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            analysis_char_limit: 8000,
            image_context_char_limit: 2000,
            max_prompt_images: 10,
            clean_text: false,
            analyze_images: true,
            min_text_chars: 50,
            strictness: JsonStrictness::default(),
            limits: HeuristicLimits::default(),
            image_filter: ImageFilter::default(),
        }
    }
}

impl fmt::Debug for DeckConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeckConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("clean_text", &self.clean_text)
            .field("analyze_images", &self.analyze_images)
            .field("min_text_chars", &self.min_text_chars)
            .field("strictness", &self.strictness)
            .field("limits", &self.limits)
            .field("image_filter", &self.image_filter)
            .finish()
    }
}

impl DeckConfig {
    /// Create a new builder for `DeckConfig`.
    pub fn builder() -> DeckConfigBuilder {
        DeckConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`DeckConfig`].
#[derive(Debug)]
pub struct DeckConfigBuilder {
    config: DeckConfig,
}

impl DeckConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn analysis_char_limit(mut self, n: usize) -> Self {
        self.config.analysis_char_limit = n;
        self
    }

    pub fn image_context_char_limit(mut self, n: usize) -> Self {
        self.config.image_context_char_limit = n;
        self
    }

    pub fn max_prompt_images(mut self, n: usize) -> Self {
        self.config.max_prompt_images = n;
        self
    }

    pub fn clean_text(mut self, v: bool) -> Self {
        self.config.clean_text = v;
        self
    }

    pub fn analyze_images(mut self, v: bool) -> Self {
        self.config.analyze_images = v;
        self
    }

    pub fn min_text_chars(mut self, n: usize) -> Self {
        self.config.min_text_chars = n;
        self
    }

    pub fn strictness(mut self, strictness: JsonStrictness) -> Self {
        self.config.strictness = strictness;
        self
    }

    pub fn limits(mut self, limits: HeuristicLimits) -> Self {
        self.config.limits = limits;
        self
    }

    pub fn image_filter(mut self, filter: ImageFilter) -> Self {
        self.config.image_filter = filter;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DeckConfig, Pdf2DeckError> {
        let c = &self.config;
        if c.analysis_char_limit == 0 {
            return Err(Pdf2DeckError::InvalidConfig(
                "analysis_char_limit must be ≥ 1".into(),
            ));
        }
        let l = &c.limits;
        if l.title_min_chars == 0 || l.title_min_chars > l.title_max_chars {
            return Err(Pdf2DeckError::InvalidConfig(format!(
                "title length window must satisfy 1 ≤ min ≤ max, got {}..={}",
                l.title_min_chars, l.title_max_chars
            )));
        }
        if l.max_section_paragraphs == 0 || l.max_document_paragraphs == 0 {
            return Err(Pdf2DeckError::InvalidConfig(
                "paragraph caps must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Heuristic settings ───────────────────────────────────────────────────

/// How forgiving the normalizer is when the candidate arrives as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JsonStrictness {
    /// Parse the text exactly as given.
    Strict,
    /// Parse as given, then retry after repairing common model artefacts
    /// (code fences, chatter around the object, trailing commas). (default)
    #[default]
    Lenient,
}

/// Bounds applied by the heuristic outline builders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicLimits {
    /// Shortest trimmed line that can be a section title.
    pub title_min_chars: usize,
    /// Longest trimmed line that can be a section title.
    pub title_max_chars: usize,
    /// Lines shorter than this break paragraphs inside a titled section.
    pub separator_chars: usize,
    /// Paragraphs kept per titled section.
    pub max_section_paragraphs: usize,
    /// Paragraphs kept when the whole document becomes one section.
    pub max_document_paragraphs: usize,
    /// Document-level fallback paragraphs must be longer than this.
    pub short_paragraph_chars: usize,
}

impl Default for HeuristicLimits {
    fn default() -> Self {
        Self {
            title_min_chars: 1,
            title_max_chars: 100,
            separator_chars: 3,
            max_section_paragraphs: 7,
            max_document_paragraphs: 10,
            short_paragraph_chars: 20,
        }
    }
}

impl HeuristicLimits {
    /// Only lines of 10 to 100 characters can be titles.
    pub fn strict_titles() -> Self {
        Self {
            title_min_chars: 10,
            ..Self::default()
        }
    }
}

/// Drops extracted images too small to be worth a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFilter {
    /// Minimum width and height in pixels.
    pub min_side: u32,
    /// Minimum area in pixels.
    pub min_area: u64,
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self {
            min_side: 150,
            min_area: 40_000,
        }
    }
}
