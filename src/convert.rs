//! Deck planning entry points.
//!
//! [`plan_deck_with`] runs the whole pipeline against any
//! [`StructureAnalyzer`]; [`plan_deck`] resolves an `edgequake-llm` provider
//! first and uses [`LlmAnalyzer`]. Only a precondition violation or a missing
//! provider is fatal. Analyzer failures and malformed replies degrade to the
//! heuristic outline.

use crate::config::DeckConfig;
use crate::error::Pdf2DeckError;
use crate::images::{prepare_images, ImageDescriptor};
use crate::output::{DeckPlan, PlanStats};
use crate::pipeline::analyze::{AnalyzerReply, LlmAnalyzer, StructureAnalyzer};
use crate::pipeline::normalize::{normalize_structure, Candidate, Normalized};
use crate::pipeline::relate::ImageAnalysis;
use crate::pipeline::slides::plan_slides;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Plan a deck using an LLM provider resolved from `config` or the environment.
///
/// # Arguments
/// * `text` — Text extracted from the document
/// * `images` — Images extracted from the document, in extraction order
/// * `document_name` — Used as the title when none is found
/// * `config` — Planning configuration
///
/// # Errors
/// - [`Pdf2DeckError::InsufficientText`] when `text` is too short
/// - [`Pdf2DeckError::ProviderNotConfigured`] when no provider can be built
pub async fn plan_deck(
    text: &str,
    images: Vec<ImageDescriptor>,
    document_name: &str,
    config: &DeckConfig,
) -> Result<DeckPlan, Pdf2DeckError> {
    check_text(text, config)?;
    let provider = resolve_provider(config).await?;
    let analyzer = LlmAnalyzer::new(provider, config);
    plan_deck_with(&analyzer, text, images, document_name, config).await
}

/// Synchronous wrapper around [`plan_deck`].
///
/// Creates a temporary tokio runtime internally.
pub fn plan_deck_sync(
    text: &str,
    images: Vec<ImageDescriptor>,
    document_name: &str,
    config: &DeckConfig,
) -> Result<DeckPlan, Pdf2DeckError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2DeckError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(plan_deck(text, images, document_name, config))
}

/// Plan a deck with the given analyzer.
pub async fn plan_deck_with(
    analyzer: &dyn StructureAnalyzer,
    text: &str,
    images: Vec<ImageDescriptor>,
    document_name: &str,
    config: &DeckConfig,
) -> Result<DeckPlan, Pdf2DeckError> {
    let total_start = Instant::now();
    info!("Planning deck: {}", document_name);
    let mut stats = PlanStats::default();

    // ── Step 1: Validate input ───────────────────────────────────────────
    check_text(text, config)?;

    // ── Step 2: Optional text cleanup ────────────────────────────────────
    let cleaned = if config.clean_text {
        match analyzer.clean_text(text).await {
            Ok(reply) if !reply.content.trim().is_empty() => {
                record(&mut stats, &reply);
                Some(reply.content)
            }
            Ok(_) => {
                warn!("Text cleanup returned nothing; using raw text");
                None
            }
            Err(e) => {
                warn!("Text cleanup failed: {}; using raw text", e);
                None
            }
        }
    } else {
        None
    };
    let text = cleaned.as_deref().unwrap_or(text);

    // ── Step 3: Structure analysis ───────────────────────────────────────
    let candidate = match analyzer.analyze_structure(text).await {
        Ok(reply) => {
            record(&mut stats, &reply);
            Candidate::Text(reply.content)
        }
        Err(e) => {
            warn!("Structure analysis failed: {}", e);
            Candidate::Absent
        }
    };

    // ── Step 4: Normalize ────────────────────────────────────────────────
    let normalized = normalize_structure(candidate, document_name, text, config);
    let used_fallback = normalized.used_fallback();
    let Normalized {
        mut outline,
        source,
    } = normalized;
    info!(
        "Outline '{}': {} sections ({})",
        outline.title,
        outline.sections.len(),
        if used_fallback {
            "heuristic"
        } else {
            "analyzer"
        }
    );

    // ── Step 5: Relate images to sections ────────────────────────────────
    let total_images = images.len();
    let images = prepare_images(images, &config.image_filter);
    debug!("{} of {} images usable", images.len(), total_images);

    if config.analyze_images && !images.is_empty() {
        match analyzer.relate_images(text, &images).await {
            Ok(reply) => {
                record(&mut stats, &reply);
                if let Some(analysis) = ImageAnalysis::parse(&reply.content, config.strictness) {
                    outline = outline.with_image_analysis(&analysis);
                }
            }
            Err(e) => warn!("Image analysis failed: {}", e),
        }
    }

    // ── Step 6: Plan slides ──────────────────────────────────────────────
    let slides = plan_slides(&outline, &images);

    stats.count_slides(&slides);
    stats.images_available = images.len();
    stats.used_fallback = used_fallback;
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Deck planned: {} slides, {} with images, {} tables, {}ms total",
        stats.sections, stats.slides_with_images, stats.table_slides, stats.total_duration_ms
    );

    Ok(DeckPlan {
        outline,
        images,
        slides,
        source,
        stats,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn check_text(text: &str, config: &DeckConfig) -> Result<(), Pdf2DeckError> {
    let chars = text.trim().chars().count();
    if chars < config.min_text_chars {
        return Err(Pdf2DeckError::InsufficientText {
            chars,
            min: config.min_text_chars,
        });
    }
    Ok(())
}

fn record(stats: &mut PlanStats, reply: &AnalyzerReply) {
    stats.analyzer_input_tokens += reply.input_tokens;
    stats.analyzer_output_tokens += reply.output_tokens;
    stats.analyzer_duration_ms += reply.duration_ms;
}

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, Pdf2DeckError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Pdf2DeckError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`); the model
///    defaults to `gpt-4.1-nano`.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`),
///    when both are set and non-empty.
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
async fn resolve_provider(config: &DeckConfig) -> Result<Arc<dyn LLMProvider>, Pdf2DeckError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2DeckError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or run with --offline.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
