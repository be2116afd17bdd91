//! # edgequake-pdf2deck
//!
//! Turn text and images extracted from a procedural PDF (a manual, guide or
//! specification) into a slide-deck plan.
//!
//! ## Why this crate?
//!
//! Language models are good at summarising a manual into slides and bad at
//! returning well-formed data: replies come wrapped in code fences, with
//! trailing commas, missing fields, or no JSON at all. This crate treats the
//! model's reply as an untrusted candidate. Whatever arrives, the result is a
//! valid [`DocumentOutline`]; when the candidate is unusable the outline is
//! rebuilt from the raw text with deterministic heuristics.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text + images
//!  │
//!  ├─ 1. Validate   enough text to work with
//!  ├─ 2. Clean      optional model pass over OCR artefacts
//!  ├─ 3. Analyze    model proposes a structure (candidate)
//!  ├─ 4. Normalize  candidate → outline, or heuristic fallback
//!  ├─ 5. Relate     model maps images to sections
//!  ├─ 6. Plan       one slide per section: bullets, image or table
//!  └─ 7. Render     DeckRenderer writes the deck; temp files are released
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2deck::{plan_deck, DeckConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = DeckConfig::default();
//!     let text = std::fs::read_to_string("manual.txt")?;
//!     let plan = plan_deck(&text, Vec::new(), "manual", &config).await?;
//!     for slide in &plan.slides {
//!         println!("{}", slide.title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Without a model, the pure stages can be used directly:
//!
//! ```rust
//! use edgequake_pdf2deck::normalize;
//!
//! let outline = normalize("not json", "Manual", "INTRO\nline a\n\nDETAILS:\nline c");
//! assert_eq!(outline.sections[0].title, "INTRO");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2deck` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod images;
pub mod outline;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod render;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DeckConfig, DeckConfigBuilder, HeuristicLimits, ImageFilter, JsonStrictness};
pub use convert::{plan_deck, plan_deck_sync, plan_deck_with};
pub use error::{AnalyzerError, Pdf2DeckError, StructureIssue};
pub use images::{prepare_images, select_existing_image, select_image, ImageDescriptor};
pub use outline::{DocumentOutline, ImageInfo, Importance, PresentationStyle, Section, SectionType};
pub use output::{DeckPlan, PlanStats};
pub use pipeline::analyze::{
    AnalyzerReply, CannedAnalyzer, LlmAnalyzer, OfflineAnalyzer, StructureAnalyzer,
};
pub use pipeline::fallback::create_fallback_outline;
pub use pipeline::normalize::{normalize, normalize_structure, Candidate, Normalized, OutlineSource};
pub use pipeline::slides::{plan_slides, SlideKind, SlidePlan};
pub use render::{render_deck, DeckRenderer, ImageWorkspace, MarkdownDeckRenderer};
