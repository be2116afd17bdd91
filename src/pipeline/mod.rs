//! Pipeline stages for turning extracted text into a deck plan.
//!
//! Each submodule implements one step. Everything except [`analyze`] is
//! synchronous and pure, so stages can be tested without a model.
//!
//! ## Data Flow
//!
//! ```text
//! analyze ──▶ extract ──▶ normalize ──▶ relate ──▶ slides
//!  (LLM)      (JSON)      (outline)    (images)   (layout)
//!                            │
//!                            └─▶ fallback (raw text scan)
//! ```
//!
//! 1. [`analyze`]   — ask the model for a candidate structure, with retry
//! 2. [`extract`]   — pull a JSON value out of the reply
//! 3. [`normalize`] — turn any candidate into a valid [`crate::outline::DocumentOutline`]
//! 4. [`fallback`]  — heuristic outline when the candidate is unusable
//! 5. [`relate`]    — merge the model's image-to-section analysis
//! 6. [`slides`]    — pick a layout per section

pub mod analyze;
pub mod extract;
pub mod fallback;
pub mod normalize;
pub mod relate;
pub mod slides;
