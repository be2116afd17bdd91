//! Candidate extraction: turn a model reply into a JSON value.
//!
//! Models asked for "only JSON" still wrap it in ` ```json ` fences, prefix it
//! with "Here is the structure:", or leave trailing commas behind. In lenient
//! mode these cheap, deterministic repairs run before a second parse attempt.
//!
//! ## Rule Order
//!
//! 1. Strip invisible Unicode (a BOM in front of `{` defeats the parser)
//! 2. Take the body of a fenced code block, if any
//! 3. Drop chatter before the first `{` and after the last `}`
//! 4. Remove trailing commas before `}` and `]`

use crate::config::JsonStrictness;
use crate::error::StructureIssue;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Parse candidate text into a JSON value according to `strictness`.
///
/// Lenient mode always tries the text as-is first, so valid JSON of any
/// shape (including arrays) is returned untouched.
pub fn parse_candidate_text(text: &str, strictness: JsonStrictness) -> Result<Value, StructureIssue> {
    let strict = serde_json::from_str::<Value>(text.trim());
    match (strict, strictness) {
        (Ok(value), _) => Ok(value),
        (Err(e), JsonStrictness::Strict) => Err(StructureIssue::InvalidJson {
            detail: e.to_string(),
        }),
        (Err(first), JsonStrictness::Lenient) => {
            let repaired = repair_json_text(text);
            debug!(
                "Strict parse failed ({}); retrying on {} repaired bytes",
                first,
                repaired.len()
            );
            serde_json::from_str::<Value>(&repaired).map_err(|e| StructureIssue::InvalidJson {
                detail: e.to_string(),
            })
        }
    }
}

/// Apply every repair rule in order.
pub fn repair_json_text(input: &str) -> String {
    let s = remove_invisible_chars(input);
    let s = extract_fenced_block(&s);
    let s = trim_to_braces(&s);
    remove_trailing_commas(&s)
}

// ── Rule 1: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 2: Take the fenced block ────────────────────────────────────────────

static RE_FENCED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json5|json|JSON)?\s*(.*?)\s*```").unwrap());

fn extract_fenced_block(input: &str) -> String {
    match RE_FENCED.captures(input) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 3: Trim to the outermost braces ─────────────────────────────────────

fn trim_to_braces(input: &str) -> String {
    match (input.find('{'), input.rfind('}')) {
        (Some(start), Some(end)) if start < end => input[start..=end].to_string(),
        _ => input.to_string(),
    }
}

// ── Rule 4: Remove trailing commas ───────────────────────────────────────────

static RE_TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\s*[}\]])").unwrap());

fn remove_trailing_commas(input: &str) -> String {
    RE_TRAILING_COMMA.replace_all(input, "$1").to_string()
}

// ── Tests ────────────────────────────────────────────────────────────────────
