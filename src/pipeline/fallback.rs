//! Heuristic outline builder used when no usable candidate structure exists.
//!
//! Works on raw extracted text only and never fails. Two passes:
//!
//! 1. **Title scan** — lines that look like headings (ALL CAPS, trailing
//!    colon, or a leading `#`) split the document into titled sections.
//! 2. **Paragraph sweep** — if the scan yields nothing, the longer
//!    blank-line-separated paragraphs become one "Document Content" section.
//!
//! When both come up empty the outline has no sections, which is still a
//! valid (if bare) deck.

use crate::config::HeuristicLimits;
use crate::outline::{DocumentOutline, Importance, Section, SectionType};
use tracing::debug;

/// Title of the single section produced by the paragraph sweep.
pub const DOCUMENT_CONTENT_TITLE: &str = "Document Content";

/// Build an outline from raw text with default limits.
pub fn create_fallback_outline(text: &str, document_name: &str) -> DocumentOutline {
    build_outline(text, document_name, &HeuristicLimits::default())
}

/// Build an outline from raw text.
///
/// Deterministic: the same input always produces the same outline.
pub fn build_outline(text: &str, document_name: &str, limits: &HeuristicLimits) -> DocumentOutline {
    let mut outline = DocumentOutline::new(document_name, document_name);
    let lines: Vec<&str> = text.lines().collect();
    let titles = find_title_lines(&lines, limits);

    for (i, (pos, title)) in titles.iter().enumerate() {
        let end = titles.get(i + 1).map(|(next, _)| *next).unwrap_or(lines.len());
        let paragraphs = span_paragraphs(&lines[pos + 1..end], limits);
        if let Some(section) = Section::new(title, paragraphs) {
            outline.push_section(section.with_kind(SectionType::Overview));
        }
    }
    debug!(
        "Title scan: {} candidates, {} sections",
        titles.len(),
        outline.sections.len()
    );

    if outline.sections.is_empty() {
        let paragraphs: Vec<String> = split_paragraphs(text)
            .into_iter()
            .filter(|p| p.chars().count() > limits.short_paragraph_chars)
            .take(limits.max_document_paragraphs)
            .collect();
        if let Some(section) = Section::new(DOCUMENT_CONTENT_TITLE, paragraphs) {
            debug!("Paragraph sweep: {} paragraphs", section.content.len());
            outline.push_section(section.with_importance(Importance::High));
        }
    }

    outline
}

/// Positions and cleaned titles of every heading-like line.
fn find_title_lines(lines: &[&str], limits: &HeuristicLimits) -> Vec<(usize, String)> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(pos, line)| {
            let trimmed = line.trim();
            let len = trimmed.chars().count();
            if len < limits.title_min_chars || len > limits.title_max_chars {
                return None;
            }
            if !(is_upper(trimmed) || trimmed.ends_with(':') || trimmed.starts_with('#')) {
                return None;
            }
            let title = clean_title(trimmed);
            (!title.is_empty()).then_some((pos, title))
        })
        .collect()
}

fn clean_title(line: &str) -> String {
    line.trim_start_matches('#')
        .trim()
        .trim_end_matches(':')
        .trim()
        .to_string()
}

/// At least one cased character and no lower-case ones.
fn is_upper(s: &str) -> bool {
    s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase)
}

/// Paragraphs inside one titled span. Blank lines are ignored; very short
/// lines (stray bullets, page numbers) end the current paragraph.
fn span_paragraphs(span: &[&str], limits: &HeuristicLimits) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in span.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        if line.chars().count() < limits.separator_chars {
            flush(&mut current, &mut paragraphs);
        } else {
            current.push(line);
        }
    }
    flush(&mut current, &mut paragraphs);

    paragraphs.truncate(limits.max_section_paragraphs);
    paragraphs
}

/// Split text on blank lines; each paragraph's lines are joined with spaces.
pub(crate) fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            flush(&mut current, &mut paragraphs);
        } else {
            current.push(line);
        }
    }
    flush(&mut current, &mut paragraphs);
    paragraphs
}

fn flush(current: &mut Vec<&str>, paragraphs: &mut Vec<String>) {
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
        current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(outline: &DocumentOutline) -> Vec<&str> {
        outline.sections.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn scans_caps_and_colon_titles() {
        let text = "INTRO\nline a\nline b\n\nDETAILS:\nline c";
        let o = create_fallback_outline(text, "Manual");
        assert_eq!(titles(&o), vec!["INTRO", "DETAILS"]);
        assert_eq!(o.sections[0].content, vec!["line a line b"]);
        assert_eq!(o.sections[1].content, vec!["line c"]);
        assert_eq!(o.sections[0].importance, Importance::Medium);
        assert_eq!(o.sections[0].kind, SectionType::Overview);
        assert_eq!(o.title, "Manual");
        assert!(o.subtitle.is_empty() && o.version.is_empty() && o.date.is_empty());
    }

    #[test]
    fn markdown_headings_are_titles() {
        let text = "# Title 1\nContent of title 1\n\n# Title 2\nContent of title 2";
        let o = create_fallback_outline(text, "Test Document");
        assert_eq!(titles(&o), vec!["Title 1", "Title 2"]);
        assert_eq!(o.title, "Test Document");
    }

    #[test]
    fn short_lines_split_paragraphs() {
        let text = "SAFETY NOTES\nwear gloves at all times\n-\nkeep the area dry\n3\nunplug before service";
        let o = create_fallback_outline(text, "doc");
        assert_eq!(
            o.sections[0].content,
            vec!["wear gloves at all times", "keep the area dry", "unplug before service"]
        );
    }

    #[test]
    fn caps_paragraphs_per_section() {
        let mut text = String::from("STEPS TO FOLLOW\n");
        for i in 0..12 {
            text.push_str(&format!("step number {i}\n--\n"));
        }
        let o = create_fallback_outline(&text, "doc");
        assert_eq!(o.sections[0].content.len(), 7);
        assert_eq!(o.sections[0].content[6], "step number 6");
    }

    #[test]
    fn empty_spans_are_skipped() {
        let text = "FIRST HEADING\n\nSECOND HEADING\nbody text here";
        let o = create_fallback_outline(text, "doc");
        assert_eq!(titles(&o), vec!["SECOND HEADING"]);
    }

    #[test]
    fn lone_hash_is_not_a_title() {
        let text = "#\nthis paragraph is long enough to keep";
        let o = create_fallback_outline(text, "doc");
        assert_eq!(titles(&o), vec![DOCUMENT_CONTENT_TITLE]);
    }

    #[test]
    fn strict_title_window_ignores_short_headings() {
        let text = "INTRO\nline a\n\nMAINTENANCE SCHEDULE\nline b";
        let o = build_outline(text, "doc", &HeuristicLimits::strict_titles());
        assert_eq!(titles(&o), vec!["MAINTENANCE SCHEDULE"]);
    }

    #[test]
    fn numbers_only_line_is_not_upper() {
        assert!(!is_upper("2024"));
        assert!(is_upper("STEP 2"));
        assert!(!is_upper("Step 2"));
    }

    #[test]
    fn paragraph_sweep_when_no_titles() {
        let text = "this is the first real paragraph\nspanning two lines\n\nshort one\n\nand here is another long paragraph";
        let o = create_fallback_outline(text, "doc");
        assert_eq!(titles(&o), vec![DOCUMENT_CONTENT_TITLE]);
        assert_eq!(o.sections[0].importance, Importance::High);
        assert_eq!(
            o.sections[0].content,
            vec![
                "this is the first real paragraph spanning two lines",
                "and here is another long paragraph"
            ]
        );
    }

    #[test]
    fn paragraph_sweep_caps_at_ten() {
        let text: Vec<String> = (0..15)
            .map(|i| format!("paragraph number {i} with enough text"))
            .collect();
        let o = create_fallback_outline(&text.join("\n\n"), "doc");
        assert_eq!(o.sections[0].content.len(), 10);
    }

    #[test]
    fn short_unrelated_lines_give_empty_outline() {
        let text: Vec<String> = (0..25).map(|i| format!("note {i}")).collect();
        let o = create_fallback_outline(&text.join("\n\n"), "Field Guide");
        assert!(o.sections.is_empty());
        assert_eq!(o.title, "Field Guide");
    }

    #[test]
    fn empty_text_gives_empty_outline() {
        let o = create_fallback_outline("", "Empty");
        assert!(o.sections.is_empty());
        assert_eq!(o.title, "Empty");
    }

    #[test]
    fn idempotent() {
        let text = "OVERVIEW\nthe pump moves water\n\nnotes:\nkeep dry\n\nrandom trailing paragraph text";
        assert_eq!(
            create_fallback_outline(text, "Pump"),
            create_fallback_outline(text, "Pump")
        );
    }

    #[test]
    fn split_paragraphs_handles_whitespace_lines() {
        let text = "a\nb\n   \nc\n\n\n";
        assert_eq!(split_paragraphs(text), vec!["a b", "c"]);
    }
}
