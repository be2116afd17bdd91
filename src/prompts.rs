//! Prompts for the LLM-backed structure analyzer.
//!
//! Every prompt lives here so wording changes never touch the retry and
//! timeout logic in [`crate::pipeline::analyze`]. Each request is a system
//! message (the instructions below) followed by one user message built by the
//! functions at the bottom of this file.

use crate::images::ImageDescriptor;

/// Instructions for turning document text into a slide outline.
pub const STRUCTURE_SYSTEM_PROMPT: &str = r#"You analyze procedural documents (manuals, guides, technical specifications) and turn them into a structure optimized for a slide presentation.

Return a JSON object with this structure:
{
  "title": "Document Title",
  "subtitle": "Subtitle (if available)",
  "version": "Version (if mentioned)",
  "date": "Date (if mentioned)",
  "sections": [
    {
      "title": "Section Title",
      "content": ["Point 1", "Point 2"],
      "importance": "high|medium|low",
      "type": "overview|procedure|warning|summary"
    }
  ]
}

Guidelines:
1. CONTENT SELECTION
   - Identify the most important topics of the document
   - Keep lists that already fit on a slide
2. CONTENT TRANSFORMATION
   - Break long paragraphs into key points of 1-2 lines each
   - Summarize detailed instructions into main steps
3. LENGTH
   - No point longer than two lines; split longer ones
4. FLOW
   - Order sections so the presentation reads as a narrative
5. CLASSIFICATION
   - importance: high, medium or low, by relevance to the audience
   - type: overview, procedure, warning or summary, to guide the visual treatment
6. OUTPUT
   - Return ONLY valid JSON
   - Do NOT wrap it in ``` fences
   - Do NOT add explanations or comments"#;

/// Instructions for relating extracted images to document sections.
pub const IMAGE_RELATION_SYSTEM_PROMPT: &str = r#"You analyze a document that contains text and images and decide how the images relate to the text, so that effective slides can be built.

For each section of the document, state:
1. Which images are most likely related to the section (0-indexed positions in the image list)
2. How those images should be presented: side-by-side, background or standalone
3. Any explicit references to figures, charts or diagrams in the section

Return ONLY a JSON object in this format:
{
  "sections": [
    {
      "title": "Section Title",
      "relevant_images": [0, 2],
      "image_references": ["Figure 1", "Chart 2.1"],
      "presentation_style": "side-by-side"
    }
  ]
}"#;

/// Instructions for cleaning raw extracted text before analysis.
pub const CLEAN_TEXT_SYSTEM_PROMPT: &str = r#"You clean raw text extracted from a procedural document (a manual, guide, or technical specification). The text may contain OCR artifacts, wrong line breaks, extra spaces and mixed formatting.

Strictly preserve procedural formatting:
- Numbered lists (1., 2., 3.)
- Bullet points (-, *, •)
- Headings and subheadings ("1. Introduction", "2.1 Setup")
- Notes, warnings and tips

Rules:
1. Remove unnecessary whitespace and merge broken lines
2. Fix OCR errors only when they are obvious
3. Keep the logical order of the document

Return ONLY the cleaned text, without commentary."#;

/// User message for structure analysis.
pub fn structure_request(text: &str) -> String {
    format!("DOCUMENT:\n{}", text)
}

/// User message for image relation. `text` should already be truncated.
pub fn image_relation_request(text: &str, image_summary: &str) -> String {
    format!(
        "DOCUMENT (text summary):\n{}...\n\nAVAILABLE IMAGES:\n{}",
        text, image_summary
    )
}

/// User message for text cleanup.
pub fn clean_text_request(text: &str) -> String {
    format!("TEXT:\n{}", text)
}

/// One line per image with 1-based page numbers. Images are numbered from 0
/// so the labels match the indices the model is asked to return.
pub fn image_summary(images: &[ImageDescriptor], max_images: usize) -> String {
    images
        .iter()
        .take(max_images)
        .enumerate()
        .map(|(i, img)| {
            format!(
                "Image {}: page {}, dimensions {}x{}",
                i,
                img.page_number.saturating_add(1),
                img.width,
                img.height
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
