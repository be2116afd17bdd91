//! Rendering boundary and cleanup of temporary files.
//!
//! The binary slide writer is a collaborator behind [`DeckRenderer`]. This
//! module owns what surrounds it: the temporary image files extracted for
//! one document ([`ImageWorkspace`]) and the output path. [`render_deck`]
//! guarantees that a failed render leaves no partial output (an earlier deck
//! at the same path is kept) and that the workspace is released either way.

use crate::error::Pdf2DeckError;
use crate::images::select_existing_image;
use crate::output::DeckPlan;
use crate::pipeline::slides::SlideKind;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Writes a planned deck to `output`.
pub trait DeckRenderer {
    fn render(&self, plan: &DeckPlan, output: &Path) -> Result<(), Pdf2DeckError>;
}

/// Temporary image files belonging to one conversion.
///
/// Files are deleted by [`ImageWorkspace::release`] or on drop. Deletion is
/// best-effort: failures are logged and never returned.
#[derive(Debug, Default)]
pub struct ImageWorkspace {
    dir: Option<TempDir>,
    files: Vec<PathBuf>,
}

impl ImageWorkspace {
    /// A workspace that only tracks files written elsewhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// A workspace backed by a fresh temporary directory.
    pub fn temporary() -> Result<Self, Pdf2DeckError> {
        let dir = tempfile::Builder::new()
            .prefix("pdf2deck-")
            .tempdir()
            .map_err(|e| Pdf2DeckError::Internal(format!("tempdir: {e}")))?;
        debug!("Image workspace at {}", dir.path().display());
        Ok(Self {
            dir: Some(dir),
            files: Vec::new(),
        })
    }

    /// The backing directory, if any.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_ref().map(TempDir::path)
    }

    /// Path for a new file inside the backing directory. The file is tracked.
    pub fn path_for(&mut self, file_name: &str) -> Option<PathBuf> {
        let path = self.dir()?.join(file_name);
        self.files.push(path.clone());
        Some(path)
    }

    /// Delete `path` when the workspace is released.
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.files.push(path.into());
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Delete every tracked file and the backing directory. Returns the
    /// number of files removed. Calling it again is a no-op.
    pub fn release(&mut self) -> usize {
        let mut removed = 0;
        for path in self.files.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("Already gone: {}", path.display());
                }
                Err(e) => warn!("Failed to delete {}: {}", path.display(), e),
            }
        }
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!("Failed to delete {}: {}", path.display(), e);
            }
        }
        removed
    }
}

impl Drop for ImageWorkspace {
    fn drop(&mut self) {
        self.release();
    }
}

/// Render `plan` to `output`, then release `workspace`.
///
/// On failure a partially written output is removed before the error is
/// returned. A file that was already at `output` before the call is left in
/// place.
pub fn render_deck(
    plan: &DeckPlan,
    renderer: &dyn DeckRenderer,
    output: &Path,
    mut workspace: ImageWorkspace,
) -> Result<(), Pdf2DeckError> {
    info!(
        "Rendering {} slides to {}",
        plan.slides.len(),
        output.display()
    );
    let existed = output.exists();
    let result = renderer.render(plan, output);

    if let Err(ref e) = result {
        warn!("Rendering failed: {}", e);
        if existed {
            debug!("Keeping pre-existing output {}", output.display());
        } else {
            remove_partial(output);
        }
    }

    let removed = workspace.release();
    debug!("Released image workspace ({} files)", removed);
    result
}

fn remove_partial(output: &Path) {
    match fs::remove_file(output) {
        Ok(()) => debug!("Removed partial output {}", output.display()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(
            "Failed to remove partial output {}: {}",
            output.display(),
            err
        ),
    }
}

/// Renders a deck as Markdown, one `---` separated block per slide.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownDeckRenderer;

impl MarkdownDeckRenderer {
    pub fn render_to_string(&self, plan: &DeckPlan) -> String {
        let outline = &plan.outline;
        let mut slides = Vec::with_capacity(plan.slides.len() + 1);

        let subtitle = outline.display_subtitle();
        slides.push(if subtitle.is_empty() {
            format!("# {}\n", outline.title)
        } else {
            format!("# {}\n\n{}\n", outline.title, subtitle)
        });

        for slide in &plan.slides {
            let Some(section) = outline.sections.get(slide.section_index) else {
                continue;
            };
            let mut block = format!("## {}\n\n", slide.title);
            match &slide.kind {
                SlideKind::Table { rows } => block.push_str(&markdown_table(rows)),
                kind => {
                    for item in &section.content {
                        block.push_str(&format!("- {}\n", item.replace('\n', " ")));
                    }
                    if matches!(kind, SlideKind::WithImage { .. }) {
                        if let Some(image) = select_existing_image(section, &plan.images) {
                            block.push_str(&format!(
                                "\n![{}]({})\n",
                                slide.title,
                                image.path.display()
                            ));
                        }
                    }
                }
            }
            slides.push(block);
        }

        slides.join("\n---\n\n")
    }
}

impl DeckRenderer for MarkdownDeckRenderer {
    fn render(&self, plan: &DeckPlan, output: &Path) -> Result<(), Pdf2DeckError> {
        write_atomic(output, &self.render_to_string(plan))
    }
}

fn markdown_table(rows: &[Vec<String>]) -> String {
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    if cols == 0 {
        return String::new();
    }
    let line = |row: &[String]| {
        let cells: Vec<&str> = (0..cols)
            .map(|i| row.get(i).map(String::as_str).unwrap_or(""))
            .collect();
        format!("| {} |\n", cells.join(" | "))
    };

    let mut out = line(rows[0].as_slice());
    out.push_str(&format!("|{}\n", " --- |".repeat(cols)));
    for row in &rows[1..] {
        out.push_str(&line(row.as_slice()));
    }
    out
}

/// Write to a sibling temp file, then rename over `path`.
fn write_atomic(path: &Path, contents: &str) -> Result<(), Pdf2DeckError> {
    let fail = |source: io::Error| Pdf2DeckError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(fail)?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, contents).map_err(fail)?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        fail(e)
    })
}
