//! CLI binary for edgequake-pdf2deck.
//!
//! A thin shim over the library crate that maps CLI flags to `DeckConfig`,
//! plans the deck and prints or writes the result.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2deck::{
    plan_deck, plan_deck_with, render_deck, CannedAnalyzer, DeckConfig, DeckPlan,
    HeuristicLimits, ImageDescriptor, ImageWorkspace, JsonStrictness, MarkdownDeckRenderer,
    OfflineAnalyzer,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Plan a deck from extracted text (Markdown preview on stdout)
  pdf2deck manual.txt

  # With extracted images, written to a file
  pdf2deck manual.txt --images images.json -o deck.md

  # No model at all: heuristic outline only
  pdf2deck --offline manual.txt

  # Reuse a structure saved from an earlier model run
  pdf2deck manual.txt --candidate structure.json --json > plan.json

IMAGES FILE:
  A JSON array of objects with path, page_num (0-indexed), width, height.
  Entries that are malformed or zero-sized are skipped.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
"#;

/// Turn text extracted from a procedural PDF into a slide-deck plan.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2deck",
    version,
    about = "Turn text extracted from a procedural PDF into a slide-deck plan",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Text file produced by the PDF text extractor.
    input: PathBuf,

    /// Document name, used as the title when none is found. Default: file stem.
    #[arg(long, env = "PDF2DECK_NAME")]
    name: Option<String>,

    /// JSON file describing extracted images.
    #[arg(long, env = "PDF2DECK_IMAGES")]
    images: Option<PathBuf>,

    /// Image file to include; dimensions are read from the file. Repeatable.
    #[arg(long = "image", value_name = "PATH")]
    image_files: Vec<PathBuf>,

    /// Delete the image files once the deck is written.
    #[arg(long, env = "PDF2DECK_REMOVE_IMAGES")]
    remove_images: bool,

    /// Use this saved model reply as the candidate structure instead of
    /// calling a model.
    #[arg(long, env = "PDF2DECK_CANDIDATE")]
    candidate: Option<PathBuf>,

    /// Saved image-analysis reply to use with --candidate.
    #[arg(long, requires = "candidate")]
    image_analysis: Option<PathBuf>,

    /// Skip the model entirely and build the outline heuristically.
    #[arg(long, env = "PDF2DECK_OFFLINE", conflicts_with = "candidate")]
    offline: bool,

    /// Reject model replies that are not exactly JSON.
    #[arg(long, env = "PDF2DECK_STRICT")]
    strict: bool,

    /// Only treat lines of 10 to 100 characters as headings.
    #[arg(long, env = "PDF2DECK_STRICT_TITLES")]
    strict_titles: bool,

    /// Ask the model to clean OCR artefacts before analysis.
    #[arg(long, env = "PDF2DECK_CLEAN_TEXT")]
    clean_text: bool,

    /// Do not ask the model to relate images to sections.
    #[arg(long, env = "PDF2DECK_NO_IMAGE_ANALYSIS")]
    no_image_analysis: bool,

    /// Minimum characters of text required.
    #[arg(long, env = "PDF2DECK_MIN_TEXT_CHARS", default_value_t = 50)]
    min_text_chars: usize,

    /// Write the Markdown deck to this file instead of stdout.
    #[arg(short, long, env = "PDF2DECK_OUTPUT")]
    output: Option<PathBuf>,

    /// Print the deck plan as JSON.
    #[arg(long, env = "PDF2DECK_JSON")]
    json: bool,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Max LLM output tokens per call.
    #[arg(long, env = "PDF2DECK_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2DECK_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Retries per LLM call.
    #[arg(long, env = "PDF2DECK_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "PDF2DECK_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2DECK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2DECK_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Read inputs ──────────────────────────────────────────────────────
    let text = read_text(&cli.input)?;
    let name = cli.name.clone().unwrap_or_else(|| {
        cli.input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    });
    let images = load_images(&cli)?;

    let mut workspace = ImageWorkspace::new();
    if cli.remove_images {
        for image in &images {
            workspace.track(&image.path);
        }
    }

    // ── Plan ─────────────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let plan = if let Some(ref path) = cli.candidate {
        let mut analyzer = CannedAnalyzer::new(read_text(path)?);
        if let Some(ref path) = cli.image_analysis {
            analyzer = analyzer.with_image_analysis(read_text(path)?);
        }
        plan_deck_with(&analyzer, &text, images, &name, &config).await
    } else if cli.offline {
        plan_deck_with(&OfflineAnalyzer, &text, images, &name, &config).await
    } else {
        plan_deck(&text, images, &name, &config).await
    }
    .context("Planning failed")?;

    // ── Output ───────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&plan).context("Failed to serialise plan")?;
        println!("{json}");
    }

    if let Some(ref output_path) = cli.output {
        render_deck(&plan, &MarkdownDeckRenderer, output_path, workspace)
            .context("Rendering failed")?;
        if !cli.quiet {
            print_summary(&plan, Some(output_path));
        }
    } else {
        if !cli.json {
            let markdown = MarkdownDeckRenderer.render_to_string(&plan);
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(markdown.as_bytes())
                .context("Failed to write to stdout")?;
            if !markdown.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
        workspace.release();
        if !cli.quiet {
            print_summary(&plan, None);
        }
    }

    Ok(())
}

/// Map CLI args to `DeckConfig`.
fn build_config(cli: &Cli) -> Result<DeckConfig> {
    let mut builder = DeckConfig::builder()
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .clean_text(cli.clean_text)
        .analyze_images(!cli.no_image_analysis)
        .min_text_chars(cli.min_text_chars)
        .strictness(if cli.strict {
            JsonStrictness::Strict
        } else {
            JsonStrictness::Lenient
        });

    if cli.strict_titles {
        builder = builder.limits(HeuristicLimits::strict_titles());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }

    builder.build().context("Invalid configuration")
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Images from `--images` followed by `--image` files, in that order.
fn load_images(cli: &Cli) -> Result<Vec<ImageDescriptor>> {
    let mut images = match cli.images {
        Some(ref path) => {
            let raw = read_text(path)?;
            let value: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", path.display()))?;
            ImageDescriptor::list_from_value(&value)
        }
        None => Vec::new(),
    };
    for path in &cli.image_files {
        images.push(ImageDescriptor::from_file(path, 0)?);
    }
    Ok(images)
}

fn print_summary(plan: &DeckPlan, output: Option<&Path>) {
    let stats = &plan.stats;
    let mark = if stats.used_fallback {
        cyan("⚠")
    } else {
        green("✔")
    };
    let target = output
        .map(|p| format!("  →  {}", bold(&p.display().to_string())))
        .unwrap_or_default();
    eprintln!(
        "{}  {} slides  ({} with images, {} tables)  {}ms{}",
        mark,
        stats.sections,
        stats.slides_with_images,
        stats.table_slides,
        stats.total_duration_ms,
        target
    );
    if stats.used_fallback {
        eprintln!("   {}", dim("outline built heuristically"));
    }
    if stats.analyzer_input_tokens > 0 {
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&stats.analyzer_input_tokens.to_string()),
            dim(&stats.analyzer_output_tokens.to_string()),
        );
    }
}
