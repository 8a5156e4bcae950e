//! CLI binary for edgequake-flashcards.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig`, prints cards, and optionally saves them to a
//! `JsonFileStore`.

use anyhow::{bail, Context, Result};
use clap::Parser;
use edgequake_flashcards::{
    CardOrigin, Flashcard, FlashcardGenerator, FlashcardSet, FlashcardStore, GenerationConfig,
    GenerationOutput, JsonFileStore, SourceDocument,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Ten cards from a PDF (stdout)
  flashcards lecture.pdf

  # Five cards from pasted text
  flashcards --text "Paris is the capital of France. It lies on the Seine." -n 5

  # Generate and save to a store file
  flashcards notes.md --store ~/flashcards.json --title "Week 3"

  # Manage saved sets
  flashcards --store ~/flashcards.json --list
  flashcards --store ~/flashcards.json --show 1b4e28ba-2fa1-11d2-883f-0016d3cca427 --json
  flashcards --store ~/flashcards.json --delete 1b4e28ba-2fa1-11d2-883f-0016d3cca427

SUPPORTED INPUTS:
  pdf               text layer extracted with pdfium
  png, jpg, jpeg    accepted; no OCR, a fixed stand-in text is used
  txt, md           read as UTF-8

  Without an API key (or when the model misbehaves) cards are built from the
  source sentences instead, so a valid request always yields cards.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (default: system library)
  FLASHCARDS_STORE        Default store file for --store

  A .env file in the working directory is loaded first.
"#;

/// Generate study flashcards from documents with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "flashcards",
    version,
    about = "Generate study flashcards from PDFs, images and text using LLMs",
    long_about = "Generate question/answer flashcards from PDF, image or text sources \
(local files or URLs) using any provider supported by edgequake-llm. Falls back to \
sentence-based cards when no model is available.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file path, HTTP/HTTPS URL, or literal text with --text.
    #[arg(required_unless_present_any = ["list", "show", "delete"])]
    input: Option<String>,

    /// Number of flashcards to generate.
    #[arg(short = 'n', long, env = "FLASHCARDS_COUNT",
          value_parser = clap::value_parser!(u64).range(1..))]
    count: Option<u64>,

    /// Treat INPUT as the source text itself.
    #[arg(long)]
    text: bool,

    /// JSON file store to save generated sets to (and to manage).
    #[arg(long, env = "FLASHCARDS_STORE")]
    store: Option<PathBuf>,

    /// Title of the saved set. Default: the file name without extension.
    #[arg(long)]
    title: Option<String>,

    /// List the sets in --store.
    #[arg(long, conflicts_with_all = ["show", "delete"])]
    list: bool,

    /// Print one set from --store.
    #[arg(long, value_name = "ID", conflicts_with = "delete")]
    show: Option<Uuid>,

    /// Delete one set (and its cards) from --store.
    #[arg(long, value_name = "ID")]
    delete: Option<Uuid>,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "FLASHCARDS_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Characters of source text sent to the model.
    #[arg(long, env = "FLASHCARDS_MAX_INPUT_CHARS", default_value_t = 4000)]
    max_input_chars: usize,

    /// Max LLM output tokens.
    #[arg(long, env = "FLASHCARDS_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "FLASHCARDS_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Output structured JSON instead of text.
    #[arg(long, env = "FLASHCARDS_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "FLASHCARDS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FLASHCARDS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FLASHCARDS_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "FLASHCARDS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// LLM call timeout in seconds.
    #[arg(long, env = "FLASHCARDS_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before parsing so `env = …` fallbacks see .env values.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    // ── Store maintenance ────────────────────────────────────────────────
    if cli.list || cli.show.is_some() || cli.delete.is_some() {
        let path = cli
            .store
            .as_deref()
            .context("--list, --show and --delete need --store (or FLASHCARDS_STORE)")?;
        return store_command(&cli, path).await;
    }

    // ── Generate ─────────────────────────────────────────────────────────
    let Some(input) = cli.input.as_deref() else {
        bail!("INPUT is required");
    };
    let config = build_config(&cli).await?;
    let count = cli
        .count
        .map(|n| n as usize)
        .unwrap_or(config.default_count);
    let generator = FlashcardGenerator::new(config);

    let message = if generator.has_ai() {
        "Asking the model…"
    } else {
        "Building cards from sentences…"
    };
    let spinner = show_progress.then(|| new_spinner(message));

    let start = Instant::now();
    let result = if cli.text {
        let source = SourceDocument::from_text(input);
        generator
            .generate(input, count)
            .await
            .map(|output| (source, output))
    } else {
        generator.generate_from_input(input, count).await
    };
    if let Some(ref bar) = spinner {
        bar.finish_and_clear();
    }
    let (source, output) = result.context("Generation failed")?;

    if !cli.quiet {
        print_summary(&output, start.elapsed());
    }

    // ── Save / print ─────────────────────────────────────────────────────
    if let Some(ref path) = cli.store {
        let title = cli.title.clone().unwrap_or_else(|| source.title());
        let set = output.into_set(title, source.name);
        let store = JsonFileStore::open(path)
            .await
            .with_context(|| format!("Failed to open store {}", path.display()))?;
        let set = store.create_set(set).await.context("Failed to save set")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&set).context("Failed to serialise set")?
            );
        } else {
            print_set(&set);
            if !cli.quiet {
                eprintln!(
                    "{} saved as {} in {}",
                    green("✔"),
                    bold(&set.id.to_string()),
                    path.display()
                );
            }
        }
    } else if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else {
        print_cards(&output.flashcards);
    }

    Ok(())
}

/// Handle `--list`, `--show` and `--delete`.
async fn store_command(cli: &Cli, path: &Path) -> Result<()> {
    let store = JsonFileStore::open(path)
        .await
        .with_context(|| format!("Failed to open store {}", path.display()))?;

    if cli.list {
        let sets = store.list_sets().await?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&sets)?);
        } else if sets.is_empty() {
            eprintln!("{}", dim("No sets saved yet."));
        } else {
            for s in sets {
                println!("{}  {:>4} cards  {}", s.id, s.count, s.title);
            }
        }
    } else if let Some(id) = cli.show {
        let set = store.get_set(id).await?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&set)?);
        } else {
            print_set(&set);
        }
    } else if let Some(id) = cli.delete {
        store.delete_set(id).await?;
        if !cli.quiet {
            eprintln!("{} deleted {}", green("✔"), id);
        }
    }
    Ok(())
}

/// Map CLI args to `GenerationConfig`.
async fn build_config(cli: &Cli) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .max_input_chars(cli.max_input_chars)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(n) = cli.count {
        builder = builder.default_count(n as usize);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}

fn new_spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("Generating");
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn print_summary(output: &GenerationOutput, elapsed: Duration) {
    let n = output.flashcards.len();
    match output.origin {
        CardOrigin::Ai { strategy } => eprintln!(
            "{} {} flashcards  {}",
            green("✔"),
            bold(&n.to_string()),
            dim(&format!("model, parsed from {strategy}, {:.1}s", elapsed.as_secs_f64())),
        ),
        CardOrigin::Fallback { ref reason } => eprintln!(
            "{} {} flashcards  {}",
            yellow("⚠"),
            bold(&n.to_string()),
            dim(&format!("built from sentences: {reason}")),
        ),
    }
}

fn print_set(set: &FlashcardSet) {
    println!("{}  {}", bold(&set.title), dim(&format!("({}, {})", set.source, set.id)));
    println!();
    print_cards(&set.flashcards);
}

fn print_cards(cards: &[Flashcard]) {
    for (i, card) in cards.iter().enumerate() {
        println!("{:>3}. Q: {}", i + 1, card.question);
        println!("     A: {}", card.answer);
        if let Some(ref tags) = card.tags {
            println!("     {}", dim(&format!("tags: {}", tags.join(", "))));
        }
    }
}
