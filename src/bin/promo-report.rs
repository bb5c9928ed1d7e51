//! CLI binary for promo-report.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ReportConfig` / `DocumentStyle` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use promo_report::pipeline::package::write_atomic;
use promo_report::pipeline::postprocess::clean_markdown;
use promo_report::{
    block_summary, convert, generate_report_to_archive, render_markdown, DocumentStyle,
    ProgressCallback, ReportConfig, ReportProgressCallback,
};
use std::collections::HashMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per photo.
/// Photos complete out of order, so start times are kept per image.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_report_start` tells us how many photos there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Loading photos…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} photos  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Reading");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, image_num: usize) -> f64 {
        self.start_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&image_num)
            .map(|t| t.elapsed().as_millis() as f64 / 1000.0)
            .unwrap_or(0.0)
    }
}

impl ReportProgressCallback for CliProgressCallback {
    fn on_report_start(&self, total_images: usize) {
        self.activate_bar(total_images);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Reading {total_images} photos…"))
        ));
    }

    fn on_image_start(&self, image_num: usize, _total: usize) {
        self.start_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(image_num, Instant::now());
        self.bar.set_message(format!("photo {image_num}"));
    }

    fn on_image_complete(&self, image_num: usize, total: usize, text_len: usize) {
        let secs = self.elapsed_secs(image_num);
        self.bar.println(format!(
            "  {} Photo {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            image_num,
            total,
            dim(&format!("{text_len:>5} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_image_error(&self, image_num: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(image_num);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Keep one line per photo.
        let msg = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} Photo {:>3}/{:<3}  {}  {}",
            red("✗"),
            image_num,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_analysis_start(&self) {
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        self.bar.set_style(spinner_style);
        self.bar.set_prefix("Analysing");
        self.bar.set_message("comparing promotions…");
    }

    fn on_report_complete(&self, total_images: usize, success_count: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} photos read, report written",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} photos read  ({} failed)",
                cyan("⚠"),
                bold(&success_count.to_string()),
                total_images,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Full report from a folder of photos
  promo-report analyze photos/*.jpg -o week42.zip --title "Week 42"

  # Use a specific model
  promo-report analyze --provider anthropic --model claude-sonnet-4-20250514 shelf.jpg

  # Render analysis markdown you already have (no API key needed)
  promo-report render analysis.md -o report.docx

  # Inspect how a markdown file is classified
  promo-report blocks analysis.md

ARCHIVE LAYOUT:
  report.docx        the formatted report
  analysis.md        the analysis as markdown
  ocr/<photo>.txt    text read from each photo
  images/<photo>     the original photos

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  PROMO_REPORT_PROVIDER   Override provider (openai, anthropic, gemini, ollama)
  PROMO_REPORT_MODEL      Override model ID (must accept images)
"#;

/// Turn photos of competitor promotions into a Word report.
#[derive(Parser, Debug)]
#[command(
    name = "promo-report",
    version,
    about = "Turn photos of competitor promotions into a structured Word report",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PROMO_REPORT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PROMO_REPORT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read photos, analyse them and write the report archive.
    Analyze(AnalyzeArgs),
    /// Render a markdown analysis to .docx without calling a model.
    Render(RenderArgs),
    /// Print the block tree a markdown file converts to, as JSON.
    Blocks(BlocksArgs),
}

/// Document appearance flags shared by `analyze` and `render`.
#[derive(Args, Debug)]
struct StyleArgs {
    /// JSON file with a full DocumentStyle; flags below override it.
    #[arg(long, env = "PROMO_REPORT_STYLE")]
    style: Option<PathBuf>,

    /// Document title (stored in the document properties).
    #[arg(long, env = "PROMO_REPORT_TITLE")]
    title: Option<String>,

    /// Document author.
    #[arg(long, env = "PROMO_REPORT_AUTHOR")]
    author: Option<String>,

    /// Body font family.
    #[arg(long, env = "PROMO_REPORT_FONT")]
    font: Option<String>,

    /// Body font size in points (6–72).
    #[arg(long, env = "PROMO_REPORT_FONT_SIZE")]
    font_size: Option<u32>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Photos to analyse (png, jpeg, webp, gif).
    #[arg(required = true, num_args = 1..)]
    images: Vec<PathBuf>,

    /// Archive to write.
    #[arg(short, long, env = "PROMO_REPORT_OUTPUT", default_value = "report.zip")]
    output: PathBuf,

    /// LLM model ID; must accept images (e.g. gpt-4.1-mini, gpt-4.1).
    #[arg(long, env = "PROMO_REPORT_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "PROMO_REPORT_PROVIDER")]
    provider: Option<String>,

    /// Concurrent text-extraction calls.
    #[arg(short, long, env = "PROMO_REPORT_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Longest photo edge sent to the model, in pixels.
    #[arg(long, env = "PROMO_REPORT_MAX_PIXELS", default_value_t = 2000)]
    max_pixels: u32,

    /// Max LLM output tokens per call.
    #[arg(long, env = "PROMO_REPORT_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PROMO_REPORT_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Retries per call on LLM failure.
    #[arg(long, env = "PROMO_REPORT_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "PROMO_REPORT_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Text file with a custom text-extraction prompt.
    #[arg(long, env = "PROMO_REPORT_OCR_PROMPT")]
    ocr_prompt: Option<PathBuf>,

    /// Text file with a custom analysis prompt.
    #[arg(long, env = "PROMO_REPORT_ANALYSIS_PROMPT")]
    analysis_prompt: Option<PathBuf>,

    /// Leave the photo appendix out of the document.
    #[arg(long)]
    no_appendix: bool,

    /// Print run statistics as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PROMO_REPORT_NO_PROGRESS")]
    no_progress: bool,

    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Markdown file, or `-` for stdin.
    input: PathBuf,

    /// .docx file to write.
    #[arg(short, long, default_value = "report.docx")]
    output: PathBuf,

    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Args, Debug)]
struct BlocksArgs {
    /// Markdown file, or `-` for stdin.
    input: PathBuf,

    /// Skip the cleanup rules and classify the text exactly as given.
    #[arg(long)]
    raw: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs would interleave with the progress bar; the bar
    // carries the feedback that matters.
    let show_progress = match &cli.command {
        Command::Analyze(a) => !cli.quiet && !a.no_progress && !a.json,
        _ => false,
    };
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

    match cli.command {
        Command::Analyze(ref args) => run_analyze(args, cli.quiet, show_progress).await,
        Command::Render(ref args) => run_render(args, cli.quiet),
        Command::Blocks(ref args) => run_blocks(args),
    }
}

async fn run_analyze(args: &AnalyzeArgs, quiet: bool, show_progress: bool) -> Result<()> {
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ReportProgressCallback>)
    } else {
        None
    };

    let config = build_config(args, progress_cb).await?;
    let stats = generate_report_to_archive(&args.images, &args.output, &config)
        .await
        .context("Report generation failed")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialise statistics")?
        );
    }

    if !quiet {
        eprintln!(
            "{}  {}/{} photos  {} tables  {}ms  →  {}",
            if stats.failed_images == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.processed_images,
            stats.total_images,
            stats.tables,
            stats.total_duration_ms,
            bold(&args.output.display().to_string()),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&stats.total_input_tokens.to_string()),
            dim(&stats.total_output_tokens.to_string()),
        );
    }
    Ok(())
}

fn run_render(args: &RenderArgs, quiet: bool) -> Result<()> {
    let markdown = read_input(&args.input)?;
    let style = build_style(&args.style)?;
    let docx = render_markdown(&markdown, &style).context("Rendering failed")?;
    write_atomic(&args.output, &docx)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if !quiet {
        eprintln!(
            "{}  {} bytes  →  {}",
            green("✔"),
            docx.len(),
            bold(&args.output.display().to_string())
        );
    }
    Ok(())
}

fn run_blocks(args: &BlocksArgs) -> Result<()> {
    let markdown = read_input(&args.input)?;
    let text = if args.raw {
        markdown
    } else {
        clean_markdown(&markdown)
    };
    let blocks = convert(&text);
    println!(
        "{}",
        serde_json::to_string_pretty(&blocks).context("Failed to serialise blocks")?
    );
    tracing::info!("{}", block_summary(&blocks));
    Ok(())
}

/// Read a file, or stdin for `-`.
fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Style file first, then individual flags on top.
fn build_style(args: &StyleArgs) -> Result<DocumentStyle> {
    let mut style = match args.style {
        Some(ref path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read style from {:?}", path))?;
            serde_json::from_str::<DocumentStyle>(&json)
                .with_context(|| format!("Invalid style file {:?}", path))?
        }
        None => DocumentStyle::default(),
    };

    if let Some(ref title) = args.title {
        style.title = Some(title.clone());
    }
    if let Some(ref author) = args.author {
        style.author = Some(author.clone());
    }
    if let Some(ref font) = args.font {
        style.font = font.clone();
    }
    if let Some(size) = args.font_size {
        style.font_size_pt = size;
    }
    Ok(style)
}

/// Map CLI args to `ReportConfig`.
async fn build_config(args: &AnalyzeArgs, progress: Option<ProgressCallback>) -> Result<ReportConfig> {
    let mut style = build_style(&args.style)?;
    if args.no_appendix {
        style.include_appendix = false;
    }

    let mut builder = ReportConfig::builder()
        .concurrency(args.concurrency)
        .max_image_pixels(args.max_pixels)
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .max_retries(args.max_retries)
        .api_timeout_secs(args.api_timeout)
        .style(style);

    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref path) = args.ocr_prompt {
        builder = builder.ocr_prompt(read_prompt(path).await?);
    }
    if let Some(ref path) = args.analysis_prompt {
        builder = builder.analysis_prompt(read_prompt(path).await?);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn read_prompt(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read prompt from {:?}", path))
}
