//! # promo-report
//!
//! Turn photographs of competitor promotions into a structured Word report.
//!
//! ## Why this crate?
//!
//! Field teams photograph shelf labels, posters and flyers in stores. Reading
//! dozens of photos, typing up each offer and comparing them by hand takes
//! hours. This crate has a vision model transcribe every photo, a second call
//! turn the transcripts into a markdown analysis with a comparison table, and
//! then renders that markdown into a `.docx` with real headings, lists and
//! shaded tables.
//!
//! ## Pipeline Overview
//!
//! ```text
//! photos
//!  │
//!  ├─ 1. Input     read files, sniff format by magic bytes, read dimensions
//!  ├─ 2. Encode    downscale oversized photos → base64 ImageData
//!  ├─ 3. OCR       concurrent vision calls, one per photo
//!  ├─ 4. Analyse   one call over the aggregated transcripts → markdown
//!  ├─ 5. Polish    deterministic cleanup of model quirks
//!  ├─ 6. Convert   line classifier → Vec<Block>
//!  ├─ 7. Render    Block list → .docx (optional photo appendix)
//!  └─ 8. Package   report.docx + analysis.md + transcripts + photos → .zip
//! ```
//!
//! Steps 6 and 7 need no network and are available on their own through
//! [`convert`] and [`render_markdown`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use promo_report::{generate_report_to_archive, ReportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = ReportConfig::builder().title("Week 42").build()?;
//!     let stats = generate_report_to_archive(
//!         &["shelf1.jpg", "flyer.png"],
//!         "report.zip",
//!         &config,
//!     )
//!     .await?;
//!     eprintln!("{} tables, {} tokens in", stats.tables, stats.total_input_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Offline conversion
//!
//! ```rust
//! use promo_report::{convert, Block};
//!
//! let blocks = convert("# Report\n| Brand | Type |\n| --- | --- |\n| Dior | Cash |");
//! assert_eq!(blocks[0], Block::heading(1, "Report"));
//! assert!(blocks[1].is_table());
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `promo-report` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! promo-report = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod docx;
pub mod error;
pub mod markdown;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DocumentStyle, ReportConfig, ReportConfigBuilder, TablePalette};
pub use docx::{render_docx, AppendixImage};
pub use error::{ImageError, ReportError};
pub use markdown::{build_paragraph, build_table, convert, shade_for_row, Block, ListKind, RowShade, Span};
pub use output::{AnalysisResult, ImageResult, ReportOutput, ReportStats};
pub use pipeline::input::SourceImage;
pub use progress::{
    NoopProgressCallback, Progress, ProgressCallback, ProgressRegistry, ReportProgressCallback,
    SessionProgress, Stage,
};
pub use report::{
    analyze_text, block_summary, generate_report, generate_report_from_images,
    generate_report_sync, generate_report_to_archive, render_markdown,
};
