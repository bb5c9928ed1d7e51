//! Report entry points.
//!
//! [`generate_report`] runs the whole pipeline and returns everything in
//! memory. [`generate_report_to_archive`] additionally writes the zip a user
//! downloads. Hosts that run their own OCR use [`analyze_text`]; hosts that
//! already have the analysis markdown use [`render_markdown`], which needs
//! no provider at all.

use crate::config::{DocumentStyle, ReportConfig};
use crate::docx::{render_docx, AppendixImage};
use crate::error::ReportError;
use crate::markdown::{convert, Block};
use crate::output::{AnalysisResult, ImageResult, ReportOutput, ReportStats};
use crate::pipeline::input::{load_images, SourceImage};
use crate::pipeline::{llm, ocr, package, postprocess};
use crate::prompts::aggregate_ocr_text;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Generate a report from photographs on disk.
///
/// # Returns
/// `Ok(ReportOutput)` on success, even if some images failed
/// (check `output.stats.failed_images`).
///
/// # Errors
/// Returns `Err(ReportError)` only for fatal errors:
/// - No paths, or a path that is missing / unreadable / not an image
/// - No provider could be configured
/// - Text extraction failed for every image
/// - The analysis call failed
pub async fn generate_report<P: AsRef<Path>>(
    paths: &[P],
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    let images = load_images(paths)?;
    generate_report_from_images(&images, config).await
}

/// Generate a report from images already in memory (e.g. an upload).
pub async fn generate_report_from_images(
    images: &[SourceImage],
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    let total_start = Instant::now();
    if images.is_empty() {
        return Err(ReportError::NoImages);
    }
    info!("Starting report over {} images", images.len());

    let provider = resolve_provider(config)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_report_start(images.len());
    }

    // ── Step 1: Extract text per image ───────────────────────────────────
    let ocr_start = Instant::now();
    let results = ocr::recognize_all(&provider, images, config).await;
    let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;

    let processed = results.iter().filter(|r| r.error.is_none()).count();
    info!(
        "Extracted text from {}/{} images in {}ms",
        processed,
        images.len(),
        ocr_duration_ms
    );
    if processed == 0 {
        let first_error = results
            .iter()
            .find_map(|r| r.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(ReportError::AllImagesFailed {
            total: images.len(),
            retries: config.max_retries,
            first_error,
        });
    }

    // ── Step 2: Analyse ──────────────────────────────────────────────────
    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_start();
    }
    let ocr_text = aggregate_ocr_text(&results);
    let analysis = llm::analyze(&provider, &ocr_text, config).await?;

    // ── Step 3: Build the document ───────────────────────────────────────
    let appendix: Vec<AppendixImage> = images.iter().map(AppendixImage::from).collect();
    let mut output = assemble(analysis, results, &appendix, &config.style)?;
    output.stats.ocr_duration_ms = ocr_duration_ms;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Report complete: {}/{} images, {} blocks, {}ms total",
        processed,
        images.len(),
        output.stats.blocks,
        output.stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_report_complete(images.len(), processed);
    }

    Ok(output)
}

/// Generate a report and write the downloadable archive to `archive_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn generate_report_to_archive<P: AsRef<Path>>(
    paths: &[P],
    archive_path: impl AsRef<Path>,
    config: &ReportConfig,
) -> Result<ReportStats, ReportError> {
    let images = load_images(paths)?;
    let output = generate_report_from_images(&images, config).await?;
    let bytes = package::build_archive(
        &output.docx,
        &output.analysis_markdown,
        &images,
        &output.images,
    )?;
    package::write_atomic(archive_path.as_ref(), &bytes)?;
    info!(
        "Wrote {} ({} bytes)",
        archive_path.as_ref().display(),
        bytes.len()
    );
    Ok(output.stats)
}

/// Synchronous wrapper around [`generate_report`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_report_sync<P: AsRef<Path>>(
    paths: &[P],
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReportError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_report(paths, config))
}

/// Run the analysis over text the caller extracted itself.
///
/// The document has no appendix and `output.images` is empty.
pub async fn analyze_text(
    ocr_text: &str,
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    let total_start = Instant::now();
    if ocr_text.trim().is_empty() {
        return Err(ReportError::NoText);
    }
    let provider = resolve_provider(config)?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_start();
    }
    let analysis = llm::analyze(&provider, ocr_text, config).await?;
    let mut output = assemble(analysis, Vec::new(), &[], &config.style)?;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Render analysis markdown straight to `.docx` bytes. No LLM involved.
pub fn render_markdown(markdown: &str, style: &DocumentStyle) -> Result<Vec<u8>, ReportError> {
    style.validate()?;
    let cleaned = postprocess::clean_markdown(markdown);
    let blocks = convert(&cleaned);
    render_docx(&blocks, style, &[])
}

/// Postprocess, convert and render; fill in everything in the stats that
/// doesn't depend on timing of the caller.
fn assemble(
    analysis: AnalysisResult,
    images: Vec<ImageResult>,
    appendix: &[AppendixImage],
    style: &DocumentStyle,
) -> Result<ReportOutput, ReportError> {
    let analysis_markdown = postprocess::clean_markdown(&analysis.markdown);
    let blocks = convert(&analysis_markdown);
    let docx = render_docx(&blocks, style, appendix)?;

    let stats = ReportStats {
        total_images: images.len(),
        processed_images: images.iter().filter(|i| i.error.is_none()).count(),
        failed_images: images.iter().filter(|i| i.error.is_some()).count(),
        total_input_tokens: images.iter().map(|i| i.input_tokens as u64).sum::<u64>()
            + analysis.input_tokens as u64,
        total_output_tokens: images.iter().map(|i| i.output_tokens as u64).sum::<u64>()
            + analysis.output_tokens as u64,
        blocks: blocks.len(),
        tables: blocks.iter().filter(|b| b.is_table()).count(),
        docx_bytes: docx.len(),
        ocr_duration_ms: 0,
        analysis_duration_ms: analysis.duration_ms,
        total_duration_ms: 0,
    };
    debug!(?stats, "Assembled report");

    Ok(ReportOutput {
        analysis_markdown,
        blocks,
        docx,
        images,
        stats,
    })
}

/// Block count by kind, for logs and the CLI summary.
pub fn block_summary(blocks: &[Block]) -> String {
    let mut counts = [0usize; 5];
    for block in blocks {
        let slot = match block {
            Block::Heading { .. } => 0,
            Block::Paragraph { .. } => 1,
            Block::ListItem { .. } => 2,
            Block::Table { .. } => 3,
            Block::Spacer => 4,
        };
        counts[slot] += 1;
    }
    format!(
        "{} headings, {} paragraphs, {} list items, {} tables, {} spacers",
        counts[0], counts[1], counts[2], counts[3], counts[4]
    )
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ReportError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ReportError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model`.
/// 3. **Environment pair** (`PROMO_REPORT_PROVIDER` + `PROMO_REPORT_MODEL`),
///    both set and non-empty.
/// 4. **OpenAI** when `OPENAI_API_KEY` is set, even if other keys are too.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
///
/// Both pipeline calls use the same provider, so it must be vision-capable.
fn resolve_provider(config: &ReportConfig) -> Result<Arc<dyn LLMProvider>, ReportError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("PROMO_REPORT_PROVIDER"),
        std::env::var("PROMO_REPORT_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ReportError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
