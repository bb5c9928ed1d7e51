//! Result types returned by the report entry points.

use crate::error::ImageError;
use crate::markdown::Block;
use serde::{Deserialize, Serialize};

/// Everything produced by one report run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    /// Cleaned analysis markdown, as fed to the converter.
    pub analysis_markdown: String,
    /// Block tree rendered into the document.
    pub blocks: Vec<Block>,
    /// The `.docx` package.
    #[serde(skip)]
    pub docx: Vec<u8>,
    /// Per-image extraction results, in input order.
    pub images: Vec<ImageResult>,
    pub stats: ReportStats,
}

impl ReportOutput {
    /// Text extracted from the images that succeeded.
    pub fn successful_images(&self) -> impl Iterator<Item = &ImageResult> {
        self.images.iter().filter(|i| i.error.is_none())
    }
}

/// Text extraction outcome for one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResult {
    /// 1-indexed position in the input list.
    pub image_num: usize,
    pub file_name: String,
    /// Extracted text; empty on failure.
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
    pub retries: u32,
    pub error: Option<ImageError>,
}

/// Outcome of the analysis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub markdown: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
    pub retries: u32,
}

/// Aggregate statistics for a report run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportStats {
    pub total_images: usize,
    pub processed_images: usize,
    pub failed_images: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub blocks: usize,
    pub tables: usize,
    pub docx_bytes: usize,
    pub ocr_duration_ms: u64,
    pub analysis_duration_ms: u64,
    pub total_duration_ms: u64,
}
