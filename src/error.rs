//! Error types for the promo-report library.
//!
//! Two error types for two failure modes:
//!
//! * [`ReportError`]: **Fatal**: the report cannot be produced at all
//!   (no readable images, provider not configured, analysis call failed,
//!   archive could not be written). Returned as `Err(ReportError)` from the
//!   top-level `generate_*` functions.
//!
//! * [`ImageError`]: **Non-fatal**: text extraction failed for one image
//!   but the others are fine. Stored inside [`crate::output::ImageResult`];
//!   the report is still produced from the images that did succeed.
//!
//! The markdown converter has no error type: every input line is classified.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the promo-report library.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// An input image was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was read but is not a supported image.
    #[error("File is not a supported image (png, jpeg, webp, gif): '{path}'\nFirst bytes: {magic:02x?}")]
    NotAnImage { path: PathBuf, magic: Vec<u8> },

    /// The image header was recognised but decoding failed.
    #[error("Image '{path}' could not be decoded: {detail}")]
    CorruptImage { path: PathBuf, detail: String },

    /// No input images were supplied.
    #[error("No images supplied; at least one photograph is required")]
    NoImages,

    /// Text handed to the analysis was empty.
    #[error("No extracted text to analyse")]
    NoText,

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Text extraction failed for every image; there is nothing to analyse.
    #[error("Text extraction failed for all {total} images after {retries} retries each.\nFirst error: {first_error}")]
    AllImagesFailed {
        total: usize,
        retries: u32,
        first_error: String,
    },

    /// The analysis call failed after all retries.
    #[error("Analysis failed after {retries} retries: {detail}")]
    AnalysisFailed { retries: u32, detail: String },

    /// The model answered with no content.
    #[error("Analysis returned an empty response")]
    EmptyAnalysis,

    // ── Output errors ─────────────────────────────────────────────────────
    /// The document package could not be assembled.
    #[error("Failed to assemble document: {0}")]
    Document(String),

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<zip::result::ZipError> for ReportError {
    fn from(e: zip::result::ZipError) -> Self {
        ReportError::Document(e.to_string())
    }
}

/// A non-fatal error for a single image.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageError {
    /// The image could not be prepared for the vision model.
    #[error("Image {image}: encoding failed: {detail}")]
    EncodeFailed { image: usize, detail: String },

    /// Text extraction call failed after retries.
    #[error("Image {image}: text extraction failed after {retries} retries: {detail}")]
    OcrFailed {
        image: usize,
        retries: u32,
        detail: String,
    },

    /// The model returned no text for the image.
    #[error("Image {image}: no text found")]
    NoText { image: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_images_failed_display() {
        let e = ReportError::AllImagesFailed {
            total: 4,
            retries: 3,
            first_error: "timeout".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("all 4 images"), "got: {msg}");
        assert!(msg.contains("timeout"));
    }

    #[test]
    fn not_an_image_shows_magic_bytes() {
        let e = ReportError::NotAnImage {
            path: PathBuf::from("notes.txt"),
            magic: vec![0x68, 0x65],
        };
        let msg = e.to_string();
        assert!(msg.contains("notes.txt"));
        assert!(msg.contains("68"), "got: {msg}");
    }

    #[test]
    fn ocr_failed_display() {
        let e = ImageError::OcrFailed {
            image: 2,
            retries: 3,
            detail: "429".into(),
        };
        assert!(e.to_string().contains("Image 2"));
        assert!(e.to_string().contains("429"));
    }

    #[test]
    fn zip_error_maps_to_document() {
        let e: ReportError = zip::result::ZipError::FileNotFound.into();
        assert!(matches!(e, ReportError::Document(_)));
    }

    #[test]
    fn image_error_serialises() {
        let e = ImageError::NoText { image: 1 };
        let json = serde_json::to_string(&e).expect("serialise");
        assert!(json.contains("NoText"));
    }
}
