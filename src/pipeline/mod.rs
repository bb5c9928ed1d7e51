//! Pipeline stages for photo-to-report generation.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable; only
//! [`ocr`] and [`llm`] touch the network.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ ocr ──▶ llm ──▶ postprocess ──▶ markdown ──▶ docx ──▶ package
//! (paths)   (base64)   (VLM)   (analysis) (cleanup)     (blocks)             (zip)
//! ```
//!
//! 1. [`input`]: read each photo, sniff its format, read its dimensions
//! 2. [`encode`]: downscale oversized photos and base64-wrap them for the
//!    multimodal request body
//! 3. [`ocr`]: one vision call per photo, concurrently; failures are
//!    recorded per image, never fatal
//! 4. [`llm`]: the analysis call over the aggregated text, with the
//!    shared retry/backoff policy
//! 5. [`postprocess`]: deterministic cleanup of model quirks (fences, BOMs,
//!    mixed bullet markers) before the line classifier sees the text
//! 6. [`package`]: zip the document, the markdown, the extracted text and
//!    the source photos; written atomically

pub mod encode;
pub mod input;
pub mod llm;
pub mod ocr;
pub mod package;
pub mod postprocess;
