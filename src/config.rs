//! Configuration types for report generation.
//!
//! All pipeline behaviour is controlled through [`ReportConfig`], built via
//! [`ReportConfigBuilder`]. Document appearance lives in the nested
//! [`DocumentStyle`], which is plain serialisable data so a host can store
//! it per customer and pass it to [`crate::render_markdown`] directly.

use crate::error::ReportError;
use crate::markdown::RowShade;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for one report run.
///
/// Built via [`ReportConfig::builder()`] or using [`ReportConfig::default()`].
///
/// # Example
/// ```rust
/// use promo_report::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .concurrency(6)
///     .model("gpt-4.1-mini")
///     .title("Competitor promotions, week 42")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ReportConfig {
    /// LLM model identifier, e.g. "gpt-4.1-mini". If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for both calls. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens per completion. Default: 4096.
    ///
    /// The analysis of a dozen photos with a comparison table easily passes
    /// 2 000 tokens; a low cap truncates the table mid-row.
    pub max_tokens: usize,

    /// Retry attempts on a failed LLM call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Concurrent text-extraction calls. Default: 4.
    pub concurrency: usize,

    /// Longest image edge sent to the vision model, in pixels. Default: 2000.
    ///
    /// Phone photos are routinely 4000 px and larger; they are downscaled
    /// before encoding.
    pub max_image_pixels: u32,

    /// Per-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Custom text-extraction prompt. If None, uses the built-in default.
    pub ocr_prompt: Option<String>,

    /// Custom analysis prompt. If None, uses the built-in default.
    pub analysis_prompt: Option<String>,

    /// Document appearance.
    pub style: DocumentStyle,

    /// Optional per-image progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 4096,
            max_retries: 3,
            retry_backoff_ms: 500,
            concurrency: 4,
            max_image_pixels: 2000,
            api_timeout_secs: 120,
            ocr_prompt: None,
            analysis_prompt: None,
            style: DocumentStyle::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("concurrency", &self.concurrency)
            .field("max_image_pixels", &self.max_image_pixels)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("style", &self.style)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ReportProgressCallback>"),
            )
            .finish()
    }
}

impl ReportConfig {
    /// Create a new builder for `ReportConfig`.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn max_image_pixels(mut self, px: u32) -> Self {
        self.config.max_image_pixels = px.max(256);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn ocr_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.ocr_prompt = Some(prompt.into());
        self
    }

    pub fn analysis_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.analysis_prompt = Some(prompt.into());
        self
    }

    pub fn style(mut self, style: DocumentStyle) -> Self {
        self.config.style = style;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.style.title = Some(title.into());
        self
    }

    pub fn include_appendix(mut self, v: bool) -> Self {
        self.config.style.include_appendix = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, ReportError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(ReportError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.max_tokens == 0 {
            return Err(ReportError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        c.style.validate()?;
        Ok(self.config)
    }
}

// ── Document style ───────────────────────────────────────────────────────

/// Appearance of the generated Word document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentStyle {
    /// Written to the document properties (not rendered as a heading).
    pub title: Option<String>,
    pub author: Option<String>,
    /// Body font family. Default: "Calibri".
    pub font: String,
    /// Body font size in points. Default: 11.
    pub font_size_pt: u32,
    /// Append the source photographs after the analysis. Default: true.
    pub include_appendix: bool,
    pub palette: TablePalette,
}

impl Default for DocumentStyle {
    fn default() -> Self {
        Self {
            title: None,
            author: None,
            font: "Calibri".to_string(),
            font_size_pt: 11,
            include_appendix: true,
            palette: TablePalette::default(),
        }
    }
}

impl DocumentStyle {
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.font.trim().is_empty() {
            return Err(ReportError::InvalidConfig("font must not be empty".into()));
        }
        if !(6..=72).contains(&self.font_size_pt) {
            return Err(ReportError::InvalidConfig(format!(
                "font size must be 6–72 pt, got {}",
                self.font_size_pt
            )));
        }
        self.palette.validate()
    }
}

/// Table fill colours as 6-digit hex (`RRGGBB`, no `#`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablePalette {
    pub header: String,
    pub even: String,
    pub odd: String,
}

impl Default for TablePalette {
    fn default() -> Self {
        Self {
            header: "D9E2F3".to_string(),
            even: "FFFFFF".to_string(),
            odd: "F2F2F2".to_string(),
        }
    }
}

impl TablePalette {
    /// Fill colour for a row role.
    pub fn fill(&self, shade: RowShade) -> &str {
        match shade {
            RowShade::Header => &self.header,
            RowShade::Even => &self.even,
            RowShade::Odd => &self.odd,
        }
    }

    fn validate(&self) -> Result<(), ReportError> {
        for (name, value) in [("header", &self.header), ("even", &self.even), ("odd", &self.odd)] {
            let ok = value.len() == 6 && value.chars().all(|c| c.is_ascii_hexdigit());
            if !ok {
                return Err(ReportError::InvalidConfig(format!(
                    "palette.{name} must be 6 hex digits (RRGGBB), got {value:?}"
                )));
            }
        }
        Ok(())
    }
}
