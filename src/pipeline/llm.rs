//! LLM interaction: retrying chat calls and the analysis request.
//!
//! Both pipeline calls (per-image text extraction in [`super::ocr`] and the
//! single analysis call here) go through [`chat_with_retry`], so they share
//! one retry and timeout policy.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors are transient under concurrent load. Exponential
//! backoff (`retry_backoff_ms * 2^(attempt-1)`) avoids every worker retrying
//! at once: with 500 ms base and 3 retries the waits are 500 ms → 1 s → 2 s.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::output::AnalysisResult;
use crate::prompts::DEFAULT_ANALYSIS_PROMPT;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// A successful chat completion.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    /// Retries used before success (0 = first attempt).
    pub retries: u32,
}

/// A chat call that failed on every attempt.
#[derive(Debug, Clone)]
pub struct CallFailure {
    pub last_error: String,
    pub retries: u32,
}

/// Backoff before retry number `attempt` (1-based).
pub fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_millis(base_ms.saturating_mul(factor))
}

/// Send `messages`, retrying failures and timeouts up to `config.max_retries`.
pub async fn chat_with_retry(
    provider: &Arc<dyn LLMProvider>,
    messages: &[ChatMessage],
    config: &ReportConfig,
    label: &str,
) -> Result<Completion, CallFailure> {
    let options = build_options(config);
    let call_timeout = Duration::from_secs(config.api_timeout_secs);
    let mut last_err = String::from("Unknown error");

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_delay(config.retry_backoff_ms, attempt);
            warn!(
                "{}: retry {}/{} after {}ms",
                label,
                attempt,
                config.max_retries,
                backoff.as_millis()
            );
            sleep(backoff).await;
        }

        match timeout(call_timeout, provider.chat(messages, Some(&options))).await {
            Ok(Ok(response)) => {
                debug!(
                    "{}: {} input tokens, {} output tokens",
                    label, response.prompt_tokens, response.completion_tokens
                );
                return Ok(Completion {
                    content: response.content,
                    input_tokens: response.prompt_tokens,
                    output_tokens: response.completion_tokens,
                    retries: attempt,
                });
            }
            Ok(Err(e)) => {
                last_err = e.to_string();
                warn!("{}: attempt {} failed: {}", label, attempt + 1, last_err);
            }
            Err(_) => {
                last_err = format!("timed out after {}s", config.api_timeout_secs);
                warn!("{}: attempt {} {}", label, attempt + 1, last_err);
            }
        }
    }

    Err(CallFailure {
        last_error: last_err,
        retries: config.max_retries,
    })
}

/// Build `CompletionOptions` from the report config.
pub fn build_options(config: &ReportConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Messages for the analysis call: system prompt, then the aggregated text.
pub fn analysis_messages(ocr_text: &str, config: &ReportConfig) -> Vec<ChatMessage> {
    let system_prompt = config
        .analysis_prompt
        .as_deref()
        .unwrap_or(DEFAULT_ANALYSIS_PROMPT);
    vec![ChatMessage::system(system_prompt), ChatMessage::user(ocr_text)]
}

/// Run the analysis over the aggregated extracted text.
///
/// Unlike per-image extraction, failure here is fatal: without the analysis
/// there is no report.
pub async fn analyze(
    provider: &Arc<dyn LLMProvider>,
    ocr_text: &str,
    config: &ReportConfig,
) -> Result<AnalysisResult, ReportError> {
    let start = Instant::now();
    info!("Requesting analysis over {} chars of extracted text", ocr_text.len());

    let messages = analysis_messages(ocr_text, config);
    let completion = chat_with_retry(provider, &messages, config, "Analysis")
        .await
        .map_err(|f| ReportError::AnalysisFailed {
            retries: f.retries,
            detail: f.last_error,
        })?;

    if completion.content.trim().is_empty() {
        return Err(ReportError::EmptyAnalysis);
    }

    Ok(AnalysisResult {
        markdown: completion.content,
        input_tokens: completion.input_tokens,
        output_tokens: completion.output_tokens,
        duration_ms: start.elapsed().as_millis() as u64,
        retries: completion.retries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = ReportConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(4096));
    }

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff_delay(500, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(500, 2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(500, 3), Duration::from_millis(2000));
    }

    #[test]
    fn backoff_saturates() {
        assert_eq!(backoff_delay(u64::MAX, 10), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn analysis_messages_use_override() {
        let config = ReportConfig::builder()
            .analysis_prompt("custom")
            .build()
            .unwrap();
        let messages = analysis_messages("text", &config);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "custom");
        assert_eq!(messages[1].content, "text");
    }
}
