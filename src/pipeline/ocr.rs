//! Text extraction: one vision-model call per photograph.
//!
//! A dedicated OCR engine reads shelf labels poorly: curved packaging,
//! glare, decorative fonts. A vision model transcribing the photo does
//! better, and reuses the provider already configured for the analysis.
//!
//! Extraction never fails the whole run. Each image yields an
//! [`ImageResult`]; a failed image carries its [`ImageError`] and is left
//! out of the analysis input.

use super::encode::encode_image;
use super::input::SourceImage;
use super::llm::chat_with_retry;
use crate::config::ReportConfig;
use crate::error::ImageError;
use crate::output::ImageResult;
use crate::prompts::DEFAULT_OCR_PROMPT;
use edgequake_llm::{ChatMessage, LLMProvider};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Extract text from one photograph.
pub async fn recognize_image(
    provider: &Arc<dyn LLMProvider>,
    image: &SourceImage,
    config: &ReportConfig,
) -> ImageResult {
    let start = Instant::now();
    let failed = |error: ImageError, retries: u32| ImageResult {
        image_num: image.image_num,
        file_name: image.file_name.clone(),
        text: String::new(),
        input_tokens: 0,
        output_tokens: 0,
        duration_ms: start.elapsed().as_millis() as u64,
        retries,
        error: Some(error),
    };

    let data = match encode_image(image, config.max_image_pixels) {
        Ok(data) => data,
        Err(e) => {
            warn!("Image {}: encoding failed: {}", image.image_num, e);
            return failed(
                ImageError::EncodeFailed {
                    image: image.image_num,
                    detail: e.to_string(),
                },
                0,
            );
        }
    };

    let system_prompt = config.ocr_prompt.as_deref().unwrap_or(DEFAULT_OCR_PROMPT);
    // The image carries the content; the user text stays empty.
    let messages = vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user_with_images("", vec![data]),
    ];

    let label = format!("Image {}", image.image_num);
    match chat_with_retry(provider, &messages, config, &label).await {
        Ok(completion) if completion.content.trim().is_empty() => {
            debug!("Image {}: no legible text", image.image_num);
            failed(
                ImageError::NoText {
                    image: image.image_num,
                },
                completion.retries,
            )
        }
        Ok(completion) => ImageResult {
            image_num: image.image_num,
            file_name: image.file_name.clone(),
            text: completion.content.trim().to_string(),
            input_tokens: completion.input_tokens,
            output_tokens: completion.output_tokens,
            duration_ms: start.elapsed().as_millis() as u64,
            retries: completion.retries,
            error: None,
        },
        Err(failure) => failed(
            ImageError::OcrFailed {
                image: image.image_num,
                retries: failure.retries,
                detail: failure.last_error,
            },
            failure.retries,
        ),
    }
}

/// Extract text from every image, up to `config.concurrency` at a time.
///
/// Results are returned in input order.
pub async fn recognize_all(
    provider: &Arc<dyn LLMProvider>,
    images: &[SourceImage],
    config: &ReportConfig,
) -> Vec<ImageResult> {
    let total = images.len();
    let mut results: Vec<ImageResult> = stream::iter(images.iter().map(|image| {
        let provider = Arc::clone(provider);
        async move {
            if let Some(ref cb) = config.progress_callback {
                cb.on_image_start(image.image_num, total);
            }
            let result = recognize_image(&provider, image, config).await;
            if let Some(ref cb) = config.progress_callback {
                match &result.error {
                    None => cb.on_image_complete(image.image_num, total, result.text.len()),
                    Some(e) => cb.on_image_error(image.image_num, total, &e.to_string()),
                }
            }
            result
        }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    results.sort_by_key(|r| r.image_num);
    results
}
