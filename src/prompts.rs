//! Prompts for text extraction and promotion analysis.
//!
//! Callers can override both via [`crate::config::ReportConfig::ocr_prompt`]
//! and [`crate::config::ReportConfig::analysis_prompt`]; the constants here
//! are used only when no override is provided.
//!
//! The analysis prompt asks for exactly the markdown subset the converter in
//! [`crate::markdown`] understands: `#`/`##`/`###` headings, pipe tables,
//! `-` and `1.` lists, `**bold**` and `__underline__`.

use crate::output::ImageResult;

/// Default system prompt for reading one promotion photograph.
pub const DEFAULT_OCR_PROMPT: &str = r#"You are a meticulous transcriber. The image is a photograph of a retail promotion (poster, shelf label, flyer, counter display or receipt).

Transcribe ALL legible text exactly as printed:
- Keep brand names, prices, percentages, dates and conditions verbatim
- Keep the reading order a shopper would follow, top to bottom
- Put each distinct text block on its own line
- Do NOT translate, summarise or explain
- If no text is legible, output nothing"#;

/// Default system prompt for the competitor analysis.
pub const DEFAULT_ANALYSIS_PROMPT: &str = r####"You are a retail market analyst. You receive text transcribed from photographs of competitor promotions, one section per photograph.

Write a structured report in Markdown using ONLY these constructs:
- "# " for the report title (exactly one)
- "## " for sections and "### " for sub-sections
- Pipe tables with a header row and a "| --- |" separator row
- "- " for bullet points (indent nested bullets by two spaces)
- "1. " for numbered steps
- **bold** for key figures and __underline__ for the single most important finding per section

Structure:
1. Title
2. ## Overview: two or three sentences
3. ## Promotions: one table with columns: Brand | Promotion type | Mechanic | Value | Validity
   Sort rows by brand. Write "n/a" rather than leaving a cell empty.
4. ## Analysis: bullets on pricing depth, mechanics and timing
5. ## Recommendations: numbered list

Do NOT wrap the output in code fences. Do NOT invent promotions that are not in the text."####;

/// Join per-image text into the user message for the analysis call.
///
/// Failed images are skipped. Each section is labelled with the image number
/// and file name so the model can cite its source.
pub fn aggregate_ocr_text(images: &[ImageResult]) -> String {
    images
        .iter()
        .filter(|img| img.error.is_none() && !img.text.trim().is_empty())
        .map(|img| {
            format!(
                "=== Photo {} ({}) ===\n{}",
                img.image_num,
                img.file_name,
                img.text.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageError;

    fn result(n: usize, text: &str, failed: bool) -> ImageResult {
        ImageResult {
            image_num: n,
            file_name: format!("p{n}.jpg"),
            text: text.to_string(),
            input_tokens: 0,
            output_tokens: 0,
            duration_ms: 0,
            retries: 0,
            error: failed.then(|| ImageError::NoText { image: n }),
        }
    }

    #[test]
    fn aggregate_skips_failed_and_empty() {
        let text = aggregate_ocr_text(&[
            result(1, "Dior -20%", false),
            result(2, "", false),
            result(3, "ignored", true),
            result(4, "  Chanel gift  \n", false),
        ]);
        assert_eq!(
            text,
            "=== Photo 1 (p1.jpg) ===\nDior -20%\n\n=== Photo 4 (p4.jpg) ===\nChanel gift"
        );
    }

    #[test]
    fn analysis_prompt_names_supported_constructs() {
        for construct in ["# ", "## ", "### ", "| --- |", "**bold**", "__underline__"] {
            assert!(DEFAULT_ANALYSIS_PROMPT.contains(construct), "missing {construct}");
        }
    }

    #[test]
    fn analysis_prompt_keeps_quoted_markers() {
        assert!(DEFAULT_ANALYSIS_PROMPT.contains(r####""# " for the report title"####));
        assert!(DEFAULT_ANALYSIS_PROMPT.contains(r####""### " for sub-sections"####));
        assert!(DEFAULT_ANALYSIS_PROMPT.contains(r#"Write "n/a" rather"#));
        assert!(DEFAULT_ANALYSIS_PROMPT.ends_with("not in the text."));
    }
}
