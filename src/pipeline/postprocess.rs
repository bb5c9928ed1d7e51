//! Post-processing: deterministic cleanup of model markdown before conversion.
//!
//! The line classifier in [`crate::markdown`] is strict about prefixes: a
//! BOM in front of `# Title` or a ```` ```markdown ```` fence around the whole
//! answer turns structure into plain paragraphs. These rules fix the quirks
//! models actually produce without touching content.
//!
//! ## Rule Order
//!
//! Fences are stripped first so the remaining rules see the real first line;
//! invisible characters go before bullet normalisation so a zero-width space
//! in front of `*` doesn't hide the marker.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to the raw analysis output.
///
/// Rules (applied in order):
/// 1. Strip outer markdown fences (models sometimes disobey the prompt)
/// 2. Normalise line endings (CRLF → LF)
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
/// 4. Trim trailing whitespace per line
/// 5. Normalise `*` / `•` bullets to `-`
/// 6. Collapse 3+ consecutive blank lines down to 2
/// 7. Ensure the text ends with exactly one newline
pub fn clean_markdown(input: &str) -> String {
    let s = strip_markdown_fences(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = normalise_bullets(&s);
    let s = collapse_blank_lines(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?[ \t]*\r?\n(.*?)\r?\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Normalise bullet markers ─────────────────────────────────────────
//
// Models mix `*`, `•` and `-` within one list. Only the indents the
// classifier understands (0, 2, 4 spaces) are rewritten; `**bold**` at the
// start of a line is left alone because it has no space after the first `*`.

static RE_ALT_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^((?:    |  )?)[*•] ").unwrap());

fn normalise_bullets(input: &str) -> String {
    RE_ALT_BULLET.replace_all(input, "${1}- ").to_string()
}

// ── Rule 6: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Rule 7: Ensure text ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        let input = "```markdown\n# Hello\nWorld\n```";
        assert_eq!(strip_markdown_fences(input), "# Hello\nWorld");
    }

    #[test]
    fn test_strip_fences_md_tag_and_crlf() {
        let input = "```md\r\n# Hello\r\n```";
        assert_eq!(strip_markdown_fences(input), "# Hello");
    }

    #[test]
    fn test_no_fences_passthrough() {
        let input = "# Hello\nWorld";
        assert_eq!(strip_markdown_fences(input), "# Hello\nWorld");
    }

    #[test]
    fn test_inner_code_block_untouched() {
        let input = "# T\n```\ncode\n```\nafter";
        assert_eq!(strip_markdown_fences(input), input);
    }

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "\u{FEFF}# Title\u{200B}";
        assert_eq!(remove_invisible_chars(input), "# Title");
    }

    #[test]
    fn test_trim_trailing_whitespace() {
        assert_eq!(
            trim_trailing_whitespace("  - item   \n| a |  "),
            "  - item\n| a |"
        );
    }

    #[test]
    fn test_normalise_bullets() {
        let input = "* one\n  • two\n    * three\n**bold** start\n   * odd indent";
        assert_eq!(
            normalise_bullets(input),
            "- one\n  - two\n    - three\n**bold** start\n   * odd indent"
        );
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\n\nb"), "a\n\n\nb");
    }

    #[test]
    fn test_ensure_final_newline() {
        assert_eq!(ensure_final_newline("hello"), "hello\n");
        assert_eq!(ensure_final_newline("hello\n\n\n"), "hello\n");
        assert_eq!(ensure_final_newline(""), "\n");
    }

    #[test]
    fn test_clean_markdown_full_pipeline() {
        let input = "```markdown\n\u{FEFF}# Report\r\n\r\n* Dior   \n\n\n\n\n\n## Next\n```";
        let result = clean_markdown(input);
        assert_eq!(result, "# Report\n\n- Dior\n\n\n## Next\n");
    }
}
