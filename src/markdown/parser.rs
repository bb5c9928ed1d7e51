//! Line classifier: markdown-ish LLM output → ordered [`Block`]s.
//!
//! One forward pass, no lookahead, no backtracking. Each line is classified
//! in priority order (first match wins):
//!
//! 1. `# `   → heading level 1
//! 2. `## `  → heading level 2
//! 3. `### ` → heading level 3
//! 4. starts and ends with `|` → table row
//! 5. inside a table and the line does not start with `|` → flush the table,
//!    then classify the line with rules 6–10
//! 6. `- `            → bullet, indent 0
//! 7. `  - ` / `    - ` → bullet, indent 1 / 2
//! 8. `N. text`        → numbered item (the number itself is discarded)
//! 9. blank            → spacer
//! 10. anything else   → paragraph with inline spans
//!
//! Headings outrank table context: a heading line closes an open table
//! before it is emitted, so block order still follows source order.
//!
//! Lines are matched exactly as written, trailing whitespace included; only
//! rule 9 trims. `str::lines` already drops the `\n` / `\r\n` terminator.
//!
//! There is no error path. Every line lands in exactly one rule or is folded
//! into table state.

use super::block::Block;
use super::inline::build_paragraph;
use super::table::{build_table, split_row};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s+(.*)$").unwrap());

/// Header and data rows collected while inside a table.
#[derive(Debug, Default)]
struct TableAccumulator {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableAccumulator {
    /// Finalise into a table block. Tables without headers or without data
    /// rows are dropped.
    fn flush(self) -> Option<Block> {
        if self.headers.is_empty() || self.rows.is_empty() {
            None
        } else {
            Some(build_table(self.headers, self.rows))
        }
    }
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Normal,
    InTable(TableAccumulator),
}

/// Transient parse state for one conversion call.
#[derive(Debug, Default)]
struct Converter {
    state: State,
    blocks: Vec<Block>,
    lines: usize,
    dropped_tables: usize,
}

impl Converter {
    fn step(mut self, line: &str) -> Self {
        self.lines += 1;

        if let Some(heading) = classify_heading(line) {
            self.end_table();
            self.blocks.push(heading);
            return self;
        }

        if line.starts_with('|') && line.ends_with('|') {
            self.table_row(line);
            return self;
        }

        if !line.starts_with('|') {
            self.end_table();
        }

        self.blocks.push(classify_body(line));
        self
    }

    fn table_row(&mut self, line: &str) {
        match &mut self.state {
            State::Normal => {
                self.state = State::InTable(TableAccumulator {
                    headers: split_row(line),
                    rows: Vec::new(),
                });
            }
            State::InTable(_) if line.contains("---") => {}
            State::InTable(table) => table.rows.push(split_row(line)),
        }
    }

    fn end_table(&mut self) {
        if let State::InTable(table) = std::mem::take(&mut self.state) {
            match table.flush() {
                Some(block) => self.blocks.push(block),
                None => self.dropped_tables += 1,
            }
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.end_table();
        debug!(
            lines = self.lines,
            blocks = self.blocks.len(),
            dropped_tables = self.dropped_tables,
            "converted markdown"
        );
        self.blocks
    }
}

fn classify_heading(line: &str) -> Option<Block> {
    if let Some(rest) = line.strip_prefix("# ") {
        Some(Block::heading(1, rest))
    } else if let Some(rest) = line.strip_prefix("## ") {
        Some(Block::heading(2, rest))
    } else {
        line.strip_prefix("### ").map(|rest| Block::heading(3, rest))
    }
}

/// Rules 6–10.
fn classify_body(line: &str) -> Block {
    if let Some(rest) = line.strip_prefix("- ") {
        return Block::bullet(0, rest);
    }
    if let Some(rest) = line.strip_prefix("  - ") {
        return Block::bullet(1, rest);
    }
    if let Some(rest) = line.strip_prefix("    - ") {
        return Block::bullet(2, rest);
    }
    if let Some(caps) = RE_NUMBERED.captures(line) {
        return Block::numbered(&caps[1]);
    }
    if line.trim().is_empty() {
        return Block::Spacer;
    }
    build_paragraph(line)
}

/// Convert a block of markdown-ish text into document blocks.
///
/// Pure and deterministic; safe to call concurrently.
pub fn convert(text: &str) -> Vec<Block> {
    text.lines()
        .fold(Converter::default(), Converter::step)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::block::{ListKind, Span};

    fn table(headers: &[&str], rows: &[&[&str]]) -> Block {
        Block::Table {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn headings_by_prefix() {
        assert_eq!(
            convert("# One\n## Two\n### Three"),
            vec![
                Block::heading(1, "One"),
                Block::heading(2, "Two"),
                Block::heading(3, "Three"),
            ]
        );
    }

    #[test]
    fn deeper_heading_is_paragraph() {
        assert_eq!(
            convert("#### Four"),
            vec![Block::Paragraph {
                spans: vec![Span::plain("#### Four")]
            }]
        );
    }

    #[test]
    fn hash_without_space_is_paragraph() {
        assert!(matches!(convert("#tag")[0], Block::Paragraph { .. }));
    }

    #[test]
    fn bullet_indent_levels() {
        assert_eq!(
            convert("- a\n  - b\n    - c"),
            vec![Block::bullet(0, "a"), Block::bullet(1, "b"), Block::bullet(2, "c")]
        );
    }

    #[test]
    fn three_space_bullet_is_paragraph() {
        assert!(matches!(convert("   - odd")[0], Block::Paragraph { .. }));
    }

    #[test]
    fn numbered_prefix_is_discarded() {
        assert_eq!(
            convert("1. first\n12.   twelfth"),
            vec![Block::numbered("first"), Block::numbered("twelfth")]
        );
    }

    #[test]
    fn number_without_text_is_paragraph() {
        assert!(matches!(convert("3.")[0], Block::Paragraph { .. }));
        assert!(matches!(convert("3.5 percent")[0], Block::Paragraph { .. }));
    }

    #[test]
    fn blank_lines_become_spacers() {
        assert_eq!(
            convert("a\n\n   \nb").iter().filter(|b| **b == Block::Spacer).count(),
            2
        );
    }

    #[test]
    fn table_with_separator() {
        let blocks = convert("| A | B |\n| --- | --- |\n| 1 | 2 |\n| 3 | 4 |");
        assert_eq!(blocks, vec![table(&["A", "B"], &[&["1", "2"], &["3", "4"]])]);
    }

    #[test]
    fn table_flushed_at_end_of_input() {
        let blocks = convert("intro\n| A |\n| x |");
        assert_eq!(blocks.len(), 2);
        assert!(blocks[1].is_table());
    }

    #[test]
    fn table_without_rows_is_dropped() {
        assert!(convert("| A | B |\n|---|---|").is_empty());
        assert_eq!(convert("| A | B |\n|---|---|\ntext").len(), 1);
    }

    #[test]
    fn table_without_headers_is_dropped() {
        assert!(convert("| |\n| 1 | 2 |").iter().all(|b| !b.is_table()));
    }

    #[test]
    fn ragged_rows_are_preserved() {
        let blocks = convert("| A | B |\n| 1 |\n| 1 | 2 | 3 |");
        assert_eq!(blocks, vec![table(&["A", "B"], &[&["1"], &["1", "2", "3"]])]);
    }

    #[test]
    fn heading_closes_open_table() {
        let blocks = convert("| A |\n| 1 |\n### Note");
        assert_eq!(
            blocks,
            vec![table(&["A"], &[&["1"]]), Block::heading(3, "Note")]
        );
    }

    #[test]
    fn heading_closes_empty_table_without_emitting_it() {
        let blocks = convert("| A |\n|---|\n### Note");
        assert_eq!(blocks, vec![Block::heading(3, "Note")]);
    }

    #[test]
    fn pipe_line_without_closing_pipe_keeps_table_open() {
        let blocks = convert("| A |\n| 1 |\n| broken\n| 2 |");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[0], Block::Paragraph { .. }));
        assert_eq!(blocks[1], table(&["A"], &[&["1"], &["2"]]));
    }

    #[test]
    fn line_after_table_is_reclassified() {
        let blocks = convert("| A |\n| 1 |\n- item");
        assert_eq!(blocks[1], Block::bullet(0, "item"));
    }

    #[test]
    fn two_tables_back_to_back_via_blank_line() {
        let blocks = convert("| A |\n| 1 |\n\n| B |\n| 2 |");
        assert_eq!(
            blocks,
            vec![table(&["A"], &[&["1"]]), Block::Spacer, table(&["B"], &[&["2"]])]
        );
    }

    #[test]
    fn crlf_line_endings_are_ignored() {
        let blocks = convert("| A |\r\n| 1 |\r\n");
        assert_eq!(blocks, vec![table(&["A"], &[&["1"]])]);
    }

    #[test]
    fn trailing_space_after_closing_pipe_is_not_a_row() {
        let blocks = convert("| A |\n| 1 |  ");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                spans: vec![Span::plain("| 1 |  ")]
            }]
        );
    }

    #[test]
    fn bare_markers_keep_their_kind() {
        assert_eq!(
            convert("# \n## \n- \n  - \n1. "),
            vec![
                Block::heading(1, ""),
                Block::heading(2, ""),
                Block::bullet(0, ""),
                Block::bullet(1, ""),
                Block::numbered(""),
            ]
        );
    }

    #[test]
    fn trailing_spaces_stay_in_paragraph_text() {
        assert_eq!(
            convert("Price:  "),
            vec![Block::Paragraph {
                spans: vec![Span::plain("Price:  ")]
            }]
        );
    }

    #[test]
    fn list_item_kind() {
        match &convert("7. x")[0] {
            Block::ListItem { kind, indent, .. } => {
                assert_eq!(*kind, ListKind::Numbered);
                assert_eq!(*indent, 0);
            }
            other => panic!("expected list item, got {other:?}"),
        }
    }

    #[test]
    fn empty_and_whitespace_inputs() {
        assert!(convert("").is_empty());
        assert_eq!(convert("   "), vec![Block::Spacer]);
        assert!(convert("|---|---|").is_empty());
    }
}
