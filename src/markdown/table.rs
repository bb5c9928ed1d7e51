//! Table row splitting, table construction and the row shading policy.

use super::block::Block;
use serde::{Deserialize, Serialize};

/// Visual role of a table row. Mapped to a fill colour by the renderer
/// through [`crate::config::TablePalette`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowShade {
    /// Header row: shaded, centred, bold.
    Header,
    /// Data row with an even 0-based index.
    Even,
    /// Data row with an odd 0-based index.
    Odd,
}

/// Shading for the data row at `index` (0-based, header excluded).
pub fn shade_for_row(index: usize) -> RowShade {
    if index % 2 == 0 {
        RowShade::Even
    } else {
        RowShade::Odd
    }
}

/// Split a `| a | b |` line into trimmed cells, dropping empty segments.
///
/// Dropping empty segments also removes deliberately blank cells, which
/// makes such rows shorter than the header. Rows are never padded.
pub fn split_row(line: &str) -> Vec<String> {
    line.split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build a [`Block::Table`] from accumulated header and data rows.
///
/// No validation happens here: the classifier only calls this with a
/// non-empty header and at least one row.
pub fn build_table(headers: Vec<String>, rows: Vec<Vec<String>>) -> Block {
    Block::Table { headers, rows }
}

/// Number of grid columns needed to hold the widest row.
pub fn column_count(headers: &[String], rows: &[Vec<String>]) -> usize {
    rows.iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0)
}
