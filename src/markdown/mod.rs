//! Markdown → document-tree conversion.
//!
//! The model's analysis is "markdown-ish": mostly GFM, but with unterminated
//! tables, stray `**`, and mixed list markers. Rather than a full CommonMark
//! parser this module runs a line-oriented classifier whose policy for every
//! malformed case is fixed and tested, so the same input always produces the
//! same document.
//!
//! ```text
//! text ──▶ parser (line classifier) ──▶ Vec<Block> ──▶ crate::docx
//!              │            │
//!              │            └─ table   (row split, shading policy)
//!              └─ inline (bold / underline spans)
//! ```

pub mod block;
pub mod inline;
pub mod parser;
pub mod table;

pub use block::{Block, ListKind, Span};
pub use inline::{build_paragraph, split_spans};
pub use parser::convert;
pub use table::{build_table, column_count, shade_for_row, RowShade};
