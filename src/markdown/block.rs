//! Document blocks produced by the line classifier.

use serde::Serialize;

/// An inline run of text sharing one set of formatting flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub underline: bool,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            underline: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            underline: false,
        }
    }

    /// `__text__` renders bold *and* underlined.
    pub fn underline(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            underline: true,
        }
    }
}

/// Bullet or auto-numbered list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Bullet,
    Numbered,
}

/// One structural unit of the output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Level is always 1, 2 or 3.
    Heading { level: u8, text: String },
    Paragraph { spans: Vec<Span> },
    /// `indent` is 0, 1 or 2.
    ListItem {
        text: String,
        kind: ListKind,
        indent: u8,
    },
    /// Rows may be ragged; cells are kept exactly as they appeared.
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Blank line in the source.
    Spacer,
}

impl Block {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading {
            level,
            text: text.into(),
        }
    }

    pub fn bullet(indent: u8, text: impl Into<String>) -> Self {
        Block::ListItem {
            text: text.into(),
            kind: ListKind::Bullet,
            indent,
        }
    }

    pub fn numbered(text: impl Into<String>) -> Self {
        Block::ListItem {
            text: text.into(),
            kind: ListKind::Numbered,
            indent: 0,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Block::Table { .. })
    }
}
