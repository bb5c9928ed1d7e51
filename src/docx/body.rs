//! `word/document.xml`: one pass over the block list.

use super::parts::{
    section_properties, BULLET_NUM_ID, CONTENT_HEIGHT_TWIPS, CONTENT_WIDTH_TWIPS, EMU_PER_PIXEL,
    EMU_PER_TWIP, FIRST_NUMBERED_ID, NS_A, NS_PIC, NS_R, NS_W, NS_WP,
};
use super::xml::{empty, end, part_writer, start, text_element, val, XmlWriter};
use crate::config::TablePalette;
use crate::markdown::{column_count, shade_for_row, split_spans, Block, ListKind, RowShade, Span};
use std::io;

const BORDER_SIDES: [&str; 6] = [
    "w:top",
    "w:left",
    "w:bottom",
    "w:right",
    "w:insideH",
    "w:insideV",
];

/// Streams the document part and tracks the numbering instances it refers to.
pub struct BodyWriter {
    xml: XmlWriter,
    /// Numbered runs seen so far; each one gets its own `w:num`.
    numbered_runs: usize,
    /// Whether the previous list-relevant block was a numbered item.
    in_numbered_run: bool,
    /// Next `wp:docPr` id.
    next_drawing_id: u32,
}

impl BodyWriter {
    /// Writes the declaration and opens `w:document` and `w:body`.
    pub fn new() -> io::Result<Self> {
        let mut xml = part_writer()?;
        start(
            &mut xml,
            "w:document",
            &[
                ("xmlns:w", NS_W),
                ("xmlns:r", NS_R),
                ("xmlns:wp", NS_WP),
                ("xmlns:a", NS_A),
                ("xmlns:pic", NS_PIC),
            ],
        )?;
        start(&mut xml, "w:body", &[])?;
        Ok(Self {
            xml,
            numbered_runs: 0,
            in_numbered_run: false,
            next_drawing_id: 1,
        })
    }

    pub fn numbered_runs(&self) -> usize {
        self.numbered_runs
    }

    /// Section properties, then the closing tags. Returns the finished part.
    pub fn finish(mut self) -> io::Result<Vec<u8>> {
        section_properties(&mut self.xml)?;
        end(&mut self.xml, "w:body")?;
        end(&mut self.xml, "w:document")?;
        Ok(self.xml.into_inner())
    }

    pub fn block(&mut self, block: &Block, palette: &TablePalette) -> io::Result<()> {
        match block {
            Block::Heading { level, text } => {
                self.end_numbered_run();
                self.heading(*level, text)
            }
            Block::Paragraph { spans } => {
                self.end_numbered_run();
                let w = &mut self.xml;
                start(w, "w:p", &[])?;
                runs(w, spans, false)?;
                end(w, "w:p")
            }
            Block::ListItem { text, kind, indent } => self.list_item(text, *kind, *indent),
            Block::Table { headers, rows } => {
                self.end_numbered_run();
                self.table(headers, rows, palette)
            }
            // Blank lines between items don't restart numbering.
            Block::Spacer => empty(&mut self.xml, "w:p", &[]),
        }
    }

    fn end_numbered_run(&mut self) {
        self.in_numbered_run = false;
    }

    pub fn heading(&mut self, level: u8, text: &str) -> io::Result<()> {
        let w = &mut self.xml;
        start(w, "w:p", &[])?;
        match level {
            1 | 2 => {
                let style = format!("Heading{level}");
                start(w, "w:pPr", &[])?;
                val(w, "w:pStyle", &style)?;
                end(w, "w:pPr")?;
                run(w, &Span::plain(text), false)?;
            }
            // Level 3 has no heading style of its own: a bold line.
            _ => run(w, &Span::bold(text), false)?,
        }
        end(w, "w:p")
    }

    fn list_item(&mut self, text: &str, kind: ListKind, indent: u8) -> io::Result<()> {
        let (num_id, ilvl) = match kind {
            ListKind::Bullet => (BULLET_NUM_ID, indent.min(2)),
            ListKind::Numbered => {
                if !self.in_numbered_run {
                    self.numbered_runs += 1;
                    self.in_numbered_run = true;
                }
                (FIRST_NUMBERED_ID + self.numbered_runs as u32 - 1, 0)
            }
        };
        let (num_id, ilvl) = (num_id.to_string(), ilvl.to_string());

        let w = &mut self.xml;
        start(w, "w:p", &[])?;
        start(w, "w:pPr", &[])?;
        val(w, "w:pStyle", "ListParagraph")?;
        start(w, "w:numPr", &[])?;
        val(w, "w:ilvl", &ilvl)?;
        val(w, "w:numId", &num_id)?;
        end(w, "w:numPr")?;
        end(w, "w:pPr")?;
        runs(w, &split_spans(text), false)?;
        end(w, "w:p")
    }

    fn table(
        &mut self,
        headers: &[String],
        rows: &[Vec<String>],
        palette: &TablePalette,
    ) -> io::Result<()> {
        let columns = column_count(headers, rows).max(1);
        let col_width = (CONTENT_WIDTH_TWIPS / columns as u32).to_string();

        let w = &mut self.xml;
        start(w, "w:tbl", &[])?;
        start(w, "w:tblPr", &[])?;
        empty(w, "w:tblW", &[("w:w", "5000"), ("w:type", "pct")])?;
        start(w, "w:tblBorders", &[])?;
        for side in BORDER_SIDES {
            empty(
                w,
                side,
                &[
                    ("w:val", "single"),
                    ("w:sz", "4"),
                    ("w:space", "0"),
                    ("w:color", "A6A6A6"),
                ],
            )?;
        }
        end(w, "w:tblBorders")?;
        empty(w, "w:tblLayout", &[("w:type", "fixed")])?;
        end(w, "w:tblPr")?;

        start(w, "w:tblGrid", &[])?;
        for _ in 0..columns {
            empty(w, "w:gridCol", &[("w:w", col_width.as_str())])?;
        }
        end(w, "w:tblGrid")?;

        row(w, headers, RowShade::Header, &col_width, palette)?;
        for (i, cells) in rows.iter().enumerate() {
            row(w, cells, shade_for_row(i), &col_width, palette)?;
        }
        end(w, "w:tbl")
    }

    pub fn page_break(&mut self) -> io::Result<()> {
        self.end_numbered_run();
        let w = &mut self.xml;
        start(w, "w:p", &[])?;
        start(w, "w:r", &[])?;
        empty(w, "w:br", &[("w:type", "page")])?;
        end(w, "w:r")?;
        end(w, "w:p")
    }

    pub fn caption(&mut self, text: &str) -> io::Result<()> {
        let w = &mut self.xml;
        start(w, "w:p", &[])?;
        start(w, "w:pPr", &[])?;
        val(w, "w:pStyle", "Caption")?;
        end(w, "w:pPr")?;
        run(w, &Span::plain(text), false)?;
        end(w, "w:p")
    }

    /// Inline picture referencing relationship `rel_id`.
    pub fn picture(
        &mut self,
        rel_id: &str,
        name: &str,
        width_px: u32,
        height_px: u32,
    ) -> io::Result<()> {
        let (cx, cy) = picture_extent(width_px, height_px);
        let (cx, cy) = (cx.to_string(), cy.to_string());
        let id = self.next_drawing_id.to_string();
        self.next_drawing_id += 1;
        let label = format!("Picture {id}");
        let extent = [("cx", cx.as_str()), ("cy", cy.as_str())];

        let w = &mut self.xml;
        start(w, "w:p", &[])?;
        start(w, "w:pPr", &[])?;
        val(w, "w:jc", "center")?;
        end(w, "w:pPr")?;
        start(w, "w:r", &[])?;
        start(w, "w:drawing", &[])?;
        start(
            w,
            "wp:inline",
            &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")],
        )?;
        empty(w, "wp:extent", &extent)?;
        empty(
            w,
            "wp:docPr",
            &[("id", id.as_str()), ("name", label.as_str()), ("descr", name)],
        )?;
        start(w, "wp:cNvGraphicFramePr", &[])?;
        empty(w, "a:graphicFrameLocks", &[("noChangeAspect", "1")])?;
        end(w, "wp:cNvGraphicFramePr")?;

        start(w, "a:graphic", &[])?;
        start(w, "a:graphicData", &[("uri", NS_PIC)])?;
        start(w, "pic:pic", &[])?;

        start(w, "pic:nvPicPr", &[])?;
        empty(w, "pic:cNvPr", &[("id", id.as_str()), ("name", name)])?;
        empty(w, "pic:cNvPicPr", &[])?;
        end(w, "pic:nvPicPr")?;

        start(w, "pic:blipFill", &[])?;
        empty(w, "a:blip", &[("r:embed", rel_id)])?;
        start(w, "a:stretch", &[])?;
        empty(w, "a:fillRect", &[])?;
        end(w, "a:stretch")?;
        end(w, "pic:blipFill")?;

        start(w, "pic:spPr", &[])?;
        start(w, "a:xfrm", &[])?;
        empty(w, "a:off", &[("x", "0"), ("y", "0")])?;
        empty(w, "a:ext", &extent)?;
        end(w, "a:xfrm")?;
        start(w, "a:prstGeom", &[("prst", "rect")])?;
        empty(w, "a:avLst", &[])?;
        end(w, "a:prstGeom")?;
        end(w, "pic:spPr")?;

        end(w, "pic:pic")?;
        end(w, "a:graphicData")?;
        end(w, "a:graphic")?;
        end(w, "wp:inline")?;
        end(w, "w:drawing")?;
        end(w, "w:r")?;
        end(w, "w:p")
    }
}

fn row(
    w: &mut XmlWriter,
    cells: &[String],
    shade: RowShade,
    col_width: &str,
    palette: &TablePalette,
) -> io::Result<()> {
    let header = shade == RowShade::Header;
    start(w, "w:tr", &[])?;
    if header {
        start(w, "w:trPr", &[])?;
        empty(w, "w:tblHeader", &[])?;
        end(w, "w:trPr")?;
    }
    let fill = palette.fill(shade);
    // A row needs at least one cell to be valid.
    let placeholder = [String::new()];
    let cells = if cells.is_empty() { &placeholder[..] } else { cells };
    for cell in cells {
        start(w, "w:tc", &[])?;
        start(w, "w:tcPr", &[])?;
        empty(w, "w:tcW", &[("w:w", col_width), ("w:type", "dxa")])?;
        empty(
            w,
            "w:shd",
            &[("w:val", "clear"), ("w:color", "auto"), ("w:fill", fill)],
        )?;
        end(w, "w:tcPr")?;
        start(w, "w:p", &[])?;
        if header {
            start(w, "w:pPr", &[])?;
            val(w, "w:jc", "center")?;
            end(w, "w:pPr")?;
        }
        runs(w, &split_spans(cell), header)?;
        end(w, "w:p")?;
        end(w, "w:tc")?;
    }
    end(w, "w:tr")
}

fn runs(w: &mut XmlWriter, spans: &[Span], force_bold: bool) -> io::Result<()> {
    for span in spans {
        run(w, span, force_bold)?;
    }
    Ok(())
}

fn run(w: &mut XmlWriter, span: &Span, force_bold: bool) -> io::Result<()> {
    if span.text.is_empty() {
        return Ok(());
    }
    start(w, "w:r", &[])?;
    let bold = span.bold || force_bold;
    if bold || span.underline {
        start(w, "w:rPr", &[])?;
        if bold {
            empty(w, "w:b", &[])?;
        }
        if span.underline {
            val(w, "w:u", "single")?;
        }
        end(w, "w:rPr")?;
    }
    text_element(w, "w:t", &[("xml:space", "preserve")], &span.text)?;
    end(w, "w:r")
}

/// Picture size in EMU: natural size at 96 dpi, shrunk to fit the content
/// area with the aspect ratio kept. Never enlarged.
pub fn picture_extent(width_px: u32, height_px: u32) -> (u64, u64) {
    let natural_w = (width_px.max(1) as u64) * EMU_PER_PIXEL;
    let natural_h = (height_px.max(1) as u64) * EMU_PER_PIXEL;
    let max_w = CONTENT_WIDTH_TWIPS as u64 * EMU_PER_TWIP;
    let max_h = CONTENT_HEIGHT_TWIPS as u64 * EMU_PER_TWIP;

    let scale = (max_w as f64 / natural_w as f64)
        .min(max_h as f64 / natural_h as f64)
        .min(1.0);
    let cx = ((natural_w as f64 * scale).round() as u64).max(1);
    let cy = ((natural_h as f64 * scale).round() as u64).max(1);
    (cx, cy)
}
