//! Document assembly: `Block` list → `.docx` bytes.
//!
//! A `.docx` file is a zip of XML parts. Only the handful of parts Word and
//! LibreOffice actually require are written:
//!
//! ```text
//! [Content_Types].xml
//! _rels/.rels
//! docProps/core.xml          title, author
//! docProps/app.xml
//! word/document.xml          the body, built by BodyWriter
//! word/styles.xml            body font, Heading1/2, Caption
//! word/numbering.xml         bullets + one restarting decimal list per run
//! word/_rels/document.xml.rels
//! word/media/imageN.ext      appendix photographs
//! ```
//!
//! Output is deterministic: the same blocks, style and images always give
//! the same bytes (no timestamps in the properties or the zip entries).

mod body;
mod parts;
mod xml;

pub use body::picture_extent;

use crate::config::DocumentStyle;
use crate::error::ReportError;
use crate::markdown::Block;
use crate::pipeline::input::SourceImage;
use body::BodyWriter;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// A photograph placed in the document appendix.
#[derive(Debug, Clone)]
pub struct AppendixImage {
    /// Shown above the picture.
    pub caption: String,
    pub bytes: Vec<u8>,
    /// File extension used for the media part (`png`, `jpg`, …).
    pub extension: String,
    pub width: u32,
    pub height: u32,
}

impl From<&SourceImage> for AppendixImage {
    fn from(image: &SourceImage) -> Self {
        Self {
            caption: format!("Photo {}: {}", image.image_num, image.file_name),
            bytes: image.bytes.clone(),
            extension: image.extension().to_string(),
            width: image.width,
            height: image.height,
        }
    }
}

/// Render blocks (and, if `style.include_appendix`, the images) into a
/// `.docx` package held in memory.
pub fn render_docx(
    blocks: &[Block],
    style: &DocumentStyle,
    appendix: &[AppendixImage],
) -> Result<Vec<u8>, ReportError> {
    let mut body = BodyWriter::new().map_err(xml_failed)?;
    for block in blocks {
        body.block(block, &style.palette).map_err(xml_failed)?;
    }

    // (relationship id, target) per media part; rId1/rId2 are styles/numbering.
    let mut media: Vec<(String, String)> = Vec::new();
    let mut media_parts: Vec<(String, &[u8])> = Vec::new();
    if style.include_appendix && !appendix.is_empty() {
        body.page_break().map_err(xml_failed)?;
        body.heading(1, "Appendix").map_err(xml_failed)?;
        for (i, image) in appendix.iter().enumerate() {
            let n = i + 1;
            let rel_id = format!("rId{}", n + 2);
            let target = format!("media/image{n}.{}", image.extension);
            body.caption(&image.caption).map_err(xml_failed)?;
            body.picture(&rel_id, &image.caption, image.width, image.height)
                .map_err(xml_failed)?;
            media_parts.push((format!("word/{target}"), image.bytes.as_slice()));
            media.push((rel_id, target));
        }
    }

    let numbered_runs = body.numbered_runs();
    let document = body.finish().map_err(xml_failed)?;

    let xml_parts: [(&str, Vec<u8>); 8] = [
        ("[Content_Types].xml", parts::content_types().map_err(xml_failed)?),
        ("_rels/.rels", parts::package_rels().map_err(xml_failed)?),
        ("docProps/core.xml", parts::core_properties(style).map_err(xml_failed)?),
        ("docProps/app.xml", parts::app_properties().map_err(xml_failed)?),
        ("word/document.xml", document),
        ("word/styles.xml", parts::styles(style).map_err(xml_failed)?),
        ("word/numbering.xml", parts::numbering(numbered_runs).map_err(xml_failed)?),
        ("word/_rels/document.xml.rels", parts::document_rels(&media).map_err(xml_failed)?),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in &xml_parts {
        add_part(&mut zip, name, bytes, part_options(CompressionMethod::Deflated))?;
    }
    // Already-compressed image formats gain nothing from deflate.
    for (name, bytes) in &media_parts {
        add_part(&mut zip, name, bytes, part_options(CompressionMethod::Stored))?;
    }

    let bytes = zip.finish()?.into_inner();
    debug!(
        blocks = blocks.len(),
        images = media_parts.len(),
        numbered_runs,
        bytes = bytes.len(),
        "Rendered docx"
    );
    Ok(bytes)
}

fn xml_failed(e: std::io::Error) -> ReportError {
    ReportError::Document(format!("writing XML: {e}"))
}

/// Fixed timestamp so identical input gives identical bytes.
fn part_options(method: CompressionMethod) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(method)
        .last_modified_time(DateTime::default())
}

fn add_part<W: Write + std::io::Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    bytes: &[u8],
    options: SimpleFileOptions,
) -> Result<(), ReportError> {
    zip.start_file(name, options)?;
    zip.write_all(bytes)
        .map_err(|e| ReportError::Document(format!("writing {name}: {e}")))
}
