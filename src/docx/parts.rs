//! Fixed package parts and the parts that only vary by style.

use super::xml::{empty, end, part, start, text_element, val, XmlWriter};
use crate::config::DocumentStyle;
use std::io;

pub const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

const REL_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_CORE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const REL_APP: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_NUMBERING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Bullet definition, shared by every bulleted item.
pub const BULLET_NUM_ID: u32 = 1;
/// First `w:num` id handed out to numbered runs.
pub const FIRST_NUMBERED_ID: u32 = 2;

const IMAGE_TYPES: [(&str, &str); 5] = [
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
];

const OVERRIDES: [(&str, &str); 5] = [
    (
        "/word/document.xml",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
    ),
    (
        "/word/styles.xml",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
    ),
    (
        "/word/numbering.xml",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml",
    ),
    (
        "/docProps/core.xml",
        "application/vnd.openxmlformats-package.core-properties+xml",
    ),
    (
        "/docProps/app.xml",
        "application/vnd.openxmlformats-officedocument.extended-properties+xml",
    ),
];

pub fn content_types() -> io::Result<Vec<u8>> {
    part(|w| {
        start(w, "Types", &[("xmlns", NS_CONTENT_TYPES)])?;
        let defaults = [
            ("rels", "application/vnd.openxmlformats-package.relationships+xml"),
            ("xml", "application/xml"),
        ];
        for &(ext, ty) in defaults.iter().chain(IMAGE_TYPES.iter()) {
            empty(w, "Default", &[("Extension", ext), ("ContentType", ty)])?;
        }
        for (name, ty) in OVERRIDES {
            empty(w, "Override", &[("PartName", name), ("ContentType", ty)])?;
        }
        end(w, "Types")
    })
}

fn relationship(w: &mut XmlWriter, id: &str, rel_type: &str, target: &str) -> io::Result<()> {
    empty(
        w,
        "Relationship",
        &[("Id", id), ("Type", rel_type), ("Target", target)],
    )
}

pub fn package_rels() -> io::Result<Vec<u8>> {
    part(|w| {
        start(w, "Relationships", &[("xmlns", NS_RELATIONSHIPS)])?;
        relationship(w, "rId1", REL_DOCUMENT, "word/document.xml")?;
        relationship(w, "rId2", REL_CORE, "docProps/core.xml")?;
        relationship(w, "rId3", REL_APP, "docProps/app.xml")?;
        end(w, "Relationships")
    })
}

/// `docProps/core.xml`. No timestamps, so identical input gives identical bytes.
pub fn core_properties(style: &DocumentStyle) -> io::Result<Vec<u8>> {
    part(|w| {
        start(
            w,
            "cp:coreProperties",
            &[
                (
                    "xmlns:cp",
                    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
                ),
                ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
                ("xmlns:dcterms", "http://purl.org/dc/terms/"),
                ("xmlns:dcmitype", "http://purl.org/dc/dcmitype/"),
                ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
            ],
        )?;
        if let Some(title) = &style.title {
            text_element(w, "dc:title", &[], title)?;
        }
        if let Some(author) = &style.author {
            text_element(w, "dc:creator", &[], author)?;
        }
        end(w, "cp:coreProperties")
    })
}

pub fn app_properties() -> io::Result<Vec<u8>> {
    part(|w| {
        start(
            w,
            "Properties",
            &[(
                "xmlns",
                "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
            )],
        )?;
        text_element(
            w,
            "Application",
            &[],
            concat!("promo-report ", env!("CARGO_PKG_VERSION")),
        )?;
        end(w, "Properties")
    })
}

/// `word/_rels/document.xml.rels`: styles, numbering, then one entry per
/// media file as `(relationship id, target)`.
pub fn document_rels(media: &[(String, String)]) -> io::Result<Vec<u8>> {
    part(|w| {
        start(w, "Relationships", &[("xmlns", NS_RELATIONSHIPS)])?;
        relationship(w, "rId1", REL_STYLES, "styles.xml")?;
        relationship(w, "rId2", REL_NUMBERING, "numbering.xml")?;
        for (id, target) in media {
            relationship(w, id, REL_IMAGE, target)?;
        }
        end(w, "Relationships")
    })
}

/// `<w:sz>` and `<w:szCs>` in half-points.
fn font_size(w: &mut XmlWriter, half_points: u32) -> io::Result<()> {
    let size = half_points.to_string();
    val(w, "w:sz", &size)?;
    val(w, "w:szCs", &size)
}

/// Opening of a paragraph style; the caller writes pPr/rPr and closes it.
fn paragraph_style(w: &mut XmlWriter, id: &str, name: &str) -> io::Result<()> {
    start(w, "w:style", &[("w:type", "paragraph"), ("w:styleId", id)])?;
    val(w, "w:name", name)?;
    val(w, "w:basedOn", "Normal")?;
    val(w, "w:next", "Normal")?;
    empty(w, "w:qFormat", &[])
}

fn heading_style(
    w: &mut XmlWriter,
    level: u8,
    before: &str,
    after: &str,
    color: &str,
    half_points: u32,
) -> io::Result<()> {
    paragraph_style(w, &format!("Heading{level}"), &format!("heading {level}"))?;
    start(w, "w:pPr", &[])?;
    empty(w, "w:keepNext", &[])?;
    empty(w, "w:spacing", &[("w:before", before), ("w:after", after)])?;
    let outline = (level - 1).to_string();
    val(w, "w:outlineLvl", outline.as_str())?;
    end(w, "w:pPr")?;
    start(w, "w:rPr", &[])?;
    empty(w, "w:b", &[])?;
    val(w, "w:color", color)?;
    font_size(w, half_points)?;
    end(w, "w:rPr")?;
    end(w, "w:style")
}

/// `word/styles.xml` with the body font from `style`.
pub fn styles(style: &DocumentStyle) -> io::Result<Vec<u8>> {
    let font = style.font.as_str();
    // Sizes are in half-points.
    let body = style.font_size_pt * 2;

    part(|w| {
        start(w, "w:styles", &[("xmlns:w", NS_W)])?;

        start(w, "w:docDefaults", &[])?;
        start(w, "w:rPrDefault", &[])?;
        start(w, "w:rPr", &[])?;
        empty(
            w,
            "w:rFonts",
            &[
                ("w:ascii", font),
                ("w:hAnsi", font),
                ("w:eastAsia", font),
                ("w:cs", font),
            ],
        )?;
        font_size(w, body)?;
        val(w, "w:lang", "en-GB")?;
        end(w, "w:rPr")?;
        end(w, "w:rPrDefault")?;
        start(w, "w:pPrDefault", &[])?;
        start(w, "w:pPr", &[])?;
        empty(
            w,
            "w:spacing",
            &[("w:after", "120"), ("w:line", "264"), ("w:lineRule", "auto")],
        )?;
        end(w, "w:pPr")?;
        end(w, "w:pPrDefault")?;
        end(w, "w:docDefaults")?;

        start(
            w,
            "w:style",
            &[("w:type", "paragraph"), ("w:default", "1"), ("w:styleId", "Normal")],
        )?;
        val(w, "w:name", "Normal")?;
        empty(w, "w:qFormat", &[])?;
        end(w, "w:style")?;

        heading_style(w, 1, "360", "120", "1F3864", body + 12)?;
        heading_style(w, 2, "240", "80", "2F5496", body + 6)?;

        start(
            w,
            "w:style",
            &[("w:type", "paragraph"), ("w:styleId", "ListParagraph")],
        )?;
        val(w, "w:name", "List Paragraph")?;
        val(w, "w:basedOn", "Normal")?;
        empty(w, "w:qFormat", &[])?;
        start(w, "w:pPr", &[])?;
        empty(w, "w:spacing", &[("w:after", "60")])?;
        empty(w, "w:contextualSpacing", &[])?;
        end(w, "w:pPr")?;
        end(w, "w:style")?;

        paragraph_style(w, "Caption", "caption")?;
        start(w, "w:pPr", &[])?;
        empty(w, "w:keepNext", &[])?;
        empty(w, "w:spacing", &[("w:before", "240"), ("w:after", "60")])?;
        end(w, "w:pPr")?;
        start(w, "w:rPr", &[])?;
        empty(w, "w:i", &[])?;
        val(w, "w:color", "44546A")?;
        end(w, "w:rPr")?;
        end(w, "w:style")?;

        start(
            w,
            "w:style",
            &[("w:type", "table"), ("w:default", "1"), ("w:styleId", "TableNormal")],
        )?;
        val(w, "w:name", "Normal Table")?;
        start(w, "w:tblPr", &[])?;
        empty(w, "w:tblInd", &[("w:w", "0"), ("w:type", "dxa")])?;
        start(w, "w:tblCellMar", &[])?;
        for (side, width) in [("w:top", "0"), ("w:left", "108"), ("w:bottom", "0"), ("w:right", "108")] {
            empty(w, side, &[("w:w", width), ("w:type", "dxa")])?;
        }
        end(w, "w:tblCellMar")?;
        end(w, "w:tblPr")?;
        end(w, "w:style")?;

        end(w, "w:styles")
    })
}

fn level(
    w: &mut XmlWriter,
    ilvl: usize,
    format: &str,
    text: &str,
    left: usize,
) -> io::Result<()> {
    let ilvl = ilvl.to_string();
    let left = left.to_string();
    start(w, "w:lvl", &[("w:ilvl", ilvl.as_str())])?;
    val(w, "w:start", "1")?;
    val(w, "w:numFmt", format)?;
    val(w, "w:lvlText", text)?;
    val(w, "w:lvlJc", "left")?;
    start(w, "w:pPr", &[])?;
    empty(
        w,
        "w:ind",
        &[("w:left", left.as_str()), ("w:hanging", "360")],
    )?;
    end(w, "w:pPr")?;
    end(w, "w:lvl")
}

/// `word/numbering.xml`: one bullet definition with three levels, one
/// decimal definition, and a restarting `w:num` per numbered run.
pub fn numbering(numbered_runs: usize) -> io::Result<Vec<u8>> {
    part(|w| {
        start(w, "w:numbering", &[("xmlns:w", NS_W)])?;

        start(w, "w:abstractNum", &[("w:abstractNumId", "0")])?;
        val(w, "w:multiLevelType", "hybridMultilevel")?;
        for (ilvl, glyph) in ["\u{2022}", "\u{25E6}", "\u{25AA}"].iter().enumerate() {
            level(w, ilvl, "bullet", glyph, 720 * (ilvl + 1))?;
        }
        end(w, "w:abstractNum")?;

        start(w, "w:abstractNum", &[("w:abstractNumId", "1")])?;
        val(w, "w:multiLevelType", "singleLevel")?;
        level(w, 0, "decimal", "%1.", 720)?;
        end(w, "w:abstractNum")?;

        // Every w:num must follow the last w:abstractNum.
        let bullet_id = BULLET_NUM_ID.to_string();
        start(w, "w:num", &[("w:numId", bullet_id.as_str())])?;
        val(w, "w:abstractNumId", "0")?;
        end(w, "w:num")?;
        for offset in 0..numbered_runs {
            let id = (FIRST_NUMBERED_ID as usize + offset).to_string();
            start(w, "w:num", &[("w:numId", id.as_str())])?;
            val(w, "w:abstractNumId", "1")?;
            start(w, "w:lvlOverride", &[("w:ilvl", "0")])?;
            val(w, "w:startOverride", "1")?;
            end(w, "w:lvlOverride")?;
            end(w, "w:num")?;
        }

        end(w, "w:numbering")
    })
}

/// A4 portrait with 2.54 cm margins.
pub fn section_properties(w: &mut XmlWriter) -> io::Result<()> {
    let width = PAGE_WIDTH_TWIPS.to_string();
    let height = PAGE_HEIGHT_TWIPS.to_string();
    let margin = MARGIN_TWIPS.to_string();
    let margin = margin.as_str();
    start(w, "w:sectPr", &[])?;
    empty(
        w,
        "w:pgSz",
        &[("w:w", width.as_str()), ("w:h", height.as_str())],
    )?;
    empty(
        w,
        "w:pgMar",
        &[
            ("w:top", margin),
            ("w:right", margin),
            ("w:bottom", margin),
            ("w:left", margin),
            ("w:header", "708"),
            ("w:footer", "708"),
            ("w:gutter", "0"),
        ],
    )?;
    end(w, "w:sectPr")
}

pub const PAGE_WIDTH_TWIPS: u32 = 11_906;
pub const PAGE_HEIGHT_TWIPS: u32 = 16_838;
pub const MARGIN_TWIPS: u32 = 1_440;

/// Usable width between the margins.
pub const CONTENT_WIDTH_TWIPS: u32 = PAGE_WIDTH_TWIPS - 2 * MARGIN_TWIPS;
/// Usable height, less room for the caption above a picture.
pub const CONTENT_HEIGHT_TWIPS: u32 = PAGE_HEIGHT_TWIPS - 2 * MARGIN_TWIPS - 1_440;

pub const EMU_PER_TWIP: u64 = 635;
/// At 96 dpi.
pub const EMU_PER_PIXEL: u64 = 9_525;

#[cfg(test)]
mod tests {
    use super::*;

    fn text(bytes: io::Result<Vec<u8>>) -> String {
        String::from_utf8(bytes.unwrap()).unwrap()
    }

    #[test]
    fn numbering_lists_abstracts_before_instances() {
        let xml = text(numbering(2));
        let last_abstract = xml.rfind("<w:abstractNum ").unwrap();
        let first_num = xml.find("<w:num ").unwrap();
        assert!(last_abstract < first_num);
        assert!(xml.contains(r#"<w:num w:numId="1">"#));
        assert!(xml.contains(r#"<w:num w:numId="2">"#));
        assert!(xml.contains(r#"<w:num w:numId="3">"#));
        assert!(!xml.contains(r#"<w:num w:numId="4">"#));
        assert_eq!(xml.matches("<w:startOverride").count(), 2);
    }

    #[test]
    fn bullet_levels_indent_further() {
        let xml = text(numbering(0));
        assert!(xml.contains(r#"<w:ind w:left="720" w:hanging="360"/>"#));
        assert!(xml.contains(r#"<w:ind w:left="2160" w:hanging="360"/>"#));
        assert!(xml.contains("<w:lvlText w:val=\"\u{25AA}\"/>"));
    }

    #[test]
    fn styles_use_configured_font() {
        let style = DocumentStyle {
            font: "Arial & Co".into(),
            font_size_pt: 10,
            ..Default::default()
        };
        let xml = text(styles(&style));
        assert!(xml.contains(r#"w:ascii="Arial &amp; Co""#));
        assert!(xml.contains(r#"<w:sz w:val="20"/>"#));
        assert!(xml.contains(r#"w:styleId="Heading1""#));
        assert!(xml.contains(r#"w:styleId="Heading2""#));
        // 10 pt body → 16 pt heading 1
        assert!(xml.contains(r#"<w:sz w:val="32"/>"#));
    }

    #[test]
    fn core_properties_escape_title() {
        let style = DocumentStyle {
            title: Some("Q3 <draft>".into()),
            author: Some("Trade team".into()),
            ..Default::default()
        };
        let xml = text(core_properties(&style));
        assert!(xml.contains("<dc:title>Q3 &lt;draft&gt;</dc:title>"));
        assert!(xml.contains("<dc:creator>Trade team</dc:creator>"));
    }

    #[test]
    fn core_properties_without_metadata() {
        let xml = text(core_properties(&DocumentStyle::default()));
        assert!(!xml.contains("dc:title"));
        assert!(xml.ends_with("</cp:coreProperties>"));
    }

    #[test]
    fn document_rels_list_media_after_fixed_parts() {
        let xml = text(document_rels(&[("rId3".into(), "media/image1.png".into())]));
        let numbering = xml.find("numbering.xml").unwrap();
        let image = xml.find(r#"Id="rId3""#).unwrap();
        assert!(numbering < image);
        assert!(xml.contains(r#"Target="media/image1.png""#));
    }

    #[test]
    fn content_types_cover_image_extensions() {
        let xml = text(content_types());
        for (ext, _) in IMAGE_TYPES {
            assert!(xml.contains(&format!(r#"Extension="{ext}""#)));
        }
        assert!(xml.starts_with("<?xml"));
    }
}
