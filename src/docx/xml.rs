//! Thin helpers over `quick_xml::Writer` for the WordprocessingML parts.
//!
//! Attribute values and text go through quick-xml's escaping; nothing here
//! formats markup by hand.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io;

pub type XmlWriter = Writer<Vec<u8>>;

/// A fresh writer holding the standalone UTF-8 declaration every part starts with.
pub fn part_writer() -> io::Result<XmlWriter> {
    let mut w = Writer::new(Vec::new());
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(w)
}

/// Build a whole part in one closure.
pub fn part(build: impl FnOnce(&mut XmlWriter) -> io::Result<()>) -> io::Result<Vec<u8>> {
    let mut w = part_writer()?;
    build(&mut w)?;
    Ok(w.into_inner())
}

pub fn start(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
    w.write_event(Event::Start(
        BytesStart::new(name).with_attributes(attrs.iter().copied()),
    ))
}

pub fn end(w: &mut XmlWriter, name: &str) -> io::Result<()> {
    w.write_event(Event::End(BytesEnd::new(name)))
}

/// `<name a="…"/>`
pub fn empty(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
    w.write_event(Event::Empty(
        BytesStart::new(name).with_attributes(attrs.iter().copied()),
    ))
}

/// `<name a="…">text</name>`
pub fn text_element(
    w: &mut XmlWriter,
    name: &str,
    attrs: &[(&str, &str)],
    text: &str,
) -> io::Result<()> {
    start(w, name, attrs)?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    end(w, name)
}

/// Shorthand for the ubiquitous `<name w:val="…"/>`.
pub fn val(w: &mut XmlWriter, name: &str, value: &str) -> io::Result<()> {
    empty(w, name, &[("w:val", value)])
}
