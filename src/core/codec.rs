//! Conversion between the record table and XML text
//!
//! Encoding writes one child element per record under a `<metadata>` root and
//! never fails. Decoding accepts any well-formed document with a single root,
//! turning each direct child of the root into a record. Ids are always
//! renumbered from 1 on decode.

use std::fmt::Write as _;
use std::str;

use quick_xml::escape::{escape, partial_escape, resolve_predefined_entity};
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;

use super::record::Record;

/// XML declaration written at the top of every document
pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Root element wrapping all records
pub const ROOT_TAG: &str = "metadata";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    #[error("utf8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("document has no root element")]
    NoRoot,

    #[error("document has more than one root element")]
    MultipleRoots,

    #[error("text outside of the root element")]
    TextOutsideRoot,

    #[error("closing tag </{0}> has no matching opening tag")]
    UnmatchedEnd(String),

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("unknown entity reference &{0};")]
    UnknownEntity(String),

    #[error("\"{0}\" is not a valid XML name")]
    InvalidName(String),

    #[error("invalid character {0:?}")]
    InvalidChar(char),

    #[error("attribute \"{0}\" contains a raw '<'")]
    LessThanInAttribute(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Render records as an XML document.
pub fn encode(records: &[Record]) -> String {
    let mut xml = String::with_capacity(64 + records.len() * 48);
    xml.push_str(DECLARATION);
    xml.push('\n');
    let _ = writeln!(xml, "<{ROOT_TAG}>");

    for record in records {
        let attrs = if record.attributes.is_empty() {
            String::new()
        } else {
            format!(" {}", record.attributes)
        };
        let _ = writeln!(
            xml,
            "  <{tag}{attrs}>{value}</{tag}>",
            tag = record.tag,
            value = partial_escape(record.value.as_str()),
        );
    }

    let _ = write!(xml, "</{ROOT_TAG}>");
    xml
}

/// Parse an XML document into records, one per direct child of the root.
pub fn decode(xml: &str) -> ParseResult<Vec<Record>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().check_end_names = true;

    let mut records: Vec<Record> = Vec::new();
    // Names of currently open elements, root first
    let mut open: Vec<String> = Vec::new();
    let mut current: Option<Record> = None;
    let mut root_seen = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = element_name(&e)?;
                match open.len() {
                    0 => {
                        enter_root(&mut root_seen)?;
                        check_attributes(&e)?;
                    }
                    1 => {
                        current = Some(Record::new(
                            records.len() as u64 + 1,
                            name.clone(),
                            "",
                            serialize_attributes(&e)?,
                        ));
                    }
                    _ => check_attributes(&e)?,
                }
                open.push(name);
            }
            Event::Empty(e) => {
                let name = element_name(&e)?;
                match open.len() {
                    0 => {
                        enter_root(&mut root_seen)?;
                        check_attributes(&e)?;
                    }
                    1 => {
                        let attributes = serialize_attributes(&e)?;
                        records.push(Record::new(records.len() as u64 + 1, name, "", attributes));
                    }
                    _ => check_attributes(&e)?,
                }
            }
            Event::End(e) => {
                if open.pop().is_none() {
                    let name = str::from_utf8(e.name().as_ref())?.to_string();
                    return Err(ParseError::UnmatchedEnd(name));
                }
                if open.len() == 1 {
                    if let Some(record) = current.take() {
                        records.push(record);
                    }
                }
            }
            Event::Text(t) => {
                let text = t.decode()?;
                push_text(&open, current.as_mut(), &text)?;
            }
            Event::CData(c) => {
                let text = c.decode()?;
                push_text(&open, current.as_mut(), &text)?;
            }
            Event::GeneralRef(r) => {
                let text = resolve_reference(&r)?;
                push_text(&open, current.as_mut(), &text)?;
            }
            Event::Eof => break,
            // Declaration, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(name) = open.pop() {
        return Err(ParseError::Unclosed(name));
    }
    if !root_seen {
        return Err(ParseError::NoRoot);
    }

    tracing::debug!("Decoded {} records", records.len());
    Ok(records)
}

fn enter_root(root_seen: &mut bool) -> ParseResult<()> {
    if *root_seen {
        return Err(ParseError::MultipleRoots);
    }
    *root_seen = true;
    Ok(())
}

/// Append character data to the record being built.
///
/// Whitespace between top-level markup is allowed; any other text outside the
/// root is an error. Text directly inside the root belongs to no record.
fn push_text(open: &[String], current: Option<&mut Record>, text: &str) -> ParseResult<()> {
    if open.is_empty() {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(ParseError::TextOutsideRoot);
    }
    check_chars(text)?;
    if let Some(record) = current {
        record.value.push_str(text);
    }
    Ok(())
}

fn resolve_reference(r: &BytesRef<'_>) -> ParseResult<String> {
    if let Some(ch) = r.resolve_char_ref()? {
        return Ok(ch.to_string());
    }
    let name = r.decode()?;
    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| ParseError::UnknownEntity(name.into_owned()))
}

fn element_name(e: &BytesStart<'_>) -> ParseResult<String> {
    let qname = e.name();
    let name = str::from_utf8(qname.as_ref())?;
    check_name(name)?;
    Ok(name.to_string())
}

fn check_attributes(e: &BytesStart<'_>) -> ParseResult<()> {
    attribute_pairs(e).map(|_| ())
}

/// Re-serialize an element's attributes as `a="1" b="2"` in source order.
fn serialize_attributes(e: &BytesStart<'_>) -> ParseResult<String> {
    let pairs: Vec<String> = attribute_pairs(e)?
        .into_iter()
        .map(|(key, value)| format!("{}=\"{}\"", key, escape(value.as_str())))
        .collect();
    Ok(pairs.join(" "))
}

/// Checked `(key, unescaped value)` pairs of an element's attributes
fn attribute_pairs(e: &BytesStart<'_>) -> ParseResult<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = str::from_utf8(attr.key.as_ref())?;
        check_name(key)?;
        if attr.value.contains(&b'<') {
            return Err(ParseError::LessThanInAttribute(key.to_string()));
        }
        let value = attr.unescape_value()?;
        check_chars(&value)?;
        pairs.push((key.to_string(), value.into_owned()));
    }
    Ok(pairs)
}

fn check_name(name: &str) -> ParseResult<()> {
    let mut chars = name.chars();
    if chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char) {
        Ok(())
    } else {
        Err(ParseError::InvalidName(name.to_string()))
    }
}

fn check_chars(text: &str) -> ParseResult<()> {
    match text.chars().find(|&c| !is_xml_char(c)) {
        Some(c) => Err(ParseError::InvalidChar(c)),
        None => Ok(()),
    }
}

// Character classes from the XML 1.0 `Char`, `NameStartChar` and `NameChar`
// productions

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

fn is_name_start_char(c: char) -> bool {
    matches!(
        c,
        ':' | 'A'..='Z'
            | '_'
            | 'a'..='z'
            | '\u{C0}'..='\u{D6}'
            | '\u{D8}'..='\u{F6}'
            | '\u{F8}'..='\u{2FF}'
            | '\u{370}'..='\u{37D}'
            | '\u{37F}'..='\u{1FFF}'
            | '\u{200C}'..='\u{200D}'
            | '\u{2070}'..='\u{218F}'
            | '\u{2C00}'..='\u{2FEF}'
            | '\u{3001}'..='\u{D7FF}'
            | '\u{F900}'..='\u{FDCF}'
            | '\u{FDF0}'..='\u{FFFD}'
            | '\u{10000}'..='\u{EFFFF}'
    )
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(
            c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}
