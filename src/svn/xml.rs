//! Parsers for the `--xml` output of `svn info`, `svn list` and `svn proplist`.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};

use super::SvnError;
use crate::types::NodeKind;

/// The first `<entry>` of `svn info --xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoEntry {
    pub kind: NodeKind,
    pub revision: u64,
}

/// One child listed by `svn list --xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub name: String,
    pub kind: NodeKind,
}

fn xml_error(err: impl std::fmt::Display) -> SvnError {
    SvnError::Parse(err.to_string())
}

trait Handler {
    fn start(&mut self, decoder: Decoder, element: &BytesStart<'_>) -> Result<(), SvnError>;
    /// `text` is the character data since the last start tag.
    fn end(&mut self, name: &[u8], text: &str) -> Result<(), SvnError>;
}

fn walk(xml: &str, handler: &mut impl Handler) -> Result<(), SvnError> {
    let mut reader = Reader::from_str(xml);
    let decoder = reader.decoder();
    let mut text = String::new();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                text.clear();
                handler.start(decoder, &e)?;
            }
            Event::Empty(e) => {
                text.clear();
                handler.start(decoder, &e)?;
                handler.end(e.name().as_ref(), "")?;
            }
            Event::Text(t) => text.push_str(&t.decode().map_err(xml_error)?),
            Event::GeneralRef(r) => push_reference(&mut text, &r)?,
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::End(e) => {
                handler.end(e.name().as_ref(), &text)?;
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

fn push_reference(text: &mut String, reference: &BytesRef<'_>) -> Result<(), SvnError> {
    if let Some(ch) = reference.resolve_char_ref().map_err(xml_error)? {
        text.push(ch);
        return Ok(());
    }
    let name = reference.decode().map_err(xml_error)?;
    match resolve_predefined_entity(&name) {
        Some(value) => {
            text.push_str(value);
            Ok(())
        }
        None => Err(SvnError::Parse(format!("unknown entity &{};", name))),
    }
}

fn attribute(
    decoder: Decoder,
    element: &BytesStart<'_>,
    name: &str,
) -> Result<Option<String>, SvnError> {
    match element.try_get_attribute(name).map_err(xml_error)? {
        Some(attr) => Ok(Some(
            attr.decode_and_unescape_value(decoder)
                .map_err(xml_error)?
                .into_owned(),
        )),
        None => Ok(None),
    }
}

fn required_attribute(
    decoder: Decoder,
    element: &BytesStart<'_>,
    name: &str,
) -> Result<String, SvnError> {
    attribute(decoder, element, name)?.ok_or_else(|| {
        SvnError::Parse(format!(
            "<{}> is missing the '{}' attribute",
            String::from_utf8_lossy(element.name().as_ref()),
            name
        ))
    })
}

fn parse_kind(value: &str) -> Result<NodeKind, SvnError> {
    value.parse().map_err(xml_error)
}

#[derive(Default)]
struct InfoHandler {
    entry: Option<InfoEntry>,
    done: bool,
}

impl Handler for InfoHandler {
    fn start(&mut self, decoder: Decoder, element: &BytesStart<'_>) -> Result<(), SvnError> {
        if self.done || element.name().as_ref() != b"entry" {
            return Ok(());
        }
        let kind = parse_kind(&required_attribute(decoder, element, "kind")?)?;
        let revision = required_attribute(decoder, element, "revision")?
            .parse::<u64>()
            .map_err(xml_error)?;
        self.entry = Some(InfoEntry { kind, revision });
        Ok(())
    }

    fn end(&mut self, name: &[u8], _text: &str) -> Result<(), SvnError> {
        if name == b"entry" && self.entry.is_some() {
            self.done = true;
        }
        Ok(())
    }
}

/// Parse the first entry of `svn info --xml`.
pub fn parse_info(xml: &str) -> Result<InfoEntry, SvnError> {
    let mut handler = InfoHandler::default();
    walk(xml, &mut handler)?;
    handler
        .entry
        .ok_or_else(|| SvnError::Parse("svn info returned no entry".to_string()))
}

#[derive(Default)]
struct ListHandler {
    current: Option<ListEntry>,
    entries: Vec<ListEntry>,
}

impl Handler for ListHandler {
    fn start(&mut self, decoder: Decoder, element: &BytesStart<'_>) -> Result<(), SvnError> {
        if element.name().as_ref() == b"entry" {
            let kind = parse_kind(&required_attribute(decoder, element, "kind")?)?;
            self.current = Some(ListEntry {
                name: String::new(),
                kind,
            });
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8], text: &str) -> Result<(), SvnError> {
        match name {
            b"name" => {
                if let Some(entry) = self.current.as_mut() {
                    entry.name = text.to_string();
                }
            }
            b"entry" => {
                // Some servers report the listed directory itself with an
                // empty name.
                if let Some(entry) = self.current.take().filter(|e| !e.name.is_empty()) {
                    self.entries.push(entry);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Parse `svn list --xml` into its entries, in listing order.
pub fn parse_list(xml: &str) -> Result<Vec<ListEntry>, SvnError> {
    let mut handler = ListHandler::default();
    walk(xml, &mut handler)?;
    Ok(handler.entries)
}

#[derive(Default)]
struct PropHandler {
    current: Option<String>,
    properties: BTreeMap<String, String>,
}

impl Handler for PropHandler {
    fn start(&mut self, decoder: Decoder, element: &BytesStart<'_>) -> Result<(), SvnError> {
        if element.name().as_ref() == b"property" {
            let name = required_attribute(decoder, element, "name")?;
            if let Some(encoding) = attribute(decoder, element, "encoding")? {
                log::debug!("property {} is {} encoded; keeping it as is", name, encoding);
            }
            self.current = Some(name);
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8], text: &str) -> Result<(), SvnError> {
        if name == b"property" {
            if let Some(prop) = self.current.take() {
                self.properties.insert(prop, text.to_string());
            }
        }
        Ok(())
    }
}

/// Parse `svn proplist --xml --verbose` into a name → value map.
pub fn parse_proplist(xml: &str) -> Result<BTreeMap<String, String>, SvnError> {
    let mut handler = PropHandler::default();
    walk(xml, &mut handler)?;
    Ok(handler.properties)
}
