//! quick-xml reader producing an [`XmlNode`] tree.

#![allow(clippy::unused_self)] // Unit struct methods have &self for API consistency

use std::io::BufRead;

use figcap_core::ExtractError;
use quick_xml::errors::IllFormedError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::tree::XmlNode;

/// Parse JATS XML into an element tree.
#[derive(Debug, Clone, Copy)]
pub struct JatsParser;

impl JatsParser {
    /// Create a new parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse a document into a synthetic root node holding the top-level
    /// element(s).
    ///
    /// Entity and character references are decoded, CDATA is kept as text,
    /// and comments, processing instructions and the doctype are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error for mismatched or missing end tags, malformed syntax,
    /// or text that cannot be decoded.
    pub fn parse(&self, body: &[u8]) -> Result<XmlNode, ExtractError> {
        let mut reader = Reader::from_reader(body);
        reader.config_mut().trim_text(false);
        self.parse_document(&mut reader)
    }

    fn parse_document<R: BufRead>(&self, reader: &mut Reader<R>) -> Result<XmlNode, ExtractError> {
        let mut buf = Vec::new();
        // Open elements, outermost first; the bottom entry is the document.
        let mut stack = vec![XmlNode::default()];

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let node = self.start_node(reader, &e);
                    stack.push(node);
                }
                Event::Empty(e) => {
                    let node = self.start_node(reader, &e);
                    top(&mut stack).children.push(node);
                }
                Event::End(_) => {
                    // The reader verifies end names, so this pops the matching element.
                    if stack.len() > 1
                        && let Some(node) = stack.pop()
                    {
                        top(&mut stack).children.push(node);
                    }
                }
                Event::Text(e) => {
                    let text = reader.decoder().decode(&e)?;
                    append_text(top(&mut stack), &text);
                }
                Event::GeneralRef(e) => {
                    let entity = reader.decoder().decode(&e)?;
                    append_text(top(&mut stack), &decode_entity(&entity));
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e);
                    append_text(top(&mut stack), &text);
                }
                Event::Eof => break,
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            }
            buf.clear();
        }

        if stack.len() > 1
            && let Some(open) = stack.pop()
        {
            return Err(quick_xml::Error::IllFormed(IllFormedError::MissingEndTag(open.tag)).into());
        }
        Ok(stack.pop().unwrap_or_default())
    }

    fn start_node<R: BufRead>(&self, reader: &Reader<R>, e: &BytesStart) -> XmlNode {
        XmlNode {
            tag: self.decode_name(reader, e.name().as_ref()),
            attrs: self.decode_attrs(reader, e),
            ..XmlNode::default()
        }
    }

    fn decode_name<R: BufRead>(&self, reader: &Reader<R>, name: &[u8]) -> String {
        reader.decoder().decode(name).map_or_else(
            |_| String::from_utf8_lossy(name).into_owned(),
            std::borrow::Cow::into_owned,
        )
    }

    fn decode_attrs<R: BufRead>(&self, reader: &Reader<R>, e: &BytesStart) -> Vec<(String, String)> {
        let mut attrs = Vec::new();
        for attr in e.attributes().flatten() {
            let key = self.decode_name(reader, attr.key.as_ref());

            // Namespace declarations are not attributes of the element.
            if key == "xmlns" || key.starts_with("xmlns:") {
                continue;
            }

            let value = attr.unescape_value().map_or_else(
                |_| String::from_utf8_lossy(&attr.value).into_owned(),
                std::borrow::Cow::into_owned,
            );

            attrs.push((key, value));
        }
        attrs
    }
}

impl Default for JatsParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Innermost open element. The document entry is never popped, so the stack
/// is non-empty.
fn top(stack: &mut [XmlNode]) -> &mut XmlNode {
    let last = stack.len() - 1;
    &mut stack[last]
}

/// Append text to node's text or last child's tail.
fn append_text(node: &mut XmlNode, text: &str) {
    if let Some(last_child) = node.children.last_mut() {
        last_child.tail.push_str(text);
    } else {
        node.text.push_str(text);
    }
}

/// Decode XML entity references to their character values.
fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        "nbsp" => "\u{a0}".to_owned(),
        // Numeric character references
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        // Entities from an external DTD are not resolved
        _ => format!("&{entity};"),
    }
}
