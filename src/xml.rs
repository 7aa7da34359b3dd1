//! A small owned DOM over `quick-xml` events.
//!
//! Namespace prefixes are dropped: elements and attributes are stored under
//! their local names. Comments, processing instructions and the XML
//! declaration are skipped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::TextMetalError;

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    /// `line` is where the first non-blank character sits.
    Text { text: String, line: usize },
    CData { text: String, line: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    /// 1-based line of the start tag.
    pub line: usize,
}

impl XmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Concatenated text and CDATA of the direct children.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                XmlNode::Text { text, .. } | XmlNode::CData { text, .. } => out.push_str(text),
                XmlNode::Element(_) => {}
            }
        }
        out
    }
}

/// Parse a complete document and return its root element.
pub fn parse_document(source: &str) -> Result<XmlElement, TextMetalError> {
    let mut reader = Reader::from_str(source);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut line = 1usize;
    let mut counted_to = 0usize;

    loop {
        let start = reader.buffer_position() as usize;
        line += count_newlines(source, counted_to, start);
        counted_to = start.max(counted_to);

        let event = reader.read_event().map_err(|e| {
            TextMetalError::Xml(format!("line {line}: {e}"))
        })?;

        match event {
            Event::Start(tag) => {
                let element = element_from_tag(&tag, line)?;
                stack.push(element);
            }
            Event::Empty(tag) => {
                let element = element_from_tag(&tag, line)?;
                attach(&mut stack, &mut root, XmlNode::Element(element), line)?;
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(TextMetalError::Xml(format!("line {line}: unexpected end tag")));
                };
                attach(&mut stack, &mut root, XmlNode::Element(element), line)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| TextMetalError::Xml(format!("line {line}: {e}")))?;
                if let Some(parent) = stack.last_mut() {
                    push_text(parent, &text, false, line);
                } else if !text.trim().is_empty() {
                    return Err(TextMetalError::Xml(format!(
                        "line {line}: text outside the root element"
                    )));
                }
            }
            Event::CData(data) => {
                let text = String::from_utf8(data.into_inner().into_owned())
                    .map_err(|e| TextMetalError::Xml(format!("line {line}: {e}")))?;
                match stack.last_mut() {
                    Some(parent) => push_text(parent, &text, true, line),
                    None => {
                        return Err(TextMetalError::Xml(format!(
                            "line {line}: CDATA outside the root element"
                        )))
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(TextMetalError::Xml(format!(
            "unclosed element <{}> opened at line {}",
            open.name, open.line
        )));
    }
    root.ok_or_else(|| TextMetalError::Xml("document has no root element".to_string()))
}

fn count_newlines(source: &str, from: usize, to: usize) -> usize {
    if to <= from {
        return 0;
    }
    source.as_bytes()[from..to.min(source.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
}

fn element_from_tag(tag: &BytesStart<'_>, line: usize) -> Result<XmlElement, TextMetalError> {
    let name = utf8(tag.local_name().as_ref(), line)?;
    let mut attributes = Vec::new();
    for attr in tag.attributes() {
        let attr = attr.map_err(|e| TextMetalError::Xml(format!("line {line}: {e}")))?;
        let key = utf8(attr.key.local_name().as_ref(), line)?;
        let value = attr
            .unescape_value()
            .map_err(|e| TextMetalError::Xml(format!("line {line}: {e}")))?;
        attributes.push((key, value.into_owned()));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
        line,
    })
}

fn utf8(bytes: &[u8], line: usize) -> Result<String, TextMetalError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| TextMetalError::Xml(format!("line {line}: {e}")))
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    node: XmlNode,
    line: usize,
) -> Result<(), TextMetalError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    match (node, root.is_some()) {
        (XmlNode::Element(element), false) => {
            *root = Some(element);
            Ok(())
        }
        _ => Err(TextMetalError::Xml(format!(
            "line {line}: more than one root element"
        ))),
    }
}

/// Adjacent text runs are merged; CDATA stays a separate node.
fn push_text(parent: &mut XmlElement, text: &str, cdata: bool, line: usize) {
    let leading = &text[..text.len() - text.trim_start().len()];
    let line = line + leading.matches('\n').count();
    if cdata {
        parent.children.push(XmlNode::CData {
            text: text.to_string(),
            line,
        });
        return;
    }
    if let Some(XmlNode::Text {
        text: prev,
        line: prev_line,
    }) = parent.children.last_mut()
    {
        if prev.trim().is_empty() {
            *prev_line = line;
        }
        prev.push_str(text);
    } else {
        parent.children.push(XmlNode::Text {
            text: text.to_string(),
            line,
        });
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_parse_nested_document() {
        let doc = parse_document(indoc! {r#"
            <?xml version="1.0"?>
            <!-- generated -->
            <tm:Template xmlns:tm="urn:textmetal" tm:name="demo">
              <Write text="a &amp; b"/>
              <Text>hello <![CDATA[<raw>]]></Text>
            </tm:Template>
        "#})
        .unwrap();

        assert_eq!(doc.name, "Template");
        assert_eq!(doc.attr("name"), Some("demo"));
        assert_eq!(doc.line, 3);

        let children: Vec<&XmlElement> = doc.elements().collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].attr("text"), Some("a & b"));
        assert_eq!(children[0].line, 4);
        assert_eq!(children[1].line, 5);
        assert_eq!(
            children[1].children,
            vec![
                XmlNode::Text {
                    text: "hello ".to_string(),
                    line: 5
                },
                XmlNode::CData {
                    text: "<raw>".to_string(),
                    line: 5
                }
            ]
        );
        assert_eq!(children[1].text(), "hello <raw>");
    }

    #[test]
    fn test_text_lines() {
        let doc = parse_document("<a>\n\n  two\n<b/>\nfour <!-- c -->\n  five</a>").unwrap();
        let lines: Vec<usize> = doc
            .children
            .iter()
            .filter_map(|c| match c {
                XmlNode::Text { line, .. } => Some(*line),
                _ => None,
            })
            .collect();
        assert_eq!(lines, [3, 5]);
    }

    #[test]
    fn test_mismatched_end_tag() {
        let err = parse_document("<a><b></a>").unwrap_err();
        assert!(matches!(err, TextMetalError::Xml(_)));
    }

    #[test]
    fn test_unclosed_element() {
        let err = parse_document("<a><b></b>").unwrap_err();
        assert!(matches!(err, TextMetalError::Xml(_)));
    }

    #[test]
    fn test_two_roots() {
        assert!(parse_document("<a/><b/>").is_err());
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_document("   ").is_err());
    }
}
