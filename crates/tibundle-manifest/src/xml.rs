//! Owned XML document tree
//!
//! The manifest needs indexed read access plus targeted mutation of specific
//! child elements. Rather than a live DOM with parent back-references, the
//! document is held as a tree of owned nodes; queries walk the tree and
//! mutations rebuild the affected children in place.
//!
//! Attribute values and text content are stored unescaped. Serialization
//! re-escapes, so a parse/serialize round trip preserves content while not
//! guaranteeing byte-identical whitespace inside tags.

use crate::errors::ManifestError;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;

/// One node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
}

/// An element with ordered attributes and ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    /// Written as `<name/>` when true and the element has no children.
    pub self_closing: bool,
}

/// The `<?xml ...?>` declaration, when the source document carried one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDecl {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

/// A parsed document: declaration, root element, and any surrounding
/// document-level nodes (whitespace, comments).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub decl: Option<XmlDecl>,
    pub leading: Vec<XmlNode>,
    pub root: XmlElement,
    pub trailing: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: false,
        }
    }

    /// Value of the named attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set or replace the named attribute, keeping attribute order stable.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(slot) = self.attributes.iter_mut().find(|(key, _)| key == name) {
            slot.1 = value.to_string();
        } else {
            self.attributes.push((name.to_string(), value.to_string()));
        }
    }

    /// Remove the named attribute. Returns whether it was present.
    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|(key, _)| key != name);
        self.attributes.len() != before
    }

    /// Direct child elements, in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Concatenated text content of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                XmlNode::Element(el) => el.collect_text(out),
                XmlNode::Comment(_) => {}
            }
        }
    }
}

impl XmlDocument {
    /// Parse a document from source text.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let mut reader = Reader::from_str(text);

        let mut decl = None;
        let mut leading = Vec::new();
        let mut root: Option<XmlElement> = None;
        let mut trailing = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Decl(d) => decl = Some(parse_decl(&d)),
                Event::Start(start) => stack.push(element_from_start(&start, false)?),
                Event::Empty(start) => {
                    let el = element_from_start(&start, true)?;
                    attach(
                        XmlNode::Element(el),
                        &mut stack,
                        &mut root,
                        &mut leading,
                        &mut trailing,
                    );
                }
                Event::End(_) => {
                    if let Some(el) = stack.pop() {
                        attach(
                            XmlNode::Element(el),
                            &mut stack,
                            &mut root,
                            &mut leading,
                            &mut trailing,
                        );
                    }
                }
                Event::Text(t) => {
                    let text = t.unescape()?.into_owned();
                    attach(
                        XmlNode::Text(text),
                        &mut stack,
                        &mut root,
                        &mut leading,
                        &mut trailing,
                    );
                }
                Event::CData(c) => {
                    let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    attach(
                        XmlNode::CData(text),
                        &mut stack,
                        &mut root,
                        &mut leading,
                        &mut trailing,
                    );
                }
                Event::Comment(c) => {
                    let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    attach(
                        XmlNode::Comment(text),
                        &mut stack,
                        &mut root,
                        &mut leading,
                        &mut trailing,
                    );
                }
                // Processing instructions and doctypes do not occur in app
                // manifests; they are dropped rather than modeled.
                Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        let root = root.ok_or(ManifestError::EmptyDocument)?;
        Ok(Self {
            decl,
            leading,
            root,
            trailing,
        })
    }

    /// Serialize back to document text.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        if let Some(decl) = &self.decl {
            write_decl(&mut out, decl);
        }
        for node in &self.leading {
            write_node(&mut out, node);
        }
        write_element(&mut out, &self.root);
        for node in &self.trailing {
            write_node(&mut out, node);
        }
        out
    }
}

fn parse_decl(decl: &BytesDecl) -> XmlDecl {
    let version = decl
        .version()
        .map(|v| String::from_utf8_lossy(&v).into_owned())
        .unwrap_or_else(|_| "1.0".to_string());
    let encoding = decl
        .encoding()
        .and_then(Result::ok)
        .map(|v| String::from_utf8_lossy(&v).into_owned());
    let standalone = decl
        .standalone()
        .and_then(Result::ok)
        .map(|v| String::from_utf8_lossy(&v).into_owned());
    XmlDecl {
        version,
        encoding,
        standalone,
    }
}

fn element_from_start(start: &BytesStart, self_closing: bool) -> Result<XmlElement, ManifestError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
        self_closing,
    })
}

fn attach(
    node: XmlNode,
    stack: &mut Vec<XmlElement>,
    root: &mut Option<XmlElement>,
    leading: &mut Vec<XmlNode>,
    trailing: &mut Vec<XmlNode>,
) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return;
    }
    match node {
        XmlNode::Element(el) if root.is_none() => *root = Some(el),
        other => {
            if root.is_none() {
                leading.push(other);
            } else {
                trailing.push(other);
            }
        }
    }
}

fn write_decl(out: &mut String, decl: &XmlDecl) {
    out.push_str("<?xml version=\"");
    out.push_str(&decl.version);
    out.push('"');
    if let Some(encoding) = &decl.encoding {
        out.push_str(" encoding=\"");
        out.push_str(encoding);
        out.push('"');
    }
    if let Some(standalone) = &decl.standalone {
        out.push_str(" standalone=\"");
        out.push_str(standalone);
        out.push('"');
    }
    out.push_str("?>");
}

fn write_node(out: &mut String, node: &XmlNode) {
    match node {
        XmlNode::Element(el) => write_element(out, el),
        XmlNode::Text(t) => out.push_str(&escape(t)),
        XmlNode::CData(t) => {
            out.push_str("<![CDATA[");
            out.push_str(t);
            out.push_str("]]>");
        }
        XmlNode::Comment(t) => {
            out.push_str("<!--");
            out.push_str(t);
            out.push_str("-->");
        }
    }
}

fn write_element(out: &mut String, el: &XmlElement) {
    out.push('<');
    out.push_str(&el.name);
    for (key, value) in &el.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value));
        out.push('"');
    }
    if el.children.is_empty() && el.self_closing {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &el.children {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_reserialize_simple() {
        let src = r#"<?xml version="1.0" encoding="UTF-8"?>
<ti:app xmlns:ti="http://ti.appcelerator.org">
    <name>demo</name>
</ti:app>
"#;
        let doc = XmlDocument::parse(src).unwrap();
        assert_eq!(doc.root.name, "ti:app");
        assert_eq!(doc.to_xml(), src);
    }

    #[test]
    fn test_attr_roundtrip_escaping() {
        let src = r#"<root note="a &amp; b"><child>x &lt; y</child></root>"#;
        let doc = XmlDocument::parse(src).unwrap();
        assert_eq!(doc.root.child_elements().count(), 1);
        assert_eq!(doc.root.attr("note"), Some("a & b"));
        assert_eq!(doc.to_xml(), src);
    }

    #[test]
    fn test_self_closing_preserved() {
        let src = "<root><analytics/></root>";
        let doc = XmlDocument::parse(src).unwrap();
        assert_eq!(doc.to_xml(), src);
    }

    #[test]
    fn test_text_is_recursive() {
        let src = "<root>a<inner>b</inner>c</root>";
        let doc = XmlDocument::parse(src).unwrap();
        assert_eq!(doc.root.text(), "abc");
    }

    #[test]
    fn test_missing_root_is_error() {
        assert!(matches!(
            XmlDocument::parse("<?xml version=\"1.0\"?>"),
            Err(ManifestError::EmptyDocument)
        ));
    }

    #[test]
    fn test_malformed_is_parse_error() {
        assert!(matches!(
            XmlDocument::parse("<root><open></root>"),
            Err(ManifestError::Parse(_))
        ));
    }

    #[test]
    fn test_set_and_remove_attr() {
        let mut el = XmlElement::new("plugin");
        el.set_attr("version", "1.0");
        el.set_attr("version", "2.0");
        assert_eq!(el.attr("version"), Some("2.0"));
        assert!(el.remove_attr("version"));
        assert!(!el.remove_attr("version"));
    }
}
