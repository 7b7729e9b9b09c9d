//! Generic `Values` document model.
//!
//! # Responsibility
//! - Hold the small wire schema used by the sidecar column: a `Values`
//!   root, one child element per mapped property, and nested `Value`
//!   elements (with optional `Key` attributes) for sequences and maps.
//! - Parse and serialize that shape without knowing any property kinds.
//!
//! # Invariants
//! - Serialization is a single line with no XML declaration.
//! - Parsing accepts any root element name and skips unknown nested
//!   elements; structural errors are hard failures, never masked.

use quick_xml::escape::escape;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub(crate) const ROOT_ELEMENT: &str = "Values";
pub(crate) const VALUE_ELEMENT: &str = "Value";
pub(crate) const KEY_ATTRIBUTE: &str = "Key";

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Structural failure while reading a persisted document.
#[derive(Debug)]
pub enum DocumentError {
    Parse(quick_xml::Error),
    Attribute(AttrError),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "malformed values document: {err}"),
            Self::Attribute(err) => write!(f, "malformed values attribute: {err}"),
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Attribute(err) => Some(err),
        }
    }
}

impl From<quick_xml::Error> for DocumentError {
    fn from(value: quick_xml::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<AttrError> for DocumentError {
    fn from(value: AttrError) -> Self {
        Self::Attribute(value)
    }
}

/// One `Value` child of a sequence or map property element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueItem {
    /// `Key` attribute, present for map entries only.
    pub key: Option<String>,
    pub text: String,
}

impl ValueItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            key: None,
            text: text.into(),
        }
    }

    pub fn keyed(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            text: text.into(),
        }
    }
}

/// One property element under the root.
///
/// Scalar properties carry `text`; sequence and map properties carry
/// `items`. A node holding neither is a present-but-empty element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyNode {
    name: String,
    text: String,
    items: Vec<ValueItem>,
}

impl PropertyNode {
    fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: String::new(),
            items: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn items(&self) -> &[ValueItem] {
        &self.items
    }
}

/// In-memory form of the persisted document.
///
/// Node order is preserved so encode output is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValuesDocument {
    nodes: Vec<PropertyNode>,
}

impl ValuesDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the root has no child elements at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First node with the given name, like the original lookup semantics.
    pub fn node(&self, name: &str) -> Option<&PropertyNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Adds or replaces a scalar property element.
    pub fn set_text(&mut self, name: &str, text: impl Into<String>) {
        let node = self.upsert(name);
        node.text = text.into();
        node.items.clear();
    }

    /// Adds or replaces a sequence/map property element.
    pub fn set_items(&mut self, name: &str, items: Vec<ValueItem>) {
        let node = self.upsert(name);
        node.text.clear();
        node.items = items;
    }

    /// Removes the first property element with the given name, if present.
    pub fn remove(&mut self, name: &str) {
        if let Some(position) = self.nodes.iter().position(|node| node.name == name) {
            self.nodes.remove(position);
        }
    }

    fn upsert(&mut self, name: &str) -> &mut PropertyNode {
        if let Some(position) = self.nodes.iter().position(|node| node.name == name) {
            return &mut self.nodes[position];
        }
        self.nodes.push(PropertyNode::named(name));
        self.nodes.last_mut().expect("node was just pushed")
    }

    /// Serializes to the compact single-line wire form.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        push_open(&mut out, ROOT_ELEMENT);
        for node in &self.nodes {
            push_open(&mut out, &node.name);
            if node.items.is_empty() {
                out.push_str(&escape(&node.text));
            } else {
                for item in &node.items {
                    match &item.key {
                        Some(key) => {
                            out.push('<');
                            out.push_str(VALUE_ELEMENT);
                            out.push(' ');
                            out.push_str(KEY_ATTRIBUTE);
                            out.push_str("=\"");
                            out.push_str(&escape(key));
                            out.push_str("\">");
                        }
                        None => push_open(&mut out, VALUE_ELEMENT),
                    }
                    out.push_str(&escape(&item.text));
                    push_close(&mut out, VALUE_ELEMENT);
                }
            }
            push_close(&mut out, &node.name);
        }
        push_close(&mut out, ROOT_ELEMENT);
        out
    }

    /// Parses the persisted wire form.
    ///
    /// # Errors
    /// - Returns `DocumentError` for structurally invalid XML; malformed
    ///   *values* inside a well-formed document are the codec's concern,
    ///   not a parse failure.
    pub fn parse(text: &str) -> DocumentResult<Self> {
        let mut reader = Reader::from_reader(text.as_bytes());
        let mut buf = Vec::new();
        let mut document = ValuesDocument::new();
        let mut root_open = false;
        let mut property: Option<PropertyNode> = None;
        let mut item: Option<ValueItem> = None;
        let mut skip_depth = 0usize;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(element) => {
                    if skip_depth > 0 {
                        skip_depth += 1;
                    } else if !root_open {
                        root_open = true;
                    } else if property.is_none() {
                        property = Some(PropertyNode::named(element_name(&element)));
                    } else if item.is_none() && element.name().as_ref() == VALUE_ELEMENT.as_bytes()
                    {
                        item = Some(ValueItem {
                            key: key_attribute(&element)?,
                            text: String::new(),
                        });
                    } else {
                        skip_depth = 1;
                    }
                }
                Event::Empty(element) => {
                    if skip_depth == 0 {
                        if !root_open {
                            root_open = true;
                        } else if property.is_none() {
                            document.nodes.push(PropertyNode::named(element_name(&element)));
                        } else if item.is_none()
                            && element.name().as_ref() == VALUE_ELEMENT.as_bytes()
                        {
                            if let Some(open) = property.as_mut() {
                                open.items.push(ValueItem {
                                    key: key_attribute(&element)?,
                                    text: String::new(),
                                });
                            }
                        }
                    }
                }
                Event::Text(text_event) => {
                    if skip_depth == 0 {
                        let chunk = text_event.unescape()?;
                        append_text(property.as_mut(), item.as_mut(), &chunk);
                    }
                }
                Event::CData(data) => {
                    if skip_depth == 0 {
                        let chunk = String::from_utf8_lossy(&data).into_owned();
                        append_text(property.as_mut(), item.as_mut(), &chunk);
                    }
                }
                Event::End(_) => {
                    if skip_depth > 0 {
                        skip_depth -= 1;
                    } else if let Some(finished) = item.take() {
                        if let Some(open) = property.as_mut() {
                            open.items.push(finished);
                        }
                    } else if let Some(finished) = property.take() {
                        document.nodes.push(finished);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(document)
    }
}

fn push_open(out: &mut String, name: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
}

fn push_close(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn element_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}

fn key_attribute(element: &BytesStart<'_>) -> DocumentResult<Option<String>> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == KEY_ATTRIBUTE.as_bytes() {
            let value = attr.unescape_value()?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn append_text(property: Option<&mut PropertyNode>, item: Option<&mut ValueItem>, chunk: &str) {
    if let Some(open) = item {
        open.text.push_str(chunk);
    } else if let Some(open) = property {
        open.text.push_str(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::{ValueItem, ValuesDocument};

    #[test]
    fn empty_document_serializes_to_bare_root() {
        let document = ValuesDocument::new();
        assert!(document.is_empty());
        assert_eq!(document.to_xml_string(), "<Values></Values>");
    }

    #[test]
    fn scalar_nodes_roundtrip() {
        let mut document = ValuesDocument::new();
        document.set_text("Comment", "lathe & mill");
        let xml = document.to_xml_string();
        assert_eq!(xml, "<Values><Comment>lathe &amp; mill</Comment></Values>");

        let parsed = ValuesDocument::parse(&xml).unwrap();
        assert_eq!(parsed.node("Comment").unwrap().text(), "lathe & mill");
    }

    #[test]
    fn keyed_items_roundtrip() {
        let mut document = ValuesDocument::new();
        document.set_items(
            "Rates",
            vec![ValueItem::keyed("a", "1.5"), ValueItem::keyed("b", "2.5")],
        );
        let xml = document.to_xml_string();
        assert_eq!(
            xml,
            "<Values><Rates><Value Key=\"a\">1.5</Value><Value Key=\"b\">2.5</Value></Rates></Values>"
        );

        let parsed = ValuesDocument::parse(&xml).unwrap();
        let items = parsed.node("Rates").unwrap().items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].key.as_deref(), Some("a"));
        assert_eq!(items[1].text, "2.5");
    }

    #[test]
    fn set_text_replaces_existing_node() {
        let mut document = ValuesDocument::new();
        document.set_text("Comment", "first");
        document.set_text("Comment", "second");
        assert_eq!(document.node("Comment").unwrap().text(), "second");
        assert_eq!(
            document.to_xml_string(),
            "<Values><Comment>second</Comment></Values>"
        );
    }

    #[test]
    fn remove_drops_the_node() {
        let mut document = ValuesDocument::new();
        document.set_text("Comment", "text");
        document.remove("Comment");
        assert!(document.is_empty());
        document.remove("Comment");
        assert!(document.is_empty());
    }

    #[test]
    fn parse_accepts_self_closing_root_and_elements() {
        let parsed = ValuesDocument::parse("<Values/>").unwrap();
        assert!(parsed.is_empty());

        let parsed = ValuesDocument::parse("<Values><Tags/></Values>").unwrap();
        let node = parsed.node("Tags").unwrap();
        assert_eq!(node.text(), "");
        assert!(node.items().is_empty());
    }

    #[test]
    fn parse_accepts_foreign_root_names() {
        let parsed = ValuesDocument::parse("<Root><Count>4</Count></Root>").unwrap();
        assert_eq!(parsed.node("Count").unwrap().text(), "4");
    }

    #[test]
    fn parse_skips_unknown_nested_elements() {
        let parsed = ValuesDocument::parse(
            "<Values><Tags><Junk><Value>no</Value></Junk><Value>yes</Value></Tags></Values>",
        )
        .unwrap();
        let items = parsed.node("Tags").unwrap().items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "yes");
    }

    #[test]
    fn parse_rejects_mismatched_tags() {
        assert!(ValuesDocument::parse("<Values><A>1</B></Values>").is_err());
    }

    #[test]
    fn escaped_key_attributes_are_unescaped() {
        let parsed =
            ValuesDocument::parse("<Values><M><Value Key=\"a&amp;b\">1</Value></M></Values>")
                .unwrap();
        let items = parsed.node("M").unwrap().items();
        assert_eq!(items[0].key.as_deref(), Some("a&b"));
    }
}
