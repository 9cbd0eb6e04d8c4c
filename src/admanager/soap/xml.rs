//! Minimal XML element tree for SOAP envelopes.
//!
//! Parsed elements keep only their local names, so lookups ignore namespace
//! prefixes. Attributes are written but not read back.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ApiError;

/// An XML element with text and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Creates an empty element.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates an element holding only text.
    #[must_use]
    pub fn text_node(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Appends a child element.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Appends a text-only child element.
    #[must_use]
    pub fn with_text_child(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_child(Self::text_node(name, text))
    }

    /// Appends a text-only child when `text` is present.
    #[must_use]
    pub fn with_optional_child(self, name: &str, text: Option<&str>) -> Self {
        match text {
            Some(text) => self.with_text_child(name, text),
            None => self,
        }
    }

    /// First child with the given local name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of the first child with the given name, if non-empty.
    #[must_use]
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name)
            .map(|c| c.text.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }

    /// Boolean value of a child.
    #[must_use]
    pub fn child_bool(&self, name: &str) -> Option<bool> {
        self.child_text(name).and_then(|t| match t.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        })
    }

    /// Integer value of a child.
    #[must_use]
    pub fn child_i64(&self, name: &str) -> Option<i64> {
        self.child_text(name).and_then(|t| t.parse().ok())
    }

    /// Serializes the element and its descendants.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&quick_xml::escape::escape(value.as_str()));
            out.push('"');
        }
        if self.text.is_empty() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        out.push_str(&quick_xml::escape::escape(self.text.as_str()));
        for child in &self.children {
            child.write_into(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Parses a document into its root element.
///
/// # Errors
///
/// Returns [`ApiError::Decode`] if the document is not well-formed.
pub fn parse(xml: &str) -> Result<XmlElement, ApiError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(XmlElement::new(local_name(&start))),
            Ok(Event::Empty(start)) => {
                attach(&mut stack, &mut root, XmlElement::new(local_name(&start)));
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ApiError::Decode("unbalanced XML end tag".to_string()))?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::Text(text)) => {
                let text: Cow<'_, str> = text
                    .unescape()
                    .map_err(|e| ApiError::Decode(format!("invalid XML text: {e}")))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ApiError::Decode(format!("invalid XML: {e}"))),
        }
    }

    if !stack.is_empty() {
        return Err(ApiError::Decode("truncated XML document".to_string()));
    }
    root.ok_or_else(|| ApiError::Decode("empty XML document".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strips_namespace_prefixes() {
        let xml = r#"<?xml version="1.0"?>
            <soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
              <soap:Body>
                <getCurrentNetworkResponse xmlns="https://www.google.com/apis/ads/publisher/v202405">
                  <rval>
                    <networkCode>1234</networkCode>
                    <displayName>Tom &amp; Jerry</displayName>
                    <isTest>false</isTest>
                  </rval>
                </getCurrentNetworkResponse>
              </soap:Body>
            </soap:Envelope>"#;

        let root = parse(xml).unwrap();
        assert_eq!(root.name, "Envelope");
        let rval = root
            .child("Body")
            .and_then(|body| body.child("getCurrentNetworkResponse"))
            .and_then(|response| response.child("rval"))
            .unwrap();
        assert_eq!(rval.child_text("networkCode").as_deref(), Some("1234"));
        assert_eq!(rval.child_text("displayName").as_deref(), Some("Tom & Jerry"));
        assert_eq!(rval.child_bool("isTest"), Some(false));
        assert_eq!(rval.child_i64("networkCode"), Some(1234));
    }

    #[test]
    fn parse_handles_empty_elements() {
        let root = parse("<a><b/><c>x</c><b/></a>").unwrap();
        assert_eq!(root.children_named("b").count(), 2);
        assert!(root.child_text("b").is_none());
    }

    #[test]
    fn parse_rejects_truncated_documents() {
        assert!(parse("<a><b>").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn writer_escapes_text_and_attributes() {
        let element = XmlElement::new("value")
            .with_attribute("xsi:type", "TextValue")
            .with_text_child("value", "a < b & \"c\"");
        assert_eq!(
            element.to_xml(),
            r#"<value xsi:type="TextValue"><value>a &lt; b &amp; &quot;c&quot;</value></value>"#
        );
    }

    #[test]
    fn writer_self_closes_empty_elements() {
        assert_eq!(XmlElement::new("getAllNetworks").to_xml(), "<getAllNetworks/>");
    }

    #[test]
    fn optional_children_are_skipped() {
        let element = XmlElement::new("adUnit")
            .with_optional_child("parentId", None)
            .with_optional_child("name", Some("Sidebar"));
        assert_eq!(element.to_xml(), "<adUnit><name>Sidebar</name></adUnit>");
    }
}
