use std::any::type_name;
use std::fmt::Display;
use std::str::FromStr;

use log::trace;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use super::{XmlNamespace, XmlNodeType};
use crate::error::{DeserializationError, Error, Result, StructuralError};
use crate::types::ExchangeVersion;

/// A convenience builder for [`EwsXmlReader`]s.
///
/// ```
/// # use ews_wire::xml::EwsXmlReaderBuilder;
/// # use ews_wire::ExchangeVersion;
/// let xml = "<t:Subject xmlns:t=\"http://schemas.microsoft.com/exchange/services/2006/types\">Hi</t:Subject>";
/// let mut reader = EwsXmlReaderBuilder::new(xml)
///     .requested_version(ExchangeVersion::Exchange2010_SP1)
///     .build();
/// reader.read().unwrap();
/// assert_eq!(reader.read_element_value().unwrap(), "Hi");
/// ```
pub struct EwsXmlReaderBuilder<'a> {
    xml: &'a str,
    requested_version: ExchangeVersion,
    trim_text: bool,
}

impl<'a> EwsXmlReaderBuilder<'a> {
    /// Make a new `EwsXmlReaderBuilder` over the given document.
    pub fn new(xml: &'a str) -> Self {
        EwsXmlReaderBuilder {
            xml,
            requested_version: ExchangeVersion::default(),
            trim_text: false,
        }
    }

    /// The protocol version the request was sent with. Version-gated property flags are
    /// resolved against it.
    pub fn requested_version(&mut self, version: ExchangeVersion) -> &mut Self {
        self.requested_version = version;
        self
    }

    /// Whether leading and trailing whitespace is stripped from text nodes. Off by default, so
    /// string values keep their padding.
    pub fn trim_text(&mut self, trim: bool) -> &mut Self {
        self.trim_text = trim;
        self
    }

    /// Return a new [`EwsXmlReader`] positioned before the first node.
    pub fn build(&self) -> EwsXmlReader<'a> {
        let mut reader = NsReader::from_str(self.xml);
        let config = reader.config_mut();
        config.trim_text(self.trim_text);
        config.expand_empty_elements = true;

        EwsXmlReader {
            reader,
            node: Node::none(),
            blank_text: String::new(),
            depth: 0,
            requested_version: self.requested_version,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: XmlNodeType,
    namespace_uri: String,
    local_name: String,
    attributes: Vec<(String, String)>,
    text: String,
}

impl Node {
    fn none() -> Self {
        Node::of(XmlNodeType::None)
    }

    fn of(kind: XmlNodeType) -> Self {
        Node {
            kind,
            namespace_uri: String::new(),
            local_name: String::new(),
            attributes: Vec::new(),
            text: String::new(),
        }
    }
}

/// A forward-only cursor over one EWS XML document.
///
/// The cursor is positioned on exactly one node at a time. Self-closing elements are reported as
/// a start element immediately followed by its end element, so callers never need to special
/// case them. A cursor must not be shared between two parses; every method takes `&mut self`.
pub struct EwsXmlReader<'a> {
    reader: NsReader<&'a [u8]>,
    node: Node,
    // whitespace skipped since the last node; the value of a blank leaf element
    blank_text: String,
    depth: usize,
    requested_version: ExchangeVersion,
}

impl<'a> EwsXmlReader<'a> {
    /// Make a new cursor over `xml` with default options.
    pub fn new(xml: &'a str) -> Self {
        EwsXmlReaderBuilder::new(xml).build()
    }

    /// The protocol version this document is being read for.
    pub fn requested_version(&self) -> ExchangeVersion {
        self.requested_version
    }

    /// Advance to the next element, end element or non-blank text node.
    pub fn read(&mut self) -> Result<()> {
        if self.node.kind == XmlNodeType::EndOfDocument {
            return Err(self.structural("more content"));
        }
        self.blank_text.clear();

        loop {
            let (resolved, event) = self.reader.read_resolved_event()?;
            let namespace_uri = match resolved {
                ResolveResult::Bound(ns) => String::from_utf8_lossy(ns.as_ref()).into_owned(),
                _ => String::new(),
            };

            match event {
                Event::Start(start) => {
                    let mut attributes = Vec::new();
                    for attr in start.attributes() {
                        let attr = attr?;
                        if attr.key.as_namespace_binding().is_some() {
                            continue;
                        }
                        let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
                        let value = attr.unescape_value()?.into_owned();
                        attributes.push((name, value));
                    }

                    self.depth += 1;
                    self.node = Node {
                        kind: XmlNodeType::StartElement,
                        namespace_uri,
                        local_name: String::from_utf8_lossy(start.local_name().as_ref())
                            .into_owned(),
                        attributes,
                        text: String::new(),
                    };
                    return Ok(());
                }
                Event::End(end) => {
                    self.depth = self.depth.saturating_sub(1);
                    self.node = Node {
                        namespace_uri,
                        local_name: String::from_utf8_lossy(end.local_name().as_ref()).into_owned(),
                        ..Node::of(XmlNodeType::EndElement)
                    };
                    return Ok(());
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    if text.trim().is_empty() {
                        self.blank_text.push_str(&text);
                        continue;
                    }
                    self.node = Node {
                        text: text.into_owned(),
                        ..Node::of(XmlNodeType::Text)
                    };
                    return Ok(());
                }
                Event::CData(data) => {
                    self.node = Node {
                        text: String::from_utf8_lossy(&data.into_inner()).into_owned(),
                        ..Node::of(XmlNodeType::Text)
                    };
                    return Ok(());
                }
                Event::Eof => {
                    self.node = Node::of(XmlNodeType::EndOfDocument);
                    return Ok(());
                }
                // declarations, comments, processing instructions and doctypes carry nothing
                _ => continue,
            }
        }
    }

    pub fn node_type(&self) -> XmlNodeType {
        self.node.kind
    }

    /// The local (unprefixed) name of the current element.
    pub fn local_name(&self) -> &str {
        &self.node.local_name
    }

    /// The namespace URI the current element's prefix was bound to.
    pub fn namespace_uri(&self) -> &str {
        &self.node.namespace_uri
    }

    pub fn namespace(&self) -> XmlNamespace {
        XmlNamespace::from_uri(&self.node.namespace_uri)
    }

    /// The text of the current text node.
    pub fn text(&self) -> &str {
        &self.node.text
    }

    pub fn is_start_element(&self) -> bool {
        self.node.kind == XmlNodeType::StartElement
    }

    pub fn is_end_element(&self) -> bool {
        self.node.kind == XmlNodeType::EndElement
    }

    /// Is the cursor on a start element with the given name?
    ///
    /// [`XmlNamespace::NotSpecified`] matches an element in any namespace.
    pub fn is_start_element_named(&self, namespace: XmlNamespace, local_name: &str) -> bool {
        self.is_start_element() && self.matches(namespace, local_name)
    }

    pub fn is_end_element_named(&self, namespace: XmlNamespace, local_name: &str) -> bool {
        self.is_end_element() && self.matches(namespace, local_name)
    }

    /// Is the cursor on an end element with the given name, bound to exactly `namespace_uri`?
    pub fn is_end_element_uri(&self, namespace_uri: &str, local_name: &str) -> bool {
        self.is_end_element()
            && self.node.local_name == local_name
            && self.node.namespace_uri == namespace_uri
    }

    fn matches(&self, namespace: XmlNamespace, local_name: &str) -> bool {
        self.node.local_name == local_name
            && (namespace == XmlNamespace::NotSpecified || self.namespace() == namespace)
    }

    pub fn has_attributes(&self) -> bool {
        !self.node.attributes.is_empty()
    }

    /// The value of the named attribute on the current element, if present.
    pub fn read_attribute_value(&self, name: &str) -> Option<&str> {
        self.node
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The value of the named attribute converted to `T`.
    pub fn read_attribute_value_as<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.read_attribute_value(name) {
            None => Ok(None),
            Some(value) => convert(value).map(Some),
        }
    }

    pub fn ensure_current_node_is_start_element(
        &self,
        namespace: XmlNamespace,
        local_name: &str,
    ) -> Result<()> {
        if self.is_start_element_named(namespace, local_name) {
            Ok(())
        } else {
            Err(self.structural(&format!(
                "start element {}",
                qualified(namespace, local_name)
            )))
        }
    }

    pub fn ensure_current_node_is_end_element(
        &self,
        namespace: XmlNamespace,
        local_name: &str,
    ) -> Result<()> {
        if self.is_end_element_named(namespace, local_name) {
            Ok(())
        } else {
            Err(self.structural(&format!(
                "end element {}",
                qualified(namespace, local_name)
            )))
        }
    }

    /// Advance and require a start element with the given name.
    pub fn read_start_element(&mut self, namespace: XmlNamespace, local_name: &str) -> Result<()> {
        self.read()?;
        self.ensure_current_node_is_start_element(namespace, local_name)
    }

    /// Advance and require an end element with the given name.
    pub fn read_end_element(&mut self, namespace: XmlNamespace, local_name: &str) -> Result<()> {
        self.read()?;
        self.ensure_current_node_is_end_element(namespace, local_name)
    }

    /// Advance to the named end element unless the cursor is already on it.
    pub fn read_end_element_if_necessary(
        &mut self,
        namespace: XmlNamespace,
        local_name: &str,
    ) -> Result<()> {
        if self.is_end_element_named(namespace, local_name) {
            Ok(())
        } else {
            self.read_end_element(namespace, local_name)
        }
    }

    /// Reads the text content of the current start element and leaves the cursor on its end
    /// element. An empty element yields an empty string; a blank one yields its whitespace.
    pub fn read_element_value(&mut self) -> Result<String> {
        if !self.is_start_element() {
            return Err(self.structural("start element"));
        }
        let namespace_uri = self.node.namespace_uri.clone();
        let local_name = self.node.local_name.clone();

        self.read()?;
        let value = match self.node.kind {
            XmlNodeType::Text => {
                let value = std::mem::take(&mut self.node.text);
                self.read()?;
                value
            }
            XmlNodeType::EndElement => std::mem::take(&mut self.blank_text),
            _ => String::new(),
        };

        if self.is_end_element_uri(&namespace_uri, &local_name) {
            Ok(value)
        } else {
            Err(self.structural(&format!("end element {}", local_name)))
        }
    }

    /// Reads and converts the text content of the current start element.
    pub fn read_element_value_as<T>(&mut self) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let value = self.read_element_value()?;
        convert(&value)
    }

    /// Advance to the named start element and read its text content.
    pub fn read_element_value_named(
        &mut self,
        namespace: XmlNamespace,
        local_name: &str,
    ) -> Result<String> {
        self.read_start_element(namespace, local_name)?;
        self.read_element_value()
    }

    /// Converts the current text node to `T`.
    pub fn read_value_as<T>(&self) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        if self.node.kind != XmlNodeType::Text {
            return Err(self.structural("text"));
        }
        convert(&self.node.text)
    }

    /// Skips the current element and everything in it, leaving the cursor on its end element.
    pub fn skip_current_element(&mut self) -> Result<()> {
        if !self.is_start_element() {
            return Err(self.structural("start element"));
        }
        trace!("skipping element {}", self.local_name());

        let depth = self.depth;
        loop {
            self.read()?;
            match self.node.kind {
                XmlNodeType::EndElement if self.depth == depth - 1 => return Ok(()),
                XmlNodeType::EndOfDocument => {
                    return Err(self.structural("end of skipped element"));
                }
                _ => {}
            }
        }
    }

    /// Requires the cursor to be on the named start element, then skips it.
    pub fn skip_element(&mut self, namespace: XmlNamespace, local_name: &str) -> Result<()> {
        self.ensure_current_node_is_start_element(namespace, local_name)?;
        self.skip_current_element()
    }

    fn describe(&self) -> String {
        match self.node.kind {
            XmlNodeType::None => "start of document".to_string(),
            XmlNodeType::EndOfDocument => "end of document".to_string(),
            XmlNodeType::Text => format!("text {:?}", self.node.text),
            XmlNodeType::StartElement => {
                format!("start element {}", self.qualified_current())
            }
            XmlNodeType::EndElement => format!("end element {}", self.qualified_current()),
        }
    }

    fn qualified_current(&self) -> String {
        match self.namespace() {
            XmlNamespace::NotSpecified if !self.node.namespace_uri.is_empty() => {
                format!("{{{}}}{}", self.node.namespace_uri, self.node.local_name)
            }
            ns => qualified(ns, &self.node.local_name),
        }
    }

    pub(crate) fn structural(&self, expected: &str) -> Error {
        Error::Structural(StructuralError {
            expected: expected.to_string(),
            found: self.describe(),
        })
    }
}

fn qualified(namespace: XmlNamespace, local_name: &str) -> String {
    match namespace {
        XmlNamespace::NotSpecified => local_name.to_string(),
        ns => format!("{}:{}", ns.prefix(), local_name),
    }
}

// typed values follow xs:whiteSpace collapse, so surrounding whitespace is not significant
fn convert<T>(value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let value = value.trim();
    value
        .parse::<T>()
        .map_err(|e| Error::Deserialization(DeserializationError::new(value, type_name::<T>()).because(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
        <m:Root xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
                xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
          <t:Count Kind="unread">42</t:Count>
          <t:Empty/>
          <t:Nested><t:Deep>x</t:Deep><t:Deep/></t:Nested>
          <t:Escaped>a &amp; b</t:Escaped>
        </m:Root>"#;

    #[test]
    fn reads_elements_and_values() {
        let mut reader = EwsXmlReader::new(DOC);
        reader
            .read_start_element(XmlNamespace::Messages, "Root")
            .unwrap();
        reader
            .read_start_element(XmlNamespace::Types, "Count")
            .unwrap();
        assert_eq!(reader.read_attribute_value("Kind"), Some("unread"));
        assert_eq!(
            reader.read_attribute_value_as::<u32>("Missing").unwrap(),
            None
        );
        assert_eq!(reader.read_element_value_as::<u32>().unwrap(), 42);
        assert!(reader.is_end_element_named(XmlNamespace::Types, "Count"));

        assert_eq!(
            reader
                .read_element_value_named(XmlNamespace::Types, "Empty")
                .unwrap(),
            ""
        );

        reader
            .read_start_element(XmlNamespace::Types, "Nested")
            .unwrap();
        reader.skip_current_element().unwrap();
        assert!(reader.is_end_element_named(XmlNamespace::Types, "Nested"));

        assert_eq!(
            reader
                .read_element_value_named(XmlNamespace::Types, "Escaped")
                .unwrap(),
            "a & b"
        );
        reader
            .read_end_element(XmlNamespace::Messages, "Root")
            .unwrap();
        reader.read().unwrap();
        assert_eq!(reader.node_type(), XmlNodeType::EndOfDocument);
        assert!(reader.read().unwrap_err().is_structural());
    }

    #[test]
    fn wrong_element_is_structural() {
        let mut reader = EwsXmlReader::new(DOC);
        let err = reader
            .read_start_element(XmlNamespace::Types, "Root")
            .unwrap_err();
        match err {
            Error::Structural(e) => {
                assert_eq!(e.expected, "start element t:Root");
                assert_eq!(e.found, "start element m:Root");
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn unconvertible_value_is_deserialization_error() {
        let mut reader = EwsXmlReader::new("<Count>many</Count>");
        reader.read().unwrap();
        match reader.read_element_value_as::<i32>().unwrap_err() {
            Error::Deserialization(e) => {
                assert_eq!(e.value, "many");
                assert_eq!(e.target, "i32");
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn not_specified_matches_any_namespace() {
        let mut reader = EwsXmlReader::new(DOC);
        reader.read().unwrap();
        assert!(reader.is_start_element_named(XmlNamespace::NotSpecified, "Root"));
        assert!(!reader.is_start_element_named(XmlNamespace::Types, "Root"));
        assert_eq!(reader.namespace_uri(), crate::xml::MESSAGES_NS_URI);
    }

    #[test]
    fn text_keeps_its_whitespace() {
        let mut reader = EwsXmlReader::new(
            "<Root>\n  <Subject>  padded  </Subject>\n  <Blank>   </Blank>\n  <Empty/>\n</Root>",
        );
        reader.read().unwrap();
        assert_eq!(
            reader
                .read_element_value_named(XmlNamespace::NotSpecified, "Subject")
                .unwrap(),
            "  padded  "
        );
        assert_eq!(
            reader
                .read_element_value_named(XmlNamespace::NotSpecified, "Blank")
                .unwrap(),
            "   "
        );
        assert_eq!(
            reader
                .read_element_value_named(XmlNamespace::NotSpecified, "Empty")
                .unwrap(),
            ""
        );
        // indentation between elements is not a node
        reader
            .read_end_element(XmlNamespace::NotSpecified, "Root")
            .unwrap();
    }

    #[test]
    fn trimming_can_be_enabled() {
        let mut reader = EwsXmlReaderBuilder::new("<Subject>  padded  </Subject>")
            .trim_text(true)
            .build();
        reader.read().unwrap();
        assert_eq!(reader.read_element_value().unwrap(), "padded");
    }

    #[test]
    fn builder_carries_version() {
        let reader = EwsXmlReaderBuilder::new("<a/>")
            .requested_version(ExchangeVersion::Exchange2007_SP1)
            .build();
        assert_eq!(reader.requested_version(), ExchangeVersion::Exchange2007_SP1);
    }
}
