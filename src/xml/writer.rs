use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::XmlNamespace;
use crate::error::{Error, Result};

/// Writes EWS XML using the fixed `m`/`t` prefixes.
///
/// Attributes may be written any time between [`write_start_element`](Self::write_start_element)
/// and the first child or text of that element; the start tag is only emitted once its content
/// begins. An element with no content is written self-closing.
pub struct EwsXmlWriter {
    writer: Writer<Vec<u8>>,
    pending: Option<BytesStart<'static>>,
    open: Vec<String>,
}

impl Default for EwsXmlWriter {
    fn default() -> Self {
        EwsXmlWriter::new()
    }
}

impl EwsXmlWriter {
    pub fn new() -> Self {
        EwsXmlWriter {
            writer: Writer::new(Vec::new()),
            pending: None,
            open: Vec::new(),
        }
    }

    /// Writes the XML declaration. All EWS examples use XML 1.0 with UTF-8.
    pub fn write_declaration(&mut self) -> Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        Ok(())
    }

    /// Opens the outermost element and declares the message and type namespace prefixes on it.
    pub fn write_start_document_element(
        &mut self,
        namespace: XmlNamespace,
        local_name: &str,
    ) -> Result<()> {
        self.write_start_element(namespace, local_name)?;
        self.write_attribute_value("xmlns:m", XmlNamespace::Messages.uri())?;
        self.write_attribute_value("xmlns:t", XmlNamespace::Types.uri())
    }

    pub fn write_start_element(&mut self, namespace: XmlNamespace, local_name: &str) -> Result<()> {
        self.flush_pending()?;
        let name = match namespace {
            XmlNamespace::NotSpecified => local_name.to_string(),
            ns => format!("{}:{}", ns.prefix(), local_name),
        };
        self.pending = Some(BytesStart::new(name.clone()));
        self.open.push(name);
        Ok(())
    }

    /// Adds an attribute to the element opened by the last `write_start_element`.
    pub fn write_attribute_value(&mut self, name: &str, value: &str) -> Result<()> {
        match self.pending {
            Some(ref mut start) => {
                start.push_attribute((name, value));
                Ok(())
            }
            None => Err(Error::Argument(format!(
                "attribute {} written after element content",
                name
            ))),
        }
    }

    /// Writes escaped text into the current element.
    pub fn write_value(&mut self, value: &str) -> Result<()> {
        self.flush_pending()?;
        self.writer.write_event(Event::Text(BytesText::new(value)))?;
        Ok(())
    }

    pub fn write_end_element(&mut self) -> Result<()> {
        let name = self
            .open
            .pop()
            .ok_or_else(|| Error::Argument("no open element to close".to_string()))?;
        match self.pending.take() {
            Some(start) => self.writer.write_event(Event::Empty(start))?,
            None => self.writer.write_event(Event::End(BytesEnd::new(name)))?,
        }
        Ok(())
    }

    /// Writes `<prefix:local_name>value</prefix:local_name>`.
    pub fn write_element_value(
        &mut self,
        namespace: XmlNamespace,
        local_name: &str,
        value: &str,
    ) -> Result<()> {
        self.write_start_element(namespace, local_name)?;
        if !value.is_empty() {
            self.write_value(value)?;
        }
        self.write_end_element()
    }

    fn flush_pending(&mut self) -> Result<()> {
        if let Some(start) = self.pending.take() {
            self.writer.write_event(Event::Start(start))?;
        }
        Ok(())
    }

    /// Closes any elements still open and returns the document.
    pub fn into_string(mut self) -> Result<String> {
        while !self.open.is_empty() {
            self.write_end_element()?;
        }
        String::from_utf8(self.writer.into_inner())
            .map_err(|e| Error::Argument(format!("written document is not UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_nested_elements() {
        let mut writer = EwsXmlWriter::new();
        writer
            .write_start_document_element(XmlNamespace::Messages, "Root")
            .unwrap();
        writer
            .write_element_value(XmlNamespace::Types, "Subject", "a < b")
            .unwrap();
        writer
            .write_start_element(XmlNamespace::Types, "FieldURI")
            .unwrap();
        writer.write_attribute_value("FieldURI", "item:Subject").unwrap();
        writer.write_end_element().unwrap();

        assert_eq!(
            writer.into_string().unwrap(),
            "<m:Root xmlns:m=\"http://schemas.microsoft.com/exchange/services/2006/messages\" \
             xmlns:t=\"http://schemas.microsoft.com/exchange/services/2006/types\">\
             <t:Subject>a &lt; b</t:Subject>\
             <t:FieldURI FieldURI=\"item:Subject\"/>\
             </m:Root>"
        );
    }

    #[test]
    fn attribute_after_content_is_rejected() {
        let mut writer = EwsXmlWriter::new();
        writer.write_start_element(XmlNamespace::Types, "A").unwrap();
        writer.write_value("x").unwrap();
        assert!(writer.write_attribute_value("B", "c").is_err());
    }
}
