use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{DeserializationError, Error, Result};
use crate::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};

/// A reference to one slot of a multi-valued property, such as `contacts:EmailAddress` with index
/// `EmailAddress1`.
///
/// Two definitions are equal when both the URI and the index match, ignoring ASCII case.
#[derive(Clone, Debug)]
pub struct IndexedPropertyDefinition {
    uri: String,
    index: String,
}

impl IndexedPropertyDefinition {
    pub fn new(uri: impl Into<String>, index: impl Into<String>) -> Self {
        IndexedPropertyDefinition {
            uri: uri.into(),
            index: index.into(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Reads an `IndexedFieldURI` element, leaving the cursor on its end element.
    pub fn load_from_xml(reader: &mut EwsXmlReader<'_>) -> Result<Self> {
        reader.ensure_current_node_is_start_element(XmlNamespace::Types, "IndexedFieldURI")?;
        let uri = required_attribute(reader, "FieldURI")?;
        let index = required_attribute(reader, "FieldIndex")?;
        reader.read_end_element(XmlNamespace::Types, "IndexedFieldURI")?;
        Ok(IndexedPropertyDefinition::new(uri, index))
    }

    pub fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        writer.write_start_element(XmlNamespace::Types, "IndexedFieldURI")?;
        writer.write_attribute_value("FieldURI", &self.uri)?;
        writer.write_attribute_value("FieldIndex", &self.index)?;
        writer.write_end_element()
    }
}

fn required_attribute(reader: &EwsXmlReader<'_>, name: &str) -> Result<String> {
    reader
        .read_attribute_value(name)
        .map(str::to_string)
        .ok_or_else(|| {
            Error::Deserialization(
                DeserializationError::new("", "IndexedFieldURI")
                    .because(format!("missing {} attribute", name)),
            )
        })
}

impl PartialEq for IndexedPropertyDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.uri.eq_ignore_ascii_case(&other.uri) && self.index.eq_ignore_ascii_case(&other.index)
    }
}

impl Eq for IndexedPropertyDefinition {}

impl Hash for IndexedPropertyDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.to_ascii_lowercase().hash(state);
        self.index.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for IndexedPropertyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.uri, self.index)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn equality_ignores_case() {
        let a = IndexedPropertyDefinition::new("contacts:EmailAddress", "EmailAddress1");
        let b = IndexedPropertyDefinition::new("Contacts:emailaddress", "EMAILADDRESS1");
        let c = IndexedPropertyDefinition::new("contacts:EmailAddress", "EmailAddress2");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = vec![a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn reads_and_writes() {
        let def = IndexedPropertyDefinition::new("contacts:PhoneNumber", "BusinessPhone");
        let mut writer = EwsXmlWriter::new();
        writer
            .write_start_document_element(XmlNamespace::Messages, "Root")
            .unwrap();
        def.write_to_xml(&mut writer).unwrap();
        let xml = writer.into_string().unwrap();
        assert!(xml.contains(
            "<t:IndexedFieldURI FieldURI=\"contacts:PhoneNumber\" FieldIndex=\"BusinessPhone\"/>"
        ));

        let mut reader = EwsXmlReader::new(&xml);
        reader.read().unwrap();
        reader
            .read_start_element(XmlNamespace::Types, "IndexedFieldURI")
            .unwrap();
        assert_eq!(IndexedPropertyDefinition::load_from_xml(&mut reader).unwrap(), def);
    }

    #[test]
    fn missing_index_is_rejected() {
        let xml = r#"<t:IndexedFieldURI xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types" FieldURI="contacts:PhoneNumber"/>"#;
        let mut reader = EwsXmlReader::new(xml);
        reader.read().unwrap();
        assert!(matches!(
            IndexedPropertyDefinition::load_from_xml(&mut reader),
            Err(Error::Deserialization(_))
        ));
    }
}
