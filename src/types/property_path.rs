use std::fmt;

use log::debug;

use super::{
    ExtendedPropertyDefinition, IndexedPropertyDefinition, PropertyDefinition,
    PropertyDefinitionResolver,
};
use crate::error::Result;
use crate::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};

/// A reference to a property as it appears in requests and in error payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyPath {
    /// `<t:FieldURI FieldURI="..."/>`: a property declared in the schema.
    Field(&'static PropertyDefinition),
    /// `<t:IndexedFieldURI FieldURI="..." FieldIndex="..."/>`.
    Indexed(IndexedPropertyDefinition),
    /// `<t:ExtendedFieldURI .../>`.
    Extended(ExtendedPropertyDefinition),
}

impl PropertyPath {
    /// Resolves the element under the cursor to a property reference.
    ///
    /// Returns `None`, without moving the cursor, when the element is not a property reference.
    /// A `FieldURI` naming a property `resolver` does not know is consumed and also yields `None`.
    /// Otherwise the cursor is left on the reference's end element.
    pub fn load_from_xml(
        reader: &mut EwsXmlReader<'_>,
        resolver: &dyn PropertyDefinitionResolver,
    ) -> Result<Option<PropertyPath>> {
        if !reader.is_start_element() {
            return Ok(None);
        }
        let local_name = reader.local_name().to_string();
        match local_name.as_str() {
            "FieldURI" => {
                let uri = reader
                    .read_attribute_value("FieldURI")
                    .unwrap_or_default()
                    .to_string();
                reader.read_end_element_if_necessary(XmlNamespace::NotSpecified, "FieldURI")?;
                let definition = resolver.find(&uri);
                if definition.is_none() {
                    debug!("unknown property {:?} in property reference", uri);
                }
                Ok(definition.map(PropertyPath::Field))
            }
            "IndexedFieldURI" => Ok(Some(PropertyPath::Indexed(
                IndexedPropertyDefinition::load_from_xml(reader)?,
            ))),
            "ExtendedFieldURI" => Ok(Some(PropertyPath::Extended(
                ExtendedPropertyDefinition::load_from_xml(reader)?,
            ))),
            _ => Ok(None),
        }
    }

    pub fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        match self {
            PropertyPath::Field(definition) => {
                writer.write_start_element(XmlNamespace::Types, "FieldURI")?;
                writer.write_attribute_value("FieldURI", definition.uri())?;
                writer.write_end_element()
            }
            PropertyPath::Indexed(definition) => definition.write_to_xml(writer),
            PropertyPath::Extended(definition) => definition.write_to_xml(writer),
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyPath::Field(definition) => f.write_str(definition.uri()),
            PropertyPath::Indexed(definition) => write!(f, "{}", definition),
            PropertyPath::Extended(definition) => write!(f, "{:?}", definition),
        }
    }
}

impl From<&'static PropertyDefinition> for PropertyPath {
    fn from(definition: &'static PropertyDefinition) -> Self {
        PropertyPath::Field(definition)
    }
}

impl From<IndexedPropertyDefinition> for PropertyPath {
    fn from(definition: IndexedPropertyDefinition) -> Self {
        PropertyPath::Indexed(definition)
    }
}

impl From<ExtendedPropertyDefinition> for PropertyPath {
    fn from(definition: ExtendedPropertyDefinition) -> Self {
        PropertyPath::Extended(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::schema::{item, Schema};
    use crate::types::{DefaultExtendedPropertySet, MapiPropertyType};

    const PATHS: &str = r#"<t:Paths xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
        <t:FieldURI FieldURI="item:Subject"/>
        <t:IndexedFieldURI FieldURI="contacts:EmailAddress" FieldIndex="EmailAddress1"/>
        <t:ExtendedFieldURI DistinguishedPropertySetId="PublicStrings" PropertyName="Keywords" PropertyType="StringArray"/>
        <t:FieldURI FieldURI="item:NoSuchThing"/>
        <t:Subject>not a path</t:Subject>
    </t:Paths>"#;

    #[test]
    fn dispatches_each_shape() {
        let mut reader = EwsXmlReader::new(PATHS);
        reader.read().unwrap();
        let schema = Schema::global();

        reader.read().unwrap();
        assert_eq!(
            PropertyPath::load_from_xml(&mut reader, schema).unwrap(),
            Some(PropertyPath::Field(&*item::SUBJECT))
        );
        assert!(reader.is_end_element_named(XmlNamespace::Types, "FieldURI"));

        reader.read().unwrap();
        assert_eq!(
            PropertyPath::load_from_xml(&mut reader, schema).unwrap(),
            Some(PropertyPath::Indexed(IndexedPropertyDefinition::new(
                "contacts:EmailAddress",
                "EmailAddress1"
            )))
        );

        reader.read().unwrap();
        assert_eq!(
            PropertyPath::load_from_xml(&mut reader, schema).unwrap(),
            Some(PropertyPath::Extended(
                ExtendedPropertyDefinition::with_name(
                    DefaultExtendedPropertySet::PublicStrings,
                    "Keywords",
                    MapiPropertyType::StringArray
                )
                .unwrap()
            ))
        );

        reader.read().unwrap();
        assert_eq!(PropertyPath::load_from_xml(&mut reader, schema).unwrap(), None);
        assert!(reader.is_end_element_named(XmlNamespace::Types, "FieldURI"));

        reader.read().unwrap();
        assert_eq!(PropertyPath::load_from_xml(&mut reader, schema).unwrap(), None);
        assert!(reader.is_start_element_named(XmlNamespace::Types, "Subject"));
    }

    #[test]
    fn writes_field_uri() {
        let mut writer = EwsXmlWriter::new();
        PropertyPath::from(&*item::SUBJECT)
            .write_to_xml(&mut writer)
            .unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            "<t:FieldURI FieldURI=\"item:Subject\"/>"
        );
    }
}
