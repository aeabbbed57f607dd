use std::any::Any;
use std::fmt;
use std::str::FromStr;

use log::warn;
use nom::{
    bytes::complete::tag_no_case,
    character::complete::hex_digit1,
    combinator::{all_consuming, map_res, opt},
    sequence::preceded,
    IResult,
};
use uuid::Uuid;

use super::{
    ComplexProperty, MapiPropertyType, MapiTypeConverter, MapiValue, MapiValueKind, OwnerHandle,
};
use crate::error::{DeserializationError, Error, Result};
use crate::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};

/// The well-known MAPI property sets that can be named instead of given by GUID.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum DefaultExtendedPropertySet {
    Meeting,
    Appointment,
    Common,
    PublicStrings,
    Address,
    InternetHeaders,
    CalendarAssistant,
    UnifiedMessaging,
    Task,
    Sharing,
}

impl DefaultExtendedPropertySet {
    const ALL: [DefaultExtendedPropertySet; 10] = [
        DefaultExtendedPropertySet::Meeting,
        DefaultExtendedPropertySet::Appointment,
        DefaultExtendedPropertySet::Common,
        DefaultExtendedPropertySet::PublicStrings,
        DefaultExtendedPropertySet::Address,
        DefaultExtendedPropertySet::InternetHeaders,
        DefaultExtendedPropertySet::CalendarAssistant,
        DefaultExtendedPropertySet::UnifiedMessaging,
        DefaultExtendedPropertySet::Task,
        DefaultExtendedPropertySet::Sharing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DefaultExtendedPropertySet::Meeting => "Meeting",
            DefaultExtendedPropertySet::Appointment => "Appointment",
            DefaultExtendedPropertySet::Common => "Common",
            DefaultExtendedPropertySet::PublicStrings => "PublicStrings",
            DefaultExtendedPropertySet::Address => "Address",
            DefaultExtendedPropertySet::InternetHeaders => "InternetHeaders",
            DefaultExtendedPropertySet::CalendarAssistant => "CalendarAssistant",
            DefaultExtendedPropertySet::UnifiedMessaging => "UnifiedMessaging",
            DefaultExtendedPropertySet::Task => "Task",
            DefaultExtendedPropertySet::Sharing => "Sharing",
        }
    }
}

impl fmt::Display for DefaultExtendedPropertySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DefaultExtendedPropertySet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DefaultExtendedPropertySet::ALL
            .iter()
            .copied()
            .find(|set| set.as_str() == s)
            .ok_or_else(|| {
                Error::Deserialization(DeserializationError::new(s, "DefaultExtendedPropertySet"))
            })
    }
}

/// The identity of a MAPI-level property, as given by an `ExtendedFieldURI` element.
///
/// A property is identified either by a bare 16-bit tag, or by a property set (well-known or by
/// GUID) together with a name or a numeric id. Two definitions are equal when every identity
/// field, including the MAPI type, is equal; a field present on one side and missing on the other
/// makes them unequal.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct ExtendedPropertyDefinition {
    property_set: Option<DefaultExtendedPropertySet>,
    property_set_id: Option<Uuid>,
    tag: Option<u16>,
    name: Option<String>,
    id: Option<i32>,
    mapi_type: MapiPropertyType,
}

impl ExtendedPropertyDefinition {
    fn empty(mapi_type: MapiPropertyType) -> Self {
        ExtendedPropertyDefinition {
            property_set: None,
            property_set_id: None,
            tag: None,
            name: None,
            id: None,
            mapi_type,
        }
    }

    /// A property identified by its MAPI tag alone, e.g. `0x1000` for `PR_BODY`.
    pub fn with_tag(tag: u16, mapi_type: MapiPropertyType) -> Self {
        ExtendedPropertyDefinition {
            tag: Some(tag),
            ..ExtendedPropertyDefinition::empty(mapi_type)
        }
    }

    pub fn with_name(
        property_set: DefaultExtendedPropertySet,
        name: impl Into<String>,
        mapi_type: MapiPropertyType,
    ) -> Result<Self> {
        Ok(ExtendedPropertyDefinition {
            property_set: Some(property_set),
            name: Some(checked_name(name.into())?),
            ..ExtendedPropertyDefinition::empty(mapi_type)
        })
    }

    pub fn with_id(property_set: DefaultExtendedPropertySet, id: i32, mapi_type: MapiPropertyType) -> Self {
        ExtendedPropertyDefinition {
            property_set: Some(property_set),
            id: Some(id),
            ..ExtendedPropertyDefinition::empty(mapi_type)
        }
    }

    pub fn with_guid_name(
        property_set_id: Uuid,
        name: impl Into<String>,
        mapi_type: MapiPropertyType,
    ) -> Result<Self> {
        Ok(ExtendedPropertyDefinition {
            property_set_id: Some(property_set_id),
            name: Some(checked_name(name.into())?),
            ..ExtendedPropertyDefinition::empty(mapi_type)
        })
    }

    pub fn with_guid_id(property_set_id: Uuid, id: i32, mapi_type: MapiPropertyType) -> Self {
        ExtendedPropertyDefinition {
            property_set_id: Some(property_set_id),
            id: Some(id),
            ..ExtendedPropertyDefinition::empty(mapi_type)
        }
    }

    pub fn property_set(&self) -> Option<DefaultExtendedPropertySet> {
        self.property_set
    }

    pub fn property_set_id(&self) -> Option<Uuid> {
        self.property_set_id
    }

    pub fn tag(&self) -> Option<u16> {
        self.tag
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub fn mapi_type(&self) -> MapiPropertyType {
        self.mapi_type
    }

    /// The in-memory kind of this property's value (of each element, for array types).
    pub fn value_kind(&self) -> MapiValueKind {
        MapiTypeConverter::entry(self.mapi_type).kind()
    }

    /// Reads an `ExtendedFieldURI` element, leaving the cursor on its end element.
    pub fn load_from_xml(reader: &mut EwsXmlReader<'_>) -> Result<Self> {
        reader.ensure_current_node_is_start_element(XmlNamespace::Types, "ExtendedFieldURI")?;

        let property_set =
            reader.read_attribute_value_as::<DefaultExtendedPropertySet>("DistinguishedPropertySetId")?;
        let property_set_id = reader.read_attribute_value_as::<Uuid>("PropertySetId")?;
        let tag = match reader.read_attribute_value("PropertyTag") {
            Some(text) => Some(parse_property_tag(text)?),
            None => None,
        };
        let name = reader.read_attribute_value("PropertyName").map(str::to_string);
        let id = reader.read_attribute_value_as::<i32>("PropertyId")?;
        let mapi_type = match reader.read_attribute_value("PropertyType") {
            Some(text) => text.parse::<MapiPropertyType>().map_err(|e| {
                warn!("unknown extended property type {:?}", text);
                e
            })?,
            None => {
                return Err(Error::Deserialization(
                    DeserializationError::new("", "ExtendedFieldURI")
                        .because("missing PropertyType attribute"),
                ))
            }
        };
        reader.read_end_element(XmlNamespace::Types, "ExtendedFieldURI")?;

        Ok(ExtendedPropertyDefinition {
            property_set,
            property_set_id,
            tag,
            name,
            id,
            mapi_type,
        })
    }

    pub fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        writer.write_start_element(XmlNamespace::Types, "ExtendedFieldURI")?;
        if let Some(set) = self.property_set {
            writer.write_attribute_value("DistinguishedPropertySetId", set.as_str())?;
        }
        if let Some(guid) = self.property_set_id {
            writer.write_attribute_value("PropertySetId", &guid.to_string())?;
        }
        if let Some(tag) = self.tag {
            writer.write_attribute_value("PropertyTag", &format!("0x{:x}", tag))?;
        }
        if let Some(ref name) = self.name {
            writer.write_attribute_value("PropertyName", name)?;
        }
        if let Some(id) = self.id {
            writer.write_attribute_value("PropertyId", &id.to_string())?;
        }
        writer.write_attribute_value("PropertyType", self.mapi_type.as_str())?;
        writer.write_end_element()
    }
}

fn checked_name(name: String) -> Result<String> {
    if name.is_empty() {
        return Err(Error::Argument(
            "extended property name must not be empty".to_string(),
        ));
    }
    Ok(name)
}

fn hex_tag(input: &str) -> IResult<&str, u16> {
    preceded(
        opt(tag_no_case("0x")),
        map_res(hex_digit1, |digits| u16::from_str_radix(digits, 16)),
    )(input)
}

fn parse_property_tag(text: &str) -> Result<u16> {
    all_consuming(hex_tag)(text)
        .map(|(_, tag)| tag)
        .map_err(|_| Error::Deserialization(DeserializationError::new(text, "PropertyTag")))
}

/// One extended property and its value.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtendedProperty {
    definition: ExtendedPropertyDefinition,
    value: MapiValue,
}

impl ExtendedProperty {
    /// Pairs a definition with a value, coercing the value to the definition's MAPI type.
    pub fn new(definition: ExtendedPropertyDefinition, value: MapiValue) -> Result<Self> {
        let value = MapiTypeConverter::change_type(definition.mapi_type(), value)?;
        Ok(ExtendedProperty { definition, value })
    }

    pub fn definition(&self) -> &ExtendedPropertyDefinition {
        &self.definition
    }

    pub fn value(&self) -> &MapiValue {
        &self.value
    }

    /// Reads one `ExtendedProperty` element, leaving the cursor on its end element.
    pub fn load_from_xml(reader: &mut EwsXmlReader<'_>, element_name: &str) -> Result<Self> {
        reader.ensure_current_node_is_start_element(XmlNamespace::Types, element_name)?;
        reader.read_start_element(XmlNamespace::Types, "ExtendedFieldURI")?;
        let definition = ExtendedPropertyDefinition::load_from_xml(reader)?;
        let mapi_type = definition.mapi_type();

        reader.read()?;
        let value = if reader.is_start_element_named(XmlNamespace::Types, "Value") {
            let text = reader.read_element_value()?;
            MapiTypeConverter::convert_to_value(mapi_type, &text)?
        } else if reader.is_start_element_named(XmlNamespace::Types, "Values") {
            let mut texts = Vec::new();
            loop {
                reader.read()?;
                if reader.is_end_element_named(XmlNamespace::Types, "Values") {
                    break;
                }
                if reader.is_start_element_named(XmlNamespace::Types, "Value") {
                    texts.push(reader.read_element_value()?);
                } else if reader.is_start_element() {
                    reader.skip_current_element()?;
                }
            }
            MapiValue::Array(MapiTypeConverter::convert_to_values(mapi_type, texts)?)
        } else {
            return Err(reader.structural("start element t:Value or t:Values"));
        };

        reader.read_end_element(XmlNamespace::Types, element_name)?;
        Ok(ExtendedProperty { definition, value })
    }

    pub fn write_to_xml(&self, writer: &mut EwsXmlWriter, element_name: &str) -> Result<()> {
        let mapi_type = self.definition.mapi_type();
        writer.write_start_element(XmlNamespace::Types, element_name)?;
        self.definition.write_to_xml(writer)?;
        if mapi_type.is_array() {
            writer.write_start_element(XmlNamespace::Types, "Values")?;
            for text in MapiTypeConverter::convert_to_strings(mapi_type, &self.value)? {
                writer.write_element_value(XmlNamespace::Types, "Value", &text)?;
            }
            writer.write_end_element()?;
        } else {
            let text = MapiTypeConverter::convert_to_string(mapi_type, Some(&self.value))?;
            writer.write_element_value(XmlNamespace::Types, "Value", &text)?;
        }
        writer.write_end_element()
    }
}

/// The extended properties of one item or folder.
///
/// On the wire each property is a sibling `ExtendedProperty` element of the owning object. A full
/// load replaces the collection with the single property under the cursor; an update merges it,
/// replacing any property with the same definition.
#[derive(Clone, Debug, Default)]
pub struct ExtendedPropertyCollection {
    properties: Vec<ExtendedProperty>,
    owner: Option<OwnerHandle>,
}

impl ExtendedPropertyCollection {
    pub fn new() -> Self {
        ExtendedPropertyCollection::default()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExtendedProperty> {
        self.properties.iter()
    }

    pub fn get(&self, definition: &ExtendedPropertyDefinition) -> Option<&MapiValue> {
        self.properties
            .iter()
            .find(|p| &p.definition == definition)
            .map(ExtendedProperty::value)
    }

    /// Sets a property, coercing `value` to the definition's MAPI type.
    pub fn set(&mut self, definition: ExtendedPropertyDefinition, value: MapiValue) -> Result<()> {
        self.merge(ExtendedProperty::new(definition, value)?);
        Ok(())
    }

    pub fn remove(&mut self, definition: &ExtendedPropertyDefinition) -> bool {
        let before = self.properties.len();
        self.properties.retain(|p| &p.definition != definition);
        before != self.properties.len()
    }

    fn merge(&mut self, property: ExtendedProperty) {
        match self
            .properties
            .iter_mut()
            .find(|p| p.definition == property.definition)
        {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
    }

    pub(crate) fn factory() -> Box<dyn ComplexProperty> {
        Box::<ExtendedPropertyCollection>::default()
    }
}

impl ComplexProperty for ExtendedPropertyCollection {
    fn load_from_xml(&mut self, reader: &mut EwsXmlReader<'_>, element_name: &str) -> Result<()> {
        let property = ExtendedProperty::load_from_xml(reader, element_name)?;
        self.properties.clear();
        self.properties.push(property);
        Ok(())
    }

    fn update_from_xml(&mut self, reader: &mut EwsXmlReader<'_>, element_name: &str) -> Result<()> {
        let property = ExtendedProperty::load_from_xml(reader, element_name)?;
        self.merge(property);
        Ok(())
    }

    fn write_to_xml(&self, writer: &mut EwsXmlWriter, element_name: &str) -> Result<()> {
        for property in &self.properties {
            property.write_to_xml(writer, element_name)?;
        }
        Ok(())
    }

    fn set_owner(&mut self, owner: OwnerHandle) {
        self.owner = Some(owner);
    }

    fn owner(&self) -> Option<OwnerHandle> {
        self.owner
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
