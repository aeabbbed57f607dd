use enumset::EnumSet;
use log::trace;

use super::schema;
use super::{
    ComplexProperty, EffectiveRights, ExchangeVersion, PropertyBag, PropertyDefinitionFlags,
    PropertyValue, TimeSpan, WireDateTime,
};
use crate::error::{DeserializationError, Error, Result};
use crate::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};

/// Creates an empty value for a complex property, ready to be loaded.
pub type ComplexPropertyFactory = fn() -> Box<dyn ComplexProperty>;

/// How a property's value is represented, both in memory and on the wire.
#[derive(Clone, Copy, Debug)]
pub enum PropertyKind {
    Boolean,
    String,
    Integer,
    DateTime,
    TimeSpan,
    /// A string restricted to the listed wire names.
    Enumeration(&'static [&'static str]),
    EffectiveRights,
    /// A nested object read and written by the value itself.
    Complex(ComplexPropertyFactory),
    /// A nested object wrapped in one extra element, e.g. `<t:Sender><t:Mailbox>..</t:Mailbox></t:Sender>`.
    Contained {
        contained_element_name: &'static str,
        factory: ComplexPropertyFactory,
    },
}

impl PropertyKind {
    /// Does a value of this shape fit a property of this kind?
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        match (self, value) {
            (PropertyKind::Boolean, PropertyValue::Boolean(_))
            | (PropertyKind::String, PropertyValue::String(_))
            | (PropertyKind::Integer, PropertyValue::Integer(_))
            | (PropertyKind::DateTime, PropertyValue::DateTime(_))
            | (PropertyKind::TimeSpan, PropertyValue::TimeSpan(_))
            | (PropertyKind::EffectiveRights, PropertyValue::EffectiveRights(_))
            | (PropertyKind::Complex(_), PropertyValue::Complex(_))
            | (PropertyKind::Contained { .. }, PropertyValue::Complex(_)) => true,
            (PropertyKind::Enumeration(names), PropertyValue::String(s)) => names.contains(&s.as_str()),
            _ => false,
        }
    }

    fn is_reference(&self) -> bool {
        matches!(
            self,
            PropertyKind::String
                | PropertyKind::Enumeration(_)
                | PropertyKind::Complex(_)
                | PropertyKind::Contained { .. }
        )
    }
}

/// One declared property of a service object.
///
/// Definitions are created once, when the schema is first used, and never change afterwards.
/// They are shared freely between parses.
#[derive(Debug)]
pub struct PropertyDefinition {
    xml_element_name: &'static str,
    uri: &'static str,
    kind: PropertyKind,
    flags: EnumSet<PropertyDefinitionFlags>,
    version: ExchangeVersion,
    nullable: bool,
}

impl PartialEq for PropertyDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for PropertyDefinition {}

impl PropertyDefinition {
    pub fn new(
        xml_element_name: &'static str,
        uri: &'static str,
        kind: PropertyKind,
        flags: impl Into<EnumSet<PropertyDefinitionFlags>>,
        version: ExchangeVersion,
    ) -> Self {
        PropertyDefinition {
            xml_element_name,
            uri,
            kind,
            flags: flags.into(),
            version,
            nullable: kind.is_reference(),
        }
    }

    /// Overrides whether the property may be cleared. Strings and nested values may be by default.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn xml_element_name(&self) -> &'static str {
        self.xml_element_name
    }

    pub fn uri(&self) -> &'static str {
        self.uri
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn flags(&self) -> EnumSet<PropertyDefinitionFlags> {
        self.flags
    }

    /// The first protocol version that supports this property.
    pub fn version(&self) -> ExchangeVersion {
        self.version
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// The definition that governs this property's flags and element name at `version`.
    ///
    /// This is `self` unless the schema's version alias table maps it to another definition.
    pub fn effective(&self, version: ExchangeVersion) -> &PropertyDefinition {
        schema::version_alias(self.uri, version).unwrap_or(self)
    }

    pub fn has_flag(&self, flag: PropertyDefinitionFlags, version: ExchangeVersion) -> bool {
        self.effective(version).flags.contains(flag)
    }

    pub fn xml_element_name_for(&self, version: ExchangeVersion) -> &'static str {
        self.effective(version).xml_element_name
    }

    /// Reads this property's value from the element under the cursor into `bag`, leaving the
    /// cursor on the element's end.
    ///
    /// An empty leaf element leaves the property unset.
    pub fn load_property_value_from_xml(
        &'static self,
        reader: &mut EwsXmlReader<'_>,
        bag: &mut PropertyBag,
    ) -> Result<()> {
        let element_name = reader.local_name().to_string();
        trace!("loading {} from <{}>", self.uri, element_name);

        let value = match self.kind {
            PropertyKind::Complex(factory) => return self.load_complex(reader, bag, factory),
            PropertyKind::Contained {
                contained_element_name,
                factory,
            } => {
                reader.read()?;
                // an empty wrapper leaves the property unset
                if reader.is_end_element_named(XmlNamespace::Types, &element_name) {
                    return Ok(());
                }
                reader.ensure_current_node_is_start_element(XmlNamespace::Types, contained_element_name)?;
                self.load_complex(reader, bag, factory)?;
                reader.read_end_element_if_necessary(XmlNamespace::Types, contained_element_name)?;
                return reader.read_end_element(XmlNamespace::Types, &element_name);
            }
            PropertyKind::EffectiveRights => {
                PropertyValue::EffectiveRights(EffectiveRights::load_from_xml(reader, &element_name)?)
            }
            kind => {
                let mut text = reader.read_element_value()?;
                // only strings keep their surrounding whitespace
                if !matches!(kind, PropertyKind::String) {
                    text = text.trim().to_string();
                }
                if text.is_empty() {
                    return Ok(());
                }
                parse_leaf(kind, text)?
            }
        };
        bag.set_loaded(self, value);
        Ok(())
    }

    fn load_complex(
        &'static self,
        reader: &mut EwsXmlReader<'_>,
        bag: &mut PropertyBag,
        factory: ComplexPropertyFactory,
    ) -> Result<()> {
        let version = reader.requested_version();
        let element_name = reader.local_name().to_string();

        if self.has_flag(PropertyDefinitionFlags::ReuseInstance, version) {
            if let Some(existing) = bag.complex_mut(self) {
                if self.has_flag(PropertyDefinitionFlags::UpdateCollectionItems, version) {
                    existing.update_from_xml(reader, &element_name)?;
                } else {
                    existing.load_from_xml(reader, &element_name)?;
                }
                return Ok(());
            }
        }

        let mut value = factory();
        value.set_owner(bag.owner());
        value.load_from_xml(reader, &element_name)?;
        bag.set_loaded(self, PropertyValue::Complex(value));
        Ok(())
    }

    /// Writes this property's value from `bag`, or nothing if it has none.
    pub fn write_property_value_to_xml(
        &self,
        writer: &mut EwsXmlWriter,
        bag: &PropertyBag,
        is_update: bool,
    ) -> Result<()> {
        let value = match bag.value_of(self) {
            Some(value) => value,
            None => return Ok(()),
        };
        let version = bag.requested_version();
        if is_update && !self.has_flag(PropertyDefinitionFlags::CanUpdate, version) {
            return Err(Error::Argument(format!(
                "property {} cannot be updated",
                self.uri
            )));
        }
        let element_name = self.xml_element_name_for(version);

        match (self.kind, value) {
            (PropertyKind::Boolean, PropertyValue::Boolean(b)) => writer.write_element_value(
                XmlNamespace::Types,
                element_name,
                if *b { "true" } else { "false" },
            ),
            (PropertyKind::String, PropertyValue::String(s))
            | (PropertyKind::Enumeration(_), PropertyValue::String(s)) => {
                writer.write_element_value(XmlNamespace::Types, element_name, s)
            }
            (PropertyKind::Integer, PropertyValue::Integer(n)) => {
                writer.write_element_value(XmlNamespace::Types, element_name, &n.to_string())
            }
            (PropertyKind::DateTime, PropertyValue::DateTime(dt)) => {
                writer.write_element_value(XmlNamespace::Types, element_name, &dt.to_string())
            }
            (PropertyKind::TimeSpan, PropertyValue::TimeSpan(span)) => {
                writer.write_element_value(XmlNamespace::Types, element_name, &span.to_string())
            }
            (PropertyKind::EffectiveRights, PropertyValue::EffectiveRights(rights)) => {
                EffectiveRights::write_to_xml(writer, element_name, *rights)
            }
            (PropertyKind::Complex(_), PropertyValue::Complex(complex)) => {
                complex.write_to_xml(writer, element_name)
            }
            (
                PropertyKind::Contained {
                    contained_element_name,
                    ..
                },
                PropertyValue::Complex(complex),
            ) => {
                writer.write_start_element(XmlNamespace::Types, element_name)?;
                complex.write_to_xml(writer, contained_element_name)?;
                writer.write_end_element()
            }
            (_, value) => Err(Error::Argument(format!(
                "property {} holds a mismatched value {:?}",
                self.uri, value
            ))),
        }
    }
}

fn parse_leaf(kind: PropertyKind, text: String) -> Result<PropertyValue> {
    Ok(match kind {
        PropertyKind::Boolean => PropertyValue::Boolean(parse_xs_boolean(&text)?),
        PropertyKind::Integer => match text.parse::<i32>() {
            Ok(n) => PropertyValue::Integer(n),
            Err(e) => {
                return Err(Error::Deserialization(
                    DeserializationError::new(text, "Integer").because(e),
                ))
            }
        },
        PropertyKind::DateTime => PropertyValue::DateTime(WireDateTime::parse(&text)?),
        PropertyKind::TimeSpan => PropertyValue::TimeSpan(TimeSpan::parse(&text)?),
        PropertyKind::Enumeration(names) => {
            if !names.contains(&text.as_str()) {
                return Err(Error::Deserialization(
                    DeserializationError::new(text, "enumeration")
                        .because(format!("expected one of {}", names.join(", "))),
                ));
            }
            PropertyValue::String(text)
        }
        _ => PropertyValue::String(text),
    })
}

/// Parses an `xs:boolean`, which allows `1` and `0` as well as the literals.
pub(crate) fn parse_xs_boolean(text: &str) -> Result<bool> {
    match text.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(Error::Deserialization(DeserializationError::new(
            text, "Boolean",
        ))),
    }
}
