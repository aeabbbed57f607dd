use std::any::Any;
use std::fmt;

use enumset::EnumSet;

use super::{
    EffectiveRights, ExchangeVersion, PropertyDefinition, TimeSpan, WireDateTime,
};
use crate::error::{Error, Result, VersionError};
use crate::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};

/// A non-owning reference from a nested value back to the service object that holds it.
///
/// The owner keeps its nested values; a nested value only remembers which owner it belongs to.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct OwnerHandle(u64);

impl OwnerHandle {
    pub const fn new(id: u64) -> Self {
        OwnerHandle(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// A nested object value that knows how to read and write its own XML.
///
/// `load_from_xml` and `update_from_xml` are entered with the cursor on the value's start
/// element (named `element_name`) and must leave it on the matching end element.
pub trait ComplexProperty: fmt::Debug + Any {
    /// Replaces the contents of this value with the element under the cursor.
    fn load_from_xml(&mut self, reader: &mut EwsXmlReader<'_>, element_name: &str) -> Result<()>;

    /// Merges the element under the cursor into this value. Collections that support incremental
    /// updates override this; everything else reloads.
    fn update_from_xml(&mut self, reader: &mut EwsXmlReader<'_>, element_name: &str) -> Result<()> {
        self.load_from_xml(reader, element_name)
    }

    /// Writes this value as an element named `element_name` in the types namespace.
    fn write_to_xml(&self, writer: &mut EwsXmlWriter, element_name: &str) -> Result<()>;

    fn set_owner(&mut self, owner: OwnerHandle);

    fn owner(&self) -> Option<OwnerHandle>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// The in-memory value of one property of a service object.
#[derive(Debug)]
pub enum PropertyValue {
    Boolean(bool),
    String(String),
    Integer(i32),
    DateTime(WireDateTime),
    TimeSpan(TimeSpan),
    EffectiveRights(EnumSet<EffectiveRights>),
    Complex(Box<dyn ComplexProperty>),
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            PropertyValue::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match *self {
            PropertyValue::Integer(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<WireDateTime> {
        match *self {
            PropertyValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_time_span(&self) -> Option<TimeSpan> {
        match *self {
            PropertyValue::TimeSpan(span) => Some(span),
            _ => None,
        }
    }

    pub fn as_effective_rights(&self) -> Option<EnumSet<EffectiveRights>> {
        match *self {
            PropertyValue::EffectiveRights(rights) => Some(rights),
            _ => None,
        }
    }

    /// Downcasts a complex value to its concrete type.
    pub fn as_complex<T: ComplexProperty>(&self) -> Option<&T> {
        match self {
            PropertyValue::Complex(value) => value.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i32> for PropertyValue {
    fn from(n: i32) -> Self {
        PropertyValue::Integer(n)
    }
}

impl From<WireDateTime> for PropertyValue {
    fn from(dt: WireDateTime) -> Self {
        PropertyValue::DateTime(dt)
    }
}

impl From<TimeSpan> for PropertyValue {
    fn from(span: TimeSpan) -> Self {
        PropertyValue::TimeSpan(span)
    }
}

impl From<EnumSet<EffectiveRights>> for PropertyValue {
    fn from(rights: EnumSet<EffectiveRights>) -> Self {
        PropertyValue::EffectiveRights(rights)
    }
}

impl<T: ComplexProperty> From<Box<T>> for PropertyValue {
    fn from(value: Box<T>) -> Self {
        PropertyValue::Complex(value)
    }
}

/// The property values of one service object.
///
/// Values are keyed by their property definition. Accessing a property that the bag's requested
/// version does not support is a [`VersionError`]; loading from XML is not checked since the
/// server only sends what it supports.
#[derive(Debug)]
pub struct PropertyBag {
    owner: OwnerHandle,
    requested_version: ExchangeVersion,
    properties: Vec<(&'static PropertyDefinition, PropertyValue)>,
    changed: Vec<&'static str>,
}

impl PropertyBag {
    pub fn new(owner: OwnerHandle, requested_version: ExchangeVersion) -> Self {
        PropertyBag {
            owner,
            requested_version,
            properties: Vec::new(),
            changed: Vec::new(),
        }
    }

    pub fn owner(&self) -> OwnerHandle {
        self.owner
    }

    pub fn requested_version(&self) -> ExchangeVersion {
        self.requested_version
    }

    fn check_version(&self, definition: &PropertyDefinition) -> Result<()> {
        if definition.version() > self.requested_version {
            return Err(Error::Version(VersionError {
                property: definition.xml_element_name(),
                minimum: definition.version(),
                requested: self.requested_version,
            }));
        }
        Ok(())
    }

    fn position(&self, definition: &PropertyDefinition) -> Option<usize> {
        self.properties
            .iter()
            .position(|(d, _)| d.uri() == definition.uri())
    }

    /// The value of a property, if it has one.
    pub fn get(&self, definition: &PropertyDefinition) -> Result<Option<&PropertyValue>> {
        self.check_version(definition)?;
        Ok(self.value_of(definition))
    }

    /// The value of a complex property, downcast to its concrete type.
    pub fn get_complex<T: ComplexProperty>(&self, definition: &PropertyDefinition) -> Result<Option<&T>> {
        Ok(self.get(definition)?.and_then(PropertyValue::as_complex::<T>))
    }

    pub fn contains(&self, definition: &PropertyDefinition) -> Result<bool> {
        self.check_version(definition)?;
        Ok(self.position(definition).is_some())
    }

    /// Sets or, with `None`, clears a property and records it as changed.
    pub fn set(
        &mut self,
        definition: &'static PropertyDefinition,
        value: Option<PropertyValue>,
    ) -> Result<()> {
        self.check_version(definition)?;
        match value {
            None => {
                if !definition.is_nullable() {
                    return Err(Error::Argument(format!(
                        "property {} cannot be set to null",
                        definition.uri()
                    )));
                }
                self.take(definition);
            }
            Some(mut value) => {
                if !definition.kind().accepts(&value) {
                    return Err(Error::Argument(format!(
                        "property {} does not accept a {:?} value",
                        definition.uri(),
                        value
                    )));
                }
                if let PropertyValue::Complex(ref mut complex) = value {
                    complex.set_owner(self.owner);
                }
                self.insert(definition, value);
            }
        }
        if !self.changed.contains(&definition.uri()) {
            self.changed.push(definition.uri());
        }
        Ok(())
    }

    pub fn remove(&mut self, definition: &'static PropertyDefinition) -> Result<Option<PropertyValue>> {
        self.check_version(definition)?;
        let removed = self.take(definition);
        if removed.is_some() && !self.changed.contains(&definition.uri()) {
            self.changed.push(definition.uri());
        }
        Ok(removed)
    }

    pub fn is_changed(&self, definition: &PropertyDefinition) -> bool {
        self.changed.contains(&definition.uri())
    }

    /// The URIs of properties set or removed since the last [`clear_change_log`](Self::clear_change_log).
    pub fn changed_properties(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.changed.iter().copied()
    }

    pub fn clear_change_log(&mut self) {
        self.changed.clear();
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub(crate) fn value_of(&self, definition: &PropertyDefinition) -> Option<&PropertyValue> {
        self.position(definition).map(|i| &self.properties[i].1)
    }

    pub(crate) fn complex_mut(
        &mut self,
        definition: &PropertyDefinition,
    ) -> Option<&mut Box<dyn ComplexProperty>> {
        let i = self.position(definition)?;
        match self.properties[i].1 {
            PropertyValue::Complex(ref mut value) => Some(value),
            _ => None,
        }
    }

    /// Stores a value read from the server without marking it changed.
    pub(crate) fn set_loaded(&mut self, definition: &'static PropertyDefinition, value: PropertyValue) {
        self.insert(definition, value);
    }

    fn insert(&mut self, definition: &'static PropertyDefinition, value: PropertyValue) {
        match self.position(definition) {
            Some(i) => self.properties[i].1 = value,
            None => self.properties.push((definition, value)),
        }
    }

    fn take(&mut self, definition: &PropertyDefinition) -> Option<PropertyValue> {
        self.position(definition)
            .map(|i| self.properties.remove(i).1)
    }

    /// Reads the properties of the object element under the cursor.
    ///
    /// Each child element is matched by element name, for the reader's requested version, against
    /// `schema`; children that match nothing are skipped. The cursor is left on the object's end
    /// element.
    pub fn load_from_xml(
        &mut self,
        reader: &mut EwsXmlReader<'_>,
        element_name: &str,
        schema: &[&'static PropertyDefinition],
    ) -> Result<()> {
        if !reader.is_start_element_named(XmlNamespace::Types, element_name) {
            reader.read_start_element(XmlNamespace::Types, element_name)?;
        }
        let version = reader.requested_version();

        loop {
            reader.read()?;
            if reader.is_end_element_named(XmlNamespace::Types, element_name) {
                return Ok(());
            }
            if !reader.is_start_element() {
                continue;
            }

            let definition = schema
                .iter()
                .copied()
                .find(|d| d.xml_element_name_for(version) == reader.local_name());
            match definition {
                Some(definition) => definition.load_property_value_from_xml(reader, self)?,
                None => reader.skip_current_element()?,
            }
        }
    }

    /// Writes the present properties in `schema` order. On update only changed properties are
    /// written.
    pub fn write_to_xml(
        &self,
        writer: &mut EwsXmlWriter,
        schema: &[&'static PropertyDefinition],
        is_update: bool,
    ) -> Result<()> {
        for definition in schema {
            if is_update && !self.is_changed(definition) {
                continue;
            }
            definition.write_property_value_to_xml(writer, self, is_update)?;
        }
        Ok(())
    }
}
