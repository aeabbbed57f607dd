//! Built-in nested property values.

use std::any::Any;
use std::iter::FromIterator;

use super::{ComplexProperty, OwnerHandle, TimeSpan};
use crate::error::Result;
use crate::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};

macro_rules! owned_complex_property {
    () => {
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
    };
}

/// A list of strings written as `<t:String>` children, such as an item's categories.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringList {
    items: Vec<String>,
    owner: Option<OwnerHandle>,
}

impl StringList {
    pub fn new() -> Self {
        StringList::default()
    }

    pub fn push(&mut self, item: impl Into<String>) {
        self.items.push(item.into());
    }

    pub fn remove(&mut self, item: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i != item);
        before != self.items.len()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|i| i == item)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn factory() -> Box<dyn ComplexProperty> {
        Box::<StringList>::default()
    }
}

impl<S: Into<String>> FromIterator<S> for StringList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        StringList {
            items: iter.into_iter().map(Into::into).collect(),
            owner: None,
        }
    }
}

impl ComplexProperty for StringList {
    fn load_from_xml(&mut self, reader: &mut EwsXmlReader<'_>, element_name: &str) -> Result<()> {
        self.items.clear();
        loop {
            reader.read()?;
            if reader.is_end_element_named(XmlNamespace::Types, element_name) {
                return Ok(());
            }
            if reader.is_start_element_named(XmlNamespace::Types, "String") {
                self.items.push(reader.read_element_value()?);
            } else if reader.is_start_element() {
                reader.skip_current_element()?;
            }
        }
    }

    fn write_to_xml(&self, writer: &mut EwsXmlWriter, element_name: &str) -> Result<()> {
        writer.write_start_element(XmlNamespace::Types, element_name)?;
        for item in &self.items {
            writer.write_element_value(XmlNamespace::Types, "String", item)?;
        }
        writer.write_end_element()
    }

    owned_complex_property!();
}

/// A time zone reference on a calendar item.
///
/// Exchange 2010 and later send `<t:StartTimeZone Id=".." Name=".."/>`. Exchange 2007 instead sends
/// `<t:MeetingTimeZone TimeZoneName="..">` with a `BaseOffset` child; both shapes load into the
/// same value and it is written back in whichever shape its element name calls for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeZoneDefinition {
    id: Option<String>,
    name: Option<String>,
    base_offset: Option<TimeSpan>,
    owner: Option<OwnerHandle>,
}

impl TimeZoneDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        TimeZoneDefinition {
            id: Some(id.into()),
            name: Some(name.into()),
            ..TimeZoneDefinition::default()
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The standard-time offset from UTC, only given in the legacy shape.
    pub fn base_offset(&self) -> Option<TimeSpan> {
        self.base_offset
    }

    pub fn set_base_offset(&mut self, offset: TimeSpan) {
        self.base_offset = Some(offset);
    }

    pub(crate) fn factory() -> Box<dyn ComplexProperty> {
        Box::<TimeZoneDefinition>::default()
    }
}

impl ComplexProperty for TimeZoneDefinition {
    fn load_from_xml(&mut self, reader: &mut EwsXmlReader<'_>, element_name: &str) -> Result<()> {
        self.id = reader.read_attribute_value("Id").map(str::to_string);
        self.name = reader
            .read_attribute_value("Name")
            .or_else(|| reader.read_attribute_value("TimeZoneName"))
            .map(str::to_string);
        self.base_offset = None;

        loop {
            reader.read()?;
            if reader.is_end_element_named(XmlNamespace::Types, element_name) {
                return Ok(());
            }
            if reader.is_start_element_named(XmlNamespace::Types, "BaseOffset") {
                self.base_offset = Some(reader.read_element_value_as::<TimeSpan>()?);
            } else if reader.is_start_element() {
                // transition periods and rules are not modeled
                reader.skip_current_element()?;
            }
        }
    }

    fn write_to_xml(&self, writer: &mut EwsXmlWriter, element_name: &str) -> Result<()> {
        writer.write_start_element(XmlNamespace::Types, element_name)?;
        if element_name == "MeetingTimeZone" {
            if let Some(ref name) = self.name {
                writer.write_attribute_value("TimeZoneName", name)?;
            }
            if let Some(offset) = self.base_offset {
                writer.write_element_value(XmlNamespace::Types, "BaseOffset", &offset.to_string())?;
            }
        } else {
            if let Some(ref id) = self.id {
                writer.write_attribute_value("Id", id)?;
            }
            if let Some(ref name) = self.name {
                writer.write_attribute_value("Name", name)?;
            }
        }
        writer.write_end_element()
    }

    owned_complex_property!();
}

/// A mailbox address, as carried in a `<t:Mailbox>` element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmailAddress {
    pub name: Option<String>,
    pub address: Option<String>,
    pub routing_type: Option<String>,
    pub mailbox_type: Option<String>,
    owner: Option<OwnerHandle>,
}

impl EmailAddress {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        EmailAddress {
            name: Some(name.into()),
            address: Some(address.into()),
            routing_type: Some("SMTP".to_string()),
            ..EmailAddress::default()
        }
    }

    pub(crate) fn factory() -> Box<dyn ComplexProperty> {
        Box::<EmailAddress>::default()
    }
}

impl ComplexProperty for EmailAddress {
    fn load_from_xml(&mut self, reader: &mut EwsXmlReader<'_>, element_name: &str) -> Result<()> {
        self.name = None;
        self.address = None;
        self.routing_type = None;
        self.mailbox_type = None;
        loop {
            reader.read()?;
            if reader.is_end_element_named(XmlNamespace::Types, element_name) {
                return Ok(());
            }
            if !reader.is_start_element() {
                continue;
            }
            let local_name = reader.local_name().to_string();
            let field = match local_name.as_str() {
                "Name" => &mut self.name,
                "EmailAddress" => &mut self.address,
                "RoutingType" => &mut self.routing_type,
                "MailboxType" => &mut self.mailbox_type,
                _ => {
                    reader.skip_current_element()?;
                    continue;
                }
            };
            *field = Some(reader.read_element_value()?);
        }
    }

    fn write_to_xml(&self, writer: &mut EwsXmlWriter, element_name: &str) -> Result<()> {
        writer.write_start_element(XmlNamespace::Types, element_name)?;
        for (child, value) in [
            ("Name", &self.name),
            ("EmailAddress", &self.address),
            ("RoutingType", &self.routing_type),
            ("MailboxType", &self.mailbox_type),
        ] {
            if let Some(value) = value {
                writer.write_element_value(XmlNamespace::Types, child, value)?;
            }
        }
        writer.write_end_element()
    }

    owned_complex_property!();
}
