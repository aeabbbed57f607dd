use enumset::{EnumSet, EnumSetType};

use crate::error::Result;
use crate::types::property_definition::parse_xs_boolean;
use crate::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};

/// Behaviors a property definition may opt into.
#[derive(Debug, EnumSetType)]
pub enum PropertyDefinitionFlags {
    /// The value is created empty when first read, even if the server omitted it.
    AutoInstantiateOnRead,
    /// A nested value already held by the owner is reloaded in place instead of replaced.
    ReuseInstance,
    /// The property can be set when the object is created.
    CanSet,
    /// The property can be changed in an update.
    CanUpdate,
    /// The property can be deleted in an update.
    CanDelete,
    /// The property can be used in a search restriction.
    CanFind,
    /// The property is only returned when explicitly requested.
    MustBeExplicitlyLoaded,
    /// A reused collection merges the incoming items instead of being reloaded.
    UpdateCollectionItems,
}

/// The permissions the authenticated user holds on an item or folder.
#[derive(Debug, EnumSetType)]
pub enum EffectiveRights {
    CreateAssociated,
    CreateContents,
    CreateHierarchy,
    Delete,
    Modify,
    Read,
    ViewPrivateItems,
}

impl EffectiveRights {
    fn element_name(self) -> &'static str {
        match self {
            EffectiveRights::CreateAssociated => "CreateAssociated",
            EffectiveRights::CreateContents => "CreateContents",
            EffectiveRights::CreateHierarchy => "CreateHierarchy",
            EffectiveRights::Delete => "Delete",
            EffectiveRights::Modify => "Modify",
            EffectiveRights::Read => "Read",
            EffectiveRights::ViewPrivateItems => "ViewPrivateItems",
        }
    }

    /// Reads an `EffectiveRights` element; the cursor must be on its start element and is left on
    /// its end element.
    pub(crate) fn load_from_xml(
        reader: &mut EwsXmlReader<'_>,
        element_name: &str,
    ) -> Result<EnumSet<EffectiveRights>> {
        let mut rights = EnumSet::new();
        reader.ensure_current_node_is_start_element(XmlNamespace::Types, element_name)?;

        loop {
            reader.read()?;
            if reader.is_end_element_named(XmlNamespace::Types, element_name) {
                return Ok(rights);
            }
            if !reader.is_start_element() {
                continue;
            }

            let right = match reader.local_name() {
                "CreateAssociated" => Some(EffectiveRights::CreateAssociated),
                "CreateContents" => Some(EffectiveRights::CreateContents),
                "CreateHierarchy" => Some(EffectiveRights::CreateHierarchy),
                "Delete" => Some(EffectiveRights::Delete),
                "Modify" => Some(EffectiveRights::Modify),
                "Read" => Some(EffectiveRights::Read),
                // TODO: decode ViewPrivateItems once servers that send it are covered by tests.
                _ => None,
            };
            match right {
                Some(right) => {
                    if parse_xs_boolean(&reader.read_element_value()?)? {
                        rights |= right;
                    }
                }
                None => reader.skip_current_element()?,
            }
        }
    }

    pub(crate) fn write_to_xml(
        writer: &mut EwsXmlWriter,
        element_name: &str,
        rights: EnumSet<EffectiveRights>,
    ) -> Result<()> {
        writer.write_start_element(XmlNamespace::Types, element_name)?;
        for right in EnumSet::<EffectiveRights>::all()
            .iter()
            .filter(|r| *r != EffectiveRights::ViewPrivateItems)
        {
            writer.write_element_value(
                XmlNamespace::Types,
                right.element_name(),
                if rights.contains(right) { "true" } else { "false" },
            )?;
        }
        writer.write_end_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_rights() {
        let xml = r#"<t:EffectiveRights xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
            <t:CreateAssociated>false</t:CreateAssociated>
            <t:CreateContents>true</t:CreateContents>
            <t:CreateHierarchy>false</t:CreateHierarchy>
            <t:Delete>true</t:Delete>
            <t:Modify>true</t:Modify>
            <t:Read>true</t:Read>
            <t:ViewPrivateItems>true</t:ViewPrivateItems>
        </t:EffectiveRights>"#;
        let mut reader = EwsXmlReader::new(xml);
        reader.read().unwrap();
        let rights = EffectiveRights::load_from_xml(&mut reader, "EffectiveRights").unwrap();
        assert_eq!(
            rights,
            EffectiveRights::CreateContents
                | EffectiveRights::Delete
                | EffectiveRights::Modify
                | EffectiveRights::Read
        );
        assert!(!rights.contains(EffectiveRights::ViewPrivateItems));
        assert!(reader.is_end_element_named(XmlNamespace::Types, "EffectiveRights"));
    }

    #[test]
    fn numeric_booleans() {
        let xml = r#"<t:EffectiveRights xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
            <t:CreateAssociated>0</t:CreateAssociated>
            <t:Delete>1</t:Delete>
            <t:Read>true</t:Read>
        </t:EffectiveRights>"#;
        let mut reader = EwsXmlReader::new(xml);
        reader.read().unwrap();
        let rights = EffectiveRights::load_from_xml(&mut reader, "EffectiveRights").unwrap();
        assert_eq!(rights, EffectiveRights::Delete | EffectiveRights::Read);

        let mut reader = EwsXmlReader::new(
            r#"<t:EffectiveRights xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types"><t:Read>yes</t:Read></t:EffectiveRights>"#,
        );
        reader.read().unwrap();
        assert!(matches!(
            EffectiveRights::load_from_xml(&mut reader, "EffectiveRights"),
            Err(crate::error::Error::Deserialization(_))
        ));
    }

    #[test]
    fn round_trip() {
        let rights = EffectiveRights::Read | EffectiveRights::CreateHierarchy;
        let mut writer = EwsXmlWriter::new();
        writer
            .write_start_document_element(XmlNamespace::Messages, "Root")
            .unwrap();
        EffectiveRights::write_to_xml(&mut writer, "EffectiveRights", rights).unwrap();
        let xml = writer.into_string().unwrap();

        let mut reader = EwsXmlReader::new(&xml);
        reader.read().unwrap();
        reader
            .read_start_element(XmlNamespace::Types, "EffectiveRights")
            .unwrap();
        assert_eq!(
            EffectiveRights::load_from_xml(&mut reader, "EffectiveRights").unwrap(),
            rights
        );
    }
}
