extern crate ews_wire;

use ews_wire::schema::{calendar, item, message};
use ews_wire::xml::{EwsXmlReaderBuilder, EwsXmlWriter, XmlNamespace};
use ews_wire::{
    DefaultExtendedPropertySet, EffectiveRights, EmailAddress, ExchangeVersion,
    ExtendedPropertyCollection, ExtendedPropertyDefinition, MapiPropertyType, MapiValue,
    OwnerHandle, PropertyBag, PropertyDefinition, PropertyValue, Schema, StringList,
    TimeZoneDefinition, WireDateTime,
};

const MESSAGE: &str = r#"<t:Message xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
  <t:ItemId Id="AAMkAGI=" ChangeKey="CQAAABYA"/>
  <t:Subject>Quarterly numbers</t:Subject>
  <t:DateTimeReceived>2020-01-01T08:30:00Z</t:DateTimeReceived>
  <t:Size>2048</t:Size>
  <t:Categories><t:String>Finance</t:String><t:String>Q1</t:String></t:Categories>
  <t:Importance>High</t:Importance>
  <t:IsDraft>false</t:IsDraft>
  <t:ExtendedProperty>
    <t:ExtendedFieldURI DistinguishedPropertySetId="PublicStrings" PropertyName="Keywords" PropertyType="StringArray"/>
    <t:Values><t:Value>alpha</t:Value><t:Value>beta</t:Value></t:Values>
  </t:ExtendedProperty>
  <t:ExtendedProperty>
    <t:ExtendedFieldURI PropertyTag="0x1081" PropertyType="Integer"/>
    <t:Value>261</t:Value>
  </t:ExtendedProperty>
  <t:EffectiveRights>
    <t:CreateAssociated>false</t:CreateAssociated>
    <t:CreateContents>false</t:CreateContents>
    <t:CreateHierarchy>false</t:CreateHierarchy>
    <t:Delete>true</t:Delete>
    <t:Modify>true</t:Modify>
    <t:Read>true</t:Read>
  </t:EffectiveRights>
  <t:Sender>
    <t:Mailbox><t:Name>Pat</t:Name><t:EmailAddress>pat@example.com</t:EmailAddress><t:RoutingType>SMTP</t:RoutingType></t:Mailbox>
  </t:Sender>
  <t:IsRead>true</t:IsRead>
</t:Message>"#;

fn load(xml: &str, element_name: &str, schema: &Schema, version: ExchangeVersion) -> PropertyBag {
    let mut reader = EwsXmlReaderBuilder::new(xml)
        .requested_version(version)
        .build();
    let mut bag = PropertyBag::new(OwnerHandle::new(42), version);
    bag.load_from_xml(&mut reader, element_name, schema.properties())
        .unwrap();
    assert!(reader.is_end_element_named(XmlNamespace::Types, element_name));
    bag
}

#[test]
fn loads_a_whole_message() {
    let bag = load(MESSAGE, "Message", Schema::message(), ExchangeVersion::Exchange2013_SP1);

    let value = |def: &PropertyDefinition| bag.get(def).unwrap();
    assert_eq!(
        value(&item::SUBJECT).and_then(PropertyValue::as_str),
        Some("Quarterly numbers")
    );
    assert_eq!(
        value(&item::DATE_TIME_RECEIVED).and_then(PropertyValue::as_date_time),
        WireDateTime::utc(2020, 1, 1, 8, 30, 0)
    );
    assert_eq!(value(&item::SIZE).and_then(PropertyValue::as_integer), Some(2048));
    assert_eq!(value(&item::IMPORTANCE).and_then(PropertyValue::as_str), Some("High"));
    assert_eq!(value(&item::IS_DRAFT).and_then(PropertyValue::as_bool), Some(false));
    assert_eq!(value(&message::IS_READ).and_then(PropertyValue::as_bool), Some(true));

    let rights = value(&item::EFFECTIVE_RIGHTS)
        .and_then(PropertyValue::as_effective_rights)
        .unwrap();
    assert_eq!(
        rights,
        EffectiveRights::Delete | EffectiveRights::Modify | EffectiveRights::Read
    );

    let categories = bag.get_complex::<StringList>(&item::CATEGORIES).unwrap().unwrap();
    assert_eq!(categories.iter().collect::<Vec<_>>(), vec!["Finance", "Q1"]);

    let sender = bag.get_complex::<EmailAddress>(&message::SENDER).unwrap().unwrap();
    assert_eq!(sender.name.as_deref(), Some("Pat"));
    assert_eq!(sender.address.as_deref(), Some("pat@example.com"));
    assert_eq!(sender.routing_type.as_deref(), Some("SMTP"));
    assert!(!bag.contains(&message::FROM).unwrap());

    // both ExtendedProperty siblings land in one collection
    let extended = bag
        .get_complex::<ExtendedPropertyCollection>(&item::EXTENDED_PROPERTIES)
        .unwrap()
        .unwrap();
    assert_eq!(extended.len(), 2);
    let keywords = ExtendedPropertyDefinition::with_name(
        DefaultExtendedPropertySet::PublicStrings,
        "Keywords",
        MapiPropertyType::StringArray,
    )
    .unwrap();
    assert_eq!(
        extended.get(&keywords),
        Some(&MapiValue::Array(vec![
            MapiValue::String("alpha".to_string()),
            MapiValue::String("beta".to_string()),
        ]))
    );
    let icon = ExtendedPropertyDefinition::with_tag(0x1081, MapiPropertyType::Integer);
    assert_eq!(extended.get(&icon), Some(&MapiValue::Integer(261)));

    // loading is not a change
    assert_eq!(bag.changed_properties().count(), 0);
}

#[test]
fn update_writes_only_changed_properties() {
    let mut bag = load(MESSAGE, "Message", Schema::message(), ExchangeVersion::Exchange2013_SP1);
    bag.set(&item::SUBJECT, Some("Revised numbers".into())).unwrap();
    bag.set(&message::IS_READ, Some(false.into())).unwrap();

    let mut writer = EwsXmlWriter::new();
    bag.write_to_xml(&mut writer, Schema::message().properties(), true)
        .unwrap();
    assert_eq!(
        writer.into_string().unwrap(),
        "<t:Subject>Revised numbers</t:Subject><t:IsRead>false</t:IsRead>"
    );

    // Size cannot be updated
    bag.set(&item::SIZE, Some(1i32.into())).unwrap();
    let mut writer = EwsXmlWriter::new();
    assert!(bag
        .write_to_xml(&mut writer, Schema::message().properties(), true)
        .is_err());
}

#[test]
fn sender_round_trips_through_its_mailbox() {
    let mut bag = PropertyBag::new(OwnerHandle::new(1), ExchangeVersion::Exchange2010);
    bag.set(
        &message::FROM,
        Some(Box::new(EmailAddress::new("Sam", "sam@example.com")).into()),
    )
    .unwrap();

    let mut writer = EwsXmlWriter::new();
    writer
        .write_start_document_element(XmlNamespace::Types, "Message")
        .unwrap();
    bag.write_to_xml(&mut writer, Schema::message().properties(), false)
        .unwrap();
    writer.write_end_element().unwrap();
    let xml = writer.into_string().unwrap();
    assert!(xml.contains(
        "<t:From><t:Mailbox><t:Name>Sam</t:Name><t:EmailAddress>sam@example.com</t:EmailAddress>\
         <t:RoutingType>SMTP</t:RoutingType></t:Mailbox></t:From>"
    ));

    let reloaded = load(&xml, "Message", Schema::message(), ExchangeVersion::Exchange2010);
    let from = reloaded
        .get_complex::<EmailAddress>(&message::FROM)
        .unwrap()
        .unwrap();
    assert_eq!(from.address.as_deref(), Some("sam@example.com"));
}

#[test]
fn start_time_zone_uses_legacy_shape_on_2007() {
    let zone = || -> Option<PropertyValue> {
        let mut tz = TimeZoneDefinition::new("Pacific Standard Time", "Pacific Standard Time");
        tz.set_base_offset("PT8H".parse().unwrap());
        Some(Box::new(tz).into())
    };

    let mut legacy = PropertyBag::new(OwnerHandle::new(1), ExchangeVersion::Exchange2007_SP1);
    legacy.set(&calendar::START_TIME_ZONE, zone()).unwrap();
    let mut writer = EwsXmlWriter::new();
    legacy
        .write_to_xml(&mut writer, Schema::calendar_item().properties(), false)
        .unwrap();
    assert_eq!(
        writer.into_string().unwrap(),
        "<t:MeetingTimeZone TimeZoneName=\"Pacific Standard Time\">\
         <t:BaseOffset>P0DT8H0M0S</t:BaseOffset></t:MeetingTimeZone>"
    );

    let mut modern = PropertyBag::new(OwnerHandle::new(1), ExchangeVersion::Exchange2010);
    modern.set(&calendar::START_TIME_ZONE, zone()).unwrap();
    let mut writer = EwsXmlWriter::new();
    modern
        .write_to_xml(&mut writer, Schema::calendar_item().properties(), false)
        .unwrap();
    assert_eq!(
        writer.into_string().unwrap(),
        "<t:StartTimeZone Id=\"Pacific Standard Time\" Name=\"Pacific Standard Time\"/>"
    );
}

#[test]
fn end_time_zone_needs_exchange_2010() {
    let mut bag = PropertyBag::new(OwnerHandle::new(1), ExchangeVersion::Exchange2007_SP1);
    let err = bag
        .set(
            &calendar::END_TIME_ZONE,
            Some(Box::new(TimeZoneDefinition::new("UTC", "UTC")).into()),
        )
        .unwrap_err();
    assert!(matches!(err, ews_wire::Error::Version(_)));
    assert!(matches!(
        bag.get(&calendar::END_TIME_ZONE),
        Err(ews_wire::Error::Version(_))
    ));
}

#[test]
fn duration_and_workspace_url() {
    let xml = r#"<t:CalendarItem xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
      <t:Duration>PT1H30M</t:Duration>
      <t:MeetingWorkspaceUrl/>
    </t:CalendarItem>"#;
    let bag = load(
        xml,
        "CalendarItem",
        Schema::calendar_item(),
        ExchangeVersion::Exchange2010_SP2,
    );
    let duration = bag
        .get(&calendar::DURATION)
        .unwrap()
        .and_then(PropertyValue::as_time_span)
        .unwrap();
    assert_eq!(duration.to_string(), "P0DT1H30M0S");
    // an empty leaf leaves the property unset
    assert!(!bag.contains(&calendar::MEETING_WORKSPACE_URL).unwrap());
}
