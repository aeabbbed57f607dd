extern crate ews_wire;

use ews_wire::extensions::streaming_events::StreamingEventsHandler;
use ews_wire::schema::item;
use ews_wire::testing;
use ews_wire::xml::{EwsXmlReader, XmlNamespace};
use ews_wire::{
    OwnerHandle, PropertyBag, PropertyValue, ResponseHandler, Schema, ServiceError,
    ServiceResponseCollection, ServiceResult, SoapFaultDetails,
};

/// Reads the `m:Items` payload of a `GetItem` response into property bags.
#[derive(Debug, Default)]
struct GetItemHandler {
    items: Vec<PropertyBag>,
}

impl ResponseHandler for GetItemHandler {
    fn read_payload(
        &mut self,
        reader: &mut EwsXmlReader<'_>,
        _response_element_name: &str,
    ) -> ews_wire::Result<()> {
        reader.read_start_element(XmlNamespace::Messages, "Items")?;
        loop {
            reader.read()?;
            if reader.is_end_element_named(XmlNamespace::Messages, "Items") {
                return Ok(());
            }
            if reader.is_start_element() {
                let element_name = reader.local_name().to_string();
                let owner = OwnerHandle::new(self.items.len() as u64);
                let mut bag = PropertyBag::new(owner, reader.requested_version());
                bag.load_from_xml(reader, &element_name, Schema::message().properties())?;
                self.items.push(bag);
            }
        }
    }
}

const GET_ITEM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Header>
    <h:ServerVersionInfo xmlns:h="http://schemas.microsoft.com/exchange/services/2006/types" MajorVersion="15"/>
  </s:Header>
  <s:Body>
    <m:GetItemResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
                       xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
      <m:ResponseMessages>
        <m:GetItemResponseMessage ResponseClass="Success">
          <m:ResponseCode>NoError</m:ResponseCode>
          <m:Items>
            <t:Message>
              <t:Subject>First</t:Subject>
              <t:IsRead>false</t:IsRead>
            </t:Message>
          </m:Items>
        </m:GetItemResponseMessage>
        <m:GetItemResponseMessage ResponseClass="Error">
          <m:MessageText>The specified object was not found in the store.</m:MessageText>
          <m:ResponseCode>ErrorItemNotFound</m:ResponseCode>
          <m:DescriptiveLinkKey>0</m:DescriptiveLinkKey>
          <m:Items/>
        </m:GetItemResponseMessage>
        <m:GetItemResponseMessage ResponseClass="Warning">
          <m:MessageText>Processing stopped.</m:MessageText>
          <m:ResponseCode>ErrorBatchProcessingStopped</m:ResponseCode>
          <m:DescriptiveLinkKey>0</m:DescriptiveLinkKey>
          <m:Items/>
        </m:GetItemResponseMessage>
      </m:ResponseMessages>
    </m:GetItemResponse>
  </s:Body>
</s:Envelope>"#;

#[test]
fn batch_with_mixed_outcomes() {
    let mut reader = EwsXmlReader::new(GET_ITEM);
    assert_eq!(SoapFaultDetails::from_envelope(&mut reader).unwrap(), None);

    let responses = ServiceResponseCollection::load_from_xml(
        &mut reader,
        "GetItemResponseMessage",
        |_| GetItemHandler::default(),
    )
    .unwrap();
    assert!(reader.is_end_element_named(XmlNamespace::Messages, "ResponseMessages"));

    assert_eq!(responses.len(), 3);
    assert_eq!(responses.overall_result(), ServiceResult::Error);

    let first = &responses[0];
    assert!(first.response.throw_if_necessary().is_ok());
    assert_eq!(first.handler.items.len(), 1);
    assert_eq!(
        first.handler.items[0]
            .get(&item::SUBJECT)
            .unwrap()
            .and_then(PropertyValue::as_str),
        Some("First")
    );

    let second = &responses[1];
    assert!(second.handler.items.is_empty());
    match second.response.throw_if_necessary() {
        Err(ews_wire::Error::Protocol(e)) => {
            assert_eq!(e.error_code(), ServiceError::ErrorItemNotFound)
        }
        other => panic!("expected a protocol error, got {:?}", other),
    }

    let third = &responses[2];
    assert!(third.response.batch_processing_stopped());
    assert!(third.handler.items.is_empty());
    assert!(third.response.throw_if_necessary().is_ok());
}

#[test]
fn helpers_build_responses() {
    let response = testing::service_response::parse(
        r#"<m:UpdateItemResponseMessage
               xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
               ResponseClass="Error">
             <m:MessageText>Conflict.</m:MessageText>
             <m:ResponseCode>ErrorIrresolvableConflict</m:ResponseCode>
             <m:DescriptiveLinkKey>0</m:DescriptiveLinkKey>
           </m:UpdateItemResponseMessage>"#,
        "UpdateItemResponseMessage",
    );
    assert_eq!(response.error_code(), ServiceError::ErrorIrresolvableConflict);
    assert_eq!(
        response.error_message(),
        Some("The operation can't be performed because the item is out of date. Reload the item and try again.")
    );

    let responses = testing::response_collection::parse(
        r#"<m:ResponseMessages xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages">
             <m:MoveItemResponseMessage ResponseClass="Success"><m:ResponseCode>NoError</m:ResponseCode></m:MoveItemResponseMessage>
             <m:MoveItemResponseMessage ResponseClass="Success"><m:ResponseCode>NoError</m:ResponseCode></m:MoveItemResponseMessage>
           </m:ResponseMessages>"#,
        "MoveItemResponseMessage",
    );
    assert_eq!(responses.len(), 2);
    assert_eq!(responses.overall_result(), ServiceResult::Success);
}

#[test]
fn fault_in_place_of_a_response() {
    let fault = testing::soap_fault::parse(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body>
             <s:Fault>
               <faultcode>s:Server</faultcode>
               <faultstring>An internal server error occurred.</faultstring>
               <detail>
                 <e:ResponseCode xmlns:e="http://schemas.microsoft.com/exchange/services/2006/errors">ErrorNotYetInvented</e:ResponseCode>
               </detail>
             </s:Fault>
           </s:Body></s:Envelope>"#,
    );
    assert_eq!(fault.response_code, ServiceError::ErrorInternalServerError);

    let err = fault.into_error();
    assert_eq!(err.to_string(), "SOAP fault: An internal server error occurred.");
}

#[test]
fn streaming_events_in_a_collection() {
    let xml = r#"<m:ResponseMessages xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages">
        <m:GetStreamingEventsResponseMessage ResponseClass="Error">
            <m:MessageText>Subscription not found.</m:MessageText>
            <m:ResponseCode>ErrorSubscriptionNotFound</m:ResponseCode>
            <m:DescriptiveLinkKey>0</m:DescriptiveLinkKey>
            <m:ErrorSubscriptionIds><m:SubscriptionId>abc</m:SubscriptionId></m:ErrorSubscriptionIds>
        </m:GetStreamingEventsResponseMessage>
    </m:ResponseMessages>"#;
    let mut reader = EwsXmlReader::new(xml);
    let responses = ServiceResponseCollection::load_from_xml(
        &mut reader,
        "GetStreamingEventsResponseMessage",
        |_| StreamingEventsHandler::default(),
    )
    .unwrap();
    assert_eq!(responses[0].handler.error_subscription_ids, vec!["abc"]);
    assert_eq!(
        responses[0].response.error_code(),
        ServiceError::ErrorSubscriptionNotFound
    );
}
