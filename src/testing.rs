//! Enable the test_helpers feature to expose helper methods to build
//! response structures from literal XML for testing your code that uses the ews-wire crate
//!
//! To use add a dev-dependency on the ews-wire crate adding the feature "test_helpers"
//! e.g.
//!
//! ```toml
//! [dependencies]
//! ews-wire = { version = "0.1" }
//!
//! [dev-dependencies]
//! # mirror the same configuration your dependencies and add test_helpers
//! ews-wire = { version = "0.1", features = ["test_helpers"] }
//! ```
//!
//! Every helper panics if the input does not parse.
#[cfg(doc)]
use crate::types::*;

/// Methods to build a [`ServiceResponse`] object
pub mod service_response {
    use crate::types::ServiceResponse;
    use crate::xml::EwsXmlReader;

    /// Builds a [`ServiceResponse`] from a single response envelope
    ///
    /// Example input.
    ///
    /// ```
    /// let input = r#"<m:DeleteItemResponseMessage
    ///     xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
    ///     ResponseClass="Success">
    ///   <m:ResponseCode>NoError</m:ResponseCode>
    /// </m:DeleteItemResponseMessage>"#;
    /// let response = ews_wire::testing::service_response::parse(input, "DeleteItemResponseMessage");
    /// assert_eq!(response.result(), ews_wire::ServiceResult::Success);
    /// ```
    pub fn parse(input: &str, response_element_name: &str) -> ServiceResponse {
        let mut reader = EwsXmlReader::new(input);
        ServiceResponse::load_from_xml(&mut reader, response_element_name).unwrap()
    }
}

/// Methods to build a [`ServiceResponseCollection`] object
pub mod response_collection {
    use crate::types::{ServiceResponse, ServiceResponseCollection};
    use crate::xml::EwsXmlReader;

    /// Builds a [`ServiceResponseCollection`] from a `m:ResponseMessages` block
    ///
    /// Example input.
    ///
    /// ```
    /// let input = r#"<m:ResponseMessages
    ///     xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages">
    ///   <m:DeleteItemResponseMessage ResponseClass="Success">
    ///     <m:ResponseCode>NoError</m:ResponseCode>
    ///   </m:DeleteItemResponseMessage>
    ///   <m:DeleteItemResponseMessage ResponseClass="Warning">
    ///     <m:MessageText>Stopped.</m:MessageText>
    ///     <m:ResponseCode>ErrorBatchProcessingStopped</m:ResponseCode>
    ///     <m:DescriptiveLinkKey>0</m:DescriptiveLinkKey>
    ///   </m:DeleteItemResponseMessage>
    /// </m:ResponseMessages>"#;
    /// let responses = ews_wire::testing::response_collection::parse(input, "DeleteItemResponseMessage");
    /// assert_eq!(responses.overall_result(), ews_wire::ServiceResult::Warning);
    /// ```
    pub fn parse(
        input: &str,
        response_element_name: &str,
    ) -> ServiceResponseCollection<ServiceResponse> {
        let mut reader = EwsXmlReader::new(input);
        ServiceResponseCollection::load_from_xml(&mut reader, response_element_name, |_| ())
            .unwrap()
            .into_iter()
            .map(|handled| handled.response)
            .collect()
    }
}

/// Methods to build a [`SoapFaultDetails`] object
pub mod soap_fault {
    use crate::types::SoapFaultDetails;
    use crate::xml::EwsXmlReader;

    /// Builds a [`SoapFaultDetails`] from a whole SOAP envelope whose body is a fault
    ///
    /// Example input.
    ///
    /// ```
    /// let input = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body>
    ///   <s:Fault>
    ///     <faultcode>s:Client</faultcode>
    ///     <faultstring>The request failed schema validation.</faultstring>
    ///   </s:Fault>
    /// </s:Body></s:Envelope>"#;
    /// let fault = ews_wire::testing::soap_fault::parse(input);
    /// assert_eq!(fault.fault_code.as_deref(), Some("s:Client"));
    /// ```
    pub fn parse(input: &str) -> SoapFaultDetails {
        let mut reader = EwsXmlReader::new(input);
        SoapFaultDetails::from_envelope(&mut reader)
            .unwrap()
            .expect("envelope body holds no fault")
    }
}

/// Methods to build a [`PropertyBag`] object
pub mod property_bag {
    use crate::types::{ExchangeVersion, OwnerHandle, PropertyBag, Schema};
    use crate::xml::EwsXmlReaderBuilder;

    /// Builds a [`PropertyBag`] by reading the object element `element_name` against `schema`
    ///
    /// Example input.
    ///
    /// ```
    /// use ews_wire::{schema::item, ExchangeVersion, Schema};
    ///
    /// let input = r#"<t:Message
    ///     xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
    ///   <t:Subject>Lunch</t:Subject>
    ///   <t:Size>1024</t:Size>
    /// </t:Message>"#;
    /// let bag = ews_wire::testing::property_bag::parse(
    ///     input,
    ///     "Message",
    ///     Schema::message(),
    ///     ExchangeVersion::Exchange2013,
    /// );
    /// assert_eq!(bag.get(&item::SIZE).unwrap().and_then(|v| v.as_integer()), Some(1024));
    /// ```
    pub fn parse(
        input: &str,
        element_name: &str,
        schema: &Schema,
        version: ExchangeVersion,
    ) -> PropertyBag {
        let mut reader = EwsXmlReaderBuilder::new(input)
            .requested_version(version)
            .build();
        let mut bag = PropertyBag::new(OwnerHandle::new(0), version);
        bag.load_from_xml(&mut reader, element_name, schema.properties())
            .unwrap();
        bag
    }
}
