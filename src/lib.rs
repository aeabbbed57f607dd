//! Property marshalling and response classification for Exchange Web Services (EWS).
//!
//! This crate is the wire core of an EWS client. It does not send requests; it reads and writes
//! the XML that travels inside SOAP envelopes:
//!
//!  - [`PropertyDefinition`]s describe how each property of a service object is named,
//!    versioned and encoded, and load or write values held in a [`PropertyBag`].
//!  - [`MapiTypeConverter`] converts extended (MAPI) property values to and from their text form.
//!  - [`ServiceResponse`] classifies one response envelope as `Success`, `Warning` or `Error`
//!    and hands any payload to a [`ResponseHandler`].
//!  - [`ServiceResponseCollection`] aggregates the per-item responses of a batch.
//!  - [`SoapFaultDetails`] decodes SOAP faults.
//!
//! # Usage
//!
//! ```
//! # use ews_wire::xml::EwsXmlReader;
//! # use ews_wire::{ServiceError, ServiceResponseCollection, ServiceResult, SoapFaultDetails};
//! let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body>
//!   <m:DeleteItemResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages">
//!     <m:ResponseMessages>
//!       <m:DeleteItemResponseMessage ResponseClass="Error">
//!         <m:MessageText>The specified object was not found in the store.</m:MessageText>
//!         <m:ResponseCode>ErrorItemNotFound</m:ResponseCode>
//!         <m:DescriptiveLinkKey>0</m:DescriptiveLinkKey>
//!       </m:DeleteItemResponseMessage>
//!     </m:ResponseMessages>
//!   </m:DeleteItemResponse>
//! </s:Body></s:Envelope>"#;
//!
//! let mut reader = EwsXmlReader::new(xml);
//! if let Some(fault) = SoapFaultDetails::from_envelope(&mut reader).unwrap() {
//!     panic!("request failed: {:?}", fault.fault_string);
//! }
//!
//! // the cursor is on m:DeleteItemResponse
//! let responses =
//!     ServiceResponseCollection::load_from_xml(&mut reader, "DeleteItemResponseMessage", |_| ())
//!         .unwrap();
//! assert_eq!(responses.overall_result(), ServiceResult::Error);
//!
//! for handled in &responses {
//!     if let Err(e) = handled.response.throw_if_necessary() {
//!         println!("delete failed: {}", e);
//!     }
//! }
//! assert_eq!(responses[0].response.error_code(), ServiceError::ErrorItemNotFound);
//! ```
//!
//! Server-side failures are data: reading an `Error` envelope succeeds, so a batch can report a
//! mix of outcomes. Call [`ServiceResponse::throw_if_necessary`] for fail-fast behavior.

mod types;

pub mod error;
pub mod extensions;
pub mod xml;

pub use crate::error::{Error, Result};
pub use types::*;

#[cfg(feature = "test_helpers")]
pub mod testing;
