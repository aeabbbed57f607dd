use std::collections::BTreeMap;

use log::{debug, warn};
use thiserror::Error;

use super::{PropertyDefinitionResolver, PropertyPath, Schema, ServiceError, ServiceResult};
use crate::error::{DeserializationError, Error, Result};
use crate::xml::{EwsXmlReader, XmlNamespace};

const IRRESOLVABLE_CONFLICT_MESSAGE: &str =
    "The operation can't be performed because the item is out of date. Reload the item and try again.";

/// Hooks through which an operation-specific response takes part in reading its envelope.
///
/// Every method has a default, so `()` handles a response that carries nothing beyond its
/// outcome.
pub trait ResponseHandler {
    /// Reads the operation-specific payload of a `Success` or `Warning` envelope.
    ///
    /// Entered with the cursor on the end of the last header element (`ResponseCode` or
    /// `DescriptiveLinkKey`). It must leave the cursor either on the last node it consumed or on
    /// the envelope's end element. The default skips every child up to the envelope's end.
    fn read_payload(
        &mut self,
        reader: &mut EwsXmlReader<'_>,
        response_element_name: &str,
    ) -> Result<()> {
        skip_to_end(reader, response_element_name)
    }

    /// Offered each child of an `Error` envelope after its header that is not a `MessageXml`
    /// block.
    ///
    /// Return `true` after consuming the element (cursor on its end element), or `false` to have
    /// it skipped.
    fn load_extra_error_details(
        &mut self,
        _reader: &mut EwsXmlReader<'_>,
        _element_name: &str,
    ) -> Result<bool> {
        Ok(false)
    }

    /// A clearer message to report for `code` in place of the server's.
    fn error_message_override(&self, _code: ServiceError) -> Option<String> {
        None
    }

    /// Called once the response is fully classified.
    fn loaded(&mut self, _response: &ServiceResponse) {}

    /// Resolves `FieldURI` references in error payloads.
    fn resolver(&self) -> &dyn PropertyDefinitionResolver {
        Schema::global()
    }
}

impl ResponseHandler for () {}

/// The outcome of one operation within a response, as read from its response envelope.
///
/// A server-side failure is *data* here: loading an `Error` envelope succeeds, and the failure
/// only becomes an [`Error`] through [`ServiceResponse::throw_if_necessary`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceResponse {
    result: ServiceResult,
    error_code: ServiceError,
    error_message: Option<String>,
    error_details: BTreeMap<String, String>,
    error_properties: Vec<PropertyPath>,
}

impl ServiceResponse {
    pub fn new(result: ServiceResult, error_code: ServiceError, error_message: Option<String>) -> Self {
        ServiceResponse {
            result,
            error_code,
            error_message,
            ..ServiceResponse::default()
        }
    }

    pub fn result(&self) -> ServiceResult {
        self.result
    }

    pub fn error_code(&self) -> ServiceError {
        self.error_code
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Name/value pairs from the envelope's `MessageXml` block.
    pub fn error_details(&self) -> &BTreeMap<String, String> {
        &self.error_details
    }

    /// The properties a failure was reported against.
    pub fn error_properties(&self) -> &[PropertyPath] {
        &self.error_properties
    }

    /// Whether the server stopped processing the batch before reaching this item.
    ///
    /// Servers report this as a `Warning`, but the code is honored on a `Success` envelope too.
    /// An `Error` envelope is never treated as stopped.
    pub fn batch_processing_stopped(&self) -> bool {
        self.result != ServiceResult::Error
            && self.error_code == ServiceError::ErrorBatchProcessingStopped
    }

    /// Reads a response envelope that has no payload of interest.
    pub fn load_from_xml(reader: &mut EwsXmlReader<'_>, response_element_name: &str) -> Result<Self> {
        ServiceResponse::load_from_xml_with_handler(reader, response_element_name, &mut ())
    }

    /// Reads the response envelope named `response_element_name`, in the messages namespace.
    ///
    /// The cursor may be on the envelope's start element or just before it. It is left on the
    /// envelope's end element.
    pub fn load_from_xml_with_handler<H: ResponseHandler + ?Sized>(
        reader: &mut EwsXmlReader<'_>,
        response_element_name: &str,
        handler: &mut H,
    ) -> Result<Self> {
        if !reader.is_start_element_named(XmlNamespace::Messages, response_element_name) {
            reader.read_start_element(XmlNamespace::Messages, response_element_name)?;
        }

        let mut response = ServiceResponse {
            result: response_class(reader)?,
            ..ServiceResponse::default()
        };

        match response.result {
            ServiceResult::Success | ServiceResult::Warning => {
                let warning = response.result == ServiceResult::Warning;
                if warning {
                    response.error_message = Some(
                        reader.read_element_value_named(XmlNamespace::Messages, "MessageText")?,
                    );
                }
                response.error_code = read_response_code(reader)?;
                if warning {
                    read_descriptive_link_key(reader)?;
                }

                if response.batch_processing_stopped() {
                    // the payload is an empty placeholder
                    skip_to_end(reader, response_element_name)?;
                } else {
                    handler.read_payload(reader, response_element_name)?;
                    reader.read_end_element_if_necessary(
                        XmlNamespace::Messages,
                        response_element_name,
                    )?;
                }
            }
            ServiceResult::Error => {
                response.error_message =
                    Some(reader.read_element_value_named(XmlNamespace::Messages, "MessageText")?);
                response.error_code = read_response_code(reader)?;
                read_descriptive_link_key(reader)?;

                loop {
                    reader.read()?;
                    if reader.is_end_element_named(XmlNamespace::Messages, response_element_name) {
                        break;
                    }
                    if !reader.is_start_element() {
                        continue;
                    }
                    if reader.is_start_element_named(XmlNamespace::Messages, "MessageXml") {
                        response.load_message_xml(reader, handler.resolver())?;
                        continue;
                    }
                    let element_name = reader.local_name().to_string();
                    if !handler.load_extra_error_details(reader, &element_name)? {
                        reader.skip_current_element()?;
                    }
                }
            }
        }

        debug!(
            "{} classified as {} ({})",
            response_element_name, response.result, response.error_code
        );

        let message = handler
            .error_message_override(response.error_code)
            .or_else(|| default_error_message(response.error_code));
        if let Some(message) = message {
            response.error_message = Some(message);
        }

        handler.loaded(&response);
        Ok(response)
    }

    /// Turns an `Error` outcome into an [`Error::Protocol`]. `Success` and `Warning` pass.
    pub fn throw_if_necessary(&self) -> Result<()> {
        if self.result == ServiceResult::Error {
            Err(ServiceResponseError::new(self.clone()).into())
        } else {
            Ok(())
        }
    }

    fn load_message_xml(
        &mut self,
        reader: &mut EwsXmlReader<'_>,
        resolver: &dyn PropertyDefinitionResolver,
    ) -> Result<()> {
        loop {
            reader.read()?;
            if reader.is_end_element_named(XmlNamespace::Messages, "MessageXml") {
                return Ok(());
            }
            if !reader.is_start_element() {
                continue;
            }

            let local_name = reader.local_name().to_string();
            match local_name.as_str() {
                "Value" => {
                    let name = reader
                        .read_attribute_value("Name")
                        .unwrap_or_default()
                        .to_string();
                    let value = reader.read_element_value()?;
                    self.error_details.insert(name, value);
                }
                "FieldURI" | "IndexedFieldURI" | "ExtendedFieldURI" => {
                    match PropertyPath::load_from_xml(reader, resolver) {
                        Ok(Some(path)) => self.error_properties.push(path),
                        Ok(None) => {}
                        Err(e) if !e.is_structural() => {
                            warn!("ignoring undecodable {} in error payload: {}", local_name, e);
                            if reader.is_start_element() {
                                reader.skip_current_element()?;
                            }
                        }
                        Err(e) => return Err(e),
                    }
                }
                _ => reader.skip_current_element()?,
            }
        }
    }
}

impl AsRef<ServiceResponse> for ServiceResponse {
    fn as_ref(&self) -> &ServiceResponse {
        self
    }
}

fn response_class(reader: &EwsXmlReader<'_>) -> Result<ServiceResult> {
    reader
        .read_attribute_value_as::<ServiceResult>("ResponseClass")?
        .ok_or_else(|| {
            Error::Deserialization(
                DeserializationError::new("", "ServiceResult")
                    .because(format!("{} has no ResponseClass attribute", reader.local_name())),
            )
        })
}

fn read_response_code(reader: &mut EwsXmlReader<'_>) -> Result<ServiceError> {
    reader.read_start_element(XmlNamespace::Messages, "ResponseCode")?;
    reader.read_element_value_as::<ServiceError>()
}

fn read_descriptive_link_key(reader: &mut EwsXmlReader<'_>) -> Result<()> {
    reader.read_start_element(XmlNamespace::Messages, "DescriptiveLinkKey")?;
    reader.read_element_value_as::<i32>()?;
    Ok(())
}

/// Skips forward to the end of `element_name`, stepping over whole subtrees.
fn skip_to_end(reader: &mut EwsXmlReader<'_>, element_name: &str) -> Result<()> {
    loop {
        reader.read()?;
        if reader.is_end_element_named(XmlNamespace::Messages, element_name) {
            return Ok(());
        }
        if reader.is_start_element() {
            reader.skip_current_element()?;
        }
    }
}

fn default_error_message(code: ServiceError) -> Option<String> {
    match code {
        ServiceError::ErrorIrresolvableConflict => Some(IRRESOLVABLE_CONFLICT_MESSAGE.to_string()),
        _ => None,
    }
}

/// A response the server classified as an error, raised by
/// [`ServiceResponse::throw_if_necessary`].
#[derive(Clone, Debug, Error)]
#[error("{}: {}", .response.error_code, .response.error_message.as_deref().unwrap_or("(no message)"))]
pub struct ServiceResponseError {
    response: ServiceResponse,
}

impl ServiceResponseError {
    pub fn new(response: ServiceResponse) -> Self {
        ServiceResponseError { response }
    }

    pub fn response(&self) -> &ServiceResponse {
        &self.response
    }

    pub fn error_code(&self) -> ServiceError {
        self.response.error_code
    }

    pub fn into_response(self) -> ServiceResponse {
        self.response
    }
}
