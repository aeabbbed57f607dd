use std::collections::BTreeMap;

use log::{debug, warn};

use super::ServiceError;
use crate::error::{Error, Result};
use crate::xml::{EwsXmlReader, XmlNamespace};

/// The decoded contents of a SOAP fault.
///
/// The standard SOAP fields come first; the rest are read from the vendor block inside `detail`.
/// Decoding is lenient: a response or error code this crate does not know becomes
/// [`ServiceError::ErrorInternalServerError`] rather than an error.
#[derive(Clone, Debug, PartialEq)]
pub struct SoapFaultDetails {
    pub fault_code: Option<String>,
    pub fault_string: Option<String>,
    pub fault_actor: Option<String>,
    pub response_code: ServiceError,
    pub message: Option<String>,
    pub error_code: ServiceError,
    pub exception_type: Option<String>,
    pub line: Option<u32>,
    pub position: Option<u32>,
    pub error_details: BTreeMap<String, String>,
}

impl Default for SoapFaultDetails {
    fn default() -> Self {
        SoapFaultDetails {
            fault_code: None,
            fault_string: None,
            fault_actor: None,
            response_code: ServiceError::ErrorInternalServerError,
            message: None,
            error_code: ServiceError::NoError,
            exception_type: None,
            line: None,
            position: None,
            error_details: BTreeMap::new(),
        }
    }
}

impl SoapFaultDetails {
    /// Reads the `Fault` element under the cursor, in `soap_namespace`.
    ///
    /// Accepts both the SOAP 1.1 children (`faultcode`, `faultstring`, `faultactor`, `detail`)
    /// and their SOAP 1.2 counterparts (`Code`, `Reason`, `Role`, `Detail`). The cursor is left on
    /// the fault's end element.
    pub fn parse(reader: &mut EwsXmlReader<'_>, soap_namespace: XmlNamespace) -> Result<Self> {
        reader.ensure_current_node_is_start_element(soap_namespace, "Fault")?;

        let mut fault = SoapFaultDetails::default();
        loop {
            reader.read()?;
            if reader.is_end_element_named(soap_namespace, "Fault") {
                break;
            }
            if !reader.is_start_element() {
                continue;
            }

            let local_name = reader.local_name().to_string();
            match local_name.as_str() {
                "faultcode" => fault.fault_code = Some(reader.read_element_value()?),
                "faultstring" => fault.fault_string = Some(reader.read_element_value()?),
                "faultactor" | "Role" => fault.fault_actor = Some(reader.read_element_value()?),
                "Code" => fault.fault_code = read_nested_text(reader, "Code", "Value")?,
                "Reason" => fault.fault_string = read_nested_text(reader, "Reason", "Text")?,
                "detail" | "Detail" => fault.parse_detail(reader, &local_name)?,
                _ => reader.skip_current_element()?,
            }
        }

        debug!(
            "SOAP fault {:?}: {:?} ({})",
            fault.fault_code, fault.fault_string, fault.response_code
        );
        Ok(fault)
    }

    /// Reads a SOAP envelope up to the first node of its body.
    ///
    /// Returns the fault if the body holds one, leaving the cursor on the fault's end element.
    /// Otherwise returns `None` with the cursor on the body's first child.
    pub fn from_envelope(reader: &mut EwsXmlReader<'_>) -> Result<Option<Self>> {
        while !reader.is_start_element() {
            reader.read()?;
        }
        let soap_namespace = match reader.namespace() {
            ns @ (XmlNamespace::Soap | XmlNamespace::Soap12) if reader.local_name() == "Envelope" => ns,
            _ => return Err(reader.structural("start element soap:Envelope")),
        };

        reader.read()?;
        if reader.is_start_element_named(soap_namespace, "Header") {
            reader.skip_current_element()?;
            reader.read()?;
        }
        reader.ensure_current_node_is_start_element(soap_namespace, "Body")?;
        reader.read()?;

        if reader.is_start_element_named(soap_namespace, "Fault") {
            SoapFaultDetails::parse(reader, soap_namespace).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn into_error(self) -> Error {
        Error::Fault(Box::new(self))
    }

    fn parse_detail(&mut self, reader: &mut EwsXmlReader<'_>, element_name: &str) -> Result<()> {
        loop {
            reader.read()?;
            if reader.is_end_element_named(XmlNamespace::NotSpecified, element_name) {
                return Ok(());
            }
            if !reader.is_start_element() {
                continue;
            }

            let local_name = reader.local_name().to_string();
            match local_name.as_str() {
                "ResponseCode" => self.response_code = lenient_code(&reader.read_element_value()?),
                "ErrorCode" => self.error_code = lenient_code(&reader.read_element_value()?),
                "Message" => self.message = Some(reader.read_element_value()?),
                "ExceptionType" => self.exception_type = Some(reader.read_element_value()?),
                "Line" => self.line = reader.read_element_value()?.trim().parse().ok(),
                "Position" => self.position = reader.read_element_value()?.trim().parse().ok(),
                "MessageXml" => self.parse_message_xml(reader)?,
                _ => reader.skip_current_element()?,
            }
        }
    }

    /// Reads `Value` entries until the `MessageXml` end element in the namespace it was opened
    /// in. Servers disagree on that namespace.
    fn parse_message_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<()> {
        let namespace_uri = reader.namespace_uri().to_string();
        loop {
            reader.read()?;
            if reader.is_end_element_uri(&namespace_uri, "MessageXml") {
                return Ok(());
            }
            if reader.is_start_element_named(XmlNamespace::NotSpecified, "Value") {
                let name = reader
                    .read_attribute_value("Name")
                    .unwrap_or_default()
                    .to_string();
                let value = reader.read_element_value()?;
                self.error_details.insert(name, value);
            } else if reader.is_start_element() {
                reader.skip_current_element()?;
            }
        }
    }
}

fn lenient_code(text: &str) -> ServiceError {
    text.trim().parse().unwrap_or_else(|_| {
        warn!("unknown error code {:?} in SOAP fault", text);
        ServiceError::ErrorInternalServerError
    })
}

/// Reads the first `inner` child of `outer`, leaving the cursor on `outer`'s end element.
fn read_nested_text(reader: &mut EwsXmlReader<'_>, outer: &str, inner: &str) -> Result<Option<String>> {
    let mut text = None;
    loop {
        reader.read()?;
        if reader.is_end_element_named(XmlNamespace::NotSpecified, outer) {
            return Ok(text);
        }
        if text.is_none() && reader.is_start_element_named(XmlNamespace::NotSpecified, inner) {
            text = Some(reader.read_element_value()?);
        } else if reader.is_start_element() {
            reader.skip_current_element()?;
        }
    }
}
