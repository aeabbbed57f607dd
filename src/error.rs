//! EWS error types.
use std::fmt;
use std::io::Error as IoError;
use std::result;

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

use crate::types::{ExchangeVersion, ServiceResponseError, SoapFaultDetails};

/// A convenience wrapper around `Result` for `ews_wire::Error`.
pub type Result<T> = result::Result<T, Error>;

/// A set of errors that can occur while reading or writing EWS XML.
///
/// Server-reported failures inside a well-formed response envelope are *not* errors at parse
/// time; they are captured on the [`ServiceResponse`](crate::types::ServiceResponse) and only
/// surface as [`Error::Protocol`] when the caller asks for it with
/// [`throw_if_necessary`](crate::types::ServiceResponse::throw_if_necessary).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The underlying tokenizer rejected the document.
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    /// An attribute of the current element could not be tokenized.
    #[error("malformed XML attribute: {0}")]
    Attribute(#[from] AttrError),
    /// An `io::Error` that occurred while writing to the output sink.
    #[error(transparent)]
    Io(#[from] IoError),
    /// The cursor was not positioned where the protocol requires. The parse cannot be resumed.
    #[error(transparent)]
    Structural(#[from] StructuralError),
    /// A value's text could not be converted to its declared type.
    #[error(transparent)]
    Deserialization(#[from] DeserializationError),
    /// A date/time or duration string had none of the accepted shapes.
    #[error("{0}")]
    Format(String),
    /// A value or identity supplied by the caller was not acceptable.
    #[error("{0}")]
    Argument(String),
    /// A property was used with a protocol version older than the one that introduced it.
    #[error(transparent)]
    Version(#[from] VersionError),
    /// The server classified a response as an error.
    #[error(transparent)]
    Protocol(Box<ServiceResponseError>),
    /// The server answered with a SOAP fault rather than a response envelope.
    #[error("SOAP fault: {}", .0.fault_string.as_deref().unwrap_or("(no fault string)"))]
    Fault(Box<SoapFaultDetails>),
}

/// The cursor was not on the node the caller expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralError {
    /// What the caller was looking for, e.g. `start element t:Subject`.
    pub expected: String,
    /// What the cursor was actually positioned on.
    pub found: String,
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, found {}", self.expected, self.found)
    }
}

impl std::error::Error for StructuralError {}

/// Text that could not be converted to the type it was declared as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeserializationError {
    /// The offending text.
    pub value: String,
    /// The name of the type the text was supposed to convert to.
    pub target: String,
    /// Why conversion failed, if known.
    pub reason: Option<String>,
}

impl DeserializationError {
    pub(crate) fn new(value: impl Into<String>, target: impl Into<String>) -> Self {
        DeserializationError {
            value: value.into(),
            target: target.into(),
            reason: None,
        }
    }

    pub(crate) fn because(mut self, reason: impl fmt::Display) -> Self {
        self.reason = Some(reason.to_string());
        self
    }
}

impl fmt::Display for DeserializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot convert {:?} to {}", self.value, self.target)?;
        if let Some(ref reason) = self.reason {
            write!(f, ": {}", reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for DeserializationError {}

/// A property was accessed on an object bound to a server that predates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionError {
    /// The property's XML element name.
    pub property: &'static str,
    /// The first version that supports the property.
    pub minimum: ExchangeVersion,
    /// The version the caller is talking to.
    pub requested: ExchangeVersion,
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "property {} is only valid for {} or later (requested {})",
            self.property, self.minimum, self.requested
        )
    }
}

impl std::error::Error for VersionError {}

impl From<ServiceResponseError> for Error {
    fn from(err: ServiceResponseError) -> Error {
        Error::Protocol(Box::new(err))
    }
}

impl From<SoapFaultDetails> for Error {
    fn from(fault: SoapFaultDetails) -> Error {
        Error::Fault(Box::new(fault))
    }
}

impl Error {
    /// Returns true if this error means the parse cannot continue on the same cursor.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::Structural(_) | Error::Xml(_) | Error::Attribute(_)
        )
    }
}
