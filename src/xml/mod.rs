//! The forward-only XML cursor and writer that every read and write in this crate drives.
//!
//! EWS documents bind a handful of fixed namespaces. Element names are compared by local name
//! plus [`XmlNamespace`]; the prefix a server happens to choose is never significant.

use std::fmt;

mod reader;
mod writer;

pub use self::reader::{EwsXmlReader, EwsXmlReaderBuilder};
pub use self::writer::EwsXmlWriter;

/// The namespaces used by the EWS wire protocol.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum XmlNamespace {
    /// No namespace. Matches any element when used in a comparison.
    NotSpecified,
    /// `http://schemas.microsoft.com/exchange/services/2006/messages`
    Messages,
    /// `http://schemas.microsoft.com/exchange/services/2006/types`
    Types,
    /// `http://schemas.microsoft.com/exchange/services/2006/errors`
    Errors,
    /// SOAP 1.1 envelope.
    Soap,
    /// SOAP 1.2 envelope.
    Soap12,
    /// `http://www.w3.org/2001/XMLSchema-instance`
    XmlSchemaInstance,
}

pub const MESSAGES_NS_URI: &str = "http://schemas.microsoft.com/exchange/services/2006/messages";
pub const TYPES_NS_URI: &str = "http://schemas.microsoft.com/exchange/services/2006/types";
pub const ERRORS_NS_URI: &str = "http://schemas.microsoft.com/exchange/services/2006/errors";
pub const SOAP_NS_URI: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP12_NS_URI: &str = "http://www.w3.org/2003/05/soap-envelope";
pub const XSI_NS_URI: &str = "http://www.w3.org/2001/XMLSchema-instance";

impl XmlNamespace {
    /// The prefix this crate uses when writing elements in this namespace.
    pub fn prefix(self) -> &'static str {
        match self {
            XmlNamespace::NotSpecified => "",
            XmlNamespace::Messages => "m",
            XmlNamespace::Types => "t",
            XmlNamespace::Errors => "e",
            XmlNamespace::Soap => "soap",
            XmlNamespace::Soap12 => "soap",
            XmlNamespace::XmlSchemaInstance => "xsi",
        }
    }

    pub fn uri(self) -> &'static str {
        match self {
            XmlNamespace::NotSpecified => "",
            XmlNamespace::Messages => MESSAGES_NS_URI,
            XmlNamespace::Types => TYPES_NS_URI,
            XmlNamespace::Errors => ERRORS_NS_URI,
            XmlNamespace::Soap => SOAP_NS_URI,
            XmlNamespace::Soap12 => SOAP12_NS_URI,
            XmlNamespace::XmlSchemaInstance => XSI_NS_URI,
        }
    }

    /// Maps a namespace URI onto one of the known namespaces. Unknown URIs map to
    /// [`XmlNamespace::NotSpecified`].
    pub fn from_uri(uri: &str) -> XmlNamespace {
        match uri {
            MESSAGES_NS_URI => XmlNamespace::Messages,
            TYPES_NS_URI => XmlNamespace::Types,
            ERRORS_NS_URI => XmlNamespace::Errors,
            SOAP_NS_URI => XmlNamespace::Soap,
            SOAP12_NS_URI => XmlNamespace::Soap12,
            XSI_NS_URI => XmlNamespace::XmlSchemaInstance,
            _ => XmlNamespace::NotSpecified,
        }
    }
}

impl fmt::Display for XmlNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// The kind of node the cursor is positioned on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XmlNodeType {
    /// Before the first call to [`EwsXmlReader::read`].
    None,
    StartElement,
    EndElement,
    Text,
    /// The document is exhausted.
    EndOfDocument,
}
