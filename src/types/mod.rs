//! This module contains types used throughout the EWS protocol.

use std::fmt;
use std::str::FromStr;

use crate::error::{DeserializationError, Error};

/// The versions of the EWS schema a request can target.
///
/// Ordering follows release order, so `requested >= property.version()` answers whether a
/// property may be used.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[allow(non_camel_case_types)]
pub enum ExchangeVersion {
    Exchange2007_SP1,
    Exchange2010,
    Exchange2010_SP1,
    Exchange2010_SP2,
    Exchange2013,
    Exchange2013_SP1,
    Exchange2015,
    Exchange2016,
}

impl Default for ExchangeVersion {
    fn default() -> Self {
        ExchangeVersion::Exchange2013_SP1
    }
}

impl ExchangeVersion {
    fn as_str(self) -> &'static str {
        match self {
            ExchangeVersion::Exchange2007_SP1 => "Exchange2007_SP1",
            ExchangeVersion::Exchange2010 => "Exchange2010",
            ExchangeVersion::Exchange2010_SP1 => "Exchange2010_SP1",
            ExchangeVersion::Exchange2010_SP2 => "Exchange2010_SP2",
            ExchangeVersion::Exchange2013 => "Exchange2013",
            ExchangeVersion::Exchange2013_SP1 => "Exchange2013_SP1",
            ExchangeVersion::Exchange2015 => "Exchange2015",
            ExchangeVersion::Exchange2016 => "Exchange2016",
        }
    }
}

impl fmt::Display for ExchangeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Ok(match s {
            "Exchange2007_SP1" => ExchangeVersion::Exchange2007_SP1,
            "Exchange2010" => ExchangeVersion::Exchange2010,
            "Exchange2010_SP1" => ExchangeVersion::Exchange2010_SP1,
            "Exchange2010_SP2" => ExchangeVersion::Exchange2010_SP2,
            "Exchange2013" => ExchangeVersion::Exchange2013,
            "Exchange2013_SP1" => ExchangeVersion::Exchange2013_SP1,
            "Exchange2015" => ExchangeVersion::Exchange2015,
            "Exchange2016" => ExchangeVersion::Exchange2016,
            _ => {
                return Err(Error::Deserialization(DeserializationError::new(
                    s,
                    "ExchangeVersion",
                )))
            }
        })
    }
}

/// The outcome class of one response envelope, as given by its `ResponseClass` attribute.
///
/// Ordered by severity so the worst of several outcomes is simply their maximum.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServiceResult {
    Success,
    Warning,
    Error,
}

impl Default for ServiceResult {
    fn default() -> Self {
        ServiceResult::Success
    }
}

impl FromStr for ServiceResult {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "Success" => Ok(ServiceResult::Success),
            "Warning" => Ok(ServiceResult::Warning),
            "Error" => Ok(ServiceResult::Error),
            _ => Err(Error::Deserialization(DeserializationError::new(
                s,
                "ServiceResult",
            ))),
        }
    }
}

impl fmt::Display for ServiceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceResult::Success => "Success",
            ServiceResult::Warning => "Warning",
            ServiceResult::Error => "Error",
        })
    }
}

mod date_time;
pub use self::date_time::{TimeSpan, WireDateTime};

mod mapi;
pub use self::mapi::{MapiPropertyType, MapiTypeConverter, MapiTypeConverterMapEntry, MapiValue, MapiValueKind};

mod flags;
pub use self::flags::{EffectiveRights, PropertyDefinitionFlags};

mod property_bag;
pub use self::property_bag::{ComplexProperty, OwnerHandle, PropertyBag, PropertyValue};

mod property_definition;
pub use self::property_definition::{ComplexPropertyFactory, PropertyDefinition, PropertyKind};

mod indexed_property;
pub use self::indexed_property::IndexedPropertyDefinition;

mod extended_property;
pub use self::extended_property::{
    DefaultExtendedPropertySet, ExtendedProperty, ExtendedPropertyCollection,
    ExtendedPropertyDefinition,
};

mod property_path;
pub use self::property_path::PropertyPath;

mod complex;
pub use self::complex::{EmailAddress, StringList, TimeZoneDefinition};

pub mod schema;
pub use self::schema::{PropertyDefinitionResolver, Schema};

mod service_error;
pub use self::service_error::ServiceError;

mod service_response;
pub use self::service_response::{ResponseHandler, ServiceResponse, ServiceResponseError};

mod response_collection;
pub use self::response_collection::{HandledResponse, ServiceResponseCollection};

mod soap_fault;
pub use self::soap_fault::SoapFaultDetails;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_ordered() {
        assert!(ExchangeVersion::Exchange2007_SP1 < ExchangeVersion::Exchange2010);
        assert!(ExchangeVersion::Exchange2013_SP1 < ExchangeVersion::Exchange2016);
        assert_eq!(
            "Exchange2010_SP2".parse::<ExchangeVersion>().unwrap(),
            ExchangeVersion::Exchange2010_SP2
        );
        assert!("Exchange2003".parse::<ExchangeVersion>().is_err());
    }

    #[test]
    fn results_are_ordered_by_severity() {
        assert!(ServiceResult::Success < ServiceResult::Warning);
        assert!(ServiceResult::Warning < ServiceResult::Error);
        assert_eq!(
            "Warning".parse::<ServiceResult>().unwrap(),
            ServiceResult::Warning
        );
    }
}
