//! Adds support for the `RuleOperationErrors` detail block that `UpdateInboxRules` responses
//! carry when the server rejects one or more rule operations.

use std::slice::Iter;

use crate::error::Result;
use crate::types::{ResponseHandler, ServiceError};
use crate::xml::{EwsXmlReader, XmlNamespace};

/// One reason a rule failed validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleError {
    /// The rule field at fault, such as `Conditions` or `Actions`.
    pub field: String,
    /// The validation error code, such as `InvalidValue`.
    pub error_code: String,
    pub error_message: Option<String>,
    /// The offending value, when the server echoes it.
    pub field_value: Option<String>,
}

/// The validation errors for one operation of an `UpdateInboxRules` request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleOperationError {
    /// The position of the failed operation in the request.
    pub operation_index: u32,
    pub validation_errors: Vec<RuleError>,
}

impl RuleOperationError {
    pub fn iter(&self) -> Iter<'_, RuleError> {
        self.validation_errors.iter()
    }

    fn load_from_xml(reader: &mut EwsXmlReader<'_>) -> Result<Self> {
        let mut error = RuleOperationError::default();
        loop {
            reader.read()?;
            if reader.is_end_element_named(XmlNamespace::Types, "RuleOperationError") {
                return Ok(error);
            }
            if reader.is_start_element_named(XmlNamespace::Types, "OperationIndex") {
                error.operation_index = reader.read_element_value_as()?;
            } else if reader.is_start_element_named(XmlNamespace::Types, "ValidationErrors") {
                loop {
                    reader.read()?;
                    if reader.is_end_element_named(XmlNamespace::Types, "ValidationErrors") {
                        break;
                    }
                    if reader.is_start_element_named(XmlNamespace::Types, "Error") {
                        error.validation_errors.push(load_rule_error(reader)?);
                    } else if reader.is_start_element() {
                        reader.skip_current_element()?;
                    }
                }
            } else if reader.is_start_element() {
                reader.skip_current_element()?;
            }
        }
    }
}

fn load_rule_error(reader: &mut EwsXmlReader<'_>) -> Result<RuleError> {
    let mut error = RuleError::default();
    loop {
        reader.read()?;
        if reader.is_end_element_named(XmlNamespace::Types, "Error") {
            return Ok(error);
        }
        if !reader.is_start_element() {
            continue;
        }
        let local_name = reader.local_name().to_string();
        match local_name.as_str() {
            "FieldURI" => error.field = reader.read_element_value()?,
            "ErrorCode" => error.error_code = reader.read_element_value()?,
            "ErrorMessage" => error.error_message = Some(reader.read_element_value()?),
            "FieldValue" => error.field_value = Some(reader.read_element_value()?),
            _ => reader.skip_current_element()?,
        }
    }
}

/// Reads `UpdateInboxRulesResponse` envelopes.
#[derive(Clone, Debug, Default)]
pub struct UpdateInboxRulesHandler {
    pub errors: Vec<RuleOperationError>,
}

impl ResponseHandler for UpdateInboxRulesHandler {
    fn load_extra_error_details(
        &mut self,
        reader: &mut EwsXmlReader<'_>,
        element_name: &str,
    ) -> Result<bool> {
        if element_name != "RuleOperationErrors" {
            return Ok(false);
        }
        loop {
            reader.read()?;
            if reader.is_end_element_named(XmlNamespace::Messages, "RuleOperationErrors") {
                return Ok(true);
            }
            if reader.is_start_element_named(XmlNamespace::Types, "RuleOperationError") {
                self.errors.push(RuleOperationError::load_from_xml(reader)?);
            } else if reader.is_start_element() {
                reader.skip_current_element()?;
            }
        }
    }

    fn error_message_override(&self, code: ServiceError) -> Option<String> {
        if code == ServiceError::ErrorInboxRulesValidationError && !self.errors.is_empty() {
            let count: usize = self.errors.iter().map(|e| e.validation_errors.len()).sum();
            Some(format!(
                "{} inbox rule operation(s) failed validation with {} error(s).",
                self.errors.len(),
                count
            ))
        } else {
            None
        }
    }
}
