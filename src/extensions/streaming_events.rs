//! Adds support for `GetStreamingEvents` responses: the connection status of a successful
//! response and the list of failed subscriptions an error response names.

use log::debug;

use crate::error::Result;
use crate::types::ResponseHandler;
use crate::xml::{EwsXmlReader, XmlNamespace};

/// The state of a streaming connection as reported by the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Ok,
    /// The server closed the connection and it must be re-established.
    Closed,
}

/// Reads `GetStreamingEventsResponseMessage` envelopes.
#[derive(Clone, Debug, Default)]
pub struct StreamingEventsHandler {
    pub connection_status: Option<ConnectionStatus>,
    /// The number of `Notification` elements in the payload.
    pub notifications: usize,
    /// The subscriptions an error response applies to.
    pub error_subscription_ids: Vec<String>,
}

impl ResponseHandler for StreamingEventsHandler {
    fn read_payload(
        &mut self,
        reader: &mut EwsXmlReader<'_>,
        response_element_name: &str,
    ) -> Result<()> {
        loop {
            reader.read()?;
            if reader.is_end_element_named(XmlNamespace::Messages, response_element_name) {
                return Ok(());
            }
            if reader.is_start_element_named(XmlNamespace::Messages, "ConnectionStatus") {
                let status = reader.read_element_value()?;
                self.connection_status = match status.trim() {
                    "OK" => Some(ConnectionStatus::Ok),
                    "Closed" => Some(ConnectionStatus::Closed),
                    _ => {
                        debug!("unknown connection status {:?}", status);
                        None
                    }
                };
            } else if reader.is_start_element_named(XmlNamespace::Messages, "Notifications") {
                loop {
                    reader.read()?;
                    if reader.is_end_element_named(XmlNamespace::Messages, "Notifications") {
                        break;
                    }
                    if reader.is_start_element() {
                        if reader.local_name() == "Notification" {
                            self.notifications += 1;
                        }
                        reader.skip_current_element()?;
                    }
                }
            } else if reader.is_start_element() {
                reader.skip_current_element()?;
            }
        }
    }

    fn load_extra_error_details(
        &mut self,
        reader: &mut EwsXmlReader<'_>,
        _element_name: &str,
    ) -> Result<bool> {
        if !reader.is_start_element_named(XmlNamespace::Messages, "ErrorSubscriptionIds") {
            return Ok(false);
        }
        loop {
            reader.read()?;
            if reader.is_end_element_named(XmlNamespace::Messages, "ErrorSubscriptionIds") {
                return Ok(true);
            }
            if reader.is_start_element_named(XmlNamespace::Messages, "SubscriptionId") {
                self.error_subscription_ids.push(reader.read_element_value()?);
            } else if reader.is_start_element() {
                reader.skip_current_element()?;
            }
        }
    }
}
