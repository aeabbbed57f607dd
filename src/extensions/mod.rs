//! Implementations of operation-specific error details and payloads.
//!
//! Each module provides a [`ResponseHandler`](crate::ResponseHandler) for one operation.
pub mod rule_operation_errors;
pub mod streaming_events;
