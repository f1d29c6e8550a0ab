//! Middleware for access control, error formatting and request tracking

pub mod access_control;
pub mod error_formatter;
pub mod request_tracking;

pub use access_control::{AccessControl, ACCESS_DENIED, AUTHENTICATION_REQUIRED};
pub use error_formatter::{error_formatter, wants_trace};
pub use request_tracking::{
    request_id_layer, request_id_propagation_layer, sensitive_headers_layer, SENSITIVE_HEADERS,
};
