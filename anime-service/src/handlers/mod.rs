//! HTTP request handlers

pub mod anime;

pub use anime::NAME_REQUIRED;
