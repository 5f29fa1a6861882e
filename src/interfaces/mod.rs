//! Edges of the crate: HTTP client and server for intent creation, CSV output.

pub mod csv;
pub mod http;
