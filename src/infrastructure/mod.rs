//! Adapters behind the domain ports: key-value stores and remote services.

pub mod gemini;
pub mod in_memory;
pub mod json_file;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod simulated;
pub mod stripe;
