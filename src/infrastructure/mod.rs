//! Adapters implementing the domain ports.

pub mod correlation_cache;
pub mod in_memory;
pub mod mpesa;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
