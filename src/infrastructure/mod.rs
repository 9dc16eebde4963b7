//! Adapters for the domain ports: key-value stores, random sources and time.

pub mod in_memory;
pub mod random;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod time;
