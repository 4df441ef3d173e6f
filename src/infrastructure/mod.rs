//! Adapters behind the domain ports: storage backends and the payment platform.

pub mod in_memory;
pub mod offline;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod telegram;
