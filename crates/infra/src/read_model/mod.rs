//! Key/value record storage abstractions.

pub mod record_store;

pub use record_store::{InMemoryRecordStore, RecordStore, StoreError};
