//! Infrastructure layer: record storage and relation hydration.

pub mod read_model;
pub mod repository;

pub use read_model::{InMemoryRecordStore, RecordStore, StoreError};
pub use repository::{RecordRepository, RepositoryError, StoredVaccination};
