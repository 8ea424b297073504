//! Utility helpers
//!
//! Local persistence for values that must survive a restart.

pub mod storage;

pub use storage::{participant_storage_key, LocalStored, StorageError};
