//! Key-value slots holding whole-collection snapshots.
//!
//! A slot is written as one JSON array on every mutation and read back only
//! when a store is opened.

mod lmdb_store;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::app_response::AppResponse;

pub use lmdb_store::LmdbSnapshotStore;

pub trait SnapshotStore {
    /// Returns the bytes stored under `slot`, or `None` if the slot was never written.
    fn read(&self, slot: &str) -> Result<Option<Vec<u8>>, AppResponse>;

    /// Overwrites `slot` with `bytes`.
    fn write(&self, slot: &str, bytes: &[u8]) -> Result<(), AppResponse>;

    /// Deletes `slot`; returns whether it existed.
    fn remove(&self, slot: &str) -> Result<bool, AppResponse>;
}

/// Process-local backend. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slots: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>, AppResponse> {
        self.slots
            .lock()
            .map_err(|_| AppResponse::DatabaseError("Memory snapshot lock poisoned".to_string()))
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn read(&self, slot: &str) -> Result<Option<Vec<u8>>, AppResponse> {
        Ok(self.slots()?.get(slot).cloned())
    }

    fn write(&self, slot: &str, bytes: &[u8]) -> Result<(), AppResponse> {
        self.slots()?.insert(slot.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<bool, AppResponse> {
        Ok(self.slots()?.remove(slot).is_some())
    }
}
