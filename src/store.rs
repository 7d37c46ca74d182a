//! The record store: an ordered, in-memory collection mirrored to a
//! [`SnapshotStore`] slot after every mutation.
//!
//! Every mutating call builds the next collection, writes the full snapshot
//! and only then swaps it in, so a failed write leaves the store exactly as
//! it was. Operations on an unknown id are silent no-ops.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::app_response::AppResponse;
use crate::snapshot::SnapshotStore;

pub type Timestamp = DateTime<Utc>;

/// Source of "now" for `createdAt` / `updatedAt`.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// What the store needs from a record type.
///
/// Implemented by [`crate::record::Record`] (library items) and
/// [`crate::catalog::CatalogItem`] (typed books).
pub trait StoredRecord: Clone + Serialize + DeserializeOwned {
    /// Caller-supplied fields for a new record.
    type Draft;
    /// Partial update; only the fields present are applied.
    type Patch;

    /// Builds a record with the given id, filling omitted fields with defaults.
    /// Fails with `ValidationError` when a required field is blank.
    fn from_draft(id: String, draft: Self::Draft, now: Timestamp) -> Result<Self, AppResponse>;

    /// Merges `patch` and stamps `updatedAt`. On error the record must be unchanged.
    fn apply_patch(&mut self, patch: Self::Patch, now: Timestamp) -> Result<(), AppResponse>;

    fn id(&self) -> &str;

    fn is_active(&self) -> bool;

    /// Sets the active flag and stamps `updatedAt`.
    fn set_active(&mut self, active: bool, now: Timestamp);

    /// Key used by the category filter and the `byCategory` histogram.
    fn category_key(&self) -> &str;

    /// Key used by the priority filter and the `byPriority` histogram.
    fn priority_key(&self) -> Option<&str> {
        None
    }

    /// Text fields searched by free-text queries.
    fn search_fields(&self) -> Vec<&str>;
}

/// Next `updatedAt` value: strictly after `createdAt` and the previous stamp,
/// even when the clock has not moved or went backwards.
pub(crate) fn next_stamp(created_at: Timestamp, updated_at: Option<Timestamp>, now: Timestamp) -> Timestamp {
    let floor = updated_at.unwrap_or(created_at) + Duration::milliseconds(1);
    now.max(floor)
}

pub struct RecordStore<R, S> {
    backend: S,
    slot: String,
    records: Vec<R>,
    clock: Box<dyn Clock>,
}

impl<R: StoredRecord, S: SnapshotStore> RecordStore<R, S> {
    /// Reads the snapshot in `slot`. Missing or unparsable data yields an empty store.
    pub fn load(backend: S, slot: impl Into<String>) -> Result<Self, AppResponse> {
        Self::load_with_clock(backend, slot, Box::new(SystemClock))
    }

    pub fn load_with_clock(
        backend: S,
        slot: impl Into<String>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, AppResponse> {
        let slot = slot.into();
        let records = read_snapshot(&backend, &slot)?;
        info!("Loaded {} records from slot '{}'", records.len(), slot);

        Ok(Self {
            backend,
            slot,
            records,
            clock,
        })
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    pub fn into_backend(self) -> S {
        self.backend
    }

    /// Discards the in-memory collection and re-reads the slot.
    pub fn reload(&mut self) -> Result<&[R], AppResponse> {
        self.records = read_snapshot(&self.backend, &self.slot)?;
        Ok(&self.records)
    }

    pub fn create(&mut self, draft: R::Draft) -> Result<&[R], AppResponse> {
        let id = self.fresh_id();
        let record = R::from_draft(id, draft, self.clock.now()).inspect_err(|e| {
            warn!("Rejected new record: {e}");
        })?;

        let mut next = self.records.clone();
        next.push(record);
        self.commit(next)
    }

    pub fn update(&mut self, id: &str, patch: R::Patch) -> Result<&[R], AppResponse> {
        let now = self.clock.now();
        let mut next = self.records.clone();

        match next.iter_mut().find(|r| r.id() == id) {
            Some(record) => record.apply_patch(patch, now).inspect_err(|e| {
                warn!("Rejected update of {id}: {e}");
            })?,
            None => debug!("update: no record with id {id}"),
        }

        self.commit(next)
    }

    pub fn delete(&mut self, id: &str) -> Result<&[R], AppResponse> {
        let next: Vec<R> = self.records.iter().filter(|r| r.id() != id).cloned().collect();
        if next.len() == self.records.len() {
            debug!("delete: no record with id {id}");
        }
        self.commit(next)
    }

    pub fn toggle_active(&mut self, id: &str) -> Result<&[R], AppResponse> {
        let now = self.clock.now();
        let mut next = self.records.clone();

        match next.iter_mut().find(|r| r.id() == id) {
            Some(record) => {
                let active = !record.is_active();
                record.set_active(active, now);
            }
            None => debug!("toggle_active: no record with id {id}"),
        }

        self.commit(next)
    }

    pub fn clear_inactive(&mut self) -> Result<&[R], AppResponse> {
        let next: Vec<R> = self.records.iter().filter(|r| r.is_active()).cloned().collect();
        info!("Clearing {} inactive records", self.records.len() - next.len());
        self.commit(next)
    }

    fn commit(&mut self, next: Vec<R>) -> Result<&[R], AppResponse> {
        let bytes = serde_json::to_vec(&next)?;
        self.backend.write(&self.slot, &bytes)?;
        self.records = next;
        Ok(&self.records)
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

fn read_snapshot<R: StoredRecord, S: SnapshotStore>(backend: &S, slot: &str) -> Result<Vec<R>, AppResponse> {
    let bytes = match backend.read(slot)? {
        Some(bytes) => bytes,
        None => {
            debug!("Slot '{slot}' is empty; starting with no records");
            return Ok(Vec::new());
        }
    };

    let decoded: Vec<R> = match serde_json::from_slice(&bytes) {
        Ok(records) => records,
        Err(e) => {
            warn!("Snapshot in slot '{slot}' is malformed, treating as empty: {e}");
            return Ok(Vec::new());
        }
    };

    let mut seen = HashSet::new();
    let records: Vec<R> = decoded
        .into_iter()
        .filter(|r| {
            let fresh = seen.insert(r.id().to_string());
            if !fresh {
                warn!("Dropping duplicate id {} from slot '{slot}'", r.id());
            }
            fresh
        })
        .collect();

    Ok(records)
}

#[cfg(test)]
pub(crate) mod test_clock {
    use std::sync::{Arc, Mutex};

    use chrono::{Duration, TimeZone, Utc};

    use super::{Clock, Timestamp};

    /// Clock that only moves when told to; clones share the same time.
    #[derive(Clone)]
    pub struct ManualClock(Arc<Mutex<Timestamp>>);

    impl ManualClock {
        pub fn new() -> Self {
            let start = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
            Self(Arc::new(Mutex::new(start)))
        }

        pub fn advance_secs(&self, secs: i64) {
            let mut now = self.0.lock().unwrap();
            *now += Duration::seconds(secs);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Timestamp {
            *self.0.lock().unwrap()
        }
    }
}
