//! Editing context for a list view: the store, the current filter controls
//! and the id of the record being edited, if any.

use log::debug;

use crate::app_response::AppResponse;
use crate::filter::{apply_filters, FilterSpec};
use crate::snapshot::SnapshotStore;
use crate::stats::{get_stats, Stats};
use crate::store::{RecordStore, StoredRecord};

pub struct Session<R, S> {
    store: RecordStore<R, S>,
    filter: FilterSpec,
    editing_id: Option<String>,
}

impl<R, S> Session<R, S>
where
    R: StoredRecord,
    R::Draft: Into<R::Patch>,
    S: SnapshotStore,
{
    pub fn new(store: RecordStore<R, S>) -> Self {
        Self {
            store,
            filter: FilterSpec::default(),
            editing_id: None,
        }
    }

    pub fn store(&self) -> &RecordStore<R, S> {
        &self.store
    }

    pub fn into_store(self) -> RecordStore<R, S> {
        self.store
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: FilterSpec) {
        self.filter = filter;
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    /// Marks `id` as being edited and returns it. Unknown ids leave the session as it was.
    pub fn begin_edit(&mut self, id: &str) -> Option<&R> {
        if self.store.get(id).is_none() {
            debug!("begin_edit: no record with id {id}");
            return None;
        }
        self.editing_id = Some(id.to_string());
        self.store.get(id)
    }

    pub fn cancel_edit(&mut self) {
        self.editing_id = None;
    }

    /// Saves a form: updates the record being edited, or creates a new one.
    ///
    /// The editing id is cleared only when the save succeeds, so a rejected
    /// form can be corrected and submitted again.
    pub fn submit(&mut self, draft: R::Draft) -> Result<&[R], AppResponse> {
        match self.editing_id.clone() {
            Some(id) => {
                self.store.update(&id, draft.into())?;
            }
            None => {
                self.store.create(draft)?;
            }
        }
        self.editing_id = None;
        Ok(self.store.records())
    }

    pub fn toggle_active(&mut self, id: &str) -> Result<&[R], AppResponse> {
        self.store.toggle_active(id)
    }

    pub fn delete(&mut self, id: &str) -> Result<&[R], AppResponse> {
        self.store.delete(id)?;
        if self.editing_id.as_deref() == Some(id) {
            self.editing_id = None;
        }
        Ok(self.store.records())
    }

    pub fn clear_inactive(&mut self) -> Result<&[R], AppResponse> {
        self.store.clear_inactive()?;
        let still_there = self.editing_id.as_deref().is_some_and(|id| self.store.get(id).is_some());
        if !still_there {
            self.editing_id = None;
        }
        Ok(self.store.records())
    }

    /// Records passing the current filter, in collection order.
    pub fn visible(&self) -> Vec<&R> {
        apply_filters(self.store.records(), &self.filter)
    }

    /// Statistics over the whole collection, regardless of the filter.
    pub fn stats(&self) -> Stats {
        get_stats(self.store.records())
    }
}
