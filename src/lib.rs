//! # Shelf Core
//!
//! Offline-first record store for small library and catalog applications.
//! A collection of records lives in memory and is mirrored, as one JSON
//! snapshot, to an LMDB-backed key-value slot after every mutation.
//!
//! ## Features
//!
//! - **Snapshot persistence**: every create/update/delete/toggle rewrites the whole slot
//!   in one LMDB transaction; a failed write leaves the in-memory collection untouched
//! - **Lenient loading**: a missing or malformed snapshot opens as an empty collection
//! - **Composable filters**: status, category (or book type), priority and free-text search
//! - **Statistics**: totals plus per-category and per-priority histograms
//! - **Typed catalog**: novels, science books and history books over a shared base
//! - **FFI surface**: JSON-in/JSON-out C functions for Flutter and other UI front ends
//!
//! ## Quick Start
//!
//! ```no_run
//! use shelf_core::record::{Record, RecordDraft};
//! use shelf_core::snapshot::LmdbSnapshotStore;
//! use shelf_core::store::RecordStore;
//! use shelf_core::config::LIBRARY_SLOT;
//!
//! let backend = LmdbSnapshotStore::init("my_library", 10 * 1024 * 1024)?;
//! let mut store: RecordStore<Record, _> = RecordStore::load(backend, LIBRARY_SLOT)?;
//!
//! store.create(RecordDraft::titled("The Rust Programming Language"))?;
//! let id = store.records()[0].id().to_string();
//! store.toggle_active(&id)?;
//! store.clear_inactive()?;
//! # Ok::<(), shelf_core::AppResponse>(())
//! ```
//!
//! ## FFI Functions
//!
//! - [`open_library`] - Open (or create) a library store from a JSON config
//! - [`create_record`] - Add a record
//! - [`update_record`] - Merge fields into a record
//! - [`delete_record`] - Remove a record
//! - [`toggle_record`] - Flip a record's active flag
//! - [`clear_inactive_records`] - Remove every inactive record
//! - [`get_all_records`] / [`get_record_by_id`] - Read records
//! - [`query_records`] - Filtered view
//! - [`get_record_stats`] - Counters and histograms
//! - [`reset_library`] - Start over with an empty environment
//! - [`close_library`] - Sync and release the store
//! - [`free_response`] - Release a string returned by any of the above

pub mod catalog;
pub mod config;
pub mod filter;
pub mod record;
pub mod session;
pub mod snapshot;
pub mod stats;
pub mod store;
mod app_response;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};
use serde::Serialize;

pub use crate::app_response::AppResponse;
use crate::config::StoreConfig;
use crate::filter::{apply_filters, FilterSpec};
use crate::record::{Record, RecordDraft, RecordPatch};
use crate::snapshot::LmdbSnapshotStore;
use crate::stats::get_stats;
use crate::store::RecordStore;

/// The store behind the C ABI.
pub type LibraryStore = RecordStore<Record, LmdbSnapshotStore>;

/// Opens the library described by `config_json` and loads its snapshot.
///
/// # Parameters
///
/// * `config_json` - Null-terminated JSON [`StoreConfig`], e.g.
///   `{"name":"my_library","slot":"libraryItems"}`. An empty string uses the defaults.
///
/// # Returns
///
/// A pointer to the opened store, or null on failure. Release it with [`close_library`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use shelf_core::open_library;
///
/// let config = CString::new(r#"{"name":"library_db"}"#).unwrap();
/// let store = open_library(config.as_ptr());
/// assert!(!store.is_null());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn open_library(config_json: *const c_char) -> *mut LibraryStore {
    if config_json.is_null() {
        warn!("Null config pointer passed to open_library");
        return std::ptr::null_mut();
    }

    let json = match unsafe { CStr::from_ptr(config_json).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in config parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    let config = match StoreConfig::from_json(json) {
        Ok(config) => config,
        Err(e) => {
            warn!("Rejected library config: {e}");
            return std::ptr::null_mut();
        }
    };

    let opened: Result<LibraryStore, AppResponse> =
        LmdbSnapshotStore::open(&config).and_then(|backend| RecordStore::load(backend, config.slot.clone()));

    match opened {
        Ok(store) => {
            info!("✅ Library '{}' opened with {} records", config.name, store.len());
            Box::into_raw(Box::new(store))
        }
        Err(e) => {
            warn!("❌ Failed to open library '{}': {e}", config.name);
            std::ptr::null_mut()
        }
    }
}

/// Adds a record built from a JSON draft.
///
/// Expected JSON (everything but `title` is optional):
/// ```json
/// {"title": "Clean Code", "description": "", "category": "book", "priority": "high"}
/// ```
///
/// Returns `Ok` with the full collection, `ValidationError` for a blank title,
/// or `SerializationError` for malformed JSON.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_record(state: *mut LibraryStore, json_ptr: *const c_char) -> *const c_char {
    let store = match store_mut(state, "create_record") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };

    let draft: RecordDraft = match parse_json(json_ptr, "draft") {
        Ok(draft) => draft,
        Err(error_ptr) => return error_ptr,
    };

    collection_response(store.create(draft))
}

/// Merges the fields in `json_ptr` into the record `id`.
///
/// Unknown ids are not an error: the collection is returned unchanged.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_record(state: *mut LibraryStore, id: *const c_char, json_ptr: *const c_char) -> *const c_char {
    let store = match store_mut(state, "update_record") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    let patch: RecordPatch = match parse_json(json_ptr, "patch") {
        Ok(patch) => patch,
        Err(error_ptr) => return error_ptr,
    };

    collection_response(store.update(&id_str, patch))
}

/// Removes the record `id` and returns the remaining collection.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_record(state: *mut LibraryStore, id: *const c_char) -> *const c_char {
    let store = match store_mut(state, "delete_record") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    collection_response(store.delete(&id_str))
}

/// Flips the active flag of record `id`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn toggle_record(state: *mut LibraryStore, id: *const c_char) -> *const c_char {
    let store = match store_mut(state, "toggle_record") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    collection_response(store.toggle_active(&id_str))
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_inactive_records(state: *mut LibraryStore) -> *const c_char {
    match store_mut(state, "clear_inactive_records") {
        Ok(store) => collection_response(store.clear_inactive()),
        Err(error_ptr) => error_ptr,
    }
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_all_records(state: *mut LibraryStore) -> *const c_char {
    match store_mut(state, "get_all_records") {
        Ok(store) => collection_response(Ok(store.records())),
        Err(error_ptr) => error_ptr,
    }
}

/// Returns the record `id`, or `NotFound`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_record_by_id(state: *mut LibraryStore, id: *const c_char) -> *const c_char {
    let store = match store_mut(state, "get_record_by_id") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    match store.get(&id_str) {
        Some(record) => payload_response(record),
        None => response_to_c_string(&AppResponse::NotFound(format!("No record found with id: {id_str}"))),
    }
}

/// Returns the records matching a JSON [`FilterSpec`].
///
/// ```json
/// {"status": "active", "category": "pdf", "priority": "all", "search": "rust"}
/// ```
///
/// Missing fields do not filter; an empty string returns every record.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn query_records(state: *mut LibraryStore, filter_json: *const c_char) -> *const c_char {
    let store = match store_mut(state, "query_records") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };

    let raw = match c_ptr_to_string(filter_json, "filter") {
        Ok(raw) => raw,
        Err(error_ptr) => return error_ptr,
    };

    let spec = if raw.trim().is_empty() {
        FilterSpec::default()
    } else {
        match serde_json::from_str::<FilterSpec>(&raw) {
            Ok(spec) => spec,
            Err(e) => {
                let error = AppResponse::SerializationError(format!("Invalid filter JSON: {e}"));
                return response_to_c_string(&error);
            }
        }
    };

    payload_response(&apply_filters(store.records(), &spec))
}

/// Returns `{"total","active","inactive","byCategory","byPriority"}` for the whole collection.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_record_stats(state: *mut LibraryStore) -> *const c_char {
    match store_mut(state, "get_record_stats") {
        Ok(store) => payload_response(&get_stats(store.records())),
        Err(error_ptr) => error_ptr,
    }
}

/// Drops every stored snapshot and switches to an empty environment named `name_ptr`.
///
/// Resetting to the current name clears it in place. The store is empty afterwards.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn reset_library(state: *mut LibraryStore, name_ptr: *const c_char) -> *const c_char {
    let store = match store_mut(state, "reset_library") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };

    let name = match c_ptr_to_string(name_ptr, "name") {
        Ok(name) => name,
        Err(error_ptr) => return error_ptr,
    };

    let reset = store.backend_mut().reset_database(&name).and_then(|_| store.reload().map(|_| ()));

    match reset {
        Ok(()) => response_to_c_string(&AppResponse::success(format!("Library '{name}' was reset successfully"))),
        Err(e) => response_to_c_string(&AppResponse::DatabaseError(format!("Error resetting library: {e}"))),
    }
}

/// Syncs the environment to disk and frees the store.
///
/// The pointer must not be used after this call, whatever the response.
/// This is the call to make before a Flutter hot restart.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_library(state: *mut LibraryStore) -> *const c_char {
    if state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to close_library".to_string());
        return response_to_c_string(&error);
    }

    let store = unsafe { Box::from_raw(state) };
    let synced = store.backend().close_database();
    drop(store);

    match synced {
        Ok(()) => response_to_c_string(&AppResponse::success("Library closed successfully")),
        Err(e) => response_to_c_string(&e),
    }
}

/// Releases a string returned by any function in this library. Null is ignored.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(ptr as *mut c_char));
    }
}

fn store_mut<'a>(state: *mut LibraryStore, caller: &str) -> Result<&'a mut LibraryStore, *const c_char> {
    match unsafe { state.as_mut() } {
        Some(store) => Ok(store),
        None => {
            let error = AppResponse::BadRequest(format!("Null state pointer passed to {caller}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(ptr: *const c_char, field_name: &str) -> Result<T, *const c_char> {
    let json = c_ptr_to_string(ptr, field_name)?;
    serde_json::from_str(&json).map_err(|e| {
        let error = AppResponse::SerializationError(format!("Invalid {field_name} JSON: {e}"));
        response_to_c_string(&error)
    })
}

fn collection_response(result: Result<&[Record], AppResponse>) -> *const c_char {
    match result {
        Ok(records) => payload_response(records),
        Err(e) => response_to_c_string(&e),
    }
}

/// Wraps `value`, serialized as JSON, in an `Ok` envelope.
fn payload_response<T: Serialize + ?Sized>(value: &T) -> *const c_char {
    match serde_json::to_string(value) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Failed to serialize result: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Serializes an [`AppResponse`] into a newly allocated C string.
///
/// Returns null if serialization or C string creation fails. Callers release
/// the string with [`free_response`].
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to an owned `String`.
///
/// Null pointers and invalid UTF-8 become a `BadRequest` response pointer.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
