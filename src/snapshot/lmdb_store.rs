use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use lmdb::{Database, DatabaseFlags, Environment, Error as LmdbError, Transaction, WriteFlags};
use log::{info, warn};

use crate::app_response::AppResponse;
use crate::config::StoreConfig;
use crate::snapshot::SnapshotStore;

const SNAPSHOT_DB: &str = "snapshots";

/// Snapshot slots kept in an LMDB environment directory named `<name>.lmdb`.
///
/// Each slot is a single key in the `snapshots` database; writes go through
/// one committed read-write transaction, so a slot is either the old or the
/// new snapshot, never a mix.
pub struct LmdbSnapshotStore {
    env: Environment,
    db: Database,
    path: PathBuf,
    map_size: usize,
}

fn lmdb_dir(name: impl AsRef<Path>) -> PathBuf {
    let mut dir = OsString::from(name.as_ref().as_os_str());
    dir.push(".lmdb");
    PathBuf::from(dir)
}

impl LmdbSnapshotStore {
    /// Opens (or creates) the environment for `name`.
    pub fn init(name: impl AsRef<Path>, map_size: usize) -> Result<Self, AppResponse> {
        let path = lmdb_dir(name);
        fs::create_dir_all(&path)?;

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(map_size)
            .open(&path)
            .inspect_err(|e| warn!("Failed to open LMDB environment at {}: {e}", path.display()))?;
        let db = env.create_db(Some(SNAPSHOT_DB), DatabaseFlags::empty())?;

        info!("LMDB snapshot store ready at {}", path.display());
        Ok(Self {
            env,
            db,
            path,
            map_size,
        })
    }

    pub fn open(config: &StoreConfig) -> Result<Self, AppResponse> {
        Self::init(&config.name, config.map_size)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes everything to disk. The environment itself is released on drop.
    pub fn close_database(&self) -> Result<(), AppResponse> {
        self.env.sync(true)?;
        info!("LMDB environment at {} synced for close", self.path.display());
        Ok(())
    }

    /// Removes every slot, keeping the environment open.
    pub fn clear_all(&self) -> Result<(), AppResponse> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.clear_db(self.db)?;
        txn.commit()?;
        Ok(())
    }

    /// Starts over with an empty environment called `name`.
    ///
    /// Resetting to the current name clears it in place; a different name
    /// opens the new environment and deletes the old directory.
    pub fn reset_database(&mut self, name: &str) -> Result<(), AppResponse> {
        let new_path = lmdb_dir(name);
        if new_path == self.path {
            self.clear_all()?;
            info!("Reset LMDB environment at {} in place", self.path.display());
            return Ok(());
        }

        let fresh = LmdbSnapshotStore::init(name, self.map_size)?;
        fresh.clear_all()?;
        let old = std::mem::replace(self, fresh);
        let old_path = old.path.clone();
        drop(old);

        if let Err(e) = fs::remove_dir_all(&old_path) {
            warn!("Could not remove old LMDB directory {}: {e}", old_path.display());
        }
        info!("Reset LMDB environment to {}", self.path.display());
        Ok(())
    }
}

impl SnapshotStore for LmdbSnapshotStore {
    fn read(&self, slot: &str) -> Result<Option<Vec<u8>>, AppResponse> {
        let txn = self.env.begin_ro_txn()?;
        let result = match txn.get(self.db, &slot) {
            Ok(bytes) => Ok(Some(bytes.to_vec())),
            Err(LmdbError::NotFound) => Ok(None),
            Err(e) => Err(AppResponse::from(e)),
        };
        txn.abort();
        result
    }

    fn write(&self, slot: &str, bytes: &[u8]) -> Result<(), AppResponse> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.put(self.db, &slot, &bytes, WriteFlags::empty())?;
        txn.commit()?;
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<bool, AppResponse> {
        let mut txn = self.env.begin_rw_txn()?;
        match txn.del(self.db, &slot, None) {
            Ok(()) => {
                txn.commit()?;
                Ok(true)
            }
            Err(LmdbError::NotFound) => {
                txn.abort();
                Ok(false)
            }
            Err(e) => Err(AppResponse::from(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP_SIZE: usize = 1024 * 1024;

    #[test]
    fn test_slot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let name = dir.path().join("reopen");
        {
            let store = LmdbSnapshotStore::init(&name, MAP_SIZE).unwrap();
            store.write("libraryItems", br#"[{"id":"1"}]"#).unwrap();
            store.close_database().unwrap();
        }

        let store = LmdbSnapshotStore::init(&name, MAP_SIZE).unwrap();
        assert_eq!(store.read("libraryItems").unwrap(), Some(br#"[{"id":"1"}]"#.to_vec()));
        assert_eq!(store.read("catalogItems").unwrap(), None);
        assert!(store.path().ends_with("reopen.lmdb"));
    }

    #[test]
    fn test_remove_reports_presence() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbSnapshotStore::init(dir.path().join("remove"), MAP_SIZE).unwrap();
        store.write("slot", b"[]").unwrap();

        assert!(store.remove("slot").unwrap());
        assert!(!store.remove("slot").unwrap());
    }

    #[test]
    fn test_reset_to_new_name_drops_old_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LmdbSnapshotStore::init(dir.path().join("before"), MAP_SIZE).unwrap();
        store.write("slot", b"[1,2,3]").unwrap();
        let old_path = store.path().to_path_buf();

        let new_name = dir.path().join("after");
        store.reset_database(new_name.to_str().unwrap()).unwrap();

        assert!(!old_path.exists());
        assert!(store.path().ends_with("after.lmdb"));
        assert_eq!(store.read("slot").unwrap(), None);
    }

    #[test]
    fn test_reset_in_place_clears_slots() {
        let dir = tempfile::tempdir().unwrap();
        let name = dir.path().join("same");
        let mut store = LmdbSnapshotStore::init(&name, MAP_SIZE).unwrap();
        store.write("a", b"[]").unwrap();
        store.write("b", b"[]").unwrap();

        store.reset_database(name.to_str().unwrap()).unwrap();
        assert_eq!(store.read("a").unwrap(), None);
        assert_eq!(store.read("b").unwrap(), None);
    }

    #[test]
    fn test_map_full_surfaces_as_database_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbSnapshotStore::init(dir.path().join("tiny"), 128 * 1024).unwrap();
        let big = vec![b'x'; 1024 * 1024];

        let err = store.write("slot", &big).unwrap_err();
        assert!(matches!(err, AppResponse::DatabaseError(_)));
    }
}
