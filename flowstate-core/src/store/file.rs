//! JSON file store.
//!
//! Writes are atomic: the new state goes to `{file}.tmp` and is renamed into
//! place, so a crash mid-write leaves the previous state intact. Saves and
//! resets hold an exclusive OS lock on `{file}.lock` from the revision check
//! through the rename, so concurrent processes sharing one path serialize.
//! The lock file is left in place; removing it would let a waiter lock an
//! unlinked inode.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use tracing::debug;

use super::{check_revision, StateStore, StoreError};
use crate::domain::RegimeState;

#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "regime_state.json".into());
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn create_parent(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    /// Blocks until this process holds the exclusive lock. Dropping the
    /// returned handle releases it.
    fn lock(&self) -> Result<File, StoreError> {
        self.create_parent()?;
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.sibling(".lock"))?;
        file.lock_exclusive()?;
        Ok(file)
    }

    fn read(&self) -> Result<Option<RegimeState>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<Option<RegimeState>, StoreError> {
        self.read()
    }

    fn save(&self, state: &RegimeState) -> Result<(), StoreError> {
        let _lock = self.lock()?;
        let stored = self.read()?;
        check_revision(stored.as_ref(), state)?;

        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.sibling(".tmp");
        fs::write(&tmp, json)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!(path = %self.path.display(), revision = state.revision, "regime state saved");
        Ok(())
    }

    fn reset(&self) -> Result<(), StoreError> {
        if !self.path.exists() {
            return Ok(());
        }
        let _lock = self.lock()?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Regime;
    use chrono::NaiveDate;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn seeded(revision: u64) -> RegimeState {
        let mut s = RegimeState::seeded(Regime::Defensive, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        s.revision = revision;
        s
    }

    #[test]
    fn missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("state.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn roundtrip_and_no_tmp_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let store = FileStateStore::new(&path);

        store.save(&seeded(1)).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, seeded(1));
        assert!(!dir.path().join("nested").join("state.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_an_error_not_a_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not valid json {{{").unwrap();
        let store = FileStateStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
        assert!(store.save(&seeded(1)).is_err());
    }

    #[test]
    fn stale_revision_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("state.json"));
        store.save(&seeded(1)).unwrap();
        store.save(&seeded(2)).unwrap();
        assert!(matches!(
            store.save(&seeded(2)),
            Err(StoreError::Conflict { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn reset_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = FileStateStore::new(&path);
        store.save(&seeded(1)).unwrap();
        store.reset().unwrap();
        assert!(!path.exists());
        store.reset().unwrap();
    }

    #[test]
    fn separate_stores_on_one_path_accept_a_single_first_save() {
        for round in 0..50 {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("state.json");
            let barrier = Arc::new(Barrier::new(2));

            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let store = FileStateStore::new(&path);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        store.save(&seeded(1))
                    })
                })
                .collect();
            let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

            let saved = results.iter().filter(|r| r.is_ok()).count();
            assert_eq!(saved, 1, "round {round}: {results:?}");
            assert!(results
                .iter()
                .any(|r| matches!(r, Err(StoreError::Conflict { expected: 2, found: 1 }))));
            assert_eq!(FileStateStore::new(&path).load().unwrap().unwrap().revision, 1);
        }
    }

    #[test]
    fn lock_file_sits_beside_the_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        FileStateStore::new(&path).save(&seeded(1)).unwrap();
        assert!(dir.path().join("state.json.lock").exists());
    }
}
