use std::sync::Mutex;

use super::{check_revision, StateStore, StoreError};
use crate::domain::RegimeState;

/// In-process store. Used by embedders that persist elsewhere, and in tests.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    slot: Mutex<Option<RegimeState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: RegimeState) -> Self {
        Self {
            slot: Mutex::new(Some(state)),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<Option<RegimeState>, StoreError> {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        Ok(slot.clone())
    }

    fn save(&self, state: &RegimeState) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        check_revision(slot.as_ref(), state)?;
        *slot = Some(state.clone());
        Ok(())
    }

    fn reset(&self) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Regime;
    use chrono::NaiveDate;

    fn seeded(revision: u64) -> RegimeState {
        let mut s = RegimeState::seeded(Regime::Aggressive, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        s.revision = revision;
        s
    }

    #[test]
    fn save_then_load() {
        let store = MemoryStateStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&seeded(1)).unwrap();
        assert_eq!(store.load().unwrap().unwrap().revision, 1);
    }

    #[test]
    fn stale_save_leaves_state_untouched() {
        let store = MemoryStateStore::with_state(seeded(3));
        assert!(store.save(&seeded(3)).is_err());
        assert_eq!(store.load().unwrap().unwrap().revision, 3);
    }

    #[test]
    fn reset_clears() {
        let store = MemoryStateStore::with_state(seeded(1));
        store.reset().unwrap();
        assert!(store.load().unwrap().is_none());
        store.save(&seeded(1)).unwrap();
    }
}
