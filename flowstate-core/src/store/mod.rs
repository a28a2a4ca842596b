//! Regime state persistence.
//!
//! The engine only sees the `StateStore` trait. Every implementation enforces
//! the revision rule: a save must carry exactly the stored revision plus one
//! (or 1 when nothing is stored). A writer that read a stale state therefore
//! gets `StoreError::Conflict` instead of silently double-counting a cycle.

pub mod file;
pub mod memory;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::RegimeState;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("state file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("revision conflict: expected {expected}, got {found}")]
    Conflict { expected: u64, found: u64 },
    #[error("state store unavailable: {0}")]
    Unavailable(String),
}

/// Durable home of the regime state.
pub trait StateStore: Send + Sync {
    /// Current state, or `None` before the first cycle (or after a reset).
    fn load(&self) -> Result<Option<RegimeState>, StoreError>;

    /// Persist a new state. Must reject a revision that does not follow the
    /// stored one (see [`check_revision`]).
    fn save(&self, state: &RegimeState) -> Result<(), StoreError>;

    /// Delete the stored state.
    fn reset(&self) -> Result<(), StoreError>;
}

impl<S: StateStore + ?Sized> StateStore for Arc<S> {
    fn load(&self) -> Result<Option<RegimeState>, StoreError> {
        (**self).load()
    }

    fn save(&self, state: &RegimeState) -> Result<(), StoreError> {
        (**self).save(state)
    }

    fn reset(&self) -> Result<(), StoreError> {
        (**self).reset()
    }
}

/// Enforce that `incoming` is the direct successor of `stored`.
pub fn check_revision(stored: Option<&RegimeState>, incoming: &RegimeState) -> Result<(), StoreError> {
    let expected = stored.map_or(0, |s| s.revision) + 1;
    if incoming.revision != expected {
        return Err(StoreError::Conflict {
            expected,
            found: incoming.revision,
        });
    }
    Ok(())
}
