use crate::error::{Result, StackHammerError};
use crate::pipeline::Tileset;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::trace;

/// Single-slot holder for the most recent tileset.
///
/// Writers swap in a fully built `Arc`, so readers only ever see a complete
/// tileset or none. `put` replaces any prior value; nothing persists past the
/// store's lifetime.
#[derive(Debug, Default)]
pub struct SessionStore {
    slot: RwLock<Option<Arc<Tileset>>>,
    generation: AtomicU64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `tileset`, replacing the previous one, and returns the shared handle.
    pub fn put(&self, tileset: Tileset) -> Arc<Tileset> {
        let shared = Arc::new(tileset);
        {
            // the slot only ever holds complete values, so a poisoned lock is still usable
            let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
            *slot = Some(Arc::clone(&shared));
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        trace!(generation = self.generation(), "stored tileset");
        shared
    }

    /// Snapshot of the current tileset.
    pub fn get(&self) -> Result<Arc<Tileset>> {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        slot.clone().ok_or(StackHammerError::StoreEmpty)
    }

    /// Removes the stored tileset, returning it if there was one.
    pub fn clear(&self) -> Option<Arc<Tileset>> {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        slot.take()
    }

    pub fn is_empty(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }

    /// Number of successful `put` calls so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
