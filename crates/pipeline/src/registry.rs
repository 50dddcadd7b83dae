//! In-memory registry of active generation batches.
//!
//! Observability only: nothing here is required for correctness and none
//! of it survives a restart. The registry is an injectable handle (cheap
//! to clone) rather than process-wide state so tests can inspect it
//! without global coupling.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use atelier_core::types::{DbId, Timestamp};
use uuid::Uuid;

/// Which stage of the pipeline a batch is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Concept,
    Render,
}

/// Progress snapshot of one in-flight batch.
#[derive(Debug, Clone)]
pub struct ActiveBatch {
    pub title_id: DbId,
    pub total: usize,
    pub phase: BatchPhase,
    /// Items that have reached a terminal status.
    pub settled: usize,
    pub started_at: Timestamp,
}

/// Shared handle to the active-batch map.
#[derive(Debug, Clone, Default)]
pub struct GenerationRegistry {
    batches: Arc<Mutex<HashMap<Uuid, ActiveBatch>>>,
}

impl GenerationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new batch and return its id.
    pub fn register(&self, title_id: DbId, total: usize) -> Uuid {
        let id = Uuid::new_v4();
        let batch = ActiveBatch {
            title_id,
            total,
            phase: BatchPhase::Concept,
            settled: 0,
            started_at: chrono::Utc::now(),
        };
        self.batches
            .lock()
            .expect("registry lock poisoned")
            .insert(id, batch);
        id
    }

    /// Record a phase transition for a batch. A no-op for unknown ids.
    pub fn set_phase(&self, id: Uuid, phase: BatchPhase) {
        if let Some(batch) = self
            .batches
            .lock()
            .expect("registry lock poisoned")
            .get_mut(&id)
        {
            batch.phase = phase;
        }
    }

    /// Record one item reaching a terminal status.
    pub fn item_settled(&self, id: Uuid) {
        if let Some(batch) = self
            .batches
            .lock()
            .expect("registry lock poisoned")
            .get_mut(&id)
        {
            batch.settled += 1;
        }
    }

    /// Remove a finished batch.
    pub fn finish(&self, id: Uuid) {
        self.batches
            .lock()
            .expect("registry lock poisoned")
            .remove(&id);
    }

    /// Snapshot of every active batch, for debugging endpoints and tests.
    pub fn snapshot(&self) -> Vec<(Uuid, ActiveBatch)> {
        self.batches
            .lock()
            .expect("registry lock poisoned")
            .iter()
            .map(|(id, batch)| (*id, batch.clone()))
            .collect()
    }

    /// Number of batches currently in flight.
    pub fn len(&self) -> usize {
        self.batches.lock().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
