// Entity Store: holds the latest world snapshot and swaps it atomically.

use crate::domain::entities::WorldSnapshot;
use std::sync::Arc;

/// Owner of the current world snapshot.
///
/// Readers get a shared handle to a whole snapshot. A replacement swaps the handle, so a
/// reader keeps seeing the snapshot it fetched in full until it asks again.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    current: Arc<WorldSnapshot>,
    // Number of replacements applied since the session started.
    generation: u64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the visible world state wholesale.
    pub fn replace(&mut self, snapshot: WorldSnapshot) {
        self.current = Arc::new(snapshot);
        self.generation += 1;
    }

    /// Current snapshot for read-only use.
    pub fn get(&self) -> Arc<WorldSnapshot> {
        Arc::clone(&self.current)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drops the held snapshot, leaving an empty world.
    pub fn clear(&mut self) {
        self.replace(WorldSnapshot::default());
    }
}
