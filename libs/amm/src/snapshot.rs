//! Last-read pool snapshot shared between refreshes and quotes

use parking_lot::RwLock;
use std::sync::Arc;
use tidepool_types::PoolSnapshot;

/// Copy-on-read holder of the most recent [`PoolSnapshot`]
///
/// Readers clone the `Arc` and never hold the lock across a computation. A
/// refresh replaces the whole snapshot; concurrent refreshes resolve as last
/// writer wins.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Option<Arc<PoolSnapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> Option<Arc<PoolSnapshot>> {
        self.current.read().clone()
    }

    /// Replace the current snapshot, returning the shared handle
    pub fn store(&self, snapshot: PoolSnapshot) -> Arc<PoolSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write() = Some(Arc::clone(&snapshot));
        snapshot
    }
}
