use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::debug;

use crate::board::ItemId;

use super::client::{PositionSync, SyncOutcome};

/// Accepts every update without contacting a backend. Used for offline
/// replays.
#[derive(Debug, Default)]
pub struct LocalSync {
    accepted: AtomicUsize,
}

impl LocalSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PositionSync for LocalSync {
    async fn update_position(&self, item_id: ItemId, x: f64, y: f64) -> SyncOutcome {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        debug!(item = %item_id, x, y, "position accepted locally");
        SyncOutcome::Synced
    }
}
