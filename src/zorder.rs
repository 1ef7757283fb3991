//! Stacking-order counter.

use tracing::trace;

use crate::board::ItemId;

/// Hands out strictly increasing z-order values as items are activated.
///
/// The counter lives only as long as the board session; after a reload it is
/// re-seeded from the highest z-order found in the snapshot.
#[derive(Debug, Clone, Default)]
pub struct ZOrderManager {
    counter: i64,
}

impl ZOrderManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start above `max_existing` so activations always land on top of
    /// everything already on the board.
    pub fn seeded(max_existing: i64) -> Self {
        Self {
            counter: max_existing,
        }
    }

    /// Assign the next stacking value to `item_id`.
    ///
    /// Returns `None` once the counter is exhausted; the counter is left
    /// unchanged so the caller can renumber the board and re-seed.
    pub fn activate(&mut self, item_id: ItemId) -> Option<i64> {
        let next = self.counter.checked_add(1)?;
        self.counter = next;
        trace!(item = %item_id, z = next, "activated item");
        Some(next)
    }

    /// The last value handed out (or the seed, if none yet).
    pub fn current(&self) -> i64 {
        self.counter
    }
}
