//! Board items, the in-memory store, and snapshot loading.

pub mod models;
pub mod snapshot;
pub mod store;

pub use models::{ItemId, MemoRecord, MemoStyle, MovableItem};
pub use snapshot::{BoardSnapshot, FileSnapshotSource, HttpSnapshotSource, SnapshotSource};
pub use store::BoardStateStore;
