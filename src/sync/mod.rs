//! Remote persistence of item positions.
//!
//! [`PositionSyncClient`] talks to the board backend; [`PositionSync`] is the
//! seam the event loop depends on so hosts and tests can substitute their own.

pub mod client;
pub mod local;

pub use client::{
    Credentials, PositionSync, PositionSyncClient, PositionUpdate, SyncOutcome,
    extract_error_message, is_failure_ack,
};
pub use local::LocalSync;
