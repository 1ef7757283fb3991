//! Position management for a board of draggable note cards.
//!
//! Items are dragged under a pointer, clamped to the board, raised to the
//! top of the z-order, and their final positions persisted to a backend with
//! optimistic update and rollback on failure.

pub mod board;
pub mod config;
pub mod drag;
pub mod errors;
pub mod geometry;
pub mod logging;
pub mod runtime;
pub mod sync;
pub mod zorder;
