use serde::{Deserialize, Serialize};

use crate::board::ItemId;
use crate::geometry::{Offset, Position};

use super::capture::CaptureGuard;

/// Stamp identifying one drag session. Strictly increasing per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Pointer is down on an item; nothing has moved yet.
    Armed,
    /// At least one move has been applied.
    Dragging,
}

/// One pointer-down-to-release interaction with a board item.
#[derive(Debug)]
pub struct DragSession {
    pub(crate) id: SessionId,
    pub(crate) item_id: ItemId,
    pub(crate) anchor: Offset,
    pub(crate) origin: Position,
    pub(crate) phase: Phase,
    /// Released when the session is dropped.
    pub(crate) _capture: CaptureGuard,
}

impl DragSession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn anchor(&self) -> Offset {
        self.anchor
    }

    pub fn origin(&self) -> Position {
        self.origin
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

/// A changed position that must be persisted, stamped with the session that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitTicket {
    pub session: SessionId,
    pub item_id: ItemId,
    /// Position captured at Armed time; the rollback target.
    pub origin: Position,
    pub target: Position,
}
