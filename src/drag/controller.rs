//! Pointer state machine for board items.
//!
//! # State Machine
//!
//! ```text
//! Idle --down--> Armed --move--> Dragging
//!   ^              |                |
//!   +--- up / leave / cancel / move-without-buttons ---+
//! ```
//!
//! The controller is a reducer: every input is dispatched together with the
//! current [`BoardStateStore`], so handlers always read current state.
//!
//! Ending a session whose item moved yields a [`CommitTicket`]. The caller
//! persists it however it likes and dispatches the outcome back through
//! [`DragController::settle`], which rolls the item back to the ticket's
//! origin on failure.
//!
//! # Invariants
//!
//! 1. At most one session is open.
//! 2. Every position written by a move lies inside the clamp rectangle for
//!    the item's size and the current container.
//! 3. A failed sync restores exactly the ticket's origin, never an
//!    intermediate position.
//! 4. A settled ticket only rolls back if its session still owns the item's
//!    latest write: no later session committed a change for that item and no
//!    later session is currently dragging it.
//! 5. Pointer capture is released whenever the session ends, on every path.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::board::{BoardStateStore, ItemId};
use crate::errors::SyncError;
use crate::geometry::{Point, Position, Size, clamp, compute_bounds};
use crate::sync::SyncOutcome;
use crate::zorder::ZOrderManager;

use super::capture::{CaptureGuard, PointerSurface};
use super::session::{CommitTicket, DragSession, Phase, SessionId};

/// Pointer input routed to the controller, in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down {
        item: ItemId,
        x: f64,
        y: f64,
    },
    Move {
        x: f64,
        y: f64,
        /// Pressed-button bitmask; 0 means the release was missed.
        #[serde(default = "primary_button")]
        buttons: u16,
    },
    Up,
    Leave,
    Cancel,
    /// The board container changed size.
    Resize {
        width: i32,
        height: i32,
    },
}

fn primary_button() -> u16 {
    1
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Release,
    Leave,
    Cancel,
    /// A move arrived with no buttons pressed.
    ButtonsReleased,
    /// A new press arrived while the previous session was still open.
    MissedRelease,
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndReason::Release => write!(f, "release"),
            EndReason::Leave => write!(f, "leave"),
            EndReason::Cancel => write!(f, "cancel"),
            EndReason::ButtonsReleased => write!(f, "buttons-released"),
            EndReason::MissedRelease => write!(f, "missed-release"),
        }
    }
}

/// What settling a ticket did to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleReport {
    Committed {
        item_id: ItemId,
        position: Position,
    },
    RolledBack {
        item_id: ItemId,
        restored: Position,
        error: SyncError,
    },
    /// The sync failed but a later session owns the item's position.
    Superseded { item_id: ItemId, error: SyncError },
    /// The item was removed before the sync settled.
    ItemGone { item_id: ItemId },
}

impl SettleReport {
    pub fn item_id(&self) -> ItemId {
        match self {
            SettleReport::Committed { item_id, .. }
            | SettleReport::RolledBack { item_id, .. }
            | SettleReport::Superseded { item_id, .. }
            | SettleReport::ItemGone { item_id } => *item_id,
        }
    }

    /// Transient notice text for the user.
    pub fn notice(&self) -> String {
        match self {
            SettleReport::Committed { item_id, position } => {
                format!("Memo {} saved at {}", item_id, position)
            }
            SettleReport::RolledBack {
                item_id,
                restored,
                error,
            } => format!(
                "Could not save memo {} ({}); moved back to {}",
                item_id, error, restored
            ),
            SettleReport::Superseded { item_id, error } => format!(
                "Earlier save of memo {} failed ({}); keeping newer position",
                item_id, error
            ),
            SettleReport::ItemGone { item_id } => {
                format!("Memo {} was removed before its save finished", item_id)
            }
        }
    }
}

pub struct DragController {
    zorder: ZOrderManager,
    container: Size,
    margin: i32,
    surface: Arc<dyn PointerSurface>,
    session: Option<DragSession>,
    last_session: u64,
    /// Latest session with an unsettled commit, per item.
    owners: HashMap<ItemId, SessionId>,
}

impl std::fmt::Debug for DragController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragController")
            .field("phase", &self.phase())
            .field("container", &self.container)
            .field("pending", &self.owners.len())
            .finish()
    }
}

impl DragController {
    pub fn new(
        container: Size,
        margin: i32,
        zorder: ZOrderManager,
        surface: Arc<dyn PointerSurface>,
    ) -> Self {
        Self {
            zorder,
            container,
            margin,
            surface,
            session: None,
            last_session: 0,
            owners: HashMap::new(),
        }
    }

    /// Controller whose z-order counter starts above everything in `store`.
    pub fn for_store(
        store: &BoardStateStore,
        container: Size,
        margin: i32,
        surface: Arc<dyn PointerSurface>,
    ) -> Self {
        Self::new(
            container,
            margin,
            ZOrderManager::seeded(store.max_z_order()),
            surface,
        )
    }

    pub fn phase(&self) -> Phase {
        self.session.as_ref().map_or(Phase::Idle, |s| s.phase)
    }

    pub fn active_session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn container(&self) -> Size {
        self.container
    }

    /// Takes effect from the next move; existing positions are not re-clamped.
    pub fn set_container(&mut self, container: Size) {
        self.container = container;
    }

    pub fn margin(&self) -> i32 {
        self.margin
    }

    pub fn zorder(&self) -> &ZOrderManager {
        &self.zorder
    }

    /// Number of commits issued but not yet settled as the latest write.
    pub fn pending_commits(&self) -> usize {
        self.owners.len()
    }

    pub fn handle(&mut self, store: &mut BoardStateStore, event: PointerEvent) -> Option<CommitTicket> {
        match event {
            PointerEvent::Down { item, x, y } => self.pointer_down(store, item, Point::new(x, y)),
            PointerEvent::Move { x, y, buttons } => self.pointer_move(store, Point::new(x, y), buttons),
            PointerEvent::Up => self.end_session(store, EndReason::Release),
            PointerEvent::Leave => self.end_session(store, EndReason::Leave),
            PointerEvent::Cancel => self.end_session(store, EndReason::Cancel),
            PointerEvent::Resize { width, height } => {
                self.set_container(Size::new(width, height));
                None
            }
        }
    }

    /// Idle → Armed. Captures the anchor and origin, raises the item, and
    /// acquires pointer capture. Nothing moves yet.
    ///
    /// A press while a session is still open means its release was missed;
    /// that session is ended first and its ticket, if any, returned.
    pub fn pointer_down(
        &mut self,
        store: &mut BoardStateStore,
        item_id: ItemId,
        pointer: Point,
    ) -> Option<CommitTicket> {
        let stale = if self.session.is_some() {
            self.end_session(store, EndReason::MissedRelease)
        } else {
            None
        };

        let Some(origin) = store.position_of(item_id) else {
            debug!(item = %item_id, "pointer-down on unknown item ignored");
            return stale;
        };

        // The item exists, so raising it cannot fail past this point.
        let z = self.raise(store, item_id);

        self.last_session += 1;
        let id = SessionId(self.last_session);
        self.session = Some(DragSession {
            id,
            item_id,
            anchor: pointer.offset_from(origin),
            origin,
            phase: Phase::Armed,
            _capture: CaptureGuard::acquire(Arc::clone(&self.surface)),
        });
        debug!(session = %id, item = %item_id, %origin, z, "drag session armed");
        stale
    }

    /// Put an existing item on top of the stack. When the counter is
    /// exhausted the board is renumbered `1..=N` and the counter re-seeded.
    fn raise(&mut self, store: &mut BoardStateStore, item_id: ItemId) -> i64 {
        let z = match self.zorder.activate(item_id) {
            Some(z) => z,
            None => {
                let top = store.renumber_z_orders();
                warn!(top, "z-order counter exhausted, renumbered board");
                self.zorder = ZOrderManager::seeded(top);
                self.zorder.activate(item_id).unwrap_or(top)
            }
        };
        if let Err(err) = store.set_z_order(item_id, z) {
            warn!(%err, "failed to raise item");
        }
        z
    }

    /// Apply a move. A move with no buttons pressed ends the session.
    pub fn pointer_move(
        &mut self,
        store: &mut BoardStateStore,
        pointer: Point,
        buttons: u16,
    ) -> Option<CommitTicket> {
        if buttons == 0 {
            return self.end_session(store, EndReason::ButtonsReleased);
        }
        let (session_id, item_id) = self.session.as_ref().map(|s| (s.id, s.item_id))?;
        let Some(size) = store.get_item(item_id).map(|item| item.size) else {
            warn!(session = %session_id, item = %item_id, "item vanished mid-drag");
            self.session = None;
            return None;
        };

        let session = self.session.as_mut()?;
        let bounds = compute_bounds(size, self.container, self.margin);
        let next = clamp(Position::from_point(pointer.minus(session.anchor)), &bounds);
        if store.set_position(session.item_id, next).is_ok() {
            session.phase = Phase::Dragging;
            trace!(session = %session.id, position = %next, "drag move");
        }
        None
    }

    pub fn pointer_up(&mut self, store: &mut BoardStateStore) -> Option<CommitTicket> {
        self.end_session(store, EndReason::Release)
    }

    pub fn pointer_leave(&mut self, store: &mut BoardStateStore) -> Option<CommitTicket> {
        self.end_session(store, EndReason::Leave)
    }

    pub fn pointer_cancel(&mut self, store: &mut BoardStateStore) -> Option<CommitTicket> {
        self.end_session(store, EndReason::Cancel)
    }

    /// Close the open session. Returns a ticket only when the item's final
    /// position differs from its origin. Capture is released when the
    /// session drops at the end of this call.
    pub fn end_session(&mut self, store: &BoardStateStore, reason: EndReason) -> Option<CommitTicket> {
        let session = self.session.take()?;
        let Some(target) = store.position_of(session.item_id) else {
            warn!(session = %session.id, item = %session.item_id, "item vanished before release");
            return None;
        };
        if target == session.origin {
            debug!(session = %session.id, %reason, "drag ended without movement");
            return None;
        }

        self.owners.insert(session.item_id, session.id);
        debug!(session = %session.id, %reason, from = %session.origin, to = %target, "drag ended");
        Some(CommitTicket {
            session: session.id,
            item_id: session.item_id,
            origin: session.origin,
            target,
        })
    }

    /// Tear down an open session without committing: the item returns to
    /// its origin and capture is released.
    pub fn abandon(&mut self, store: &mut BoardStateStore) {
        if let Some(session) = self.session.take() {
            if store.set_position(session.item_id, session.origin).is_ok() {
                debug!(session = %session.id, "drag session abandoned");
            }
        }
    }

    /// Apply the outcome of a ticket's sync.
    pub fn settle(
        &mut self,
        store: &mut BoardStateStore,
        ticket: &CommitTicket,
        outcome: &SyncOutcome,
    ) -> SettleReport {
        let owned = self.owners.get(&ticket.item_id) == Some(&ticket.session);
        if owned {
            self.owners.remove(&ticket.item_id);
        }

        let error = match outcome {
            SyncOutcome::Synced => {
                debug!(session = %ticket.session, item = %ticket.item_id, "position committed");
                return SettleReport::Committed {
                    item_id: ticket.item_id,
                    position: ticket.target,
                };
            }
            SyncOutcome::Failed(error) => error.clone(),
        };

        if !owned {
            info!(session = %ticket.session, item = %ticket.item_id, "stale sync failure ignored");
            return SettleReport::Superseded {
                item_id: ticket.item_id,
                error,
            };
        }

        if let Some(active) = self
            .session
            .as_mut()
            .filter(|s| s.item_id == ticket.item_id)
        {
            // The newer session started from the position being discarded;
            // its release must compare against the last saved one.
            active.origin = ticket.origin;
            if active.phase == Phase::Dragging {
                info!(session = %ticket.session, newer = %active.id, "sync failed while item is being dragged");
                return SettleReport::Superseded {
                    item_id: ticket.item_id,
                    error,
                };
            }
        }

        match store.set_position(ticket.item_id, ticket.origin) {
            Ok(()) => {
                warn!(
                    session = %ticket.session,
                    item = %ticket.item_id,
                    restored = %ticket.origin,
                    kind = %error.kind,
                    "position rolled back"
                );
                SettleReport::RolledBack {
                    item_id: ticket.item_id,
                    restored: ticket.origin,
                    error,
                }
            }
            Err(_) => SettleReport::ItemGone {
                item_id: ticket.item_id,
            },
        }
    }
}
