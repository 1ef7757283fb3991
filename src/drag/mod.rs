//! Pointer gestures: the board-item drag state machine, the floating control
//! classifier, and scoped pointer capture.

pub mod capture;
pub mod controller;
pub mod floating;
pub mod session;

pub use capture::{CaptureGuard, NullSurface, PointerSurface};
pub use controller::{DragController, EndReason, PointerEvent, SettleReport};
pub use floating::{CLICK_THRESHOLD, FloatingControl, FloatingEvent, FloatingGesture};
pub use session::{CommitTicket, DragSession, Phase, SessionId};
