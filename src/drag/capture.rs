//! Scoped pointer capture.
//!
//! While a press is in progress the host must route global move/release
//! events to us. [`CaptureGuard`] attaches on construction and detaches in
//! `Drop`, so release, forced termination, rollback, unmount and unwinding
//! all detach exactly once.

use std::sync::Arc;

/// Host hook for attaching and detaching global pointer listeners.
pub trait PointerSurface: Send + Sync {
    fn attach(&self);
    fn detach(&self);
}

/// Surface for headless hosts that route every event to the controller anyway.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl PointerSurface for NullSurface {
    fn attach(&self) {}
    fn detach(&self) {}
}

/// Holds the listeners for the lifetime of one press.
pub struct CaptureGuard {
    surface: Arc<dyn PointerSurface>,
}

impl CaptureGuard {
    pub fn acquire(surface: Arc<dyn PointerSurface>) -> Self {
        surface.attach();
        Self { surface }
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.surface.detach();
    }
}

impl std::fmt::Debug for CaptureGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureGuard").finish_non_exhaustive()
    }
}

/// Counts attach/detach calls.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct CountingSurface {
    attached: std::sync::atomic::AtomicUsize,
    detached: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl CountingSurface {
    pub(crate) fn attached(&self) -> usize {
        self.attached.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub(crate) fn detached(&self) -> usize {
        self.detached.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Listeners currently attached.
    pub(crate) fn live(&self) -> usize {
        self.attached() - self.detached()
    }
}

#[cfg(test)]
impl PointerSurface for CountingSurface {
    fn attach(&self) {
        self.attached
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn detach(&self) {
        self.detached
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}
