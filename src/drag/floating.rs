//! The floating control cluster: a locally positioned button that opens a
//! dialog when clicked and relocates when dragged. Its position is not synced.
//!
//! A press stays a click while the pointer never travels more than the click
//! threshold from the press point; during that time the control does not
//! move. Once the threshold is exceeded the press becomes a drag for the rest
//! of its life, and its release never yields a click.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FloatingSection;
use crate::geometry::{Offset, Point, Position, Size, clamp, compute_bounds};

use super::capture::{CaptureGuard, PointerSurface};

/// Default click/drag classification threshold in pixels.
pub const CLICK_THRESHOLD: f64 = 5.0;

/// How a press on the floating control resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatingGesture {
    /// Open the control's dialog.
    Click,
    Moved { from: Position, to: Position },
}

/// Pointer input aimed at the floating control, in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FloatingEvent {
    FloatingDown {
        x: f64,
        y: f64,
    },
    FloatingMove {
        x: f64,
        y: f64,
        #[serde(default = "primary_button")]
        buttons: u16,
    },
    FloatingUp {
        x: f64,
        y: f64,
    },
}

fn primary_button() -> u16 {
    1
}

struct Press {
    start: Point,
    anchor: Offset,
    origin: Position,
    dragging: bool,
    _capture: CaptureGuard,
}

pub struct FloatingControl {
    position: Position,
    size: Size,
    viewport: Size,
    margin: i32,
    click_threshold: f64,
    surface: Arc<dyn PointerSurface>,
    press: Option<Press>,
}

impl FloatingControl {
    /// Place the control in the bottom-right corner of its legal rectangle.
    pub fn new(
        size: Size,
        viewport: Size,
        margin: i32,
        click_threshold: f64,
        surface: Arc<dyn PointerSurface>,
    ) -> Self {
        let bounds = compute_bounds(size, viewport, margin);
        let position = clamp(Position::new(bounds.max_x, bounds.max_y), &bounds);
        Self {
            position,
            size,
            viewport,
            margin,
            click_threshold,
            surface,
            press: None,
        }
    }

    /// Build the control from the `[floating]` config section.
    pub fn from_config(
        section: &FloatingSection,
        viewport: Size,
        surface: Arc<dyn PointerSurface>,
    ) -> Self {
        Self::new(
            section.size(),
            viewport,
            section.margin,
            section.click_threshold,
            surface,
        )
    }

    pub fn handle(&mut self, event: FloatingEvent) -> Option<FloatingGesture> {
        match event {
            FloatingEvent::FloatingDown { x, y } => {
                self.pointer_down(Point::new(x, y));
                None
            }
            FloatingEvent::FloatingMove { x, y, buttons } => self.pointer_move(Point::new(x, y), buttons),
            FloatingEvent::FloatingUp { x, y } => self.pointer_up(Point::new(x, y)),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.press.as_ref().is_some_and(|p| p.dragging)
    }

    pub fn pointer_down(&mut self, pointer: Point) {
        self.press = Some(Press {
            start: pointer,
            anchor: pointer.offset_from(self.position),
            origin: self.position,
            dragging: false,
            _capture: CaptureGuard::acquire(Arc::clone(&self.surface)),
        });
    }

    /// Track a move. A move with no buttons pressed ends the press as if
    /// released at `pointer`.
    pub fn pointer_move(&mut self, pointer: Point, buttons: u16) -> Option<FloatingGesture> {
        if buttons == 0 {
            return self.pointer_up(pointer);
        }
        self.track(pointer);
        None
    }

    /// Release: a click if the press never became a drag.
    pub fn pointer_up(&mut self, pointer: Point) -> Option<FloatingGesture> {
        self.track(pointer);
        let press = self.press.take()?;
        let gesture = if press.dragging {
            FloatingGesture::Moved {
                from: press.origin,
                to: self.position,
            }
        } else {
            FloatingGesture::Click
        };
        debug!(?gesture, "floating control released");
        Some(gesture)
    }

    /// Re-clamp after the viewport changes size.
    pub fn resize_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
        let bounds = compute_bounds(self.size, self.viewport, self.margin);
        self.position = clamp(self.position, &bounds);
    }

    fn track(&mut self, pointer: Point) {
        let Some(press) = self.press.as_mut() else {
            return;
        };
        if !press.dragging && press.start.distance_to(pointer) > self.click_threshold {
            press.dragging = true;
        }
        if press.dragging {
            let bounds = compute_bounds(self.size, self.viewport, self.margin);
            self.position = clamp(Position::from_point(pointer.minus(press.anchor)), &bounds);
        }
    }
}
