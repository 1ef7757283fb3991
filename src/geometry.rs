//! Board geometry: integer item positions, fractional pointer coordinates,
//! and the clamp rectangle that keeps an item inside its container.
//!
//! All coordinates are container-relative pixels with the origin at the
//! container's top-left corner.

use serde::{Deserialize, Serialize};

/// Margin reserved on every side of the board.
pub const BOARD_MARGIN: i32 = 30;

/// Margin reserved on every side of the viewport for the floating control cluster.
pub const FLOATING_CONTROL_MARGIN: i32 = 60;

/// Integer top-left position of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Round a fractional point to the nearest integer position.
    pub fn from_point(point: Point) -> Self {
        Self::new(round_coord(point.x), round_coord(point.y))
    }

    pub fn to_point(self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Pointer coordinates as delivered by the input source.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Offset of this point from an item's top-left corner.
    pub fn offset_from(self, origin: Position) -> Offset {
        Offset {
            dx: self.x - f64::from(origin.x),
            dy: self.y - f64::from(origin.y),
        }
    }

    /// The point shifted back by `offset`, i.e. the top-left an item would
    /// have if it kept `offset` under the pointer.
    pub fn minus(self, offset: Offset) -> Point {
        Point::new(self.x - offset.dx, self.y - offset.dy)
    }

    /// Euclidean distance.
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Offset between the pointer and an item's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub dx: f64,
    pub dy: f64,
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for Size {
    type Err = anyhow::Error;

    /// Parses `WIDTHxHEIGHT`, e.g. `800x600`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| anyhow::anyhow!("Invalid size '{}'. Expected WIDTHxHEIGHT", s))?;
        let width = w
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid width in '{}'", s))?;
        let height = h
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid height in '{}'", s))?;
        Ok(Size::new(width, height))
    }
}

/// The legal rectangle for an item's top-left corner.
///
/// When the container is smaller than the item plus margins, `max_*` ends up
/// below `min_*`; [`clamp`] resolves such an axis to `min_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Bounds {
    /// True when clamping `position` would leave it unchanged.
    pub fn contains(&self, position: Position) -> bool {
        clamp(position, self) == position
    }

    pub fn is_degenerate(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }
}

/// Compute the legal rectangle for an item of `item` size inside `container`
/// with `margin` reserved on every side.
pub fn compute_bounds(item: Size, container: Size, margin: i32) -> Bounds {
    Bounds {
        min_x: margin,
        max_x: container
            .width
            .saturating_sub(item.width)
            .saturating_sub(margin),
        min_y: margin,
        max_y: container
            .height
            .saturating_sub(item.height)
            .saturating_sub(margin),
    }
}

/// Clip each axis of `proposed` into `bounds` independently.
pub fn clamp(proposed: Position, bounds: &Bounds) -> Position {
    Position::new(
        clamp_axis(proposed.x, bounds.min_x, bounds.max_x),
        clamp_axis(proposed.y, bounds.min_y, bounds.max_y),
    )
}

fn clamp_axis(value: i32, min: i32, max: i32) -> i32 {
    if max < min {
        return min;
    }
    value.max(min).min(max)
}

/// Round half away from zero; NaN maps to 0 and out-of-range values saturate.
pub fn round_coord(value: f64) -> i32 {
    value.round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_compute_bounds_board_example() {
        let bounds = compute_bounds(Size::new(200, 150), Size::new(800, 600), 30);
        assert_eq!(
            bounds,
            Bounds {
                min_x: 30,
                max_x: 570,
                min_y: 30,
                max_y: 420
            }
        );
    }

    #[test]
    fn test_clamp_board_example() {
        let bounds = compute_bounds(Size::new(200, 150), Size::new(800, 600), 30);
        assert_eq!(clamp(Position::new(1000, -50), &bounds), Position::new(570, 30));
    }

    #[test]
    fn test_clamp_inside_is_identity() {
        let bounds = compute_bounds(Size::new(256, 176), Size::new(1000, 800), 30);
        assert_eq!(bounds.max_x, 714);
        assert_eq!(bounds.max_y, 594);
        assert_eq!(clamp(Position::new(290, 290), &bounds), Position::new(290, 290));
    }

    #[test]
    fn test_container_smaller_than_item_resolves_to_min() {
        let bounds = compute_bounds(Size::new(300, 300), Size::new(200, 100), 30);
        assert!(bounds.is_degenerate());
        assert_eq!(clamp(Position::new(-10, 999), &bounds), Position::new(30, 30));
        assert!(bounds.contains(Position::new(30, 30)));
        assert!(!bounds.contains(Position::new(31, 30)));
    }

    #[test]
    fn test_floating_margin() {
        let bounds = compute_bounds(
            Size::new(56, 56),
            Size::new(1280, 800),
            FLOATING_CONTROL_MARGIN,
        );
        assert_eq!(bounds.min_x, 60);
        assert_eq!(bounds.max_x, 1280 - 56 - 60);
        assert_eq!(bounds.max_y, 800 - 56 - 60);
    }

    #[test]
    fn test_round_coord() {
        assert_eq!(round_coord(289.5), 290);
        assert_eq!(round_coord(-0.5), -1);
        assert_eq!(round_coord(12.49), 12);
        assert_eq!(round_coord(f64::NAN), 0);
        assert_eq!(round_coord(1e12), i32::MAX);
    }

    #[test]
    fn test_point_offset_roundtrip() {
        let origin = Position::new(100, 100);
        let pointer = Point::new(110.0, 112.5);
        let offset = pointer.offset_from(origin);
        assert_eq!(offset, Offset { dx: 10.0, dy: 12.5 });
        assert_eq!(Position::from_point(pointer.minus(offset)), origin);
    }

    #[test]
    fn test_size_from_str() {
        assert_eq!("800x600".parse::<Size>().unwrap(), Size::new(800, 600));
        assert_eq!("256X176".parse::<Size>().unwrap(), Size::new(256, 176));
        assert!("800".parse::<Size>().is_err());
        assert!("axb".parse::<Size>().is_err());
    }

    proptest! {
        #[test]
        fn clamped_position_is_always_inside(
            x in -5000i32..5000,
            y in -5000i32..5000,
            item_w in 1i32..600,
            item_h in 1i32..600,
            cont_w in 0i32..2000,
            cont_h in 0i32..2000,
            margin in 0i32..100,
        ) {
            let bounds = compute_bounds(Size::new(item_w, item_h), Size::new(cont_w, cont_h), margin);
            let clamped = clamp(Position::new(x, y), &bounds);
            prop_assert!(bounds.contains(clamped));
            prop_assert!(clamped.x >= bounds.min_x);
            prop_assert!(clamped.y >= bounds.min_y);
        }

        #[test]
        fn clamp_is_idempotent(x in -5000i32..5000, y in -5000i32..5000) {
            let bounds = compute_bounds(Size::new(200, 150), Size::new(800, 600), BOARD_MARGIN);
            let once = clamp(Position::new(x, y), &bounds);
            prop_assert_eq!(clamp(once, &bounds), once);
        }
    }
}
