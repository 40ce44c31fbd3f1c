//! Directional viewport narrowing.
//!
//! Every zoom step maps the current viewport rectangle plus a direction name
//! to a smaller rectangle in the same (capture-local) coordinate space. The
//! math is pure integer arithmetic with division truncating toward zero, so
//! a resolved region is always contained in its input rectangle.

use serde::{Deserialize, Serialize};

use crate::errors::{ViewfinderError, ViewfinderResult};

/// Axis-aligned rectangle in capture-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Center point, truncating toward the top-left on odd extents.
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// True when `other` lies fully inside `self`.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }

    /// Clip to a `width` x `height` extent anchored at the origin.
    ///
    /// Returns `None` when nothing remains, which happens when a persisted
    /// rectangle outlives a resolution change that shrank the capture.
    pub fn clipped_to(&self, width: u32, height: u32) -> Option<Rect> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.width.min(width - self.x);
        let h = self.height.min(height - self.y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(Rect::new(self.x, self.y, w, h))
    }
}

/// Closed vocabulary of zoom directions.
///
/// Corners take a half-by-half quadrant, edges a third-thickness strip,
/// `Center` the middle 50%, the `CenterN..CenterW` family keeps the 2/3 that
/// remains after dropping the opposite edge strip, and the `ExcludeNw..
/// ExcludeSe` family keeps the 3/4 that remains after dropping a quarter
/// corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
    Center,
    CenterN,
    CenterS,
    CenterE,
    CenterW,
    ExcludeNw,
    ExcludeNe,
    ExcludeSw,
    ExcludeSe,
}

/// Canonical names, in the order shown to the operator on a bad input.
pub const CANONICAL_DIRECTIONS: [&str; 17] = [
    "top-left",
    "top-right",
    "bottom-left",
    "bottom-right",
    "top",
    "bottom",
    "left",
    "right",
    "center",
    "center-n",
    "center-s",
    "center-e",
    "center-w",
    "exclude-nw",
    "exclude-ne",
    "exclude-sw",
    "exclude-se",
];

impl Direction {
    /// Resolve a direction name, case-insensitively and ignoring surrounding
    /// whitespace. Every alias maps onto exactly one canonical direction;
    /// anything else is `UnknownDirection` listing the canonical vocabulary.
    pub fn parse(input: &str) -> ViewfinderResult<Direction> {
        let normalized = input.trim().to_lowercase();
        let dir = match normalized.as_str() {
            "top-left" | "nw" | "northwest" => Direction::TopLeft,
            "top-right" | "ne" | "northeast" => Direction::TopRight,
            "bottom-left" | "sw" | "southwest" => Direction::BottomLeft,
            "bottom-right" | "se" | "southeast" => Direction::BottomRight,
            "top" | "n" | "north" | "up" => Direction::Top,
            "bottom" | "s" | "south" | "down" => Direction::Bottom,
            "left" | "w" | "west" => Direction::Left,
            "right" | "e" | "east" => Direction::Right,
            "center" => Direction::Center,
            "center-n" | "center-top" | "center-north" | "exclude-bottom" | "exclude-s" => {
                Direction::CenterN
            }
            "center-s" | "center-bottom" | "center-south" | "exclude-top" | "exclude-n" => {
                Direction::CenterS
            }
            "center-e" | "center-right" | "center-east" | "exclude-left" | "exclude-w" => {
                Direction::CenterE
            }
            "center-w" | "center-left" | "center-west" | "exclude-right" | "exclude-e" => {
                Direction::CenterW
            }
            "exclude-nw" | "exclude-top-left" => Direction::ExcludeNw,
            "exclude-ne" | "exclude-top-right" => Direction::ExcludeNe,
            "exclude-sw" | "exclude-bottom-left" => Direction::ExcludeSw,
            "exclude-se" | "exclude-bottom-right" => Direction::ExcludeSe,
            _ => {
                return Err(ViewfinderError::UnknownDirection {
                    input: input.trim().to_string(),
                    valid: CANONICAL_DIRECTIONS.join(", "),
                })
            }
        };
        Ok(dir)
    }

    pub fn canonical_name(&self) -> &'static str {
        match self {
            Direction::TopLeft => "top-left",
            Direction::TopRight => "top-right",
            Direction::BottomLeft => "bottom-left",
            Direction::BottomRight => "bottom-right",
            Direction::Top => "top",
            Direction::Bottom => "bottom",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Center => "center",
            Direction::CenterN => "center-n",
            Direction::CenterS => "center-s",
            Direction::CenterE => "center-e",
            Direction::CenterW => "center-w",
            Direction::ExcludeNw => "exclude-nw",
            Direction::ExcludeNe => "exclude-ne",
            Direction::ExcludeSw => "exclude-sw",
            Direction::ExcludeSe => "exclude-se",
        }
    }
}

/// Compute the sub-rectangle selected by `direction` within `rect`.
///
/// The result is expressed in the same coordinate space as the input and is
/// contained in it; the area never grows.
pub fn resolve_region(rect: &Rect, direction: Direction) -> Rect {
    let Rect { x, y, width: w, height: h } = *rect;
    let half_w = w / 2;
    let half_h = h / 2;
    let third_w = w / 3;
    let third_h = h / 3;
    let quarter_w = w / 4;
    let quarter_h = h / 4;

    match direction {
        // Corner quadrants, half by half.
        Direction::TopLeft => Rect::new(x, y, half_w, half_h),
        Direction::TopRight => Rect::new(x + half_w, y, half_w, half_h),
        Direction::BottomLeft => Rect::new(x, y + half_h, half_w, half_h),
        Direction::BottomRight => Rect::new(x + half_w, y + half_h, half_w, half_h),

        // Edge strips, one third thick across the full orthogonal extent.
        Direction::Top => Rect::new(x, y, w, third_h),
        Direction::Bottom => Rect::new(x, y + h - third_h, w, third_h),
        Direction::Left => Rect::new(x, y, third_w, h),
        Direction::Right => Rect::new(x + w - third_w, y, third_w, h),

        // Middle 50% box.
        Direction::Center => Rect::new(x + quarter_w, y + quarter_h, half_w, half_h),

        // Keep 2/3 after dropping the strip opposite the named side.
        Direction::CenterN => Rect::new(x, y, w, h - third_h),
        Direction::CenterS => Rect::new(x, y + third_h, w, h - third_h),
        Direction::CenterE => Rect::new(x + third_w, y, w - third_w, h),
        Direction::CenterW => Rect::new(x, y, w - third_w, h),

        // Keep 3/4 after dropping a quarter corner.
        Direction::ExcludeNw => Rect::new(x + quarter_w, y + quarter_h, w - quarter_w, h - quarter_h),
        Direction::ExcludeNe => Rect::new(x, y + quarter_h, w - quarter_w, h - quarter_h),
        Direction::ExcludeSw => Rect::new(x + quarter_w, y, w - quarter_w, h - quarter_h),
        Direction::ExcludeSe => Rect::new(x, y, w - quarter_w, h - quarter_h),
    }
}
