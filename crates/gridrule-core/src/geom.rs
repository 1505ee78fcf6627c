//! Axis-aligned boxes, axes, and contact sides.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Axis / Side
// ---------------------------------------------------------------------------

/// One of the two integration axes. Y is always resolved before X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Both axes in integration order.
    pub const ORDER: [Axis; 2] = [Axis::Y, Axis::X];

    /// Index into per-axis arrays (`X = 0`, `Y = 1`).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }
}

/// The side of a neighbor that the moving entity made contact with.
///
/// `Top` fires when the mover's center is above the neighbor's center on Y,
/// `Left` when the mover's center is left of the neighbor's center on X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// The side hit when the mover approaches from the low-coordinate end.
    pub fn near(axis: Axis) -> Side {
        match axis {
            Axis::X => Side::Left,
            Axis::Y => Side::Top,
        }
    }

    /// The side hit when the mover approaches from the high-coordinate end.
    pub fn far(axis: Axis) -> Side {
        match axis {
            Axis::X => Side::Right,
            Axis::Y => Side::Bottom,
        }
    }

    /// The axis this side resolves on.
    pub fn axis(self) -> Axis {
        match self {
            Side::Top | Side::Bottom => Axis::Y,
            Side::Left | Side::Right => Axis::X,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::Top => 0,
            Side::Right => 1,
            Side::Bottom => 2,
            Side::Left => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Aabb
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box in level units (one cell = 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Aabb {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// The unit box of level cell `(cx, cy)`.
    pub fn cell(cx: usize, cy: usize) -> Self {
        Self::new(cx as f64, cy as f64, 1.0, 1.0)
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.w / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.h / 2.0
    }

    pub fn center(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.center_x(),
            Axis::Y => self.center_y(),
        }
    }

    /// Strict overlap test. Boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    /// Squared distance between the two centers.
    pub fn dist_sq(&self, other: &Aabb) -> f64 {
        let dx = self.center_x() - other.center_x();
        let dy = self.center_y() - other.center_y();
        dx * dx + dy * dy
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
