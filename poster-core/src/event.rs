//! Pointer input and the coordinate spaces it moves between.

use serde::{Deserialize, Serialize};

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed / finger down.
    Down,
    /// Pointer moved.
    Move,
    /// Button released / finger up.
    Up,
}

/// A pointer event in device (on-screen) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Phase of this event.
    pub phase: PointerPhase,
    /// Device X coordinate.
    pub x: f32,
    /// Device Y coordinate.
    pub y: f32,
}

impl PointerEvent {
    /// Pointer pressed at `(x, y)`.
    #[must_use]
    pub fn down(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Down,
            x,
            y,
        }
    }

    /// Pointer moved to `(x, y)`.
    #[must_use]
    pub fn moved(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Move,
            x,
            y,
        }
    }

    /// Pointer released.
    #[must_use]
    pub fn up(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Up,
            x,
            y,
        }
    }
}

/// A point in percentage space (`[0, 100]` on both axes for on-canvas points).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PercentPoint {
    /// Horizontal percent.
    pub x: f32,
    /// Vertical percent.
    pub y: f32,
}

impl PercentPoint {
    /// Create a point.
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in percentage units.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// On-screen bounding box of the mounted canvas, in device coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasRect {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Displayed width.
    pub width: f32,
    /// Displayed height.
    pub height: f32,
}

impl CanvasRect {
    /// Create a bounding box.
    #[must_use]
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Whether the box can map points (non-zero, finite size).
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Convert a device point into percentage space.
    ///
    /// Points outside the box map outside `[0, 100]`; callers clamp as needed.
    /// Returns `None` when the box is not usable.
    #[must_use]
    pub fn to_percent(&self, x: f32, y: f32) -> Option<PercentPoint> {
        if !self.is_usable() {
            return None;
        }
        Some(PercentPoint {
            x: (x - self.left) / self.width * 100.0,
            y: (y - self.top) / self.height * 100.0,
        })
    }
}
