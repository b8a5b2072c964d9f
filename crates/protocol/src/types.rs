use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };
}

/// Width and height in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A size is usable as a coordinate basis only when both sides are
    /// finite and strictly positive.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Height divided by width, the ratio the page-flip layout works in.
    pub fn aspect_hw(&self) -> Option<f64> {
        self.is_usable().then(|| self.height / self.width)
    }
}

/// Axis-aligned rectangle. Field names follow the hotspot wire format
/// (`{x, y, width, height}`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Express this rect as percentages of `basis`.
    ///
    /// Returns `None` when the basis is not usable (image not decoded yet).
    pub fn to_percent_of(&self, basis: Size) -> Option<Rect> {
        if !basis.is_usable() {
            return None;
        }
        Some(Rect {
            x: self.x / basis.width * 100.0,
            y: self.y / basis.height * 100.0,
            width: self.width / basis.width * 100.0,
            height: self.height / basis.height * 100.0,
        })
    }

    /// Inverse of [`Rect::to_percent_of`]: treat `self` as percentages and
    /// resolve them against `container`.
    pub fn from_percent_in(&self, container: Size) -> Rect {
        Rect {
            x: container.width * self.x / 100.0,
            y: container.height * self.y / 100.0,
            width: container.width * self.width / 100.0,
            height: container.height * self.height / 100.0,
        }
    }
}
