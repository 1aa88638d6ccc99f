use serde::{Deserialize, Serialize};

/// A 2D point with floating-point coordinates.
///
/// Used both for detector output (normalized, origin bottom-left) and for
/// screen geometry (pixels, origin top-left); the containing type says which.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance, accumulated in f64.
    pub fn distance_squared(&self, other: &Point) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        dx * dx + dy * dy
    }
}

/// Pixel dimensions of the view the overlay is drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewSize {
    pub width: f32,
    pub height: f32,
}

impl ViewSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A rectangle in detector space: components in [0,1], origin bottom-left,
/// `(x, y)` being the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A rectangle in pixel space defined by top-left corner, width, and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    /// Whether `inner` lies entirely within this rectangle. Shared edges count
    /// as inside.
    pub fn contains_rect(&self, inner: &PixelRect) -> bool {
        inner.x >= self.x
            && inner.y >= self.y
            && inner.max_x() <= self.max_x()
            && inner.max_y() <= self.max_y()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_squared_in_f64() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_squared(&b), 25.0);
        assert_eq!(b.distance_squared(&a), 25.0);

        // Ten 0.1 offsets sum just above 0.1 in f32 inputs.
        let shifted = Point::new(0.6, 0.5).distance_squared(&Point::new(0.5, 0.5));
        assert!(shifted * 10.0 > 0.1);
    }

    #[test]
    fn rect_containment() {
        let outer = PixelRect::new(10.0, 10.0, 100.0, 50.0);
        assert!(outer.contains_rect(&PixelRect::new(20.0, 20.0, 10.0, 10.0)));
        assert!(outer.contains_rect(&outer));
        assert!(!outer.contains_rect(&PixelRect::new(100.0, 20.0, 20.0, 10.0)));
        assert!(!outer.contains_rect(&PixelRect::new(5.0, 20.0, 10.0, 10.0)));
    }
}
