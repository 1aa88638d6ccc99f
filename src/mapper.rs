//! Conversions between detector space and pixel space.
//!
//! Detector coordinates are normalized to [0,1] with the origin at the
//! bottom-left; pixel coordinates have the origin at the top-left. Every
//! mapping here is a vertical flip (`y' = 1 - y`) followed by a scale.
//! Values outside [0,1] are passed through unclamped.

use crate::types::{NormalizedRect, PixelRect, Point, ViewSize};

/// Project a normalized point into a view of the given size.
pub fn to_pixel_point(point: Point, size: ViewSize) -> Point {
    Point::new(point.x * size.width, (1.0 - point.y) * size.height)
}

/// Project a normalized rectangle into a view of the given size.
///
/// The rectangle's bottom-left corner becomes its top-left after the flip,
/// so the pixel origin is taken from the normalized top edge.
pub fn to_pixel_rect(rect: NormalizedRect, size: ViewSize) -> PixelRect {
    PixelRect::new(
        rect.x * size.width,
        (1.0 - rect.y - rect.height) * size.height,
        rect.width * size.width,
        rect.height * size.height,
    )
}

/// Inverse of [`to_pixel_point`].
pub fn from_pixel_point(point: Point, size: ViewSize) -> Point {
    Point::new(point.x / size.width, 1.0 - point.y / size.height)
}

/// Inverse of [`to_pixel_rect`].
pub fn from_pixel_rect(rect: PixelRect, size: ViewSize) -> NormalizedRect {
    let height = rect.height / size.height;
    NormalizedRect::new(
        rect.x / size.width,
        1.0 - rect.y / size.height - height,
        rect.width / size.width,
        height,
    )
}

/// Project a point normalized to `frame` (e.g. a landmark relative to its
/// face box) into the pixel space `frame` lives in.
pub fn to_frame_point(point: Point, frame: &PixelRect) -> Point {
    let local = to_pixel_point(point, ViewSize::new(frame.width, frame.height));
    Point::new(frame.x + local.x, frame.y + local.y)
}

/// Whether `inner` lies entirely inside `outer`.
pub fn rect_contains(outer: &PixelRect, inner: &PixelRect) -> bool {
    outer.contains_rect(inner)
}

/// A guide box centered in the view, `width_fraction` of the view wide, with
/// the given width:height aspect ratio.
pub fn guide_box(size: ViewSize, width_fraction: f32, aspect_ratio: f32) -> PixelRect {
    let width = width_fraction * size.width;
    let height = width / aspect_ratio;
    let x = 0.5 * (size.width - width);
    let y = 0.5 * size.height - 0.5 * height;
    PixelRect::new(x, y, width, height)
}
