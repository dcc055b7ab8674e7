//! Coordinate frames.
//!
//! Node and edge geometry lives in one of two frames: world space (panned
//! and zoomed by the viewport) or screen space (pinned overlays, pointer
//! input). The frames are separate euclid units, so a `ScreenPoint` can
//! only become a `WorldPoint` through `Viewport`.

use serde::{Deserialize, Serialize};

/// Unit marker for canvas (world) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSpace;

/// Unit marker for screen (pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSpace;

pub type WorldPoint = euclid::Point2D<f32, WorldSpace>;
pub type WorldVector = euclid::Vector2D<f32, WorldSpace>;
pub type WorldSize = euclid::Size2D<f32, WorldSpace>;
pub type WorldRect = euclid::Rect<f32, WorldSpace>;

pub type ScreenPoint = euclid::Point2D<f32, ScreenSpace>;
pub type ScreenVector = euclid::Vector2D<f32, ScreenSpace>;
pub type ScreenSize = euclid::Size2D<f32, ScreenSpace>;
pub type ScreenRect = euclid::Rect<f32, ScreenSpace>;

/// Shorthand for `WorldRect::new(point(x, y), size(w, h))`.
pub fn world_rect(x: f32, y: f32, w: f32, h: f32) -> WorldRect {
    WorldRect::new(WorldPoint::new(x, y), WorldSize::new(w, h))
}

/// Shorthand for `ScreenRect::new(point(x, y), size(w, h))`.
pub fn screen_rect(x: f32, y: f32, w: f32, h: f32) -> ScreenRect {
    ScreenRect::new(ScreenPoint::new(x, y), ScreenSize::new(w, h))
}

/// Area of a rectangle (negative sizes count as empty).
pub fn rect_area<U>(rect: &euclid::Rect<f32, U>) -> f32 {
    rect.size.width.max(0.0) * rect.size.height.max(0.0)
}

/// Inclusive containment test: points on the border count as inside.
pub fn rect_contains<U>(rect: &euclid::Rect<f32, U>, p: euclid::Point2D<f32, U>) -> bool {
    p.x >= rect.min_x() && p.x <= rect.max_x() && p.y >= rect.min_y() && p.y <= rect.max_y()
}

/// AABB overlap, touching edges count as overlapping.
pub fn rects_overlap<U>(a: &euclid::Rect<f32, U>, b: &euclid::Rect<f32, U>) -> bool {
    a.min_x() <= b.max_x() && a.max_x() >= b.min_x() && a.min_y() <= b.max_y() && a.max_y() >= b.min_y()
}

/// Normalize a drag rectangle from two corner points.
pub fn rect_from_corners<U>(a: euclid::Point2D<f32, U>, b: euclid::Point2D<f32, U>) -> euclid::Rect<f32, U> {
    euclid::Rect::new(
        euclid::Point2D::new(a.x.min(b.x), a.y.min(b.y)),
        euclid::Size2D::new((b.x - a.x).abs(), (b.y - a.y).abs()),
    )
}
