//! Resizing by dragging a node's border.

use loom_core::snap::{self, ResizeDirs, SnapGuide};
use loom_core::space::*;

/// Nodes never shrink below this, in their own frame's units.
pub const MIN_NODE_SIZE: f32 = 20.0;

/// Apply a pointer delta to the sides named in `dirs`. The other sides stay
/// at `original`; a side that would cross `min_size` of its anchor stops
/// there.
pub fn resize_rect<U>(
    original: euclid::Rect<f32, U>,
    dirs: ResizeDirs,
    delta: euclid::Vector2D<f32, U>,
    min_size: f32,
) -> euclid::Rect<f32, U> {
    let mut min_x = original.min_x();
    let mut min_y = original.min_y();
    let mut max_x = original.max_x();
    let mut max_y = original.max_y();
    if dirs.west {
        min_x = (min_x + delta.x).min(max_x - min_size);
    }
    if dirs.east {
        max_x = (max_x + delta.x).max(min_x + min_size);
    }
    if dirs.north {
        min_y = (min_y + delta.y).min(max_y - min_size);
    }
    if dirs.south {
        max_y = (max_y + delta.y).max(min_y + min_size);
    }
    euclid::Rect::new(
        euclid::Point2D::new(min_x, min_y),
        euclid::Size2D::new(max_x - min_x, max_y - min_y),
    )
}

/// Resize a world rectangle with grid and object snapping applied in that
/// order. Snapping that would break the minimum size is dropped.
pub fn resize_world(
    original: WorldRect,
    dirs: ResizeDirs,
    delta: WorldVector,
    grid: Option<f32>,
    statics: Option<(&[WorldRect], f32)>,
) -> (WorldRect, Vec<SnapGuide>) {
    let raw = resize_rect(original, dirs, delta, MIN_NODE_SIZE);
    let mut rect = raw;
    if let Some(grid) = grid {
        rect = snap::snap_resize_to_grid(rect, dirs, grid);
    }
    let mut guides = Vec::new();
    if let Some((statics, threshold)) = statics {
        let snapped = snap::snap_resize(original, rect, dirs, statics, threshold);
        rect = snapped.rect;
        guides = snapped.guides;
    }
    if rect.size.width < MIN_NODE_SIZE || rect.size.height < MIN_NODE_SIZE {
        return (raw, Vec::new());
    }
    (rect, guides)
}
