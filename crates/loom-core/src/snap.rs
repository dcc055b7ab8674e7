//! Grid and object snapping.
//!
//! Grid snapping rounds to multiples of the grid pitch and runs first.
//! Object snapping then aligns the moving rectangle's edges and center with
//! the static rectangles, producing guide lines for the renderer.

use crate::space::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapAxis {
    /// A vertical guide line (`x = coord`).
    X,
    /// A horizontal guide line (`y = coord`).
    Y,
}

/// An infinite alignment line to display while snapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapGuide {
    pub axis: SnapAxis,
    pub coord: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    pub rect: WorldRect,
    pub guides: Vec<SnapGuide>,
}

/// Which sides of a rectangle a resize gesture is dragging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResizeDirs {
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
}

impl ResizeDirs {
    pub fn is_empty(&self) -> bool {
        !(self.north || self.south || self.east || self.west)
    }
}

// ─── Grid ─────────────────────────────────────────────────────────────────

pub fn snap_to_grid(value: f32, grid: f32) -> f32 {
    if grid <= 0.0 {
        return value;
    }
    (value / grid).round() * grid
}

/// Round a moving rectangle's origin to the grid, keeping its size.
pub fn snap_rect_to_grid(rect: WorldRect, grid: f32) -> WorldRect {
    WorldRect::new(
        WorldPoint::new(snap_to_grid(rect.min_x(), grid), snap_to_grid(rect.min_y(), grid)),
        rect.size,
    )
}

/// Round only the dragged sides of a resized rectangle to the grid.
pub fn snap_resize_to_grid(proposed: WorldRect, dirs: ResizeDirs, grid: f32) -> WorldRect {
    let mut min_x = proposed.min_x();
    let mut min_y = proposed.min_y();
    let mut max_x = proposed.max_x();
    let mut max_y = proposed.max_y();
    if dirs.west {
        min_x = snap_to_grid(min_x, grid);
    }
    if dirs.east {
        max_x = snap_to_grid(max_x, grid);
    }
    if dirs.north {
        min_y = snap_to_grid(min_y, grid);
    }
    if dirs.south {
        max_y = snap_to_grid(max_y, grid);
    }
    from_bounds(min_x, min_y, max_x, max_y)
}

fn from_bounds(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> WorldRect {
    world_rect(min_x, min_y, (max_x - min_x).max(0.0), (max_y - min_y).max(0.0))
}

// ─── Objects ──────────────────────────────────────────────────────────────

/// Best (smallest) adjustment found so far on one axis.
#[derive(Debug, Clone, Copy)]
struct AxisMatch {
    delta: f32,
    coord: f32,
}

fn consider(best: &mut Option<AxisMatch>, moving: f32, target: f32, threshold: f32) {
    let delta = target - moving;
    if delta.abs() >= threshold {
        return;
    }
    if best.is_none_or(|b| delta.abs() < b.delta.abs()) {
        *best = Some(AxisMatch { delta, coord: target });
    }
}

fn x_lines(r: &WorldRect) -> ([f32; 2], f32) {
    ([r.min_x(), r.max_x()], r.center().x)
}

fn y_lines(r: &WorldRect) -> ([f32; 2], f32) {
    ([r.min_y(), r.max_y()], r.center().y)
}

/// Align a moving rectangle with `statics`.
///
/// Edges are compared against edges and centers against centers. On each
/// axis the smallest difference strictly below `threshold` wins and the
/// rectangle is translated by it.
pub fn snap_move(proposed: WorldRect, statics: &[WorldRect], threshold: f32) -> SnapResult {
    let mut best_x = None;
    let mut best_y = None;
    let (mx_edges, mx_center) = x_lines(&proposed);
    let (my_edges, my_center) = y_lines(&proposed);

    for s in statics {
        let (sx_edges, sx_center) = x_lines(s);
        let (sy_edges, sy_center) = y_lines(s);
        for m in mx_edges {
            for t in sx_edges {
                consider(&mut best_x, m, t, threshold);
            }
        }
        consider(&mut best_x, mx_center, sx_center, threshold);
        for m in my_edges {
            for t in sy_edges {
                consider(&mut best_y, m, t, threshold);
            }
        }
        consider(&mut best_y, my_center, sy_center, threshold);
    }

    let mut rect = proposed;
    let mut guides = Vec::new();
    if let Some(m) = best_x {
        rect.origin.x += m.delta;
        guides.push(SnapGuide {
            axis: SnapAxis::X,
            coord: m.coord,
        });
    }
    if let Some(m) = best_y {
        rect.origin.y += m.delta;
        guides.push(SnapGuide {
            axis: SnapAxis::Y,
            coord: m.coord,
        });
    }
    SnapResult { rect, guides }
}

/// Directional snap for resizing.
///
/// Only the sides named in `dirs` look for alignment targets (static edges
/// and centers). The opposite side stays where it was in `original`, so the
/// size is recomputed from that anchor.
pub fn snap_resize(
    original: WorldRect,
    proposed: WorldRect,
    dirs: ResizeDirs,
    statics: &[WorldRect],
    threshold: f32,
) -> SnapResult {
    let side = |moving: f32, lines: fn(&WorldRect) -> ([f32; 2], f32)| {
        let mut best = None;
        for s in statics {
            let (edges, center) = lines(s);
            for t in edges.into_iter().chain(std::iter::once(center)) {
                consider(&mut best, moving, t, threshold);
            }
        }
        best
    };

    let mut min_x = if dirs.west { proposed.min_x() } else { original.min_x() };
    let mut max_x = if dirs.east { proposed.max_x() } else { original.max_x() };
    let mut min_y = if dirs.north { proposed.min_y() } else { original.min_y() };
    let mut max_y = if dirs.south { proposed.max_y() } else { original.max_y() };
    let mut guides = Vec::new();

    let mut apply = |enabled: bool, value: &mut f32, axis: SnapAxis, lines: fn(&WorldRect) -> ([f32; 2], f32)| {
        if !enabled {
            return;
        }
        if let Some(m) = side(*value, lines) {
            *value = m.coord;
            guides.push(SnapGuide { axis, coord: m.coord });
        }
    };
    apply(dirs.west, &mut min_x, SnapAxis::X, x_lines);
    apply(dirs.east, &mut max_x, SnapAxis::X, x_lines);
    apply(dirs.north, &mut min_y, SnapAxis::Y, y_lines);
    apply(dirs.south, &mut max_y, SnapAxis::Y, y_lines);

    SnapResult {
        rect: from_bounds(min_x, min_y, max_x, max_y),
        guides,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn grid_rounds_to_nearest() {
        assert_eq!(snap_to_grid(29.0, 20.0), 20.0);
        assert_eq!(snap_to_grid(31.0, 20.0), 40.0);
        assert_eq!(snap_to_grid(31.0, 0.0), 31.0);
        assert_eq!(snap_rect_to_grid(world_rect(11.0, 49.0, 33.0, 7.0), 20.0), world_rect(20.0, 40.0, 33.0, 7.0));
    }

    #[test]
    fn threshold_is_strict() {
        let statics = [world_rect(105.0, 200.0, 100.0, 50.0)];
        // right edge 104.5, half a unit inside the threshold
        let r = snap_move(world_rect(4.5, 0.0, 100.0, 50.0), &statics, 5.0);
        assert_eq!(r.rect.min_x(), 5.0);
        assert_eq!(r.guides, vec![SnapGuide { axis: SnapAxis::X, coord: 105.0 }]);
        // right edge 99.5, half a unit outside
        let r = snap_move(world_rect(-0.5, 0.0, 100.0, 50.0), &statics, 5.0);
        assert_eq!(r.rect.min_x(), -0.5);
        assert!(r.guides.is_empty());
        // exactly at the threshold does not snap
        let r = snap_move(world_rect(0.0, 0.0, 100.0, 50.0), &statics, 5.0);
        assert_eq!(r.rect.min_x(), 0.0);
        // a hair inside does
        let r = snap_move(world_rect(0.01, 0.0, 100.0, 50.0), &statics, 5.0);
        assert!((r.rect.min_x() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn closest_candidate_wins() {
        let statics = [world_rect(103.0, 0.0, 10.0, 10.0), world_rect(101.0, 300.0, 10.0, 10.0)];
        let r = snap_move(world_rect(0.0, 100.0, 100.0, 20.0), &statics, 5.0);
        assert_eq!(r.rect.min_x(), 1.0);
    }

    #[test]
    fn centers_align_with_centers() {
        let statics = [world_rect(0.0, 0.0, 100.0, 100.0)];
        // moving center y = 48 vs static center 50
        let r = snap_move(world_rect(300.0, 38.0, 40.0, 20.0), &statics, 5.0);
        assert_eq!(r.rect.min_y(), 40.0);
        assert_eq!(r.guides, vec![SnapGuide { axis: SnapAxis::Y, coord: 50.0 }]);
    }

    #[test]
    fn resize_keeps_opposite_side_anchored() {
        let original = world_rect(0.0, 0.0, 100.0, 50.0);
        let statics = [world_rect(200.0, 300.0, 50.0, 50.0)];
        let dirs = ResizeDirs { east: true, ..Default::default() };
        // East edge dragged to 197 → snaps to 200, west stays at 0.
        let r = snap_resize(original, world_rect(0.0, 0.0, 197.0, 50.0), dirs, &statics, 5.0);
        assert_eq!(r.rect, world_rect(0.0, 0.0, 200.0, 50.0));
    }

    #[test]
    fn resize_only_uses_active_sides() {
        let original = world_rect(10.0, 10.0, 100.0, 50.0);
        let statics = [world_rect(8.0, 300.0, 50.0, 50.0)];
        let dirs = ResizeDirs { south: true, ..Default::default() };
        // West side is 2 away from a static edge but not being dragged.
        let r = snap_resize(original, world_rect(10.0, 10.0, 100.0, 70.0), dirs, &statics, 5.0);
        assert_eq!(r.rect, world_rect(10.0, 10.0, 100.0, 70.0));
        assert!(r.guides.is_empty());
    }

    #[test]
    fn west_resize_recomputes_width_from_anchor() {
        let original = world_rect(100.0, 0.0, 100.0, 50.0);
        let statics = [world_rect(0.0, 300.0, 52.0, 10.0)];
        let dirs = ResizeDirs { west: true, ..Default::default() };
        let r = snap_resize(original, world_rect(49.0, 0.0, 151.0, 50.0), dirs, &statics, 5.0);
        assert_eq!(r.rect, world_rect(52.0, 0.0, 148.0, 50.0));
    }
}
