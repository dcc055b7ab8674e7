//! Edge path synthesis and the geometric primitives built on it.
//!
//! Paths are kurbo `BezPath`s: a single cubic for handle-to-handle curves,
//! straight segments for routed splines. Everything here is pure; degenerate
//! input yields `None` / `f32::INFINITY` instead of panicking.

use crate::model::Handle;
use crate::space::*;
use kurbo::{BezPath, ParamCurve, ParamCurveArclen, PathEl, PathSeg, Point};

/// Arc-length accuracy used for length queries, in world units.
const ACCURACY: f64 = 1e-3;

/// Upper bound on how far control points are pushed out along the handle normal.
const MAX_CONTROL_OFFSET: f32 = 100.0;

/// Sag applied to a control point leaving through a top/bottom handle is
/// scaled down so the exit angle stays natural.
const VERTICAL_SAG_FACTOR: f32 = 0.25;

fn to_kurbo(p: WorldPoint) -> Point {
    Point::new(f64::from(p.x), f64::from(p.y))
}

fn from_kurbo(p: Point) -> WorldPoint {
    WorldPoint::new(p.x as f32, p.y as f32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// One cubic segment between two handles.
    Curve,
    /// Straight segments through routing waypoints.
    Spline,
}

/// A synthesized edge path in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePath {
    pub bez: BezPath,
    pub kind: PathKind,
}

impl EdgePath {
    /// SVG path data, for hosts rendering through the DOM.
    pub fn to_svg(&self) -> String {
        self.bez.to_svg()
    }

    pub fn start(&self) -> Option<WorldPoint> {
        self.control_points().first().copied()
    }

    pub fn end(&self) -> Option<WorldPoint> {
        self.control_points().last().copied()
    }

    /// Every point the path is built from, in order (endpoints and cubic
    /// control points).
    pub fn control_points(&self) -> Vec<WorldPoint> {
        let mut out = Vec::new();
        for el in self.bez.elements() {
            match *el {
                PathEl::MoveTo(p) | PathEl::LineTo(p) => out.push(from_kurbo(p)),
                PathEl::QuadTo(a, b) => out.extend([from_kurbo(a), from_kurbo(b)]),
                PathEl::CurveTo(a, b, c) => out.extend([from_kurbo(a), from_kurbo(b), from_kurbo(c)]),
                PathEl::ClosePath => {}
            }
        }
        out
    }

    fn segments(&self) -> impl Iterator<Item = PathSeg> + '_ {
        self.bez.segments()
    }
}

/// Arc length of one segment; collapsed segments are exactly zero.
fn seg_len(seg: &PathSeg) -> f64 {
    let hull = match *seg {
        PathSeg::Line(l) => l.p0.distance(l.p1),
        PathSeg::Quad(q) => q.p0.distance(q.p1) + q.p1.distance(q.p2),
        PathSeg::Cubic(c) => c.p0.distance(c.p1) + c.p1.distance(c.p2) + c.p2.distance(c.p3),
    };
    if hull < 1e-9 { 0.0 } else { seg.arclen(ACCURACY) }
}

// ─── Construction ─────────────────────────────────────────────────────────

/// Cubic from `start` to `end`.
///
/// Endpoints are padded by `min(padding, dist / 2.5)` along their handle
/// normals, control points sit `min(100, dist / 2)` further out, and `sag`
/// pushes both control points down (a quarter as much for vertical handles).
pub fn curve(
    start: WorldPoint,
    end: WorldPoint,
    start_handle: Handle,
    end_handle: Handle,
    sag: f32,
    padding: f32,
) -> EdgePath {
    let dist = (end - start).length();
    let pad = padding.max(0.0).min(dist / 2.5);
    let ctrl = MAX_CONTROL_OFFSET.min(dist / 2.0);

    let p0 = start + start_handle.normal() * pad;
    let p3 = end + end_handle.normal() * pad;
    let mut c1 = p0 + start_handle.normal() * ctrl;
    let mut c2 = p3 + end_handle.normal() * ctrl;
    c1.y += sag * sag_factor(start_handle);
    c2.y += sag * sag_factor(end_handle);

    let mut bez = BezPath::new();
    bez.move_to(to_kurbo(p0));
    bez.curve_to(to_kurbo(c1), to_kurbo(c2), to_kurbo(p3));
    EdgePath {
        bez,
        kind: PathKind::Curve,
    }
}

fn sag_factor(handle: Handle) -> f32 {
    if handle.is_vertical() { VERTICAL_SAG_FACTOR } else { 1.0 }
}

/// Polyline through `points`; only the first and last point are padded.
pub fn spline(points: &[WorldPoint], start_handle: Handle, end_handle: Handle, padding: f32) -> EdgePath {
    let mut bez = BezPath::new();
    let last = points.len().saturating_sub(1);
    for (i, &p) in points.iter().enumerate() {
        let p = if i == 0 && last > 0 {
            p + start_handle.normal() * padding
        } else if i == last && last > 0 {
            p + end_handle.normal() * padding
        } else {
            p
        };
        if i == 0 {
            bez.move_to(to_kurbo(p));
        } else {
            bez.line_to(to_kurbo(p));
        }
    }
    EdgePath {
        bez,
        kind: PathKind::Spline,
    }
}

// ─── Sampling ─────────────────────────────────────────────────────────────

pub fn total_length(path: &EdgePath) -> f32 {
    path.segments().map(|s| seg_len(&s)).sum::<f64>() as f32
}

/// Point at arc length `distance` from the start, clamped to the path.
/// `None` for an empty path.
pub fn point_at_length(path: &EdgePath, distance: f32) -> Option<WorldPoint> {
    let mut remaining = f64::from(distance.max(0.0));
    let mut last = None;
    for seg in path.segments() {
        let len = seg_len(&seg);
        if remaining <= len {
            let t = if len > 0.0 { seg.inv_arclen(remaining, ACCURACY) } else { 0.0 };
            return Some(from_kurbo(seg.eval(t)));
        }
        remaining -= len;
        last = Some(seg.end());
    }
    last.map(from_kurbo).or_else(|| path.start())
}

/// Label anchor: the point halfway along the path.
pub fn midpoint(path: &EdgePath) -> Option<WorldPoint> {
    point_at_length(path, total_length(path) / 2.0)
}

/// Points roughly every `step` world units along the path, both ends
/// included. Used for hit-testing against rectangles and lines.
pub fn sample_points(path: &EdgePath, step: f32) -> Vec<WorldPoint> {
    let step = f64::from(step.max(0.5));
    let mut out = Vec::new();
    for seg in path.segments() {
        if out.is_empty() {
            out.push(from_kurbo(seg.start()));
        }
        let n = (seg_len(&seg) / step).ceil().max(1.0) as usize;
        for i in 1..=n {
            out.push(from_kurbo(seg.eval(i as f64 / n as f64)));
        }
    }
    if out.is_empty()
        && let Some(p) = path.start()
    {
        out.push(p);
    }
    out
}

/// Shortest distance from `p` to the sampled path, `f32::INFINITY` if empty.
pub fn distance_to_path(path: &EdgePath, p: WorldPoint) -> f32 {
    let pts = sample_points(path, 4.0);
    match pts.as_slice() {
        [] => f32::INFINITY,
        [only] => (p - *only).length(),
        _ => pts
            .windows(2)
            .map(|w| distance_to_segment(p, w[0], w[1]))
            .fold(f32::INFINITY, f32::min),
    }
}

/// First point (from the path start) where the sampled path crosses the
/// segment `a`–`b`.
pub fn first_crossing(path: &EdgePath, a: WorldPoint, b: WorldPoint) -> Option<WorldPoint> {
    sample_points(path, 4.0)
        .windows(2)
        .find_map(|w| segment_intersection(w[0], w[1], a, b))
}

// ─── Primitives ───────────────────────────────────────────────────────────

/// Distance from `p` to the segment `v`–`w`, projection clamped to the segment.
pub fn distance_to_segment(p: WorldPoint, v: WorldPoint, w: WorldPoint) -> f32 {
    let vw = w - v;
    let len_sq = vw.square_length();
    if len_sq == 0.0 {
        return (p - v).length();
    }
    let t = ((p - v).dot(vw) / len_sq).clamp(0.0, 1.0);
    (p - (v + vw * t)).length()
}

/// Intersection of segments `p0`–`p1` and `p2`–`p3`, if they cross.
/// Parallel (or degenerate) segments never intersect.
pub fn segment_intersection(p0: WorldPoint, p1: WorldPoint, p2: WorldPoint, p3: WorldPoint) -> Option<WorldPoint> {
    let s1 = p1 - p0;
    let s2 = p3 - p2;
    let denom = -s2.x * s1.y + s1.x * s2.y;
    if denom.abs() < 1e-9 {
        return None;
    }
    let s = (-s1.y * (p0.x - p2.x) + s1.x * (p0.y - p2.y)) / denom;
    let t = (s2.x * (p0.y - p2.y) - s2.y * (p0.x - p2.x)) / denom;
    if (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t) {
        Some(p0 + s1 * t)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn close(a: WorldPoint, b: WorldPoint) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn curve_endpoints_are_padded_along_normals() {
        let start = WorldPoint::new(0.0, 0.0);
        let end = WorldPoint::new(300.0, 0.0);
        let path = curve(start, end, Handle::Right, Handle::Left, 0.0, 10.0);
        assert!(close(path.start().unwrap(), WorldPoint::new(10.0, 0.0)));
        assert!(close(path.end().unwrap(), WorldPoint::new(290.0, 0.0)));
    }

    #[test]
    fn short_curves_shrink_padding() {
        // dist 20 → pad = min(10, 8) = 8
        let path = curve(
            WorldPoint::new(0.0, 0.0),
            WorldPoint::new(0.0, 20.0),
            Handle::Bottom,
            Handle::Top,
            0.0,
            10.0,
        );
        assert!(close(path.start().unwrap(), WorldPoint::new(0.0, 8.0)));
        assert!(close(path.end().unwrap(), WorldPoint::new(0.0, 12.0)));
    }

    #[test]
    fn control_offset_is_capped_and_sag_scaled() {
        let path = curve(
            WorldPoint::new(0.0, 0.0),
            WorldPoint::new(400.0, 0.0),
            Handle::Right,
            Handle::Top,
            40.0,
            0.0,
        );
        let pts = path.control_points();
        assert_eq!(pts.len(), 4);
        // Horizontal handle: full sag, offset capped at 100.
        assert!(close(pts[1], WorldPoint::new(100.0, 40.0)));
        // Vertical handle: quarter sag.
        assert!(close(pts[2], WorldPoint::new(400.0, -100.0 + 10.0)));
    }

    #[test]
    fn zero_length_curve_is_degenerate_not_panicking() {
        let p = WorldPoint::new(5.0, 5.0);
        let path = curve(p, p, Handle::Right, Handle::Left, 0.0, 10.0);
        assert_eq!(total_length(&path), 0.0);
        assert!(close(point_at_length(&path, 3.0).unwrap(), p));
    }

    #[test]
    fn spline_pads_only_ends() {
        let pts = [WorldPoint::new(0.0, 0.0), WorldPoint::new(50.0, 50.0), WorldPoint::new(100.0, 0.0)];
        let path = spline(&pts, Handle::Right, Handle::Left, 10.0);
        let cps = path.control_points();
        assert_eq!(cps, vec![WorldPoint::new(10.0, 0.0), WorldPoint::new(50.0, 50.0), WorldPoint::new(90.0, 0.0)]);
        assert_eq!(path.kind, PathKind::Spline);
    }

    #[test]
    fn length_sampling_on_polyline() {
        let pts = [WorldPoint::new(0.0, 0.0), WorldPoint::new(30.0, 0.0), WorldPoint::new(30.0, 40.0)];
        let path = spline(&pts, Handle::Right, Handle::Left, 0.0);
        assert!((total_length(&path) - 70.0).abs() < 1e-3);
        assert!(close(point_at_length(&path, 50.0).unwrap(), WorldPoint::new(30.0, 20.0)));
        assert!(close(point_at_length(&path, 500.0).unwrap(), WorldPoint::new(30.0, 40.0)));
        assert!(close(midpoint(&path).unwrap(), WorldPoint::new(30.0, 5.0)));
    }

    #[test]
    fn segment_distance_clamps_projection() {
        let v = WorldPoint::new(0.0, 0.0);
        let w = WorldPoint::new(10.0, 0.0);
        assert_eq!(distance_to_segment(WorldPoint::new(5.0, 3.0), v, w), 3.0);
        assert_eq!(distance_to_segment(WorldPoint::new(13.0, 4.0), v, w), 5.0);
        assert_eq!(distance_to_segment(WorldPoint::new(3.0, 4.0), v, v), 5.0);
    }

    #[test]
    fn intersection_cases() {
        let hit = segment_intersection(
            WorldPoint::new(0.0, 0.0),
            WorldPoint::new(10.0, 10.0),
            WorldPoint::new(0.0, 10.0),
            WorldPoint::new(10.0, 0.0),
        );
        assert!(close(hit.unwrap(), WorldPoint::new(5.0, 5.0)));

        // Parallel
        assert_eq!(
            segment_intersection(
                WorldPoint::new(0.0, 0.0),
                WorldPoint::new(10.0, 0.0),
                WorldPoint::new(0.0, 1.0),
                WorldPoint::new(10.0, 1.0),
            ),
            None
        );
        // Lines cross but outside the segments
        assert_eq!(
            segment_intersection(
                WorldPoint::new(0.0, 0.0),
                WorldPoint::new(1.0, 1.0),
                WorldPoint::new(0.0, 10.0),
                WorldPoint::new(10.0, 0.0),
            ),
            None
        );
    }

    #[test]
    fn crossing_found_on_curve() {
        let path = curve(
            WorldPoint::new(0.0, 0.0),
            WorldPoint::new(200.0, 0.0),
            Handle::Right,
            Handle::Left,
            0.0,
            0.0,
        );
        let hit = first_crossing(&path, WorldPoint::new(100.0, -50.0), WorldPoint::new(100.0, 50.0)).unwrap();
        assert!((hit.x - 100.0).abs() < 1e-2);
        assert!(distance_to_path(&path, WorldPoint::new(100.0, 6.0)) < 6.5);
    }
}
