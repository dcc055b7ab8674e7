//! Hit testing: pointer → node, handle zone, waypoint or edge.
//!
//! Nodes are walked front-to-back: pinned overlays first, then by layer
//! (higher first), then by insertion order (later first). Edge tests run
//! against the path the `RenderQuery` reports, so they skip silently while
//! an edge's endpoints are unresolved.

use crate::query::RenderQuery;
use loom_core::id::{EdgeId, NodeId};
use loom_core::model::{Edge, GraphState, Handle, NodeKind};
use loom_core::path;
use loom_core::snap::ResizeDirs;
use loom_core::space::*;
use loom_core::viewport::Viewport;

/// Spacing between path samples for rectangle and line tests.
const SAMPLE_STEP: f32 = 4.0;

/// What part of a node the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeZone {
    Handle(Handle),
    Resize(ResizeDirs),
    Body,
}

/// Node ids ordered topmost first.
pub fn paint_order_front_to_back(graph: &GraphState) -> Vec<NodeId> {
    let mut order: Vec<(usize, &loom_core::model::Node)> = graph.nodes().enumerate().collect();
    order.sort_by(|(ia, a), (ib, b)| {
        b.is_pinned()
            .cmp(&a.is_pinned())
            .then(b.layer.cmp(&a.layer))
            .then(ib.cmp(ia))
    });
    order.into_iter().map(|(_, n)| n.id).collect()
}

/// Find the topmost node at world position `p`.
/// Returns `None` if no node is hit (background).
pub fn hit_test(graph: &GraphState, viewport: &Viewport, p: WorldPoint) -> Option<NodeId> {
    paint_order_front_to_back(graph).into_iter().find(|id| {
        graph
            .node(*id)
            .is_some_and(|n| rect_contains(&n.world_rect(viewport), p))
    })
}

/// Like `hit_test`, but ignores `skip` and anything inside it. Used while
/// dragging to see what lies under the moved node.
pub fn hit_test_excluding(graph: &GraphState, viewport: &Viewport, p: WorldPoint, skip: NodeId) -> Option<NodeId> {
    paint_order_front_to_back(graph).into_iter().find(|id| {
        *id != skip
            && !graph.is_ancestor_of(skip, *id)
            && graph
                .node(*id)
                .is_some_and(|n| rect_contains(&n.world_rect(viewport), p))
    })
}

/// Which node and zone the screen point `p` falls on.
///
/// Handles are circles of `handle_radius` around each side midpoint and
/// may stick out of the node. The resize border is `resize_margin` wide,
/// inside the node. Routing points only have a body.
pub fn hit_zone(
    graph: &GraphState,
    viewport: &Viewport,
    p: ScreenPoint,
    handle_radius: f32,
    resize_margin: f32,
) -> Option<(NodeId, NodeZone)> {
    for id in paint_order_front_to_back(graph) {
        let Some(node) = graph.node(id) else { continue };
        let rect = node.screen_rect(viewport);
        let has_handles = !matches!(node.kind, NodeKind::RoutingPoint);

        if has_handles {
            let hit = Handle::ALL
                .into_iter()
                .find(|h| (h.anchor(&rect) - p).length() <= handle_radius);
            if let Some(h) = hit {
                return Some((id, NodeZone::Handle(h)));
            }
        }
        if !rect_contains(&rect, p) {
            continue;
        }
        if node.kind.is_resizable() {
            let dirs = ResizeDirs {
                north: p.y - rect.min_y() <= resize_margin,
                south: rect.max_y() - p.y <= resize_margin,
                west: p.x - rect.min_x() <= resize_margin,
                east: rect.max_x() - p.x <= resize_margin,
            };
            if !dirs.is_empty() {
                return Some((id, NodeZone::Resize(dirs)));
            }
        }
        return Some((id, NodeZone::Body));
    }
    None
}

/// Routing waypoint within `radius` world units of `p`.
pub fn hit_waypoint(graph: &GraphState, p: WorldPoint, radius: f32) -> Option<(EdgeId, usize)> {
    graph.edges.iter().rev().find_map(|e| {
        e.waypoints
            .iter()
            .position(|w| (*w - p).length() <= radius)
            .map(|i| (e.id, i))
    })
}

/// Closest edge whose path passes within `tolerance` world units of `p`.
pub fn hit_edge(
    graph: &GraphState,
    viewport: &Viewport,
    renderer: &dyn RenderQuery,
    p: WorldPoint,
    tolerance: f32,
) -> Option<EdgeId> {
    hit_edge_filtered(graph, viewport, renderer, p, tolerance, |_| true)
}

/// `hit_edge`, restricted to edges accepted by `keep`.
pub fn hit_edge_filtered(
    graph: &GraphState,
    viewport: &Viewport,
    renderer: &dyn RenderQuery,
    p: WorldPoint,
    tolerance: f32,
    keep: impl Fn(&Edge) -> bool,
) -> Option<EdgeId> {
    let mut best: Option<(EdgeId, f32)> = None;
    for edge in graph.edges.iter().filter(|e| keep(*e)) {
        let Some(path) = renderer.edge_path(graph, viewport, edge) else {
            continue;
        };
        let d = path::distance_to_path(&path, p);
        if d <= tolerance && best.is_none_or(|(_, bd)| d < bd) {
            best = Some((edge.id, d));
        }
    }
    if let Some((id, d)) = best {
        log::trace!("hit: edge {id} at {d:.1}");
    }
    best.map(|(id, _)| id)
}

/// Find all nodes whose bounds overlap the given rectangle.
/// Used for rectangle selection.
pub fn nodes_in_rect(graph: &GraphState, viewport: &Viewport, rect: &WorldRect) -> Vec<NodeId> {
    graph
        .nodes()
        .filter(|n| rects_overlap(&n.world_rect(viewport), rect))
        .map(|n| n.id)
        .collect()
}

/// Edges with at least one sampled path point inside `rect`.
pub fn edges_in_rect(
    graph: &GraphState,
    viewport: &Viewport,
    renderer: &dyn RenderQuery,
    rect: &WorldRect,
) -> Vec<EdgeId> {
    graph
        .edges
        .iter()
        .filter(|e| {
            renderer.edge_path(graph, viewport, e).is_some_and(|path| {
                path::sample_points(&path, SAMPLE_STEP)
                    .into_iter()
                    .any(|p| rect_contains(rect, p))
            })
        })
        .map(|e| e.id)
        .collect()
}

/// Every edge crossed by the segment `a`–`b`, with the first crossing point
/// along each edge. Edges keep registration order.
pub fn edges_crossing_line(
    graph: &GraphState,
    viewport: &Viewport,
    renderer: &dyn RenderQuery,
    a: WorldPoint,
    b: WorldPoint,
) -> Vec<(EdgeId, WorldPoint)> {
    graph
        .edges
        .iter()
        .filter_map(|e| {
            let path = renderer.edge_path(graph, viewport, e)?;
            path::first_crossing(&path, a, b).map(|p| (e.id, p))
        })
        .collect()
}

/// Index in `edge.waypoints` at which a new waypoint near `p` belongs:
/// the polyline leg through start, waypoints and end that is closest to `p`.
pub fn waypoint_insert_index(edge: &Edge, p: WorldPoint) -> Option<usize> {
    let (start, end) = edge.endpoints()?;
    let mut pts = Vec::with_capacity(edge.waypoints.len() + 2);
    pts.push(start);
    pts.extend(edge.waypoints.iter().copied());
    pts.push(end);
    pts.windows(2)
        .enumerate()
        .map(|(i, w)| (i, path::distance_to_segment(p, w[0], w[1])))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}
