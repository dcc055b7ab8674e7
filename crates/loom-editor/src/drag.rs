//! Node dragging: what moves, shake detection and what happens on drop.
//!
//! Everything here is a pure planner over `GraphState`. The structural
//! changes (bridging, splitting) come back as `Command`s for the lifecycle
//! owner. Only group membership, which the editor owns, is applied in place.

use crate::bus::Command;
use crate::selection::Selection;
use loom_core::id::{EdgeId, NodeId};
use loom_core::model::{Edge, GraphState, Placement};
use loom_core::space::*;
use loom_core::viewport::Viewport;
use loom_render::hit;
use loom_render::query::RenderQuery;
use std::collections::VecDeque;

/// Shake history length.
pub const SHAKE_HISTORY: usize = 10;

/// Pointer movement (screen pixels) below which a sample does not count
/// as a direction.
const SHAKE_MIN_DELTA: f32 = 2.0;

/// The nodes a drag on `target` moves: the whole selection if `target` is
/// part of it, otherwise just `target`, expanded by containment either way.
pub fn nodes_to_move(graph: &GraphState, selection: &Selection, target: NodeId) -> Vec<NodeId> {
    if selection.contains_node(target) {
        let mut roots = vec![target];
        roots.extend(selection.node_ids().into_iter().filter(|id| *id != target));
        graph.containment_closure(&roots)
    } else {
        graph.containment_closure(&[target])
    }
}

/// Translate a node's placement: world nodes by `world`, pinned nodes by
/// `screen`. Both deltas describe the same pointer motion.
pub fn translate(placement: Placement, world: WorldVector, screen: ScreenVector) -> Placement {
    match placement {
        Placement::World(r) => Placement::World(r.translate(world)),
        Placement::Pinned(r) => Placement::Pinned(r.translate(screen)),
    }
}

// ─── Shake ───────────────────────────────────────────────────────────────

/// Detects rapid back-and-forth motion during a drag.
#[derive(Debug, Clone)]
pub struct ShakeDetector {
    samples: VecDeque<(u64, ScreenPoint)>,
    min_interval_ms: u64,
    sensitivity: u32,
    triggered: bool,
}

impl ShakeDetector {
    pub fn new(min_interval_ms: u64, sensitivity: u32) -> Self {
        Self {
            samples: VecDeque::with_capacity(SHAKE_HISTORY),
            min_interval_ms,
            sensitivity,
            triggered: false,
        }
    }

    /// Already fired during this drag.
    pub fn triggered(&self) -> bool {
        self.triggered
    }

    /// Feed a pointer position. Returns `true` exactly once per drag, when
    /// the shake is first recognised.
    pub fn record(&mut self, time_ms: u64, pos: ScreenPoint) -> bool {
        if self.triggered {
            return false;
        }
        if let Some(&(last, _)) = self.samples.back()
            && time_ms.saturating_sub(last) < self.min_interval_ms
        {
            return false;
        }
        if self.samples.len() == SHAKE_HISTORY {
            self.samples.pop_front();
        }
        self.samples.push_back((time_ms, pos));

        let reversals_x = self.reversals(|v| v.x);
        let reversals_y = self.reversals(|v| v.y);
        if reversals_x > self.sensitivity || reversals_y > self.sensitivity {
            log::debug!("shake: {reversals_x} x / {reversals_y} y reversals");
            self.triggered = true;
        }
        self.triggered
    }

    fn reversals(&self, axis: impl Fn(ScreenVector) -> f32) -> u32 {
        let mut count = 0;
        let mut last_sign = 0.0_f32;
        let points: Vec<ScreenPoint> = self.samples.iter().map(|(_, p)| *p).collect();
        for w in points.windows(2) {
            let d = axis(w[1] - w[0]);
            if d.abs() < SHAKE_MIN_DELTA {
                continue;
            }
            let sign = d.signum();
            if last_sign != 0.0 && sign != last_sign {
                count += 1;
            }
            last_sign = sign;
        }
        count
    }
}

/// Replace every edge through `node` by direct edges from each incoming
/// source to each outgoing target, then delete the originals.
///
/// Creates come first so the graph never loses a connection in between.
/// Pairs that would loop back onto themselves are skipped.
pub fn plan_bridge(graph: &GraphState, node: NodeId) -> Vec<Command> {
    let incoming = graph.incoming(node);
    let outgoing = graph.outgoing(node);
    let mut commands = Vec::new();
    for inc in &incoming {
        for out in &outgoing {
            match Edge::new(EdgeId::with_prefix("edge"), inc.from, inc.from_handle, out.to, out.to_handle) {
                Ok(edge) => commands.push(Command::EdgeCreate { edge }),
                Err(err) => log::debug!("shake: skipping bridge, {err}"),
            }
        }
    }
    for id in graph.edges_touching(node) {
        commands.push(Command::EdgeDelete { id });
    }
    commands
}

// ─── Drop ────────────────────────────────────────────────────────────────

/// Smallest (then topmost) world group whose bounds contain `point`,
/// ignoring `node` itself and any group inside it.
pub fn group_at(graph: &GraphState, viewport: &Viewport, point: WorldPoint, node: Option<NodeId>) -> Option<NodeId> {
    graph
        .nodes()
        .filter(|g| g.is_group() && !g.is_pinned())
        .filter(|g| node.is_none_or(|n| g.id != n && !graph.is_ancestor_of(n, g.id)))
        .filter(|g| rect_contains(&g.world_rect(viewport), point))
        .min_by(|a, b| {
            rect_area(&a.world_rect(viewport))
                .total_cmp(&rect_area(&b.world_rect(viewport)))
                .then(b.layer.cmp(&a.layer))
        })
        .map(|g| g.id)
}

/// The group a dropped node belongs to, judged by its center.
pub fn find_drop_group(graph: &GraphState, viewport: &Viewport, node: NodeId) -> Option<NodeId> {
    let center = graph.node(node)?.world_center(viewport);
    group_at(graph, viewport, center, Some(node))
}

/// Re-evaluate group membership for every moved world node, in order.
/// Returns the nodes whose parent changed.
pub fn recompute_membership(graph: &mut GraphState, viewport: &Viewport, moved: &[NodeId]) -> Vec<NodeId> {
    let mut changed = Vec::new();
    for &id in moved {
        if graph.node(id).is_none_or(|n| n.is_pinned()) {
            continue;
        }
        let target = find_drop_group(graph, viewport, id);
        match graph.set_parent(id, target) {
            Ok(true) => {
                log::debug!("drop: {id} now inside {target:?}");
                changed.push(id);
            }
            Ok(false) => {}
            Err(err) => log::warn!("drop: reparent skipped, {err}"),
        }
    }
    changed
}

/// An edge the dropped `node` should be spliced into: its center lies
/// within `tolerance` of the edge path and the edge does not touch it.
/// Groups and pinned nodes never split edges.
pub fn find_split_edge(
    graph: &GraphState,
    viewport: &Viewport,
    renderer: &dyn RenderQuery,
    node: NodeId,
    tolerance: f32,
) -> Option<EdgeId> {
    let n = graph.node(node)?;
    if n.is_group() || n.is_pinned() {
        return None;
    }
    let center = n.world_center(viewport);
    hit::hit_edge_filtered(graph, viewport, renderer, center, tolerance, |e| !e.touches(node))
}

/// Commands that reroute `edge` through `node`: `from → node → to`.
///
/// The inserted node receives on the handle the old target used and emits
/// on the handle the old source used, so both halves keep their direction.
/// Waypoints are divided at the leg closest to `at`.
pub fn plan_split(graph: &GraphState, edge: EdgeId, node: NodeId, at: WorldPoint) -> Vec<Command> {
    let Some(e) = graph.edge(edge) else {
        return Vec::new();
    };
    let first = Edge::new(EdgeId::with_prefix("edge"), e.from, e.from_handle, node, e.to_handle);
    let second = Edge::new(EdgeId::with_prefix("edge"), node, e.from_handle, e.to, e.to_handle);
    let (Ok(mut first), Ok(mut second)) = (first, second) else {
        log::warn!("split: {edge} would loop through {node}");
        return Vec::new();
    };
    let cut = hit::waypoint_insert_index(e, at).unwrap_or(0);
    first.waypoints = e.waypoints.iter().take(cut).copied().collect();
    second.waypoints = e.waypoints.iter().skip(cut).copied().collect();
    first.label = e.label.clone();

    vec![
        Command::EdgeCreate { edge: first },
        Command::EdgeCreate { edge: second },
        Command::EdgeDelete { id: edge },
    ]
}
