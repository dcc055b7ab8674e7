//! Coalesced edge-endpoint updates.
//!
//! Pointer moves arrive much faster than frames. Moved nodes and new edges
//! are buffered here and flushed once per `tick`: during an active drag
//! only the edges touching moved nodes are recomputed, otherwise every
//! edge is.

use loom_core::id::{EdgeId, NodeId};
use loom_core::model::GraphState;
use loom_core::physics::Simulation;
use loom_core::viewport::Viewport;
use loom_render::query::RenderQuery;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct EdgeBatch {
    moved: HashSet<NodeId>,
    added: HashSet<EdgeId>,
    full: bool,
}

/// What a flush did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Edges whose cached endpoints were recomputed.
    pub updated: usize,
    /// The sag loop went from stopped to running.
    pub physics_started: bool,
}

impl EdgeBatch {
    pub fn mark_moved(&mut self, id: NodeId) {
        self.moved.insert(id);
    }

    pub fn mark_added(&mut self, id: EdgeId) {
        self.added.insert(id);
    }

    /// Recompute every edge on the next flush (viewport change, pinning).
    pub fn request_full(&mut self) {
        self.full = true;
    }

    pub fn forget_node(&mut self, id: NodeId) {
        self.moved.remove(&id);
    }

    pub fn forget_edge(&mut self, id: EdgeId) {
        self.added.remove(&id);
    }

    pub fn is_empty(&self) -> bool {
        self.moved.is_empty() && self.added.is_empty() && !self.full
    }

    /// Apply buffered updates.
    ///
    /// `position_only` recomputes just the edges touching moved nodes and
    /// is meant for an active drag or resize. A pending full request still
    /// wins over it. Edges touching moved nodes get plucked in both paths.
    pub fn flush(
        &mut self,
        graph: &mut GraphState,
        viewport: &Viewport,
        renderer: &dyn RenderQuery,
        simulation: &mut Simulation,
        position_only: bool,
    ) -> FlushReport {
        let mut report = FlushReport::default();
        if self.is_empty() {
            return report;
        }
        let full = self.full || !position_only;
        let moved = std::mem::take(&mut self.moved);
        let added = std::mem::take(&mut self.added);
        self.full = false;

        for i in 0..graph.edges.len() {
            let edge = &graph.edges[i];
            let touched = moved.contains(&edge.from) || moved.contains(&edge.to);
            if !(full || touched || added.contains(&edge.id)) {
                continue;
            }
            let ends = renderer.resolve_endpoints(graph, viewport, edge);
            let edge = &mut graph.edges[i];
            let changed = match ends {
                Some((s, t)) => {
                    let changed = edge.start != Some(s) || edge.end != Some(t);
                    edge.start = Some(s);
                    edge.end = Some(t);
                    changed
                }
                None => false,
            };
            report.updated += 1;
            if (touched && changed) || (!edge.physics.settled && edge.endpoints().is_some()) {
                let was_running = simulation.is_running();
                if touched && changed {
                    simulation.pluck(edge);
                } else {
                    simulation.start();
                }
                report.physics_started |= !was_running && simulation.is_running();
            }
        }
        log::trace!(
            "batch: {} edges ({})",
            report.updated,
            if full { "full" } else { "position-only" }
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_core::model::{Edge, Handle, Node, NodeKind, Placement};
    use loom_core::space::{WorldPoint, world_rect};
    use loom_render::query::GeometryRenderer;
    use pretty_assertions::assert_eq;

    fn setup() -> GraphState {
        let mut g = GraphState::new();
        let (a, b, c) = (NodeId::intern("bt_a"), NodeId::intern("bt_b"), NodeId::intern("bt_c"));
        g.add_node(Node::new(a, NodeKind::Plain, world_rect(0.0, 0.0, 100.0, 50.0)), None)
            .unwrap();
        g.add_node(Node::new(b, NodeKind::Plain, world_rect(300.0, 0.0, 100.0, 50.0)), None)
            .unwrap();
        g.add_node(Node::new(c, NodeKind::Plain, world_rect(300.0, 300.0, 100.0, 50.0)), None)
            .unwrap();
        g.add_edge(Edge::new(EdgeId::intern("bt_ab"), a, Handle::Right, b, Handle::Left).unwrap())
            .unwrap();
        g.add_edge(Edge::new(EdgeId::intern("bt_bc"), b, Handle::Bottom, c, Handle::Top).unwrap())
            .unwrap();
        for e in g.edges.iter_mut() {
            e.physics.settled = true;
        }
        g
    }

    #[test]
    fn position_only_touches_moved_edges() {
        let mut g = setup();
        let vp = Viewport::default();
        let r = GeometryRenderer::default();
        let mut sim = Simulation::default();
        let mut batch = EdgeBatch::default();

        batch.mark_moved(NodeId::intern("bt_a"));
        let report = batch.flush(&mut g, &vp, &r, &mut sim, true);
        assert_eq!(report.updated, 1);
        assert!(report.physics_started);
        assert_eq!(g.edges[0].start, Some(WorldPoint::new(100.0, 25.0)));
        assert_eq!(g.edges[1].start, None);
        assert!(batch.is_empty());
    }

    #[test]
    fn full_path_resolves_everything_but_plucks_only_moved() {
        let mut g = setup();
        let vp = Viewport::default();
        let r = GeometryRenderer::default();
        let mut sim = Simulation::default();
        let mut batch = EdgeBatch::default();

        batch.request_full();
        batch.flush(&mut g, &vp, &r, &mut sim, false);
        assert!(g.edges.iter().all(|e| e.endpoints().is_some()));
        assert!(!sim.is_running());

        if let Some(n) = g.node_mut(NodeId::intern("bt_c")) {
            n.placement = Placement::World(world_rect(320.0, 300.0, 100.0, 50.0));
        }
        batch.mark_moved(NodeId::intern("bt_c"));
        let report = batch.flush(&mut g, &vp, &r, &mut sim, false);
        assert_eq!(report.updated, 2);
        assert!(report.physics_started);
        assert!(g.edges[0].physics.settled);
        assert!(!g.edges[1].physics.settled);
    }
}
