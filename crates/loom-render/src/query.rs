//! The rendering collaborator seam.
//!
//! The engine never measures rendered output itself: it asks a
//! `RenderQuery` where a node's handle ended up and what path an edge
//! draws. `GeometryRenderer` answers from the model alone, which is what
//! headless hosts and the tests use.

use loom_core::config::EngineConfig;
use loom_core::id::NodeId;
use loom_core::model::{Edge, GraphState, Handle};
use loom_core::path::{self, EdgePath};
use loom_core::space::WorldPoint;
use loom_core::viewport::Viewport;

pub trait RenderQuery {
    /// World position of `handle` on `node` as rendered, `None` if the node
    /// is gone.
    fn handle_position(&self, graph: &GraphState, viewport: &Viewport, node: NodeId, handle: Handle)
    -> Option<WorldPoint>;

    /// Path the edge draws, built from its cached endpoints. `None` until
    /// both endpoints are resolved.
    fn edge_path(&self, graph: &GraphState, viewport: &Viewport, edge: &Edge) -> Option<EdgePath>;

    /// Resolve both endpoints of `edge` from the current node geometry.
    fn resolve_endpoints(&self, graph: &GraphState, viewport: &Viewport, edge: &Edge) -> Option<(WorldPoint, WorldPoint)> {
        let start = self.handle_position(graph, viewport, edge.from, edge.from_handle)?;
        let end = self.handle_position(graph, viewport, edge.to, edge.to_handle)?;
        Some((start, end))
    }

    fn path_length(&self, graph: &GraphState, viewport: &Viewport, edge: &Edge) -> Option<f32> {
        self.edge_path(graph, viewport, edge).map(|p| path::total_length(&p))
    }

    fn point_at_length(&self, graph: &GraphState, viewport: &Viewport, edge: &Edge, distance: f32) -> Option<WorldPoint> {
        self.edge_path(graph, viewport, edge)
            .and_then(|p| path::point_at_length(&p, distance))
    }

    /// Where the edge's label sits.
    fn label_anchor(&self, graph: &GraphState, viewport: &Viewport, edge: &Edge) -> Option<WorldPoint> {
        self.edge_path(graph, viewport, edge).and_then(|p| path::midpoint(&p))
    }
}

/// Model-only renderer: handles at side midpoints, curves and splines from
/// `loom_core::path`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryRenderer {
    pub padding: f32,
    pub spline_padding: f32,
}

impl Default for GeometryRenderer {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl GeometryRenderer {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            padding: config.edge_padding,
            spline_padding: config.spline_padding,
        }
    }
}

impl RenderQuery for GeometryRenderer {
    fn handle_position(
        &self,
        graph: &GraphState,
        viewport: &Viewport,
        node: NodeId,
        handle: Handle,
    ) -> Option<WorldPoint> {
        let node = graph.node(node)?;
        Some(handle.anchor(&node.world_rect(viewport)))
    }

    fn edge_path(&self, _graph: &GraphState, _viewport: &Viewport, edge: &Edge) -> Option<EdgePath> {
        let (start, end) = edge.endpoints()?;
        if edge.waypoints.is_empty() {
            return Some(path::curve(
                start,
                end,
                edge.from_handle,
                edge.to_handle,
                edge.physics.sag,
                self.padding,
            ));
        }
        let mut points = Vec::with_capacity(edge.waypoints.len() + 2);
        points.push(start);
        points.extend(edge.waypoints.iter().copied());
        points.push(end);
        Some(path::spline(&points, edge.from_handle, edge.to_handle, self.spline_padding))
    }
}
