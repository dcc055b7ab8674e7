//! Core data model for the canvas.
//!
//! The working set is a `GraphState`: a petgraph `StableDiGraph` whose
//! nodes are canvas nodes and whose edges are *containment* (group →
//! member), plus a flat list of connections between nodes. A group's
//! contained set is exactly its outgoing containment edges, so membership
//! has a single source of truth. Containment is kept a forest: every node
//! has at most one parent and no node can (transitively) contain itself.

use crate::error::GraphError;
use crate::id::{EdgeId, NodeId};
use crate::space::*;
use crate::viewport::Viewport;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

// ─── Handles ─────────────────────────────────────────────────────────────

/// One of the four attachment points on a node's border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handle {
    Top,
    Right,
    Bottom,
    Left,
}

impl Handle {
    pub const ALL: [Handle; 4] = [Handle::Top, Handle::Right, Handle::Bottom, Handle::Left];

    /// Outward unit normal of the side this handle sits on.
    pub fn normal(self) -> WorldVector {
        match self {
            Handle::Top => WorldVector::new(0.0, -1.0),
            Handle::Right => WorldVector::new(1.0, 0.0),
            Handle::Bottom => WorldVector::new(0.0, 1.0),
            Handle::Left => WorldVector::new(-1.0, 0.0),
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Handle::Top | Handle::Bottom)
    }

    pub fn opposite(self) -> Handle {
        match self {
            Handle::Top => Handle::Bottom,
            Handle::Right => Handle::Left,
            Handle::Bottom => Handle::Top,
            Handle::Left => Handle::Right,
        }
    }

    /// Midpoint of the matching side of `rect`.
    pub fn anchor<U>(self, rect: &euclid::Rect<f32, U>) -> euclid::Point2D<f32, U> {
        let c = rect.center();
        match self {
            Handle::Top => euclid::Point2D::new(c.x, rect.min_y()),
            Handle::Right => euclid::Point2D::new(rect.max_x(), c.y),
            Handle::Bottom => euclid::Point2D::new(c.x, rect.max_y()),
            Handle::Left => euclid::Point2D::new(rect.min_x(), c.y),
        }
    }

    /// The handle whose anchor is closest to `p`.
    pub fn nearest<U>(rect: &euclid::Rect<f32, U>, p: euclid::Point2D<f32, U>) -> Handle {
        let mut best = Handle::Top;
        let mut best_d = f32::INFINITY;
        for h in Handle::ALL {
            let d = (h.anchor(rect) - p).square_length();
            if d < best_d {
                best_d = d;
                best = h;
            }
        }
        best
    }
}

// ─── Colors ──────────────────────────────────────────────────────────────

/// Fixed palette a node can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorTag {
    #[default]
    None,
    Red,
    Orange,
    Yellow,
    Green,
    Cyan,
    Purple,
}

impl ColorTag {
    /// Next palette entry, wrapping back to `None`.
    pub fn next(self) -> ColorTag {
        match self {
            ColorTag::None => ColorTag::Red,
            ColorTag::Red => ColorTag::Orange,
            ColorTag::Orange => ColorTag::Yellow,
            ColorTag::Yellow => ColorTag::Green,
            ColorTag::Green => ColorTag::Cyan,
            ColorTag::Cyan => ColorTag::Purple,
            ColorTag::Purple => ColorTag::None,
        }
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// The node variants. Content rendering belongs to the host; the engine
/// only cares how each variant behaves geometrically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Bare card.
    Plain,
    /// Container; members are the group's containment children.
    Group,
    /// Small waypoint node inserted by routing cuts.
    RoutingPoint,
    /// Markdown note.
    Note { markdown: String },
    /// Host-rendered content (3D viewport, settings form, media…).
    Embed { source: String },
}

impl NodeKind {
    pub fn is_group(&self) -> bool {
        matches!(self, NodeKind::Group)
    }

    /// Routing points keep their size; everything else can be resized.
    pub fn is_resizable(&self) -> bool {
        !matches!(self, NodeKind::RoutingPoint)
    }
}

/// Where a node lives. A pinned node is expressed in screen pixels and is
/// immune to pan/zoom; all other nodes are expressed in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Placement {
    World(WorldRect),
    Pinned(ScreenRect),
}

/// A single node on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub placement: Placement,
    pub color: ColorTag,
    /// Render order, assigned by the layer manager.
    pub layer: u32,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind, rect: WorldRect) -> Self {
        Self {
            id,
            kind,
            placement: Placement::World(rect),
            color: ColorTag::None,
            layer: 0,
        }
    }

    pub fn pinned(id: NodeId, kind: NodeKind, rect: ScreenRect) -> Self {
        Self {
            id,
            kind,
            placement: Placement::Pinned(rect),
            color: ColorTag::None,
            layer: 0,
        }
    }

    pub fn is_pinned(&self) -> bool {
        matches!(self.placement, Placement::Pinned(_))
    }

    pub fn is_group(&self) -> bool {
        self.kind.is_group()
    }

    /// Geometry in world space, converting pinned nodes through the viewport.
    pub fn world_rect(&self, viewport: &Viewport) -> WorldRect {
        match self.placement {
            Placement::World(r) => r,
            Placement::Pinned(r) => viewport.screen_rect_to_world(&r),
        }
    }

    /// Geometry in screen space, converting world nodes through the viewport.
    pub fn screen_rect(&self, viewport: &Viewport) -> ScreenRect {
        match self.placement {
            Placement::World(r) => viewport.world_rect_to_screen(&r),
            Placement::Pinned(r) => r,
        }
    }

    pub fn world_center(&self, viewport: &Viewport) -> WorldPoint {
        self.world_rect(viewport).center()
    }

    /// Switch between world and screen placement without moving on screen.
    pub fn toggle_pinned(&mut self, viewport: &Viewport) {
        self.placement = match self.placement {
            Placement::World(r) => Placement::Pinned(viewport.world_rect_to_screen(&r)),
            Placement::Pinned(r) => Placement::World(viewport.screen_rect_to_world(&r)),
        };
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// Spring-damper state of an edge's sag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SagState {
    pub sag: f32,
    pub velocity: f32,
    pub settled: bool,
}

impl Default for SagState {
    fn default() -> Self {
        Self {
            sag: 0.0,
            velocity: 0.0,
            settled: true,
        }
    }
}

/// A connection from one node handle to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub from_handle: Handle,
    pub to: NodeId,
    pub to_handle: Handle,
    /// Intermediate routing waypoints, in order, in world space.
    pub waypoints: SmallVec<[WorldPoint; 4]>,
    /// Cached resolved world position of the start handle.
    pub start: Option<WorldPoint>,
    /// Cached resolved world position of the end handle.
    pub end: Option<WorldPoint>,
    pub physics: SagState,
    pub label: Option<String>,
}

impl Edge {
    /// Build an edge, rejecting self-loops.
    ///
    /// # Errors
    /// `GraphError::SelfLoop` when `from == to`.
    pub fn new(
        id: EdgeId,
        from: NodeId,
        from_handle: Handle,
        to: NodeId,
        to_handle: Handle,
    ) -> Result<Self, GraphError> {
        if from == to {
            return Err(GraphError::SelfLoop(from));
        }
        Ok(Self {
            id,
            from,
            from_handle,
            to,
            to_handle,
            waypoints: SmallVec::new(),
            start: None,
            end: None,
            // Fresh edges fall into place from a straight line.
            physics: SagState {
                settled: false,
                ..SagState::default()
            },
            label: None,
        })
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.from == node || self.to == node
    }

    /// Both endpoints resolved.
    pub fn endpoints(&self) -> Option<(WorldPoint, WorldPoint)> {
        Some((self.start?, self.end?))
    }
}

// ─── Graph state ─────────────────────────────────────────────────────────

/// The engine's working set of nodes, containment and connections.
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    /// Containment graph: node weights are canvas nodes, edges run group → member.
    pub graph: StableDiGraph<Node, ()>,
    /// Index from NodeId → NodeIndex for fast lookup.
    pub id_index: HashMap<NodeId, NodeIndex>,
    /// Connections, in creation order.
    pub edges: Vec<Edge>,
    /// Registration sequence. Graph indices get reused after removals, so
    /// insertion order is tracked separately.
    order: BTreeMap<u64, NodeId>,
    rank: HashMap<NodeId, u64>,
    next_rank: u64,
}

impl GraphState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Register a node, optionally inside `parent`.
    ///
    /// # Errors
    /// Duplicate ids, unknown parents and non-group parents are rejected.
    pub fn add_node(&mut self, node: Node, parent: Option<NodeId>) -> Result<NodeIndex, GraphError> {
        if self.id_index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        let parent_idx = match parent {
            Some(pid) => {
                let pidx = self.index_of(pid).ok_or(GraphError::UnknownNode(pid))?;
                if !self.graph[pidx].is_group() {
                    return Err(GraphError::NotAGroup(pid));
                }
                Some(pidx)
            }
            None => None,
        };
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        self.order.insert(self.next_rank, id);
        self.rank.insert(id, self.next_rank);
        self.next_rank += 1;
        if let Some(pidx) = parent_idx {
            self.graph.add_edge(pidx, idx, ());
        }
        Ok(idx)
    }

    /// Remove a node. Its members move up to its own parent and every
    /// connection touching it is dropped.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let idx = self.index_of(id)?;
        let parent = self.parent_index(idx);
        for child in self.child_indices(idx) {
            if let Some(e) = self.graph.find_edge(idx, child) {
                self.graph.remove_edge(e);
            }
            if let Some(p) = parent {
                self.graph.add_edge(p, child, ());
            }
        }
        self.edges.retain(|e| !e.touches(id));
        self.id_index.remove(&id);
        if let Some(rank) = self.rank.remove(&id) {
            self.order.remove(&rank);
        }
        self.graph.remove_node(idx)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index_of(id).map(|idx| &self.graph[idx])
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.index_of(id).map(|idx| &mut self.graph[idx])
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.values().filter_map(|id| self.node(*id))
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().map(|n| n.id).collect()
    }

    pub fn node_count(&self) -> usize {
        self.id_index.len()
    }

    // ─── Containment ─────────────────────────────────────────────────────

    fn parent_index(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph.neighbors_directed(idx, Direction::Incoming).next()
    }

    fn child_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self.graph.neighbors_directed(idx, Direction::Outgoing).collect();
        children.sort_by_key(|c| self.rank.get(&self.graph[*c].id).copied().unwrap_or(u64::MAX));
        children
    }

    /// The group directly containing `id`, if any.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let idx = self.index_of(id)?;
        self.parent_index(idx).map(|p| self.graph[p].id)
    }

    /// Direct members of a group, in insertion order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.index_of(id) {
            Some(idx) => self.child_indices(idx).into_iter().map(|c| self.graph[c].id).collect(),
            None => Vec::new(),
        }
    }

    /// Number of groups above `id`.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.index_of(id);
        while let Some(idx) = current {
            current = self.parent_index(idx);
            if current.is_some() {
                depth += 1;
            }
        }
        depth
    }

    /// Check if `ancestor` contains `descendant`, directly or transitively.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        if ancestor == descendant {
            return false;
        }
        let mut current = match self.index_of(descendant) {
            Some(idx) => idx,
            None => return false,
        };
        while let Some(parent) = self.parent_index(current) {
            if self.graph[parent].id == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Move `child` into `group` (or to the top level with `None`).
    ///
    /// Returns `Ok(false)` when the node already sits there.
    ///
    /// # Errors
    /// Unknown ids, non-group targets, self-containment and cycles are rejected
    /// before anything changes.
    pub fn set_parent(&mut self, child: NodeId, group: Option<NodeId>) -> Result<bool, GraphError> {
        let child_idx = self.index_of(child).ok_or(GraphError::UnknownNode(child))?;
        let group_idx = match group {
            Some(g) => {
                let gidx = self.index_of(g).ok_or(GraphError::UnknownNode(g))?;
                if !self.graph[gidx].is_group() {
                    return Err(GraphError::NotAGroup(g));
                }
                if g == child || self.is_ancestor_of(child, g) {
                    return Err(GraphError::ContainmentCycle { child, group: g });
                }
                Some(gidx)
            }
            None => None,
        };
        let old = self.parent_index(child_idx);
        if old == group_idx {
            return Ok(false);
        }
        if let Some(old_idx) = old
            && let Some(e) = self.graph.find_edge(old_idx, child_idx)
        {
            self.graph.remove_edge(e);
        }
        if let Some(gidx) = group_idx {
            self.graph.add_edge(gidx, child_idx, ());
        }
        Ok(true)
    }

    /// Breadth-first closure of `roots` over containment, roots first,
    /// without duplicates. Unknown ids are skipped.
    pub fn containment_closure(&self, roots: &[NodeId]) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut queue: VecDeque<NodeId> = roots.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            if !self.contains_node(id) || !seen.insert(id) {
                continue;
            }
            out.push(id);
            queue.extend(self.children(id));
        }
        out
    }

    /// Union of every node's world rectangle.
    pub fn world_bounds(&self, viewport: &Viewport) -> Option<WorldRect> {
        self.nodes()
            .map(|n| n.world_rect(viewport))
            .reduce(|acc, r| acc.union(&r))
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// Register a connection.
    ///
    /// # Errors
    /// Self-loops, unknown endpoints and duplicate ids are rejected.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if edge.from == edge.to {
            return Err(GraphError::SelfLoop(edge.from));
        }
        for end in [edge.from, edge.to] {
            if !self.contains_node(end) {
                return Err(GraphError::UnknownNode(end));
            }
        }
        if self.edge(edge.id).is_some() {
            return Err(GraphError::DuplicateEdge(edge.id));
        }
        self.edges.push(edge);
        Ok(())
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let pos = self.edges.iter().position(|e| e.id == id)?;
        Some(self.edges.remove(pos))
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|e| e.id == id)
    }

    pub fn edges_touching(&self, node: NodeId) -> Vec<EdgeId> {
        self.edges.iter().filter(|e| e.touches(node)).map(|e| e.id).collect()
    }

    /// Connections ending at `node`.
    pub fn incoming(&self, node: NodeId) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.to == node).collect()
    }

    /// Connections leaving `node`.
    pub fn outgoing(&self, node: NodeId) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.from == node).collect()
    }
}
