//! Z-order assignment.
//!
//! Groups and plain nodes draw from two disjoint pools so every group
//! renders behind every non-group node, and edges sit on a fixed band in
//! between. Inside the group pool an ancestor always gets a lower number
//! than its descendants.

use loom_core::id::NodeId;
use loom_core::model::GraphState;

pub const GROUP_LAYER_MIN: u32 = 100;
pub const GROUP_LAYER_MAX: u32 = 499;
pub const NODE_LAYER_MIN: u32 = 10_000;
/// Edges render above all groups and below all nodes.
pub const EDGE_LAYER: u32 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerManager {
    next_group: u32,
    next_node: u32,
}

impl Default for LayerManager {
    fn default() -> Self {
        Self {
            next_group: GROUP_LAYER_MIN,
            next_node: NODE_LAYER_MIN,
        }
    }
}

impl LayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_group(&mut self) -> u32 {
        if self.next_group > GROUP_LAYER_MAX {
            self.next_group = GROUP_LAYER_MIN;
        }
        let layer = self.next_group;
        self.next_group += 1;
        layer
    }

    fn take_node(&mut self) -> u32 {
        let layer = self.next_node;
        self.next_node = self.next_node.saturating_add(1);
        layer
    }

    /// Next layer from the pool matching the node kind.
    pub fn assign(&mut self, is_group: bool) -> u32 {
        if is_group { self.take_group() } else { self.take_node() }
    }

    /// Raise `ids` and everything they contain to the front of their pools.
    ///
    /// Groups are ordered by containment depth, then by current layer, so
    /// ancestors stay behind descendants. Returns the ids whose layer
    /// changed.
    pub fn bring_to_front(&mut self, graph: &mut GraphState, ids: &[NodeId]) -> Vec<NodeId> {
        let closure = graph.containment_closure(ids);
        let mut groups = Vec::new();
        let mut others = Vec::new();
        for id in closure {
            let Some(node) = graph.node(id) else { continue };
            if node.is_group() {
                groups.push((graph.depth(id), node.layer, id));
            } else {
                others.push((node.layer, id));
            }
        }
        groups.sort();
        others.sort();

        let mut changed = Vec::new();
        for (_, _, id) in groups {
            let layer = self.take_group();
            if let Some(node) = graph.node_mut(id)
                && node.layer != layer
            {
                node.layer = layer;
                changed.push(id);
            }
        }
        for (_, id) in others {
            let layer = self.take_node();
            if let Some(node) = graph.node_mut(id)
                && node.layer != layer
            {
                node.layer = layer;
                changed.push(id);
            }
        }
        log::trace!("layers: raised {} nodes", changed.len());
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_core::model::{Node, NodeKind};
    use loom_core::space::world_rect;
    use pretty_assertions::assert_eq;

    fn add(g: &mut GraphState, layers: &mut LayerManager, name: &str, kind: NodeKind, parent: Option<&str>) -> NodeId {
        let id = NodeId::intern(name);
        let mut node = Node::new(id, kind, world_rect(0.0, 0.0, 10.0, 10.0));
        node.layer = layers.assign(node.is_group());
        g.add_node(node, parent.map(NodeId::intern)).unwrap();
        id
    }

    #[test]
    fn pools_are_disjoint() {
        let mut layers = LayerManager::new();
        assert_eq!(layers.assign(true), 100);
        assert_eq!(layers.assign(false), 10_000);
        assert_eq!(layers.assign(true), 101);
    }

    #[test]
    fn group_pool_wraps() {
        let mut layers = LayerManager::new();
        for _ in GROUP_LAYER_MIN..=GROUP_LAYER_MAX {
            layers.assign(true);
        }
        assert_eq!(layers.assign(true), GROUP_LAYER_MIN);
    }

    #[test]
    fn ancestors_stay_behind_descendants() {
        let mut g = GraphState::new();
        let mut layers = LayerManager::new();
        // Inner group registered before its (later re-parented) outer group.
        let inner = add(&mut g, &mut layers, "ly_inner", NodeKind::Group, None);
        let outer = add(&mut g, &mut layers, "ly_outer", NodeKind::Group, None);
        g.set_parent(inner, Some(outer)).unwrap();
        let leaf = add(&mut g, &mut layers, "ly_leaf", NodeKind::Plain, Some("ly_inner"));

        layers.bring_to_front(&mut g, &[outer]);
        let layer = |id| g.node(id).unwrap().layer;
        assert!(layer(outer) < layer(inner));
        assert!(layer(inner) < EDGE_LAYER);
        assert!(layer(leaf) >= NODE_LAYER_MIN);
    }
}
