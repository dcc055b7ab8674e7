//! Selected node and edge ids.
//!
//! Selection is ephemeral: it only references ids that exist in the
//! `GraphState`, and `retain_existing` drops the rest after deletions.

use crate::bus::Command;
use loom_core::id::{EdgeId, NodeId};
use loom_core::model::GraphState;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    nodes: HashSet<NodeId>,
    edges: HashSet<EdgeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.contains(&id)
    }

    pub fn select_node(&mut self, id: NodeId) {
        self.nodes.insert(id);
    }

    pub fn select_edge(&mut self, id: EdgeId) {
        self.edges.insert(id);
    }

    pub fn toggle_node(&mut self, id: NodeId) {
        if !self.nodes.remove(&id) {
            self.nodes.insert(id);
        }
    }

    pub fn toggle_edge(&mut self, id: EdgeId) {
        if !self.edges.remove(&id) {
            self.edges.insert(id);
        }
    }

    pub fn deselect_node(&mut self, id: NodeId) {
        self.nodes.remove(&id);
    }

    pub fn deselect_edge(&mut self, id: EdgeId) {
        self.edges.remove(&id);
    }

    /// Replace the current selection, e.g. after a rectangle select.
    pub fn replace(&mut self, nodes: impl IntoIterator<Item = NodeId>, edges: impl IntoIterator<Item = EdgeId>) {
        self.nodes = nodes.into_iter().collect();
        self.edges = edges.into_iter().collect();
    }

    /// Add to the current selection.
    pub fn extend(&mut self, nodes: impl IntoIterator<Item = NodeId>, edges: impl IntoIterator<Item = EdgeId>) {
        self.nodes.extend(nodes);
        self.edges.extend(edges);
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    /// Drop ids that no longer exist. Returns `true` if anything was removed.
    pub fn retain_existing(&mut self, graph: &GraphState) -> bool {
        let before = self.len();
        self.nodes.retain(|id| graph.contains_node(*id));
        self.edges.retain(|id| graph.edge(*id).is_some());
        self.len() != before
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Selected node ids, sorted.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.iter().copied().collect();
        ids.sort();
        ids
    }

    /// Selected edge ids, sorted.
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        let mut ids: Vec<EdgeId> = self.edges.iter().copied().collect();
        ids.sort();
        ids
    }

    /// `selection:changed` payload.
    pub fn snapshot(&self) -> Command {
        Command::SelectionChanged {
            nodes: self.node_ids(),
            edges: self.edge_ids(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_core::model::{Node, NodeKind};
    use loom_core::space::world_rect;

    #[test]
    fn new_selection_is_empty() {
        let s = Selection::new();
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut s = Selection::new();
        let id = NodeId::intern("sel_a");
        s.toggle_node(id);
        assert!(s.contains_node(id));
        s.toggle_node(id);
        assert!(!s.contains_node(id));
    }

    #[test]
    fn replace_discards_previous() {
        let mut s = Selection::new();
        s.select_node(NodeId::intern("sel_old"));
        s.replace([NodeId::intern("sel_new")], [EdgeId::intern("sel_e")]);
        assert_eq!(s.node_ids(), vec![NodeId::intern("sel_new")]);
        assert!(s.contains_edge(EdgeId::intern("sel_e")));
    }

    #[test]
    fn retain_drops_missing_ids() {
        let mut g = GraphState::new();
        g.add_node(
            Node::new(NodeId::intern("sel_live"), NodeKind::Plain, world_rect(0.0, 0.0, 10.0, 10.0)),
            None,
        )
        .unwrap();
        let mut s = Selection::new();
        s.select_node(NodeId::intern("sel_live"));
        s.select_node(NodeId::intern("sel_gone"));
        s.select_edge(EdgeId::intern("sel_gone_e"));
        assert!(s.retain_existing(&g));
        assert_eq!(s.node_ids(), vec![NodeId::intern("sel_live")]);
        assert!(!s.retain_existing(&g));
    }
}
