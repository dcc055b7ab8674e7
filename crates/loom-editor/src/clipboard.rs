//! Copy / paste of node subgraphs.
//!
//! A copy captures the selection's containment closure plus every edge
//! whose two endpoints were captured, encoded with MessagePack. A paste
//! never touches the graph directly: it yields `node:create` / `edge:create`
//! commands with fresh ids, parents before members.

use crate::bus::Command;
use crate::error::EditorError;
use crate::selection::Selection;
use loom_core::id::{EdgeId, NodeId};
use loom_core::model::{Edge, GraphState, Node, Placement, SagState};
use loom_core::space::{ScreenVector, WorldVector};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClipNode {
    node: Node,
    /// Parent, only when the parent was captured too.
    parent: Option<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClipPayload {
    nodes: Vec<ClipNode>,
    edges: Vec<Edge>,
}

/// Result of a paste: the creation commands and the ids they will register.
#[derive(Debug, Clone, PartialEq)]
pub struct Pasted {
    pub commands: Vec<Command>,
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
}

#[derive(Debug, Default)]
pub struct Clipboard {
    data: Option<Vec<u8>>,
    /// Pastes since the last copy, for cascading offsets.
    pastes: u32,
}

impl Clipboard {
    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    /// Raw bytes, for hosts that mirror the system clipboard.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    pub fn set_bytes(&mut self, bytes: Vec<u8>) {
        self.data = Some(bytes);
        self.pastes = 0;
    }

    /// Capture the selected nodes (with everything they contain) and the
    /// edges between captured nodes. Returns the number of nodes captured.
    ///
    /// # Errors
    /// `ClipboardEncode` if serialization fails.
    pub fn copy(&mut self, graph: &GraphState, selection: &Selection) -> Result<usize, EditorError> {
        let ids = graph.containment_closure(&selection.node_ids());
        let captured: HashSet<NodeId> = ids.iter().copied().collect();
        let nodes: Vec<ClipNode> = ids
            .iter()
            .filter_map(|id| {
                let node = graph.node(*id)?.clone();
                let parent = graph.parent(*id).filter(|p| captured.contains(p));
                Some(ClipNode { node, parent })
            })
            .collect();
        let edges: Vec<Edge> = graph
            .edges
            .iter()
            .filter(|e| captured.contains(&e.from) && captured.contains(&e.to))
            .cloned()
            .collect();

        let count = nodes.len();
        let bytes = rmp_serde::to_vec_named(&ClipPayload { nodes, edges })?;
        log::debug!("clipboard: copied {count} nodes ({} bytes)", bytes.len());
        self.set_bytes(bytes);
        Ok(count)
    }

    /// Build creation commands for the clipboard content, shifted by
    /// `step * (n + 1)` for the n-th paste since the last copy.
    ///
    /// # Errors
    /// `EmptyClipboard` before the first copy, `ClipboardDecode` for bytes
    /// that are not a clipboard payload.
    pub fn paste(&mut self, step: f32) -> Result<Pasted, EditorError> {
        let bytes = self.data.as_deref().ok_or(EditorError::EmptyClipboard)?;
        let payload: ClipPayload = rmp_serde::from_slice(bytes)?;
        self.pastes += 1;
        let shift = step * self.pastes as f32;
        Ok(remap(payload, WorldVector::new(shift, shift)))
    }
}

fn remap(payload: ClipPayload, offset: WorldVector) -> Pasted {
    let ids: HashMap<NodeId, NodeId> = payload
        .nodes
        .iter()
        .map(|c| (c.node.id, NodeId::with_prefix("node")))
        .collect();

    let mut commands = Vec::with_capacity(payload.nodes.len() + payload.edges.len());
    let mut nodes = Vec::with_capacity(payload.nodes.len());
    for ClipNode { mut node, parent } in payload.nodes {
        let Some(&fresh) = ids.get(&node.id) else { continue };
        node.id = fresh;
        node.placement = match node.placement {
            Placement::World(r) => Placement::World(r.translate(offset)),
            Placement::Pinned(r) => Placement::Pinned(r.translate(ScreenVector::new(offset.x, offset.y))),
        };
        nodes.push(fresh);
        commands.push(Command::NodeCreate {
            node,
            parent: parent.and_then(|p| ids.get(&p).copied()),
            members: Vec::new(),
        });
    }

    let mut edges = Vec::with_capacity(payload.edges.len());
    for mut edge in payload.edges {
        let (Some(&from), Some(&to)) = (ids.get(&edge.from), ids.get(&edge.to)) else {
            continue;
        };
        edge.id = EdgeId::with_prefix("edge");
        edge.from = from;
        edge.to = to;
        for w in edge.waypoints.iter_mut() {
            *w += offset;
        }
        edge.start = None;
        edge.end = None;
        edge.physics = SagState {
            settled: false,
            ..SagState::default()
        };
        edges.push(edge.id);
        commands.push(Command::EdgeCreate { edge });
    }

    Pasted { commands, nodes, edges }
}
