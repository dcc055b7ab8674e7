//! Outbound command channel.
//!
//! The editor never creates or destroys entries on its own: it asks the
//! lifecycle owner to, through `Command`s pushed into a `CommandSink`.
//! Hosts that route by name use `Command::topic()`.

use loom_core::id::{EdgeId, NodeId};
use loom_core::model::{Edge, Handle, Node};
use loom_core::space::WorldPoint;

/// A request or notification addressed to the editor's collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a node, optionally inside `parent`. A new group may adopt
    /// existing `members`.
    NodeCreate {
        node: Node,
        parent: Option<NodeId>,
        members: Vec<NodeId>,
    },
    NodeDelete { id: NodeId },
    /// Geometry, color, parent or layer of a node changed.
    NodeUpdate { id: NodeId },
    EdgeCreate { edge: Edge },
    EdgeDelete { id: EdgeId },
    /// Waypoints, label or endpoints of an edge changed.
    EdgeUpdate { id: EdgeId },
    /// Full selection, sorted.
    SelectionChanged { nodes: Vec<NodeId>, edges: Vec<EdgeId> },
    /// The sag loop went from stopped to running.
    PhysicsStart,
    /// An edge drag ended on empty canvas: offer "create node and connect".
    ConnectMenu { from: NodeId, handle: Handle, at: WorldPoint },
    /// Something was rejected; for the collaborator layer to surface.
    Diagnostic { message: String },
}

impl Command {
    /// Channel name for string-routed buses.
    pub fn topic(&self) -> &'static str {
        match self {
            Command::NodeCreate { .. } => "node:create",
            Command::NodeDelete { .. } => "node:delete",
            Command::NodeUpdate { .. } => "node:update",
            Command::EdgeCreate { .. } => "edge:create",
            Command::EdgeDelete { .. } => "edge:delete",
            Command::EdgeUpdate { .. } => "edge:update",
            Command::SelectionChanged { .. } => "selection:changed",
            Command::PhysicsStart => "physics:start",
            Command::ConnectMenu { .. } => "edge:connect-menu",
            Command::Diagnostic { .. } => "diagnostic",
        }
    }
}

/// Anything that accepts commands.
pub trait CommandSink {
    fn send(&mut self, command: Command);
}

impl CommandSink for Vec<Command> {
    fn send(&mut self, command: Command) {
        self.push(command);
    }
}

/// Buffered commands waiting for the host to drain them.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: Vec<Command>,
}

impl Outbox {
    pub fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.queue)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.queue.iter()
    }
}

impl CommandSink for Outbox {
    fn send(&mut self, command: Command) {
        log::trace!("outbox: {}", command.topic());
        self.queue.push(command);
    }
}
