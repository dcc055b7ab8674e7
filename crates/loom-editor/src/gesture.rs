//! Gesture state records.
//!
//! Exactly one gesture is active at a time; the `Editor` matches on it
//! before acting on any input so modes can never overlap.

use crate::drag::ShakeDetector;
use loom_core::id::{EdgeId, NodeId};
use loom_core::model::{Handle, Placement};
use loom_core::snap::ResizeDirs;
use loom_core::space::{ScreenPoint, WorldPoint};

/// Pointer-down on empty canvas. Armed until the debounce elapses or the
/// pointer moves past it, so a double-click can still claim the press.
#[derive(Debug, Clone, PartialEq)]
pub struct RectSelectState {
    pub origin: ScreenPoint,
    pub current: ScreenPoint,
    pub start_ms: u64,
    pub active: bool,
    /// Shift held: keep the existing selection.
    pub additive: bool,
}

#[derive(Debug, Clone)]
pub struct DragState {
    pub target: NodeId,
    pub origin: ScreenPoint,
    /// Placement of every moved node when the drag started.
    pub originals: Vec<(NodeId, Placement)>,
    pub shake: ShakeDetector,
    pub moved: bool,
}

impl DragState {
    pub fn moved_ids(&self) -> Vec<NodeId> {
        self.originals.iter().map(|(id, _)| *id).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResizeState {
    pub target: NodeId,
    pub origin: ScreenPoint,
    pub original: Placement,
    pub dirs: ResizeDirs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeDrawState {
    pub from: NodeId,
    pub handle: Handle,
    /// Live endpoint following the pointer.
    pub end: WorldPoint,
}

/// Transient line for cut and routing-cut modes.
#[derive(Debug, Clone, PartialEq)]
pub struct LineState {
    pub origin: WorldPoint,
    pub current: WorldPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutingPointDrag {
    pub edge: EdgeId,
    pub index: usize,
    pub original: WorldPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanState {
    pub last: ScreenPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PinchState {
    pub initial_distance: f32,
    pub initial_scale: f32,
    pub last_mid: ScreenPoint,
}

#[derive(Debug, Clone, Default)]
pub enum Gesture {
    #[default]
    Idle,
    RectSelecting(RectSelectState),
    DraggingNode(DragState),
    DraggingPinnedNode(DragState),
    Resizing(ResizeState),
    DrawingEdge(EdgeDrawState),
    CuttingEdgeLine(LineState),
    RoutingCutLine(LineState),
    DraggingRoutingPoint(RoutingPointDrag),
    Panning(PanState),
    Pinching(PinchState),
}

/// Payload-free view of `Gesture`, for hosts and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Idle,
    RectSelecting,
    DraggingNode,
    DraggingPinnedNode,
    Resizing,
    DrawingEdge,
    CuttingEdgeLine,
    RoutingCutLine,
    DraggingRoutingPoint,
    Panning,
    Pinching,
}

impl Gesture {
    /// An armed rectangle select still reports `Idle`.
    pub fn kind(&self) -> GestureKind {
        match self {
            Gesture::Idle => GestureKind::Idle,
            Gesture::RectSelecting(s) if !s.active => GestureKind::Idle,
            Gesture::RectSelecting(_) => GestureKind::RectSelecting,
            Gesture::DraggingNode(_) => GestureKind::DraggingNode,
            Gesture::DraggingPinnedNode(_) => GestureKind::DraggingPinnedNode,
            Gesture::Resizing(_) => GestureKind::Resizing,
            Gesture::DrawingEdge(_) => GestureKind::DrawingEdge,
            Gesture::CuttingEdgeLine(_) => GestureKind::CuttingEdgeLine,
            Gesture::RoutingCutLine(_) => GestureKind::RoutingCutLine,
            Gesture::DraggingRoutingPoint(_) => GestureKind::DraggingRoutingPoint,
            Gesture::Panning(_) => GestureKind::Panning,
            Gesture::Pinching(_) => GestureKind::Pinching,
        }
    }

    /// Idle, or only armed for a rectangle select.
    pub fn accepts_pointer_down(&self) -> bool {
        matches!(self.kind(), GestureKind::Idle)
    }

    /// Drag or resize in progress: edge updates are position-only.
    pub fn is_manipulating(&self) -> bool {
        matches!(
            self,
            Gesture::DraggingNode(_) | Gesture::DraggingPinnedNode(_) | Gesture::Resizing(_)
        )
    }

    /// Whether the gesture holds on to `id`.
    pub fn references_node(&self, id: NodeId) -> bool {
        match self {
            Gesture::DraggingNode(d) | Gesture::DraggingPinnedNode(d) => d.originals.iter().any(|(n, _)| *n == id),
            Gesture::Resizing(r) => r.target == id,
            Gesture::DrawingEdge(e) => e.from == id,
            _ => false,
        }
    }
}
