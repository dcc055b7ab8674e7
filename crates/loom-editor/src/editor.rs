//! The editor controller.
//!
//! `Editor` owns the graph, the viewport, the selection and the single
//! active gesture. Discrete input arrives through `handle`; the host's
//! frame callback drives `tick`. Structural changes leave as `Command`s in
//! the outbox and come back through `register_*` / `unregister_*` (or
//! `apply_pending` for hosts without their own store).

use crate::batch::EdgeBatch;
use crate::bus::{Command, CommandSink, Outbox};
use crate::clipboard::Clipboard;
use crate::drag::{self, ShakeDetector};
use crate::error::EditorError;
use crate::gesture::*;
use crate::input::{InputEvent, Modifiers, PointerButton, Touch};
use crate::layers::LayerManager;
use crate::resize::{self, MIN_NODE_SIZE};
use crate::selection::Selection;
use crate::shortcuts::{HeldMode, ShortcutAction, ShortcutMap};
use loom_core::config::EngineConfig;
use loom_core::id::{EdgeId, NodeId};
use loom_core::model::{Edge, GraphState, Handle, Node, NodeKind, Placement, SagState};
use loom_core::path::{self, EdgePath};
use loom_core::physics::Simulation;
use loom_core::snap::{self, SnapGuide};
use loom_core::space::*;
use loom_core::viewport::{Viewport, ViewportAnimation};
use loom_render::hit::{self, NodeZone};
use loom_render::query::{GeometryRenderer, RenderQuery};
use std::collections::HashSet;

/// Duration of keyboard zoom and zoom-to-fit transitions.
pub const ZOOM_ANIMATION_MS: u64 = 250;
/// Scale factor per keyboard zoom step.
pub const ZOOM_STEP: f32 = 1.2;
/// Padding between a new group's bounds and its members.
pub const GROUP_PADDING: f32 = 20.0;
/// Side length of routing-point nodes.
pub const ROUTING_POINT_SIZE: f32 = 16.0;
/// Wheel zoom per pixel of vertical scroll (exponential).
const WHEEL_ZOOM_RATE: f32 = 0.002;
/// Screen margin kept around content by zoom-to-fit.
const FIT_MARGIN: f32 = 40.0;

pub struct Editor {
    pub graph: GraphState,
    pub viewport: Viewport,
    pub selection: Selection,
    config: EngineConfig,
    layers: LayerManager,
    simulation: Simulation,
    animation: Option<ViewportAnimation>,
    batch: EdgeBatch,
    gesture: Gesture,
    held: HashSet<HeldMode>,
    outbox: Outbox,
    renderer: Box<dyn RenderQuery>,
    clipboard: Clipboard,
    /// Ids requested by a paste, group or create that get selected once
    /// they register.
    pending_nodes: HashSet<NodeId>,
    pending_edges: HashSet<EdgeId>,
    guides: Vec<SnapGuide>,
    screen_size: ScreenSize,
    now_ms: u64,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Editor {
    pub fn new(config: EngineConfig) -> Self {
        let renderer = GeometryRenderer::from_config(&config);
        Self::with_renderer(config, Box::new(renderer))
    }

    /// Use a host-provided geometry source instead of `GeometryRenderer`.
    pub fn with_renderer(config: EngineConfig, renderer: Box<dyn RenderQuery>) -> Self {
        let config = config.normalized();
        Self {
            graph: GraphState::new(),
            viewport: Viewport::new(config.min_zoom, config.max_zoom),
            selection: Selection::new(),
            config,
            layers: LayerManager::new(),
            simulation: Simulation::default(),
            animation: None,
            batch: EdgeBatch::default(),
            gesture: Gesture::Idle,
            held: HashSet::new(),
            outbox: Outbox::default(),
            renderer,
            clipboard: Clipboard::default(),
            pending_nodes: HashSet::new(),
            pending_edges: HashSet::new(),
            guides: Vec::new(),
            screen_size: ScreenSize::new(800.0, 600.0),
            now_ms: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the settings. A gravity change wakes every edge so the sag
    /// converges to the new resting value. The renderer is left alone; a
    /// host that wants new paddings passes a new one via `set_renderer`.
    pub fn set_config(&mut self, config: EngineConfig) {
        let config = config.normalized();
        let gravity_changed = config.edge_gravity != self.config.edge_gravity;
        self.viewport.set_scale_bounds(config.min_zoom, config.max_zoom);
        self.config = config;
        self.batch.request_full();
        if gravity_changed {
            log::debug!("config: edge gravity now {}", self.config.edge_gravity);
            for edge in self.graph.edges.iter_mut() {
                edge.physics.settled = false;
            }
            if self.simulation.start() {
                self.outbox.send(Command::PhysicsStart);
            }
        }
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn RenderQuery>) {
        self.renderer = renderer;
        self.batch.request_full();
    }

    pub fn renderer(&self) -> &dyn RenderQuery {
        self.renderer.as_ref()
    }

    pub fn set_screen_size(&mut self, size: ScreenSize) {
        self.screen_size = size;
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn clipboard_mut(&mut self) -> &mut Clipboard {
        &mut self.clipboard
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn gesture_kind(&self) -> GestureKind {
        self.gesture.kind()
    }

    pub fn is_held(&self, mode: HeldMode) -> bool {
        self.held.contains(&mode)
    }

    /// Alignment guides of the current drag or resize.
    pub fn guides(&self) -> &[SnapGuide] {
        &self.guides
    }

    pub fn edge_path(&self, id: EdgeId) -> Option<EdgePath> {
        let edge = self.graph.edge(id)?;
        self.renderer.edge_path(&self.graph, &self.viewport, edge)
    }

    /// Preview of the edge being drawn, ending at the pointer.
    pub fn draft_edge_path(&self) -> Option<EdgePath> {
        let Gesture::DrawingEdge(draw) = &self.gesture else {
            return None;
        };
        let start = self
            .renderer
            .handle_position(&self.graph, &self.viewport, draw.from, draw.handle)?;
        Some(path::curve(
            start,
            draw.end,
            draw.handle,
            draw.handle.opposite(),
            0.0,
            self.config.edge_padding,
        ))
    }

    /// Current cut or routing-cut line.
    pub fn cut_line(&self) -> Option<(WorldPoint, WorldPoint)> {
        match &self.gesture {
            Gesture::CuttingEdgeLine(l) | Gesture::RoutingCutLine(l) => Some((l.origin, l.current)),
            _ => None,
        }
    }

    /// World rectangle of an active rectangle selection.
    pub fn rect_select_rect(&self) -> Option<WorldRect> {
        match &self.gesture {
            Gesture::RectSelecting(s) if s.active => Some(rect_from_corners(
                self.viewport.screen_to_world(s.origin),
                self.viewport.screen_to_world(s.current),
            )),
            _ => None,
        }
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Take everything queued for the host.
    pub fn drain_commands(&mut self) -> Vec<Command> {
        self.outbox.drain()
    }

    pub fn pending_commands(&self) -> &Outbox {
        &self.outbox
    }

    fn emit_selection(&mut self) {
        self.outbox.send(self.selection.snapshot());
    }

    fn diagnostic(&mut self, message: String) {
        log::warn!("{message}");
        self.outbox.send(Command::Diagnostic { message });
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// A node now exists. Assigns its layer and schedules its edges.
    ///
    /// # Errors
    /// Duplicate ids, unknown or non-group parents.
    pub fn register_node(&mut self, mut node: Node, parent: Option<NodeId>) -> Result<(), EditorError> {
        node.layer = self.layers.assign(node.is_group());
        let id = node.id;
        self.graph.add_node(node, parent)?;
        self.batch.mark_moved(id);
        log::debug!("lifecycle: registered {id}");
        if self.pending_nodes.remove(&id) {
            self.selection.select_node(id);
            self.settle_pending_selection();
        }
        Ok(())
    }

    /// # Errors
    /// Self-loops, unknown endpoints and duplicate ids.
    pub fn register_edge(&mut self, edge: Edge) -> Result<(), EditorError> {
        let id = edge.id;
        self.graph.add_edge(edge)?;
        self.batch.mark_added(id);
        log::debug!("lifecycle: registered {id}");
        if self.pending_edges.remove(&id) {
            self.selection.select_edge(id);
            self.settle_pending_selection();
        }
        Ok(())
    }

    fn settle_pending_selection(&mut self) {
        if self.pending_nodes.is_empty() && self.pending_edges.is_empty() {
            self.emit_selection();
        }
    }

    /// A node is gone. Its members move up to its parent and its edges
    /// disappear with it. A gesture holding on to it is cancelled.
    pub fn unregister_node(&mut self, id: NodeId) -> Option<Node> {
        if self.gesture.references_node(id) {
            self.cancel_gesture();
        }
        let mut changed = self.selection.contains_node(id);
        self.selection.deselect_node(id);
        for edge in self.graph.edges_touching(id) {
            changed |= self.selection.contains_edge(edge);
            self.selection.deselect_edge(edge);
            self.batch.forget_edge(edge);
        }
        self.batch.forget_node(id);
        self.pending_nodes.remove(&id);
        let removed = self.graph.remove_node(id);
        if removed.is_some() {
            log::debug!("lifecycle: unregistered {id}");
        }
        if changed {
            self.emit_selection();
        }
        removed
    }

    pub fn unregister_edge(&mut self, id: EdgeId) -> Option<Edge> {
        if let Gesture::DraggingRoutingPoint(r) = &self.gesture
            && r.edge == id
        {
            self.gesture = Gesture::Idle;
        }
        let changed = self.selection.contains_edge(id);
        self.selection.deselect_edge(id);
        self.batch.forget_edge(id);
        self.pending_edges.remove(&id);
        let removed = self.graph.remove_edge(id);
        if changed {
            self.emit_selection();
        }
        removed
    }

    /// Act as the lifecycle owner for one command. Notifications are
    /// ignored.
    ///
    /// # Errors
    /// Whatever the matching `register_*` call rejects.
    pub fn apply_lifecycle(&mut self, command: &Command) -> Result<(), EditorError> {
        match command {
            Command::NodeCreate { node, parent, members } => {
                self.register_node(node.clone(), *parent)?;
                for member in members {
                    if let Err(err) = self.graph.set_parent(*member, Some(node.id)) {
                        log::warn!("lifecycle: {member} stays outside {}, {err}", node.id);
                    }
                }
            }
            Command::NodeDelete { id } => {
                self.unregister_node(*id);
            }
            Command::EdgeCreate { edge } => self.register_edge(edge.clone())?,
            Command::EdgeDelete { id } => {
                self.unregister_edge(*id);
            }
            Command::NodeUpdate { .. }
            | Command::EdgeUpdate { .. }
            | Command::SelectionChanged { .. }
            | Command::PhysicsStart
            | Command::ConnectMenu { .. }
            | Command::Diagnostic { .. } => {}
        }
        Ok(())
    }

    /// Drain the outbox and apply it in place until nothing new is queued.
    /// Returns every command, in emission order.
    pub fn apply_pending(&mut self) -> Vec<Command> {
        let mut applied = Vec::new();
        loop {
            let commands = self.outbox.drain();
            if commands.is_empty() {
                break;
            }
            for command in &commands {
                if let Err(err) = self.apply_lifecycle(command) {
                    self.diagnostic(format!("{} rejected: {err}", command.topic()));
                }
            }
            applied.extend(commands);
        }
        applied
    }

    // ─── Frame ───────────────────────────────────────────────────────────

    /// Advance time-driven state: the select debounce, the viewport
    /// animation, batched edge updates and the sag simulation. Returns
    /// `true` while another frame is needed.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        self.now_ms = now_ms;
        self.arm_rect_select(now_ms);

        if let Some(animation) = self.animation {
            let done = animation.sample(&mut self.viewport, now_ms);
            self.batch.request_full();
            if done {
                self.animation = None;
            }
        }

        let report = self.batch.flush(
            &mut self.graph,
            &self.viewport,
            self.renderer.as_ref(),
            &mut self.simulation,
            self.gesture.is_manipulating(),
        );
        if report.physics_started {
            self.outbox.send(Command::PhysicsStart);
        }
        self.simulation.tick(&mut self.graph.edges, self.config.edge_gravity);
        self.needs_frame()
    }

    pub fn needs_frame(&self) -> bool {
        self.animation.is_some()
            || self.simulation.is_running()
            || !self.batch.is_empty()
            || matches!(&self.gesture, Gesture::RectSelecting(s) if !s.active)
    }

    fn arm_rect_select(&mut self, now_ms: u64) {
        if let Gesture::RectSelecting(s) = &mut self.gesture
            && !s.active
            && now_ms.saturating_sub(s.start_ms) >= self.config.select_debounce_ms
        {
            s.active = true;
            log::debug!("gesture: rect select active");
        }
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    /// Animate to `scale` / `offset` over `duration_ms`, replacing any
    /// animation in flight. A zero duration jumps on the next tick.
    pub fn animate_to(&mut self, scale: f32, offset: ScreenVector, duration_ms: u64) {
        self.animation = Some(ViewportAnimation::new(
            &self.viewport,
            scale,
            offset,
            self.now_ms,
            duration_ms,
        ));
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn zoom_to_fit(&mut self) {
        let Some(bounds) = self.graph.world_bounds(&self.viewport) else {
            return;
        };
        let (scale, offset) = self.viewport.fit_rect(&bounds, self.screen_size, FIT_MARGIN);
        self.animate_to(scale, offset, ZOOM_ANIMATION_MS);
    }

    fn zoom_by(&mut self, factor: f32) {
        let center = ScreenPoint::new(self.screen_size.width / 2.0, self.screen_size.height / 2.0);
        let mut target = self.viewport;
        target.zoom_at(center, self.viewport.scale * factor);
        self.animate_to(target.scale, target.offset, ZOOM_ANIMATION_MS);
    }

    fn pan_by(&mut self, delta: ScreenVector) {
        self.viewport.pan(delta);
        self.animation = None;
        self.batch.request_full();
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn handle(&mut self, event: &InputEvent) {
        self.now_ms = event.time_ms();
        match event {
            InputEvent::PointerDown {
                pos,
                button,
                modifiers,
                time_ms,
            } => self.pointer_down(*pos, *button, *modifiers, *time_ms),
            InputEvent::PointerMove { pos, time_ms, .. } => self.pointer_move(*pos, *time_ms),
            InputEvent::PointerUp { pos, .. } => self.pointer_up(*pos),
            InputEvent::DoubleClick { pos, .. } => self.double_click(*pos),
            InputEvent::Touches { touches, .. } => self.touches(touches),
            InputEvent::Wheel {
                pos, delta, modifiers, ..
            } => self.wheel(*pos, *delta, *modifiers),
            InputEvent::KeyDown { key, modifiers, .. } => self.key_down(key, *modifiers),
            InputEvent::KeyUp { key, .. } => self.key_up(key),
        }
    }

    fn begin(&mut self, gesture: Gesture) {
        log::debug!("gesture: {:?} -> {:?}", self.gesture.kind(), gesture.kind());
        self.gesture = gesture;
    }

    fn pointer_down(&mut self, pos: ScreenPoint, button: PointerButton, modifiers: Modifiers, time_ms: u64) {
        if !self.gesture.accepts_pointer_down() || button == PointerButton::Secondary {
            return;
        }
        let world = self.viewport.screen_to_world(pos);

        if button == PointerButton::Primary {
            let line = LineState {
                origin: world,
                current: world,
            };
            if self.held.contains(&HeldMode::Cut) {
                return self.begin(Gesture::CuttingEdgeLine(line));
            }
            if self.held.contains(&HeldMode::RoutingCut) {
                return self.begin(Gesture::RoutingCutLine(line));
            }
        }
        if button == PointerButton::Middle || self.held.contains(&HeldMode::Pan) {
            return self.begin(Gesture::Panning(PanState { last: pos }));
        }

        let radius = self.config.handle_radius / self.viewport.scale;
        if let Some((edge, index)) = hit::hit_waypoint(&self.graph, world, radius)
            && let Some(original) = self.graph.edge(edge).and_then(|e| e.waypoints.get(index).copied())
        {
            return self.begin(Gesture::DraggingRoutingPoint(RoutingPointDrag { edge, index, original }));
        }

        let zone = hit::hit_zone(
            &self.graph,
            &self.viewport,
            pos,
            self.config.handle_radius,
            self.config.resize_margin,
        );
        match zone {
            Some((from, NodeZone::Handle(handle))) => {
                self.begin(Gesture::DrawingEdge(EdgeDrawState { from, handle, end: world }));
            }
            Some((target, NodeZone::Resize(dirs))) => {
                if let Some(node) = self.graph.node(target) {
                    let original = node.placement;
                    self.begin(Gesture::Resizing(ResizeState {
                        target,
                        origin: pos,
                        original,
                        dirs,
                    }));
                }
            }
            Some((target, NodeZone::Body)) => self.begin_drag(target, pos, modifiers),
            None => self.press_empty(pos, world, modifiers, time_ms),
        }
    }

    fn begin_drag(&mut self, target: NodeId, pos: ScreenPoint, modifiers: Modifiers) {
        if modifiers.shift {
            self.selection.toggle_node(target);
            self.emit_selection();
        } else if !self.selection.contains_node(target) {
            self.selection.replace([target], []);
            self.emit_selection();
        }

        let ids = drag::nodes_to_move(&self.graph, &self.selection, target);
        let originals: Vec<(NodeId, Placement)> = ids
            .iter()
            .filter_map(|id| self.graph.node(*id).map(|n| (*id, n.placement)))
            .collect();
        for id in self.layers.bring_to_front(&mut self.graph, &ids) {
            self.outbox.send(Command::NodeUpdate { id });
        }

        let pinned = self.graph.node(target).is_some_and(|n| n.is_pinned());
        let state = DragState {
            target,
            origin: pos,
            originals,
            shake: ShakeDetector::new(self.config.shake_sample_ms, self.config.shake_sensitivity),
            moved: false,
        };
        self.begin(if pinned {
            Gesture::DraggingPinnedNode(state)
        } else {
            Gesture::DraggingNode(state)
        });
    }

    fn press_empty(&mut self, pos: ScreenPoint, world: WorldPoint, modifiers: Modifiers, time_ms: u64) {
        let tolerance = self.config.edge_hit_tolerance / self.viewport.scale;
        if let Some(edge) = hit::hit_edge(&self.graph, &self.viewport, self.renderer.as_ref(), world, tolerance) {
            if modifiers.shift {
                self.selection.toggle_edge(edge);
            } else {
                self.selection.replace([], [edge]);
            }
            self.emit_selection();
            return;
        }
        if !modifiers.shift && !self.selection.is_empty() {
            self.selection.clear();
            self.emit_selection();
        }
        self.begin(Gesture::RectSelecting(RectSelectState {
            origin: pos,
            current: pos,
            start_ms: time_ms,
            active: false,
            additive: modifiers.shift,
        }));
    }

    fn pointer_move(&mut self, pos: ScreenPoint, time_ms: u64) {
        let mut gesture = std::mem::take(&mut self.gesture);
        match &mut gesture {
            Gesture::Idle | Gesture::Pinching(_) => {}
            Gesture::RectSelecting(s) => {
                s.current = pos;
                if !s.active && time_ms.saturating_sub(s.start_ms) >= self.config.select_debounce_ms {
                    s.active = true;
                    log::debug!("gesture: rect select active");
                }
            }
            Gesture::DraggingNode(d) => self.drag_to(d, pos, time_ms, true),
            Gesture::DraggingPinnedNode(d) => self.drag_to(d, pos, time_ms, false),
            Gesture::Resizing(r) => self.resize_to(r, pos),
            Gesture::DrawingEdge(e) => e.end = self.viewport.screen_to_world(pos),
            Gesture::CuttingEdgeLine(l) | Gesture::RoutingCutLine(l) => {
                l.current = self.viewport.screen_to_world(pos);
            }
            Gesture::DraggingRoutingPoint(r) => self.move_waypoint(r, pos),
            Gesture::Panning(p) => {
                let delta = pos - p.last;
                p.last = pos;
                self.pan_by(delta);
            }
        }
        self.gesture = gesture;
    }

    /// Rectangles other nodes can be snapped against.
    fn static_rects(&self, exclude: &HashSet<NodeId>) -> Vec<WorldRect> {
        self.graph
            .nodes()
            .filter(|n| !exclude.contains(&n.id))
            .filter_map(|n| match n.placement {
                Placement::World(r) => Some(r),
                Placement::Pinned(_) => None,
            })
            .collect()
    }

    fn drag_to(&mut self, state: &mut DragState, pos: ScreenPoint, time_ms: u64, snapping: bool) {
        self.move_dragged(state, pos, snapping);
        if state.shake.record(time_ms, pos) {
            log::debug!("drag: shake on {}, bridging", state.target);
            for command in drag::plan_bridge(&self.graph, state.target) {
                self.outbox.send(command);
            }
        }
    }

    /// Place every dragged node for a pointer at `pos`.
    fn move_dragged(&mut self, state: &mut DragState, pos: ScreenPoint, snapping: bool) {
        let mut screen_delta = pos - state.origin;
        if screen_delta != ScreenVector::zero() {
            state.moved = true;
        }
        let mut world_delta = self.viewport.screen_vector_to_world(screen_delta);
        self.guides.clear();

        if snapping
            && let Some((_, Placement::World(original))) = state.originals.iter().find(|(id, _)| *id == state.target)
        {
            let mut proposed = original.translate(world_delta);
            if self.config.snap_to_grid {
                proposed = snap::snap_rect_to_grid(proposed, self.config.grid_size);
            }
            if self.config.snap_to_objects {
                let moving: HashSet<NodeId> = state.originals.iter().map(|(id, _)| *id).collect();
                let result = snap::snap_move(proposed, &self.static_rects(&moving), self.config.snap_threshold);
                proposed = result.rect;
                self.guides = result.guides;
            }
            world_delta = proposed.origin - original.origin;
            // Pinned companions follow the snapped motion, not the raw pointer.
            screen_delta = self.viewport.world_vector_to_screen(world_delta);
        }

        for (id, original) in &state.originals {
            if let Some(node) = self.graph.node_mut(*id) {
                node.placement = drag::translate(*original, world_delta, screen_delta);
            }
            self.batch.mark_moved(*id);
        }
    }

    fn resize_to(&mut self, state: &ResizeState, pos: ScreenPoint) {
        let screen_delta = pos - state.origin;
        let placement = match state.original {
            Placement::Pinned(rect) => {
                self.guides.clear();
                Placement::Pinned(resize::resize_rect(rect, state.dirs, screen_delta, MIN_NODE_SIZE))
            }
            Placement::World(rect) => {
                let delta = self.viewport.screen_vector_to_world(screen_delta);
                let grid = self.config.snap_to_grid.then_some(self.config.grid_size);
                let statics = self.config.snap_to_objects.then(|| {
                    let exclude: HashSet<NodeId> = self.graph.containment_closure(&[state.target]).into_iter().collect();
                    self.static_rects(&exclude)
                });
                let (rect, guides) = resize::resize_world(
                    rect,
                    state.dirs,
                    delta,
                    grid,
                    statics.as_deref().map(|s| (s, self.config.snap_threshold)),
                );
                self.guides = guides;
                Placement::World(rect)
            }
        };
        if let Some(node) = self.graph.node_mut(state.target) {
            node.placement = placement;
        }
        self.batch.mark_moved(state.target);
    }

    fn move_waypoint(&mut self, state: &RoutingPointDrag, pos: ScreenPoint) {
        let mut p = self.viewport.screen_to_world(pos);
        if self.config.snap_to_grid {
            let grid = self.config.grid_size;
            p = WorldPoint::new(snap::snap_to_grid(p.x, grid), snap::snap_to_grid(p.y, grid));
        }
        if let Some(w) = self
            .graph
            .edge_mut(state.edge)
            .and_then(|e| e.waypoints.get_mut(state.index))
        {
            *w = p;
        }
    }

    fn pointer_up(&mut self, pos: ScreenPoint) {
        let gesture = std::mem::take(&mut self.gesture);
        let kind = gesture.kind();
        self.guides.clear();
        match gesture {
            Gesture::Idle | Gesture::Panning(_) => {}
            Gesture::Pinching(pinch) => {
                self.gesture = Gesture::Pinching(pinch);
                return;
            }
            Gesture::RectSelecting(mut s) => {
                s.current = pos;
                self.finish_rect_select(&s);
            }
            Gesture::DraggingNode(mut d) => {
                self.move_dragged(&mut d, pos, true);
                self.guides.clear();
                self.finish_drag(&d);
            }
            Gesture::DraggingPinnedNode(mut d) => {
                self.move_dragged(&mut d, pos, false);
                self.finish_drag(&d);
            }
            Gesture::Resizing(r) => {
                self.resize_to(&r, pos);
                self.guides.clear();
                self.outbox.send(Command::NodeUpdate { id: r.target });
            }
            Gesture::DrawingEdge(e) => self.finish_edge(&e, pos),
            Gesture::CuttingEdgeLine(mut l) => {
                l.current = self.viewport.screen_to_world(pos);
                self.finish_cut(&l);
            }
            Gesture::RoutingCutLine(mut l) => {
                l.current = self.viewport.screen_to_world(pos);
                self.finish_routing_cut(&l);
            }
            Gesture::DraggingRoutingPoint(r) => {
                self.move_waypoint(&r, pos);
                self.outbox.send(Command::EdgeUpdate { id: r.edge });
            }
        }
        if kind != GestureKind::Idle {
            log::debug!("gesture: {kind:?} -> Idle");
        }
    }

    fn finish_rect_select(&mut self, state: &RectSelectState) {
        // Released before the debounce: a plain click on the canvas.
        if !state.active {
            return;
        }
        let rect = rect_from_corners(
            self.viewport.screen_to_world(state.origin),
            self.viewport.screen_to_world(state.current),
        );
        let nodes = hit::nodes_in_rect(&self.graph, &self.viewport, &rect);
        let edges = hit::edges_in_rect(&self.graph, &self.viewport, self.renderer.as_ref(), &rect);
        log::debug!("rect select: {} nodes, {} edges", nodes.len(), edges.len());
        if state.additive {
            self.selection.extend(nodes, edges);
        } else {
            self.selection.replace(nodes, edges);
        }
        self.emit_selection();
    }

    fn finish_drag(&mut self, state: &DragState) {
        if !state.moved {
            return;
        }
        let ids = state.moved_ids();
        for id in &ids {
            self.outbox.send(Command::NodeUpdate { id: *id });
        }

        // Only the outermost moved nodes can change groups; their members
        // travel with them. Pinned ones are skipped inside.
        let moving: HashSet<NodeId> = ids.iter().copied().collect();
        let roots: Vec<NodeId> = ids
            .iter()
            .copied()
            .filter(|id| self.graph.parent(*id).is_none_or(|p| !moving.contains(&p)))
            .collect();
        drag::recompute_membership(&mut self.graph, &self.viewport, &roots);

        if state.shake.triggered() {
            return;
        }
        let split = drag::find_split_edge(
            &self.graph,
            &self.viewport,
            self.renderer.as_ref(),
            state.target,
            self.config.edge_split_tolerance,
        );
        if let Some(edge) = split
            && let Some(at) = self.graph.node(state.target).map(|n| n.world_center(&self.viewport))
        {
            log::debug!("drop: splitting {edge} through {}", state.target);
            for command in drag::plan_split(&self.graph, edge, state.target, at) {
                self.outbox.send(command);
            }
        }
    }

    fn finish_edge(&mut self, draw: &EdgeDrawState, pos: ScreenPoint) {
        let world = self.viewport.screen_to_world(pos);
        let target = hit::hit_zone(
            &self.graph,
            &self.viewport,
            pos,
            self.config.handle_radius,
            self.config.resize_margin,
        );
        let Some((to, zone)) = target else {
            self.outbox.send(Command::ConnectMenu {
                from: draw.from,
                handle: draw.handle,
                at: world,
            });
            return;
        };
        let to_handle = match zone {
            NodeZone::Handle(h) => h,
            NodeZone::Resize(_) | NodeZone::Body => self
                .graph
                .node(to)
                .map(|n| Handle::nearest(&n.world_rect(&self.viewport), world))
                .unwrap_or(draw.handle.opposite()),
        };
        match Edge::new(EdgeId::with_prefix("edge"), draw.from, draw.handle, to, to_handle) {
            Ok(edge) => {
                log::debug!("connect: {} -> {}", edge.from, edge.to);
                self.outbox.send(Command::EdgeCreate { edge });
            }
            Err(err) => self.diagnostic(format!("connection rejected: {err}")),
        }
    }

    fn finish_cut(&mut self, line: &LineState) {
        let crossed = hit::edges_crossing_line(
            &self.graph,
            &self.viewport,
            self.renderer.as_ref(),
            line.origin,
            line.current,
        );
        log::debug!("cut: {} edges", crossed.len());
        for (id, _) in crossed {
            self.outbox.send(Command::EdgeDelete { id });
        }
    }

    fn finish_routing_cut(&mut self, line: &LineState) {
        let crossed = hit::edges_crossing_line(
            &self.graph,
            &self.viewport,
            self.renderer.as_ref(),
            line.origin,
            line.current,
        );
        let Some((edge, at)) = crossed
            .into_iter()
            .min_by(|a, b| (a.1 - line.origin).length().total_cmp(&(b.1 - line.origin).length()))
        else {
            return;
        };

        let half = ROUTING_POINT_SIZE / 2.0;
        let node = Node::new(
            NodeId::with_prefix("node"),
            NodeKind::RoutingPoint,
            world_rect(at.x - half, at.y - half, ROUTING_POINT_SIZE, ROUTING_POINT_SIZE),
        );
        let split = drag::plan_split(&self.graph, edge, node.id, at);
        if split.is_empty() {
            return;
        }
        log::debug!("routing cut: {edge} through {}", node.id);
        let parent = drag::group_at(&self.graph, &self.viewport, at, None);
        self.outbox.send(Command::NodeCreate {
            node,
            parent,
            members: Vec::new(),
        });
        for command in split {
            self.outbox.send(command);
        }
    }

    fn double_click(&mut self, pos: ScreenPoint) {
        // The press that armed the rectangle select belongs to this
        // double-click.
        if matches!(&self.gesture, Gesture::RectSelecting(s) if !s.active) {
            self.begin(Gesture::Idle);
        }
        if !matches!(self.gesture, Gesture::Idle) {
            return;
        }
        let world = self.viewport.screen_to_world(pos);

        let radius = self.config.handle_radius / self.viewport.scale;
        if let Some((edge, index)) = hit::hit_waypoint(&self.graph, world, radius) {
            self.remove_waypoint(edge, index);
            return;
        }
        if hit::hit_test(&self.graph, &self.viewport, world).is_some() {
            return;
        }
        let tolerance = self.config.edge_hit_tolerance / self.viewport.scale;
        if let Some(edge) = hit::hit_edge(&self.graph, &self.viewport, self.renderer.as_ref(), world, tolerance) {
            self.insert_waypoint(edge, world);
            return;
        }
        self.create_node_at(world);
    }

    fn remove_waypoint(&mut self, id: EdgeId, index: usize) {
        let Some(edge) = self.graph.edge_mut(id) else {
            return;
        };
        if index >= edge.waypoints.len() {
            return;
        }
        edge.waypoints.remove(index);
        if edge.waypoints.is_empty() && self.simulation.pluck(edge) {
            self.outbox.send(Command::PhysicsStart);
        }
        self.outbox.send(Command::EdgeUpdate { id });
    }

    fn insert_waypoint(&mut self, id: EdgeId, at: WorldPoint) {
        let Some(edge) = self.graph.edge_mut(id) else {
            return;
        };
        let Some(index) = hit::waypoint_insert_index(edge, at) else {
            return;
        };
        edge.waypoints.insert(index, at);
        edge.physics = SagState::default();
        self.outbox.send(Command::EdgeUpdate { id });
    }

    fn create_node_at(&mut self, center: WorldPoint) {
        let size = self.config.default_node_size;
        let rect = WorldRect::new(
            WorldPoint::new(center.x - size.width / 2.0, center.y - size.height / 2.0),
            size,
        );
        let node = Node::new(NodeId::with_prefix("node"), NodeKind::Plain, rect);
        let parent = drag::group_at(&self.graph, &self.viewport, center, None);
        self.pending_nodes.insert(node.id);
        self.outbox.send(Command::NodeCreate {
            node,
            parent,
            members: Vec::new(),
        });
    }

    fn touches(&mut self, touches: &[Touch]) {
        let [a, b, ..] = touches else {
            if matches!(self.gesture, Gesture::Pinching(_)) {
                self.begin(Gesture::Idle);
            }
            return;
        };
        let distance = (b.pos - a.pos).length();
        let mid = a.pos.lerp(b.pos, 0.5);

        if let Gesture::Pinching(pinch) = &mut self.gesture {
            if pinch.initial_distance > f32::EPSILON {
                let scale = pinch.initial_scale * distance / pinch.initial_distance;
                self.viewport.zoom_at(pinch.last_mid, scale);
            }
            self.viewport.pan(mid - pinch.last_mid);
            pinch.last_mid = mid;
            self.animation = None;
            self.batch.request_full();
            return;
        }

        // A second finger preempts whatever the first one started.
        self.cancel_gesture();
        self.begin(Gesture::Pinching(PinchState {
            initial_distance: distance,
            initial_scale: self.viewport.scale,
            last_mid: mid,
        }));
    }

    fn wheel(&mut self, pos: ScreenPoint, delta: ScreenVector, modifiers: Modifiers) {
        if modifiers.command() {
            let scale = self.viewport.scale * (-delta.y * WHEEL_ZOOM_RATE).exp();
            self.viewport.zoom_at(pos, scale);
            self.animation = None;
            self.batch.request_full();
        } else {
            self.pan_by(-delta);
        }
    }

    /// Put everything the active gesture moved back where it was and
    /// return to `Idle`.
    pub fn cancel_gesture(&mut self) {
        let gesture = std::mem::take(&mut self.gesture);
        self.guides.clear();
        match &gesture {
            Gesture::DraggingNode(d) | Gesture::DraggingPinnedNode(d) => {
                for (id, placement) in &d.originals {
                    if let Some(node) = self.graph.node_mut(*id) {
                        node.placement = *placement;
                    }
                    self.batch.mark_moved(*id);
                }
            }
            Gesture::Resizing(r) => {
                if let Some(node) = self.graph.node_mut(r.target) {
                    node.placement = r.original;
                }
                self.batch.mark_moved(r.target);
            }
            Gesture::DraggingRoutingPoint(r) => {
                if let Some(w) = self.graph.edge_mut(r.edge).and_then(|e| e.waypoints.get_mut(r.index)) {
                    *w = r.original;
                }
            }
            _ => {}
        }
        if !matches!(gesture, Gesture::Idle) {
            log::debug!("gesture: {:?} cancelled", gesture.kind());
        }
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    fn key_down(&mut self, key: &str, modifiers: Modifiers) {
        if let Some(mode) = ShortcutMap::held_mode(key, modifiers)
            && self.held.insert(mode)
        {
            log::trace!("held: {mode:?} on");
        }
        if let Some(action) = ShortcutMap::resolve(key, modifiers) {
            self.run(action);
        }
    }

    fn key_up(&mut self, key: &str) {
        if let Some(mode) = ShortcutMap::held_mode(key, Modifiers::default())
            && self.held.remove(&mode)
        {
            log::trace!("held: {mode:?} off");
        }
    }

    /// Perform a shortcut action, as if its keys had been pressed.
    pub fn run(&mut self, action: ShortcutAction) {
        log::debug!("action: {action:?}");
        match action {
            ShortcutAction::Delete => self.delete_selection(),
            ShortcutAction::SelectAll => {
                let edges: Vec<EdgeId> = self.graph.edges.iter().map(|e| e.id).collect();
                self.selection.replace(self.graph.node_ids(), edges);
                self.emit_selection();
            }
            ShortcutAction::Copy => {
                self.copy_selection();
            }
            ShortcutAction::Cut => {
                if self.copy_selection() {
                    self.delete_selection();
                }
            }
            ShortcutAction::Paste => self.paste(),
            ShortcutAction::Escape => {
                if !matches!(self.gesture, Gesture::Idle) {
                    self.cancel_gesture();
                } else if !self.selection.is_empty() {
                    self.selection.clear();
                    self.emit_selection();
                }
            }
            ShortcutAction::Group => self.group_selection(),
            ShortcutAction::Ungroup => self.ungroup_selection(),
            ShortcutAction::BringToFront => {
                let ids = self.selection.node_ids();
                for id in self.layers.bring_to_front(&mut self.graph, &ids) {
                    self.outbox.send(Command::NodeUpdate { id });
                }
            }
            ShortcutAction::CycleColor => {
                for id in self.selection.node_ids() {
                    if let Some(node) = self.graph.node_mut(id) {
                        node.color = node.color.next();
                        self.outbox.send(Command::NodeUpdate { id });
                    }
                }
            }
            ShortcutAction::TogglePin => self.toggle_pin_selection(),
            ShortcutAction::ZoomIn => self.zoom_by(ZOOM_STEP),
            ShortcutAction::ZoomOut => self.zoom_by(1.0 / ZOOM_STEP),
            ShortcutAction::ZoomToFit => self.zoom_to_fit(),
        }
    }

    /// Request deletion of the selection and everything nested in it:
    /// edges first (selected ones and those touching a removed node), then
    /// nodes, members before their groups. This is the same set
    /// [`Clipboard::copy`] captures.
    pub fn delete_selection(&mut self) {
        let mut nodes = self.graph.containment_closure(&self.selection.node_ids());
        nodes.reverse();
        let mut edges = self.selection.edge_ids();
        for id in &nodes {
            edges.extend(self.graph.edges_touching(*id));
        }
        edges.sort();
        edges.dedup();
        if nodes.is_empty() && edges.is_empty() {
            return;
        }
        for id in edges {
            self.outbox.send(Command::EdgeDelete { id });
        }
        for id in nodes {
            self.outbox.send(Command::NodeDelete { id });
        }
        self.selection.clear();
        self.emit_selection();
    }

    /// Returns whether anything was copied.
    fn copy_selection(&mut self) -> bool {
        if self.selection.node_ids().is_empty() {
            return false;
        }
        match self.clipboard.copy(&self.graph, &self.selection) {
            Ok(count) => count > 0,
            Err(err) => {
                self.diagnostic(format!("copy failed: {err}"));
                false
            }
        }
    }

    fn paste(&mut self) {
        match self.clipboard.paste(self.config.paste_offset) {
            Ok(pasted) => {
                self.selection.clear();
                self.emit_selection();
                self.pending_nodes.extend(pasted.nodes);
                self.pending_edges.extend(pasted.edges);
                for command in pasted.commands {
                    self.outbox.send(command);
                }
            }
            Err(EditorError::EmptyClipboard) => log::debug!("paste: clipboard is empty"),
            Err(err) => self.diagnostic(format!("paste failed: {err}")),
        }
    }

    /// Wrap the selected top-level world nodes in a new group.
    fn group_selection(&mut self) {
        let selected = self.selection.node_ids();
        let members: Vec<NodeId> = selected
            .iter()
            .copied()
            .filter(|id| self.graph.node(*id).is_some_and(|n| !n.is_pinned()))
            .filter(|id| {
                !selected
                    .iter()
                    .any(|other| other != id && self.graph.is_ancestor_of(*other, *id))
            })
            .collect();
        let Some(bounds) = members
            .iter()
            .filter_map(|id| self.graph.node(*id))
            .map(|n| n.world_rect(&self.viewport))
            .reduce(|a, b| a.union(&b))
        else {
            return;
        };

        let parents: HashSet<Option<NodeId>> = members.iter().map(|id| self.graph.parent(*id)).collect();
        let parent = if parents.len() == 1 {
            parents.into_iter().next().flatten()
        } else {
            None
        };
        let group = Node::new(
            NodeId::with_prefix("group"),
            NodeKind::Group,
            bounds.inflate(GROUP_PADDING, GROUP_PADDING),
        );
        log::debug!("group: {} around {} nodes", group.id, members.len());

        self.selection.clear();
        self.emit_selection();
        self.pending_nodes.insert(group.id);
        self.outbox.send(Command::NodeCreate {
            node: group,
            parent,
            members,
        });
    }

    /// Delete the selected groups, keeping their members.
    fn ungroup_selection(&mut self) {
        let groups: Vec<NodeId> = self
            .selection
            .node_ids()
            .into_iter()
            .filter(|id| self.graph.node(*id).is_some_and(|n| n.is_group()))
            .collect();
        if groups.is_empty() {
            return;
        }
        let released: Vec<NodeId> = groups
            .iter()
            .flat_map(|g| self.graph.children(*g))
            .filter(|c| !groups.contains(c))
            .collect();
        let mut edges: Vec<EdgeId> = groups.iter().flat_map(|g| self.graph.edges_touching(*g)).collect();
        edges.sort();
        edges.dedup();

        for id in edges {
            self.outbox.send(Command::EdgeDelete { id });
        }
        for id in groups {
            self.outbox.send(Command::NodeDelete { id });
        }
        self.selection.replace(released, []);
        self.emit_selection();
    }

    /// Pin selected world nodes to the screen, or unpin pinned ones.
    /// Geometry is converted through the viewport so nothing jumps.
    fn toggle_pin_selection(&mut self) {
        for id in self.selection.node_ids() {
            let Some(node) = self.graph.node(id) else { continue };
            if node.is_group() {
                continue;
            }
            let pinning = !node.is_pinned();
            if pinning && let Err(err) = self.graph.set_parent(id, None) {
                log::warn!("pin: {id} keeps its group, {err}");
            }
            if let Some(node) = self.graph.node_mut(id) {
                node.toggle_pinned(&self.viewport);
            }
            if !pinning {
                drag::recompute_membership(&mut self.graph, &self.viewport, &[id]);
            }
            self.batch.mark_moved(id);
            self.outbox.send(Command::NodeUpdate { id });
        }
        self.batch.request_full();
    }
}
