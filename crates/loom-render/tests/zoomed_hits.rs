//! Hit testing through a panned and zoomed viewport.

use loom_core::id::{EdgeId, NodeId};
use loom_core::model::{Edge, GraphState, Handle, Node, NodeKind};
use loom_core::snap::ResizeDirs;
use loom_core::space::*;
use loom_core::viewport::Viewport;
use loom_render::hit::{self, NodeZone};
use loom_render::{GeometryRenderer, RenderQuery};
use pretty_assertions::assert_eq;

/// Scale 2, shifted right by 100 px: world (0, 0) sits at screen (100, 0).
fn zoomed() -> Viewport {
    let mut vp = Viewport::default();
    vp.set_scale(2.0);
    vp.pan(ScreenVector::new(100.0, 0.0));
    vp
}

fn scene() -> GraphState {
    let mut g = GraphState::new();
    g.add_node(Node::new(NodeId::intern("zh_a"), NodeKind::Plain, world_rect(0.0, 0.0, 100.0, 50.0)), None)
        .unwrap();
    g.add_node(Node::new(NodeId::intern("zh_b"), NodeKind::Plain, world_rect(300.0, 0.0, 100.0, 50.0)), None)
        .unwrap();
    g
}

#[test]
fn zones_are_measured_in_screen_pixels() {
    let g = scene();
    let vp = zoomed();
    let a = NodeId::intern("zh_a");

    // A spans screen (100, 0) to (300, 100).
    assert_eq!(
        hit::hit_zone(&g, &vp, ScreenPoint::new(295.0, 50.0), 10.0, 6.0),
        Some((a, NodeZone::Handle(Handle::Right)))
    );
    assert_eq!(
        hit::hit_zone(&g, &vp, ScreenPoint::new(150.0, 3.0), 10.0, 6.0),
        Some((
            a,
            NodeZone::Resize(ResizeDirs {
                north: true,
                ..ResizeDirs::default()
            })
        ))
    );
    assert_eq!(
        hit::hit_zone(&g, &vp, ScreenPoint::new(160.0, 50.0), 10.0, 6.0),
        Some((a, NodeZone::Body))
    );
    assert_eq!(hit::hit_zone(&g, &vp, ScreenPoint::new(50.0, 50.0), 10.0, 6.0), None);
}

#[test]
fn pinned_overlay_wins_over_world_nodes() {
    let mut g = scene();
    let overlay = NodeId::intern("zh_overlay");
    g.add_node(Node::pinned(overlay, NodeKind::Plain, screen_rect(120.0, 20.0, 60.0, 60.0)), None)
        .unwrap();
    let vp = zoomed();

    assert_eq!(
        hit::hit_zone(&g, &vp, ScreenPoint::new(150.0, 50.0), 10.0, 6.0).map(|(id, _)| id),
        Some(overlay)
    );
    let under = vp.screen_to_world(ScreenPoint::new(150.0, 50.0));
    assert_eq!(
        hit::hit_test_excluding(&g, &vp, under, overlay),
        Some(NodeId::intern("zh_a"))
    );
}

#[test]
fn edge_queries_work_in_world_units() {
    let mut g = scene();
    let vp = zoomed();
    let r = GeometryRenderer {
        padding: 0.0,
        spline_padding: 0.0,
    };
    let id = EdgeId::intern("zh_ab");
    let mut e = Edge::new(id, NodeId::intern("zh_a"), Handle::Right, NodeId::intern("zh_b"), Handle::Left).unwrap();
    let (s, t) = r.resolve_endpoints(&g, &vp, &e).unwrap();
    e.start = Some(s);
    e.end = Some(t);
    g.add_edge(e).unwrap();

    // Straight line at y = 25 from x = 100 to x = 300.
    assert_eq!(hit::hit_edge(&g, &vp, &r, WorldPoint::new(200.0, 28.0), 4.0), Some(id));
    assert_eq!(hit::hit_edge(&g, &vp, &r, WorldPoint::new(200.0, 40.0), 4.0), None);

    let crossings = hit::edges_crossing_line(&g, &vp, &r, WorldPoint::new(200.0, -50.0), WorldPoint::new(200.0, 100.0));
    assert_eq!(crossings.len(), 1);
    assert_eq!(crossings[0].0, id);
    assert!((crossings[0].1 - WorldPoint::new(200.0, 25.0)).length() < 0.5);

    let band = world_rect(150.0, 0.0, 20.0, 50.0);
    assert_eq!(hit::edges_in_rect(&g, &vp, &r, &band), vec![id]);
    assert_eq!(hit::nodes_in_rect(&g, &vp, &band), Vec::<NodeId>::new());
}
