//! Integration tests: grouping, ungrouping and membership on drop.

use loom_core::error::GraphError;
use loom_core::id::{EdgeId, NodeId};
use loom_core::model::{Edge, Handle, Node, NodeKind};
use loom_core::space::*;
use loom_editor::{Command, Editor, InputEvent, Modifiers};
use pretty_assertions::assert_eq;

fn add(editor: &mut Editor, name: &str, kind: NodeKind, rect: WorldRect, parent: Option<NodeId>) -> NodeId {
    let id = NodeId::intern(name);
    editor.register_node(Node::new(id, kind, rect), parent).unwrap();
    id
}

fn world(editor: &Editor, id: NodeId) -> WorldRect {
    editor.graph.node(id).unwrap().world_rect(&editor.viewport)
}

fn key(editor: &mut Editor, key: &str, modifiers: Modifiers) {
    editor.handle(&InputEvent::key_down(key, modifiers, 0));
    editor.handle(&InputEvent::key_up(key, 0));
}

fn drag(editor: &mut Editor, from: (f32, f32), to: (f32, f32)) {
    editor.handle(&InputEvent::pointer_down(from.0, from.1, 0));
    editor.handle(&InputEvent::pointer_move(to.0, to.1, 10));
    editor.handle(&InputEvent::pointer_up(to.0, to.1, 20));
}

fn ctrl() -> Modifiers {
    Modifiers {
        ctrl: true,
        ..Modifiers::default()
    }
}

#[test]
fn group_wraps_selection_then_ungroup_releases_it() {
    let mut editor = Editor::default();
    let a = add(&mut editor, "ct_a", NodeKind::Plain, world_rect(0.0, 0.0, 100.0, 50.0), None);
    let b = add(&mut editor, "ct_b", NodeKind::Plain, world_rect(200.0, 100.0, 100.0, 50.0), None);
    editor.selection.replace([a, b], []);

    key(&mut editor, "g", ctrl());
    let commands = editor.apply_pending();
    let group = commands
        .iter()
        .find_map(|c| match c {
            Command::NodeCreate { node, members, .. } => {
                let mut members = members.clone();
                members.sort();
                let mut expected = vec![a, b];
                expected.sort();
                assert_eq!(members, expected);
                Some(node.id)
            }
            _ => None,
        })
        .unwrap();

    assert_eq!(world(&editor, group), world_rect(-20.0, -20.0, 340.0, 190.0));
    assert_eq!(editor.graph.parent(a), Some(group));
    assert_eq!(editor.graph.parent(b), Some(group));
    assert_eq!(editor.selection.node_ids(), vec![group]);
    assert!(editor.graph.node(group).unwrap().layer < editor.graph.node(a).unwrap().layer);

    key(
        &mut editor,
        "G",
        Modifiers {
            shift: true,
            ..ctrl()
        },
    );
    editor.apply_pending();
    assert!(!editor.graph.contains_node(group));
    assert_eq!(editor.graph.parent(a), None);
    assert_eq!(editor.graph.parent(b), None);
    assert!(editor.selection.contains_node(a) && editor.selection.contains_node(b));
}

#[test]
fn group_keeps_a_shared_parent() {
    let mut editor = Editor::default();
    let outer = add(&mut editor, "ctp_o", NodeKind::Group, world_rect(0.0, 0.0, 800.0, 600.0), None);
    let a = add(&mut editor, "ctp_a", NodeKind::Plain, world_rect(100.0, 100.0, 100.0, 50.0), Some(outer));
    let b = add(&mut editor, "ctp_b", NodeKind::Plain, world_rect(300.0, 100.0, 100.0, 50.0), Some(outer));
    editor.selection.replace([a, b], []);

    key(&mut editor, "g", ctrl());
    editor.apply_pending();
    let group = editor.graph.parent(a).unwrap();
    assert_ne!(group, outer);
    assert_eq!(editor.graph.parent(group), Some(outer));
}

#[test]
fn ungroup_drops_edges_attached_to_the_group() {
    let mut editor = Editor::default();
    let g = add(&mut editor, "cte_g", NodeKind::Group, world_rect(0.0, 0.0, 300.0, 300.0), None);
    let a = add(&mut editor, "cte_a", NodeKind::Plain, world_rect(20.0, 20.0, 100.0, 50.0), Some(g));
    let n = add(&mut editor, "cte_n", NodeKind::Plain, world_rect(500.0, 0.0, 100.0, 50.0), None);
    editor
        .register_edge(Edge::new(EdgeId::intern("cte_gn"), g, Handle::Right, n, Handle::Left).unwrap())
        .unwrap();
    editor
        .register_edge(Edge::new(EdgeId::intern("cte_an"), a, Handle::Right, n, Handle::Left).unwrap())
        .unwrap();
    editor.selection.replace([g], []);

    key(
        &mut editor,
        "g",
        Modifiers {
            shift: true,
            ..ctrl()
        },
    );
    editor.apply_pending();
    assert_eq!(editor.graph.edges.len(), 1);
    assert_eq!(editor.graph.edges[0].id, EdgeId::intern("cte_an"));
}

#[test]
fn containment_cycles_are_rejected() {
    let mut editor = Editor::default();
    let outer = add(&mut editor, "cc_o", NodeKind::Group, world_rect(0.0, 0.0, 800.0, 600.0), None);
    let inner = add(&mut editor, "cc_i", NodeKind::Group, world_rect(50.0, 50.0, 300.0, 300.0), Some(outer));

    assert!(matches!(
        editor.graph.set_parent(outer, Some(inner)),
        Err(GraphError::ContainmentCycle { .. })
    ));
    assert!(matches!(
        editor.graph.set_parent(outer, Some(outer)),
        Err(GraphError::ContainmentCycle { .. })
    ));
    assert_eq!(editor.graph.parent(inner), Some(outer));
    assert_eq!(editor.graph.parent(outer), None);
}

#[test]
fn dropping_a_node_into_a_group_adopts_it() {
    let mut editor = Editor::default();
    let g = add(&mut editor, "cd_g", NodeKind::Group, world_rect(0.0, 0.0, 400.0, 300.0), None);
    let n = add(&mut editor, "cd_n", NodeKind::Plain, world_rect(600.0, 0.0, 100.0, 50.0), None);

    drag(&mut editor, (650.0, 25.0), (250.0, 175.0));
    assert_eq!(world(&editor, n).origin, WorldPoint::new(200.0, 150.0));
    assert_eq!(editor.graph.parent(n), Some(g));

    drag(&mut editor, (250.0, 175.0), (650.0, 25.0));
    assert_eq!(editor.graph.parent(n), None);
}

#[test]
fn dragging_a_group_never_nests_it_in_itself() {
    let mut editor = Editor::default();
    let outer = add(&mut editor, "cn_o", NodeKind::Group, world_rect(0.0, 0.0, 400.0, 300.0), None);
    let inner = add(&mut editor, "cn_i", NodeKind::Group, world_rect(100.0, 100.0, 200.0, 150.0), Some(outer));

    // Its center ends up inside `inner`, which travels along.
    drag(&mut editor, (200.0, 15.0), (210.0, 25.0));
    assert_eq!(editor.graph.parent(outer), None);
    assert_eq!(editor.graph.parent(inner), Some(outer));
}

#[test]
fn deleting_a_group_removes_its_members() {
    let mut editor = Editor::default();
    let outer = add(&mut editor, "cr_o", NodeKind::Group, world_rect(0.0, 0.0, 800.0, 600.0), None);
    let g = add(&mut editor, "cr_g", NodeKind::Group, world_rect(50.0, 50.0, 400.0, 300.0), Some(outer));
    let a = add(&mut editor, "cr_a", NodeKind::Plain, world_rect(100.0, 100.0, 100.0, 50.0), Some(g));
    let n = add(&mut editor, "cr_n", NodeKind::Plain, world_rect(500.0, 100.0, 100.0, 50.0), Some(outer));
    editor
        .register_edge(Edge::new(EdgeId::intern("cr_an"), a, Handle::Right, n, Handle::Left).unwrap())
        .unwrap();
    editor.selection.replace([g], []);

    key(&mut editor, "Delete", Modifiers::default());
    let commands = editor.apply_pending();
    let deleted: Vec<NodeId> = commands
        .iter()
        .filter_map(|c| match c {
            Command::NodeDelete { id } => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(deleted, vec![a, g]);
    assert!(!editor.graph.contains_node(g));
    assert!(!editor.graph.contains_node(a));
    assert!(editor.graph.edges.is_empty());
    assert_eq!(editor.graph.parent(n), Some(outer));
}

#[test]
fn removing_a_lone_group_releases_members_to_its_parent() {
    let mut editor = Editor::default();
    let outer = add(&mut editor, "crl_o", NodeKind::Group, world_rect(0.0, 0.0, 800.0, 600.0), None);
    let g = add(&mut editor, "crl_g", NodeKind::Group, world_rect(50.0, 50.0, 400.0, 300.0), Some(outer));
    let a = add(&mut editor, "crl_a", NodeKind::Plain, world_rect(100.0, 100.0, 100.0, 50.0), Some(g));

    editor.apply_lifecycle(&Command::NodeDelete { id: g }).unwrap();
    assert!(!editor.graph.contains_node(g));
    assert!(editor.graph.contains_node(a));
    assert_eq!(editor.graph.parent(a), Some(outer));
}

#[test]
fn pinned_drag_still_regroups_world_companions() {
    let mut editor = Editor::default();
    let g = add(&mut editor, "cpd_g", NodeKind::Group, world_rect(0.0, 0.0, 400.0, 300.0), None);
    let n = add(&mut editor, "cpd_n", NodeKind::Plain, world_rect(600.0, 0.0, 100.0, 50.0), None);
    let p = NodeId::intern("cpd_p");
    editor
        .register_node(Node::pinned(p, NodeKind::Plain, screen_rect(600.0, 400.0, 50.0, 50.0)), None)
        .unwrap();
    editor.selection.replace([p, n], []);

    // Grabbing the pinned node carries `n` into the group.
    drag(&mut editor, (625.0, 425.0), (225.0, 575.0));
    assert_eq!(world(&editor, n).origin, WorldPoint::new(200.0, 150.0));
    assert_eq!(editor.graph.parent(n), Some(g));
    assert_eq!(editor.graph.parent(p), None);
}
