use flow_viewer::{
    config::FixtureConfig,
    data_structures::{
        scene::Scene,
        scene_graph::{ContainerNode, MeshNode, SceneNode},
    },
    replace::replace,
};

use crate::common::test_utils::{Counter, TrackedResource, box_asset, box_primitive};

mod common;

fn fixture_scene() -> Scene {
    Scene::with_fixtures(&FixtureConfig {
        show_axes: true,
        ..Default::default()
    })
}

#[test]
fn persistent_members_survive_every_replacement() {
    let mut scene = fixture_scene();
    let persistent = scene.persistent_ids();
    assert!(!persistent.is_empty());

    let disposals = Counter::default();
    for name in ["a", "b", "c"] {
        replace(&mut scene, Some(box_asset(name, [0.0; 3], [1.0; 3], &disposals)));
        assert_eq!(scene.persistent_ids(), persistent);
        assert_eq!(scene.asset_roots().count(), 1);
        assert_eq!(scene.asset().map(|a| a.name().to_string()), Some(name.to_string()));
        assert_eq!(scene.len(), persistent.len() + 1);
    }
}

/// Loading B after A leaves only B, and every resource of A is released.
#[test]
fn scenario_second_asset_replaces_first() {
    let mut scene = fixture_scene();
    let a_disposals = Counter::default();
    let b_disposals = Counter::default();

    replace(&mut scene, Some(box_asset("a", [0.0; 3], [1.0; 3], &a_disposals)));
    let report = replace(&mut scene, Some(box_asset("b", [0.0; 3], [2.0; 3], &b_disposals)));

    assert_eq!(report.removed, 1);
    assert_eq!(report.disposed, 2);
    assert!(report.warnings.is_empty());
    assert_eq!(a_disposals.get(), 2);
    assert_eq!(b_disposals.get(), 0);
    assert!(scene.members().iter().all(|m| m.name() != "a"));
    assert_eq!(scene.asset().map(|a| a.name().to_string()), Some("b".to_string()));
    // asset comes last
    assert_eq!(scene.members().last().map(|m| m.name().to_string()), Some("b".to_string()));
}

#[test]
fn nested_resources_are_disposed_one_by_one() {
    let disposals = Counter::default();
    let mut leaf = MeshNode::new("leaf", vec![box_primitive([0.0; 3], [1.0; 3])], vec![]);
    leaf.attach_resources(
        vec![
            TrackedResource::boxed("leaf-0", &disposals),
            TrackedResource::boxed("leaf-1", &disposals),
        ],
        vec![TrackedResource::boxed("leaf-material", &disposals)],
    );
    let mut middle = ContainerNode::new("middle");
    middle.add_child(Box::new(leaf));
    let mut root = MeshNode::new("root", vec![], vec![]);
    root.attach_resources(vec![], vec![TrackedResource::boxed("root-material", &disposals)]);
    root.add_child(Box::new(middle));

    let mut scene = Scene::new();
    scene.add(Box::new(root));
    let report = replace(&mut scene, None);

    assert_eq!(report.disposed, 4);
    assert_eq!(disposals.get(), 4);
    assert!(scene.is_empty());
}

#[test]
fn disposal_failure_is_reported_and_member_still_removed() {
    let disposals = Counter::default();
    let mut broken = MeshNode::new("broken", vec![box_primitive([0.0; 3], [1.0; 3])], vec![]);
    let broken_id = broken.id();
    broken.attach_resources(
        vec![TrackedResource::failing("lost-buffer", &disposals)],
        vec![TrackedResource::boxed("material", &disposals)],
    );

    let mut scene = fixture_scene();
    let persistent = scene.persistent_ids();
    scene.add(Box::new(broken));

    let report = replace(&mut scene, None);

    assert_eq!(report.removed, 1);
    assert_eq!(report.disposed, 1);
    assert_eq!(disposals.get(), 2);
    assert_eq!(report.warnings.len(), 1);
    let warning = &report.warnings[0];
    assert_eq!(warning.node, broken_id);
    assert_eq!(warning.name, "lost-buffer");
    assert!(warning.reason.contains("device lost"));
    assert!(scene.find(broken_id).is_none());
    assert_eq!(scene.persistent_ids(), persistent);
}

#[test]
fn replacing_with_nothing_on_a_fixture_scene_changes_nothing() {
    let mut scene = fixture_scene();
    let before = scene.persistent_ids();
    let report = replace(&mut scene, None);
    assert_eq!(report.removed, 0);
    assert_eq!(scene.persistent_ids(), before);
}
