use cgmath::{Deg, InnerSpace, MetricSpace, Point3, Transform};
use flow_viewer::{
    context::ViewerContext,
    data_structures::bounds::BoundingVolume,
    framing::Framer,
    replace::{replace, reset},
};

use crate::common::test_utils::{Counter, box_asset, test_context};

mod common;

const EPSILON: f32 = 1e-3;

fn expected_distance(diagonal: f32, fovy_degrees: f32, margin: f32) -> f32 {
    diagonal / (2.0 * (fovy_degrees.to_radians() / 2.0).tan()) * margin
}

#[test]
fn distance_follows_diagonal_and_fov() {
    let framer = Framer::default();
    let asset = box_asset("cube", [-1.0; 3], [1.0; 3], &Counter::default());
    let volume = BoundingVolume::of(asset.as_ref());

    for fovy in [30.0, 45.0, 75.0, 90.0] {
        let pose = framer.pose(&volume, fovy, 16.0 / 9.0);
        let expected = expected_distance(2.0 * 3f32.sqrt(), fovy, 1.5);
        assert!((pose.distance - expected).abs() < EPSILON, "fov {fovy}");
        assert!((pose.position.distance(pose.target) - expected).abs() < EPSILON);
        assert_eq!(pose.target, Point3::new(0.0, 0.0, 0.0));
    }
}

#[test]
fn camera_looks_along_the_default_direction() {
    let framer = Framer::default();
    let asset = box_asset("cube", [-1.0; 3], [1.0; 3], &Counter::default());
    let pose = framer.pose(&BoundingVolume::of(asset.as_ref()), 75.0, 16.0 / 9.0);
    let offset = (pose.position - pose.target).normalize();
    let expected = cgmath::Vector3::new(0.0, 0.5, 1.0).normalize();
    assert!((offset - expected).magnitude() < EPSILON);
}

fn assert_corners_on_screen(ctx: &ViewerContext, volume: &BoundingVolume) {
    // corners may touch the frustum when the bounding sphere is tangent to it
    let tolerance = 1e-4;
    let view_proj = ctx.camera_uniform.view_proj();
    for corner in volume.aabb().corners() {
        let ndc = view_proj.transform_point(corner);
        assert!(
            ndc.x.abs() <= 1.0 + tolerance && ndc.y.abs() <= 1.0 + tolerance,
            "corner {corner:?} off screen: {ndc:?}"
        );
        assert!(ndc.z >= 0.0 && ndc.z <= 1.0, "corner {corner:?} clipped: {ndc:?}");
    }
}

#[test]
fn wide_fov_keeps_the_cube_on_screen() {
    let mut ctx = test_context();
    ctx.projection.fovy = Deg(120.0);
    let asset = box_asset("cube", [-1.0; 3], [1.0; 3], &Counter::default());
    let volume = BoundingVolume::of(asset.as_ref());

    let pose = Framer::new(&ctx.config.framing).frame(&mut ctx, &volume);

    assert!(pose.distance > volume.diagonal / 2.0);
    assert_corners_on_screen(&ctx, &volume);
}

#[test]
fn portrait_viewport_keeps_the_cube_on_screen() {
    let mut ctx = test_context();
    ctx.resize(500, 1000);
    let asset = box_asset("cube", [-1.0; 3], [1.0; 3], &Counter::default());
    let volume = BoundingVolume::of(asset.as_ref());

    Framer::new(&ctx.config.framing).frame(&mut ctx, &volume);

    assert_eq!(ctx.projection.aspect, 0.5);
    assert_corners_on_screen(&ctx, &volume);
}

/// A large asset far from the origin ends up centered and fully visible.
#[test]
fn scenario_offset_asset_is_framed_inside_the_frustum() {
    let mut ctx = test_context();
    let asset = box_asset("hall", [1000.0, 0.0, -20.0], [1100.0, 50.0, 20.0], &Counter::default());
    let volume = BoundingVolume::of(asset.as_ref());
    replace(&mut ctx.scene, Some(asset));

    let pose = Framer::new(&ctx.config.framing).frame(&mut ctx, &volume);

    assert_eq!(ctx.camera.target, volume.center);
    assert_eq!(ctx.controller.target(), volume.center);
    assert_eq!(ctx.camera.position, pose.position);

    assert_corners_on_screen(&ctx, &volume);
}

#[test]
fn tiny_asset_keeps_the_camera_off_its_target() {
    let mut ctx = test_context();
    let asset = box_asset("speck", [0.0; 3], [1e-4, 1e-4, 1e-4], &Counter::default());
    let volume = BoundingVolume::of(asset.as_ref());
    let pose = Framer::new(&ctx.config.framing).frame(&mut ctx, &volume);

    assert!(pose.distance > 0.0);
    assert!(ctx.projection.znear > 0.0 && ctx.projection.znear < pose.distance);
    assert!(ctx.projection.zfar > pose.distance);
}

#[test]
fn empty_volume_gives_finite_pose() {
    let mut ctx = test_context();
    let pose = Framer::new(&ctx.config.framing).frame(&mut ctx, &BoundingVolume::empty());

    assert_eq!(pose.distance, ctx.config.framing.min_distance);
    assert_eq!(pose.target, Point3::new(0.0, 0.0, 0.0));
    for c in [ctx.camera.position.x, ctx.camera.position.y, ctx.camera.position.z] {
        assert!(c.is_finite());
    }
    assert_ne!(ctx.camera.position, ctx.camera.target);
    let view_proj: [[f32; 4]; 4] = ctx.camera_uniform.view_proj().into();
    assert!(view_proj.iter().flatten().all(|v| v.is_finite()));
}

#[test]
fn reset_is_idempotent() {
    let mut ctx = test_context();
    let disposals = Counter::default();
    replace(&mut ctx.scene, Some(box_asset("duck", [-3.0; 3], [3.0; 3], &disposals)));

    let first = reset(&mut ctx);
    assert_eq!(first.removed, 1);
    assert_eq!(disposals.get(), 2);

    let ids: Vec<_> = ctx.scene.members().iter().map(|m| m.id()).collect();
    let camera = ctx.camera.clone();
    let projection = ctx.projection.clone();

    let second = reset(&mut ctx);
    assert_eq!(second.removed, 0);
    assert_eq!(second.disposed, 0);
    assert_eq!(disposals.get(), 2);
    let ids_after: Vec<_> = ctx.scene.members().iter().map(|m| m.id()).collect();
    assert_eq!(ids, ids_after);
    assert_eq!(ctx.camera, camera);
    assert_eq!(ctx.projection, projection);
    assert!(ctx.scene.asset().is_none());
}
