//! Camera framing and asset placement.
//!
//! The camera is placed on a fixed viewing direction from the volume's
//! center, at a distance proportional to the volume's diagonal:
//!
//! ```text
//! distance = diagonal / (2 * tan(fovy / 2)) * margin
//! ```
//!
//! The camera backs off further when the bounding sphere would not fit the
//! narrower of the vertical and horizontal half angles. Empty or degenerate
//! volumes fall back to `min_distance`, so a framed pose is always finite
//! and never sits on its own target.

use cgmath::{InnerSpace, Point3, Vector3};
use log::{debug, warn};

use crate::{
    config::{FramingConfig, PlacementConfig},
    context::ViewerContext,
    data_structures::{bounds::BoundingVolume, scene_graph::SceneNode},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Framer {
    pub margin: f32,
    pub min_distance: f32,
    /// Unit vector from the target towards the camera.
    direction: Vector3<f32>,
}

impl Framer {
    pub fn new(config: &FramingConfig) -> Self {
        let direction = Vector3::from(config.direction);
        let direction = if direction.magnitude2() > 0.0 && direction.magnitude2().is_finite() {
            direction.normalize()
        } else {
            Vector3::new(0.0, 0.5, 1.0).normalize()
        };
        Self {
            margin: config.margin,
            min_distance: config.min_distance,
            direction,
        }
    }

    pub fn direction(&self) -> Vector3<f32> {
        self.direction
    }

    /// Distance at which the volume fits the view.
    ///
    /// The diagonal formula is the base. Wide or narrow frusta additionally
    /// need the bounding sphere to fit the smaller of the two half angles.
    pub fn fitting_distance(&self, volume: &BoundingVolume, fovy_degrees: f32, aspect: f32) -> f32 {
        let half_fovy = fovy_degrees.to_radians() / 2.0;
        let distance = volume.diagonal / (2.0 * half_fovy.tan()) * self.margin;
        let half_fovx = (aspect * half_fovy.tan()).atan();
        let sphere = (volume.diagonal / 2.0) / half_fovy.min(half_fovx).sin();
        let distance = distance.max(sphere);
        if volume.diagonal > 0.0 && volume.diagonal.is_finite() && distance.is_finite() && distance > 0.0 {
            distance
        } else {
            self.min_distance
        }
    }

    pub fn pose(&self, volume: &BoundingVolume, fovy_degrees: f32, aspect: f32) -> CameraPose {
        let distance = self.fitting_distance(volume, fovy_degrees, aspect);
        let center = volume.center;
        let target = if center.x.is_finite() && center.y.is_finite() && center.z.is_finite() {
            center
        } else {
            warn!("Volume center {center:?} is not finite, framing the origin");
            Point3::new(0.0, 0.0, 0.0)
        };
        CameraPose {
            position: target + self.direction * distance,
            target,
            distance,
        }
    }

    /// Near and far planes that keep the volume's bounding sphere between
    /// them when viewed from `distance`.
    pub fn clip_planes(&self, volume: &BoundingVolume, distance: f32) -> (f32, f32) {
        let radius = if volume.diagonal.is_finite() { volume.diagonal / 2.0 } else { 0.0 };
        let floor = distance * 1e-3;
        let znear = (distance - radius).max(floor) * 0.9;
        let zfar = (distance + radius) * 1.1;
        (znear, zfar.max(znear * 2.0))
    }

    /// Points the camera at `volume`, widens the clip planes as needed and
    /// hands the new pivot to the orbit controller.
    pub fn frame(&self, ctx: &mut ViewerContext, volume: &BoundingVolume) -> CameraPose {
        let pose = self.pose(volume, ctx.projection.fovy.0, ctx.projection.aspect);
        let (znear, zfar) = self.clip_planes(volume, pose.distance);

        ctx.camera.position = pose.position;
        ctx.camera.target = pose.target;
        // Never narrower than configured, the fixtures extend past the asset.
        ctx.projection.znear = znear.min(ctx.config.camera.znear);
        ctx.projection.zfar = zfar.max(ctx.config.camera.zfar);

        ctx.controller.set_target(pose.target);
        ctx.controller.update(&mut ctx.camera);
        ctx.update_camera_uniform();

        debug!(
            "Framed volume (diagonal {:.3}) from distance {:.3}, planes {:.3}..{:.3}",
            volume.diagonal, pose.distance, ctx.projection.znear, ctx.projection.zfar
        );
        pose
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new(&FramingConfig::default())
    }
}

/// Scales, recenters and grounds an asset root as configured.
///
/// Operates on the root's local transform only, so the asset's own hierarchy
/// is left untouched.
pub fn place_asset(asset: &mut dyn SceneNode, config: &PlacementConfig) {
    let volume = BoundingVolume::of(asset);
    if volume.is_empty() {
        return;
    }

    if let Some(target_size) = config.normalize_size {
        let largest = volume.size.x.max(volume.size.y).max(volume.size.z);
        let factor = target_size / largest;
        if largest > 0.0 && factor.is_finite() && factor > 0.0 {
            let scaled = asset.get_local_transform().scaled_by(factor);
            asset.set_local_transform(scaled);
        }
    }

    let volume = BoundingVolume::of(asset);
    let mut offset = Vector3::new(0.0, 0.0, 0.0);
    if config.center {
        offset -= volume.center - Point3::new(0.0, 0.0, 0.0);
    }
    if config.ground {
        offset.y = -volume.min.y;
    }
    if offset != Vector3::new(0.0, 0.0, 0.0) {
        let moved = asset.get_local_transform().translated_by(offset);
        asset.set_local_transform(moved);
    }
}
