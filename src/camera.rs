//! Viewer camera, projection and orbit controls.

use cgmath::{Deg, InnerSpace, Matrix4, MetricSpace, Point3, Rad, SquareMatrix, Vector3};

use crate::config::CameraConfig;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new(position: Point3<f32>, target: Point3<f32>) -> Self {
        Self {
            position,
            target,
            up: Vector3::unit_y(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 2.5, 5.0), Point3::new(0.0, 0.0, 0.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, fovy: Deg<f32>, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy,
            znear,
            zfar,
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            aspect: config.aspect,
            fovy: Deg(config.fovy),
            znear: config.znear,
            zfar: config.zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.view_proj.into()
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// The orbit input collaborator. The viewer only sets its pivot and asks it
/// to resynchronise with the camera after framing; drag and zoom handling is
/// up to the implementation.
pub trait OrbitController {
    fn target(&self) -> Point3<f32>;

    fn set_target(&mut self, target: Point3<f32>);

    /// Applies the controller's pivot to the camera and re-derives any
    /// internal state from the camera's current placement.
    fn update(&mut self, camera: &mut Camera);
}

const MIN_ELEVATION: f32 = -std::f32::consts::FRAC_PI_2 + 0.01;
const MAX_ELEVATION: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Spherical orbit around a target point.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    target: Point3<f32>,
    /// Horizontal angle around Y, measured from +Z towards +X.
    azimuth: Rad<f32>,
    elevation: Rad<f32>,
    radius: f32,
    pub min_radius: f32,
    pub max_radius: f32,
}

impl OrbitControls {
    pub fn new() -> Self {
        Self {
            target: Point3::new(0.0, 0.0, 0.0),
            azimuth: Rad(0.0),
            elevation: Rad(0.0),
            radius: 5.0,
            min_radius: 0.01,
            max_radius: f32::MAX,
        }
    }

    pub fn azimuth(&self) -> Rad<f32> {
        self.azimuth
    }

    pub fn elevation(&self) -> Rad<f32> {
        self.elevation
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    fn sync_from_camera(&mut self, camera: &Camera) {
        let direction = camera.position - self.target;
        let horizontal = (direction.x * direction.x + direction.z * direction.z).sqrt();
        self.radius = direction.magnitude();
        self.azimuth = Rad(direction.x.atan2(direction.z));
        self.elevation = Rad(direction.y.atan2(horizontal));
    }

    fn place_camera(&self, camera: &mut Camera) {
        let (sin_az, cos_az) = self.azimuth.0.sin_cos();
        let (sin_el, cos_el) = self.elevation.0.sin_cos();
        camera.target = self.target;
        camera.position = self.target
            + Vector3::new(cos_el * sin_az, sin_el, cos_el * cos_az) * self.radius;
    }

    /// Orbits by the given angles, keeping the camera off the poles.
    pub fn rotate(&mut self, camera: &mut Camera, azimuth: Rad<f32>, elevation: Rad<f32>) {
        self.azimuth += azimuth;
        self.elevation = Rad((self.elevation.0 + elevation.0).clamp(MIN_ELEVATION, MAX_ELEVATION));
        self.place_camera(camera);
    }

    /// Multiplies the distance to the target by `factor`.
    pub fn zoom(&mut self, camera: &mut Camera, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.radius = (self.radius * factor).clamp(self.min_radius, self.max_radius);
            self.place_camera(camera);
        }
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new()
    }
}

impl OrbitController for OrbitControls {
    fn target(&self) -> Point3<f32> {
        self.target
    }

    fn set_target(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    fn update(&mut self, camera: &mut Camera) {
        camera.target = self.target;
        self.sync_from_camera(camera);
    }
}
