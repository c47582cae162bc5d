use log::info;

use crate::{
    camera::{Camera, CameraUniform, OrbitControls, OrbitController, Projection},
    config::ViewerConfig,
    data_structures::{bounds::AssetInfo, scene::Scene},
};

/// Everything the load pipeline mutates, passed explicitly to it.
///
/// The external render loop reads `scene` and `camera_uniform` every frame;
/// the orbit input handler drives `controller`.
pub struct ViewerContext {
    pub scene: Scene,
    pub camera: Camera,
    pub projection: Projection,
    pub controller: Box<dyn OrbitController>,
    pub camera_uniform: CameraUniform,
    pub config: ViewerConfig,
}

impl ViewerContext {
    /// Scene with fixtures, default camera and [`OrbitControls`].
    pub fn new(config: ViewerConfig) -> Self {
        Self::with_controller(config, Box::new(OrbitControls::new()))
    }

    pub fn with_controller(config: ViewerConfig, mut controller: Box<dyn OrbitController>) -> Self {
        let scene = Scene::with_fixtures(&config.fixtures);
        let mut camera = Camera::default();
        let projection = Projection::from_config(&config.camera);
        controller.set_target(camera.target);
        controller.update(&mut camera);

        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(&camera, &projection);
        info!("Viewer context ready with {} fixtures", scene.len());

        Self {
            scene,
            camera,
            projection,
            controller,
            camera_uniform,
            config,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
        self.update_camera_uniform();
    }

    /// Call after the camera or projection changed.
    pub fn update_camera_uniform(&mut self) {
        self.camera_uniform.update_view_proj(&self.camera, &self.projection);
    }

    /// Summary of the displayed asset, None while only fixtures are shown.
    pub fn asset_info(&self) -> Option<AssetInfo> {
        self.scene.asset().map(AssetInfo::of)
    }
}
