//! Viewer options with TOML support.
//!
//! Every section uses `#[serde(default)]`, so a file overriding only
//! `[framing]` leaves the rest at their defaults.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ViewerConfig {
    pub camera: CameraConfig,
    pub framing: FramingConfig,
    pub placement: PlacementConfig,
    pub fixtures: FixtureConfig,
    pub accepted_types: AcceptedTypes,
}

impl ViewerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fovy = self.camera.fovy;
        if !(fovy > 0.0 && fovy < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fovy must be in (0, 180) degrees, got {fovy}"
            )));
        }
        let aspect = self.camera.aspect;
        if !(aspect > 0.0 && aspect.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "camera.aspect must be positive, got {aspect}"
            )));
        }
        if !(self.camera.znear > 0.0 && self.camera.zfar > self.camera.znear && self.camera.zfar.is_finite()) {
            return Err(ConfigError::Invalid(
                "camera planes need 0 < znear < zfar".to_string(),
            ));
        }
        if !(self.framing.margin > 0.0 && self.framing.margin.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "framing.margin must be positive, got {}",
                self.framing.margin
            )));
        }
        if !(self.framing.min_distance > 0.0 && self.framing.min_distance.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "framing.min_distance must be positive, got {}",
                self.framing.min_distance
            )));
        }
        if self.framing.direction.iter().all(|c| *c == 0.0) {
            return Err(ConfigError::Invalid(
                "framing.direction must not be the zero vector".to_string(),
            ));
        }
        if let Some(size) = self.placement.normalize_size {
            if !(size > 0.0 && size.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "placement.normalize_size must be positive, got {size}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
    pub aspect: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fovy: 75.0,
            znear: 0.1,
            zfar: 1000.0,
            aspect: 16.0 / 9.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FramingConfig {
    /// Multiplier on the fitting distance; 1.0 touches the frustum.
    pub margin: f32,
    /// Distance used when the content has no extent.
    pub min_distance: f32,
    /// Viewing direction from the target towards the camera; normalized on use.
    pub direction: [f32; 3],
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            margin: 1.5,
            min_distance: 5.0,
            direction: [0.0, 0.5, 1.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PlacementConfig {
    /// Scale the asset so its largest dimension equals this size.
    pub normalize_size: Option<f32>,
    /// Move the asset's center onto the origin.
    pub center: bool,
    /// Rest the asset's lowest point on the ground plane (y = 0).
    pub ground: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FixtureConfig {
    pub grid_size: f32,
    pub grid_divisions: u32,
    /// Zero disables the ground plane.
    pub ground_size: f32,
    pub axes_length: f32,
    pub show_axes: bool,
    pub lights: Vec<LightConfig>,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            grid_size: 20.0,
            grid_divisions: 20,
            ground_size: 100.0,
            axes_length: 5.0,
            show_axes: false,
            lights: vec![
                LightConfig {
                    position: [5.0, 10.0, 7.5],
                    color: [1.0, 1.0, 1.0],
                    intensity: 1.0,
                },
                LightConfig {
                    position: [-5.0, 5.0, -5.0],
                    color: [1.0, 1.0, 1.0],
                    intensity: 0.4,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
}

/// File extensions (without dot, lower case) and media types the loader
/// accepts before handing a file to the parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AcceptedTypes {
    pub extensions: Vec<String>,
    pub media_types: Vec<String>,
}

impl AcceptedTypes {
    /// A file passes when its extension (if any) and its declared media type
    /// (if any) are both accepted. Files without either are left to the
    /// parser.
    pub fn accepts(&self, name: &str, media_type: Option<&str>) -> bool {
        let extension_ok = match extension_of(name) {
            Some(ext) => self.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)),
            None => true,
        };
        let media_type_ok = match media_type.filter(|m| !m.is_empty()) {
            Some(media) => self.media_types.iter().any(|m| m.eq_ignore_ascii_case(media)),
            None => true,
        };
        extension_ok && media_type_ok
    }
}

impl Default for AcceptedTypes {
    fn default() -> Self {
        Self {
            extensions: ["glb", "gltf", "obj"].map(String::from).to_vec(),
            media_types: [
                "model/gltf-binary",
                "model/gltf+json",
                "model/obj",
                "text/plain",
                "application/octet-stream",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// Lower-case extension of a file name, without the dot.
pub fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
