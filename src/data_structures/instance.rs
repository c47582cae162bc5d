//! Local transformation data for scene nodes.
//!
//! Every node in the scene graph carries one [`Instance`] describing how it is
//! placed relative to its parent. World placement is derived on demand by
//! composing the chain of parent transforms, it is never stored.

use cgmath::{One, Vector3};

/// Node-local transformation: position, rotation (as quaternion), and scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Translation * rotation * scale, the order glTF uses for TRS nodes.
    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Multiplies the scale by `factor` and scales the position along with it,
    /// so the node grows or shrinks around its parent's origin.
    pub fn scaled_by(&self, factor: f32) -> Self {
        Self {
            position: self.position * factor,
            rotation: self.rotation,
            scale: self.scale * factor,
        }
    }

    pub fn translated_by(&self, offset: Vector3<f32>) -> Self {
        Self {
            position: self.position + offset,
            ..self.clone()
        }
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl From<gltf::scene::Transform> for Instance {
    fn from(transform: gltf::scene::Transform) -> Self {
        let (position, rotation, scale) = transform.decomposed();
        Instance {
            position: position.into(),
            // glTF stores quaternions as [x, y, z, w]
            rotation: cgmath::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
            scale: scale.into(),
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}
