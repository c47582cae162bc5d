//! Mesh and material data, CPU side and GPU side.
//!
//! Parsers produce [`Primitive`]s and [`MaterialDesc`]s, plain data that the
//! bounding volume calculator can read without a GPU. When a device is
//! available they are uploaded into [`Mesh`] and [`Material`], which own the
//! actual `wgpu` buffers and textures and release them through [`Dispose`].

use anyhow::bail;
use wgpu::util::DeviceExt;

use crate::data_structures::texture::Texture;

/// A GPU resource owned by a scene node that must be released explicitly
/// before the node is dropped.
pub trait Dispose {
    fn label(&self) -> &str;

    /// Releases the underlying GPU memory. Calling it twice is an error.
    fn dispose(&mut self) -> anyhow::Result<()>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Topology {
    #[default]
    TriangleList,
    /// Used by the grid and axes fixtures.
    LineList,
}

/// Geometry of one draw call in node-local space.
#[derive(Clone, Debug, Default)]
pub struct Primitive {
    pub topology: Topology,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    /// Empty for non-indexed geometry.
    pub indices: Vec<u32>,
    /// Index into the owning node's material list.
    pub material: Option<usize>,
}

impl Primitive {
    pub fn from_positions(positions: Vec<[f32; 3]>) -> Self {
        Self {
            positions,
            ..Default::default()
        }
    }

    pub fn vertices(&self) -> Vec<ModelVertex> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, &position)| ModelVertex {
                position,
                tex_coords: self.tex_coords.get(i).copied().unwrap_or_default(),
                normal: self.normals.get(i).copied().unwrap_or_default(),
            })
            .collect()
    }

    /// Indices to draw with; non-indexed geometry gets a sequential list.
    pub fn draw_indices(&self) -> Vec<u32> {
        if self.indices.is_empty() {
            (0..self.positions.len() as u32).collect()
        } else {
            self.indices.clone()
        }
    }
}

/// Material description as it comes out of the parser.
#[derive(Clone, Debug)]
pub struct MaterialDesc {
    pub name: String,
    pub base_color: [f32; 4],
    pub base_color_texture: Option<image::RgbaImage>,
}

impl MaterialDesc {
    pub fn untextured(name: &str, base_color: [f32; 4]) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            base_color_texture: None,
        }
    }
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self::untextured("default", [0.8, 0.8, 0.8, 1.0])
    }
}

pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: usize,
    disposed: bool,
}

impl Mesh {
    pub fn new(device: &wgpu::Device, name: &str, primitive: &Primitive) -> Self {
        let vertices = primitive.vertices();
        let indices = primitive.draw_indices();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: indices.len() as u32,
            material: primitive.material.unwrap_or(0),
            disposed: false,
        }
    }
}

impl Dispose for Mesh {
    fn label(&self) -> &str {
        &self.name
    }

    fn dispose(&mut self) -> anyhow::Result<()> {
        if self.disposed {
            bail!("mesh {} was already disposed", self.name);
        }
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        self.disposed = true;
        Ok(())
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub has_texture: u32,
    _padding: [u32; 3],
}

pub struct Material {
    pub name: String,
    pub uniform: MaterialUniform,
    pub uniform_buffer: wgpu::Buffer,
    pub diffuse_texture: Option<Texture>,
    disposed: bool,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        desc: &MaterialDesc,
    ) -> anyhow::Result<Self> {
        let diffuse_texture = desc
            .base_color_texture
            .as_ref()
            .map(|rgba| Texture::from_rgba(device, queue, rgba, &desc.name))
            .transpose()?;
        let uniform = MaterialUniform {
            base_color: desc.base_color,
            has_texture: diffuse_texture.is_some() as u32,
            _padding: [0; 3],
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Material Buffer", desc.name)),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Ok(Self {
            name: desc.name.clone(),
            uniform,
            uniform_buffer,
            diffuse_texture,
            disposed: false,
        })
    }
}

impl Dispose for Material {
    fn label(&self) -> &str {
        &self.name
    }

    fn dispose(&mut self) -> anyhow::Result<()> {
        if self.disposed {
            bail!("material {} was already disposed", self.name);
        }
        self.uniform_buffer.destroy();
        if let Some(texture) = &self.diffuse_texture {
            texture.destroy();
        }
        self.disposed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_indexed_primitive_draws_sequentially() {
        let primitive = Primitive::from_positions(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert_eq!(primitive.draw_indices(), vec![0, 1, 2]);
    }

    #[test]
    fn missing_attributes_default_to_zero() {
        let mut primitive = Primitive::from_positions(vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        primitive.normals = vec![[0.0, 1.0, 0.0]];
        let vertices = primitive.vertices();
        assert_eq!(vertices[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[1].normal, [0.0; 3]);
        assert_eq!(vertices[1].tex_coords, [0.0; 2]);
    }
}
