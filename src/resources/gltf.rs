//! glTF 2.0 (`.gltf` with embedded buffers and `.glb`) to scene nodes.

use std::collections::HashMap;

use anyhow::Context;
use log::{debug, warn};

use crate::data_structures::{
    instance::Instance,
    model::{MaterialDesc, Primitive, Topology},
    scene_graph::{ContainerNode, MeshNode, SceneNode},
};

/// Buffers and decoded materials shared by every node of one document.
struct Imported {
    buffers: Vec<::gltf::buffer::Data>,
    materials: Vec<MaterialDesc>,
}

/// Parses a self-contained glTF document into a tree rooted at a container
/// named after the file. External buffer or image URIs cannot be resolved
/// from a single selected file and fail the parse.
pub fn parse_gltf(bytes: &[u8], file_name: &str) -> anyhow::Result<Box<dyn SceneNode>> {
    let (document, buffers, images) =
        ::gltf::import_slice(bytes).with_context(|| format!("{file_name} is not valid glTF"))?;

    let materials = document
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            let base_color_texture = pbr.base_color_texture().and_then(|info| {
                let index = info.texture().source().index();
                images.get(index).and_then(to_rgba)
            });
            MaterialDesc {
                name: material
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("material-{}", material.index().unwrap_or(0))),
                base_color: pbr.base_color_factor(),
                base_color_texture,
            }
        })
        .collect();
    let imported = Imported { buffers, materials };

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .context("glTF document has no scene")?;

    let mut root = ContainerNode::new(file_name);
    for node in scene.nodes() {
        root.add_child(to_scene_node(node, &imported));
    }
    debug!(
        "Parsed {file_name}: {} root nodes, {} materials",
        root.children.len(),
        imported.materials.len()
    );
    Ok(Box::new(root))
}

fn to_scene_node(node: ::gltf::Node, imported: &Imported) -> Box<dyn SceneNode> {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node-{}", node.index()));

    let mut scene_node: Box<dyn SceneNode> = match node.mesh() {
        Some(mesh) => {
            let mut primitives = Vec::new();
            let mut materials = Vec::new();
            // glTF material index (None = default) -> index in this node's list
            let mut material_slots: HashMap<Option<usize>, usize> = HashMap::new();

            for primitive in mesh.primitives() {
                let Some(mut converted) = to_primitive(&primitive, &imported.buffers) else {
                    warn!(
                        "Skipping primitive {} of mesh {} with unsupported mode {:?}",
                        primitive.index(),
                        mesh.index(),
                        primitive.mode()
                    );
                    continue;
                };
                let gltf_material = primitive.material().index();
                let slot = *material_slots.entry(gltf_material).or_insert_with(|| {
                    let desc = gltf_material
                        .and_then(|idx| imported.materials.get(idx).cloned())
                        .unwrap_or_default();
                    materials.push(desc);
                    materials.len() - 1
                });
                converted.material = Some(slot);
                primitives.push(converted);
            }
            Box::new(MeshNode::new(&name, primitives, materials))
        }
        None => Box::new(ContainerNode::new(&name)),
    };

    scene_node.set_local_transform(Instance::from(node.transform()));
    for child in node.children() {
        scene_node.add_child(to_scene_node(child, imported));
    }
    scene_node
}

fn to_primitive(primitive: &::gltf::Primitive, buffers: &[::gltf::buffer::Data]) -> Option<Primitive> {
    let topology = match primitive.mode() {
        ::gltf::mesh::Mode::Triangles => Topology::TriangleList,
        ::gltf::mesh::Mode::Lines => Topology::LineList,
        _ => return None,
    };
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

    Some(Primitive {
        topology,
        positions: reader.read_positions().map(|p| p.collect()).unwrap_or_default(),
        normals: reader.read_normals().map(|n| n.collect()).unwrap_or_default(),
        tex_coords: reader
            .read_tex_coords(0)
            .map(|coords| coords.into_f32().collect())
            .unwrap_or_default(),
        indices: reader
            .read_indices()
            .map(|indices| indices.into_u32().collect())
            .unwrap_or_default(),
        material: None,
    })
}

fn to_rgba(data: &::gltf::image::Data) -> Option<image::RgbaImage> {
    use ::gltf::image::Format;

    let (width, height) = (data.width, data.height);
    let pixels = data.pixels.clone();
    let dynamic = match data.format {
        Format::R8G8B8A8 => image::RgbaImage::from_raw(width, height, pixels).map(image::DynamicImage::ImageRgba8),
        Format::R8G8B8 => image::RgbImage::from_raw(width, height, pixels).map(image::DynamicImage::ImageRgb8),
        Format::R8 => image::GrayImage::from_raw(width, height, pixels).map(image::DynamicImage::ImageLuma8),
        other => {
            warn!("Ignoring base color texture with pixel format {other:?}");
            None
        }
    };
    dynamic.map(|image| image.to_rgba8())
}
