//! Scene graph nodes.
//!
//! Provides the [`SceneNode`] trait and the node types an asset tree or a
//! scene fixture is built from. Every node carries a [`Role`] tag: fixtures
//! (grid, ground, axes, lights) are [`Role::Persistent`] and survive every
//! scene replacement, everything a parser produces is [`Role::Asset`].

use std::sync::atomic::{AtomicU64, Ordering};

use crate::data_structures::{
    instance::Instance,
    model::{self, Dispose, MaterialDesc, Primitive},
};

/// Process-unique node identity, assigned at construction.
pub type NodeId = u64;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_node_id() -> NodeId {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

/// The scene members that are part of the viewer rather than the asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fixture {
    Grid,
    Ground,
    Axes,
    Light,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Persistent(Fixture),
    Asset,
}

impl Role {
    pub fn is_persistent(&self) -> bool {
        matches!(self, Role::Persistent(_))
    }
}

pub trait SceneNode {
    fn id(&self) -> NodeId;

    fn name(&self) -> &str;

    fn role(&self) -> Role;

    fn get_local_transform(&self) -> &Instance;

    fn set_local_transform(&mut self, instance: Instance);

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    /// Geometry of this node alone, in node-local space.
    fn get_primitives(&self) -> &[Primitive] {
        &[]
    }

    /// GPU resources owned by this node alone (children own theirs).
    fn get_resources_mut(&mut self) -> Vec<&mut Box<dyn Dispose>> {
        Vec::new()
    }

    /**
     * Creates the GPU buffers for this node and all descendants. Nodes that already
     * own resources are left untouched.
     */
    fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) -> anyhow::Result<()> {
        for child in self.get_children_mut().iter_mut() {
            child.write_to_buffers(queue, device)?;
        }
        Ok(())
    }
}

/// Depth-first, parent before children.
pub fn visit(node: &dyn SceneNode, f: &mut dyn FnMut(&dyn SceneNode)) {
    f(node);
    for child in node.get_children() {
        visit(child.as_ref(), f);
    }
}

pub fn count_nodes(node: &dyn SceneNode) -> usize {
    let mut count = 0;
    visit(node, &mut |_: &dyn SceneNode| count += 1);
    count
}

/// A grouping node without geometry, e.g. a glTF node without a mesh.
pub struct ContainerNode {
    id: NodeId,
    name: String,
    role: Role,
    local: Instance,
    pub children: Vec<Box<dyn SceneNode>>,
}

impl ContainerNode {
    pub fn new(name: &str) -> Self {
        Self {
            id: next_node_id(),
            name: name.to_string(),
            role: Role::Asset,
            local: Instance::default(),
            children: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

impl SceneNode for ContainerNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> Role {
        self.role
    }

    fn get_local_transform(&self) -> &Instance {
        &self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }
}

/// A node with geometry and materials.
///
/// The CPU-side primitives stay available after upload so that bounding
/// volumes can always be recomputed from the current transforms.
pub struct MeshNode {
    id: NodeId,
    name: String,
    role: Role,
    local: Instance,
    children: Vec<Box<dyn SceneNode>>,
    primitives: Vec<Primitive>,
    materials: Vec<MaterialDesc>,
    gpu_meshes: Vec<Box<dyn Dispose>>,
    gpu_materials: Vec<Box<dyn Dispose>>,
}

impl MeshNode {
    pub fn new(name: &str, primitives: Vec<Primitive>, materials: Vec<MaterialDesc>) -> Self {
        Self {
            id: next_node_id(),
            name: name.to_string(),
            role: Role::Asset,
            local: Instance::default(),
            children: Vec::new(),
            primitives,
            materials,
            gpu_meshes: Vec::new(),
            gpu_materials: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Hands already created GPU resources to this node, which now owns them.
    pub fn attach_resources(
        &mut self,
        meshes: Vec<Box<dyn Dispose>>,
        materials: Vec<Box<dyn Dispose>>,
    ) {
        self.gpu_meshes.extend(meshes);
        self.gpu_materials.extend(materials);
    }

    pub fn is_uploaded(&self) -> bool {
        !self.gpu_meshes.is_empty() || !self.gpu_materials.is_empty()
    }
}

impl SceneNode for MeshNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> Role {
        self.role
    }

    fn get_local_transform(&self) -> &Instance {
        &self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn get_primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    fn get_resources_mut(&mut self) -> Vec<&mut Box<dyn Dispose>> {
        self.gpu_meshes
            .iter_mut()
            .chain(self.gpu_materials.iter_mut())
            .collect()
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) -> anyhow::Result<()> {
        if !self.is_uploaded() {
            for (idx, primitive) in self.primitives.iter().enumerate() {
                let label = format!("{}#{}", self.name, idx);
                let mesh = model::Mesh::new(device, &label, primitive);
                self.gpu_meshes.push(Box::new(mesh));
            }
            for desc in &self.materials {
                let material = model::Material::new(device, queue, desc)?;
                self.gpu_materials.push(Box::new(material));
            }
        }
        for child in self.children.iter_mut() {
            child.write_to_buffers(queue, device)?;
        }
        Ok(())
    }
}

/// A point light. Lights never own GPU memory of their own; the render loop
/// packs them into its light uniform.
pub struct LightNode {
    id: NodeId,
    name: String,
    local: Instance,
    children: Vec<Box<dyn SceneNode>>,
    pub color: [f32; 3],
    pub intensity: f32,
}

impl LightNode {
    pub fn new(name: &str, position: [f32; 3], color: [f32; 3], intensity: f32) -> Self {
        Self {
            id: next_node_id(),
            name: name.to_string(),
            local: Instance::from(cgmath::Vector3::from(position)),
            children: Vec::new(),
            color,
            intensity,
        }
    }
}

impl SceneNode for LightNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> Role {
        Role::Persistent(Fixture::Light)
    }

    fn get_local_transform(&self) -> &Instance {
        &self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }
}
