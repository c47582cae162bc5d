//! The displayed scene: an ordered list of top-level nodes.
//!
//! Fixtures are created once by [`Scene::with_fixtures`] and tagged
//! persistent. The loaded asset is appended behind them and swapped out by
//! [`crate::replace::replace`].

use crate::{
    config::FixtureConfig,
    data_structures::{
        model::{MaterialDesc, Primitive, Topology},
        scene_graph::{Fixture, LightNode, MeshNode, NodeId, Role, SceneNode},
    },
};

#[derive(Default)]
pub struct Scene {
    members: Vec<Box<dyn SceneNode>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixtures(config: &FixtureConfig) -> Self {
        let mut scene = Self::new();
        if config.grid_divisions > 0 && config.grid_size > 0.0 {
            scene.add(Box::new(grid(config.grid_size, config.grid_divisions)));
        }
        if config.ground_size > 0.0 {
            scene.add(Box::new(ground(config.ground_size)));
        }
        if config.show_axes && config.axes_length > 0.0 {
            scene.add(Box::new(axes(config.axes_length)));
        }
        for (idx, light) in config.lights.iter().enumerate() {
            scene.add(Box::new(LightNode::new(
                &format!("light-{idx}"),
                light.position,
                light.color,
                light.intensity,
            )));
        }
        scene
    }

    pub fn add(&mut self, node: Box<dyn SceneNode>) {
        self.members.push(node);
    }

    pub fn members(&self) -> &[Box<dyn SceneNode>] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Detaches every member, leaving the scene empty.
    pub(crate) fn take_members(&mut self) -> Vec<Box<dyn SceneNode>> {
        std::mem::take(&mut self.members)
    }

    pub fn asset_roots(&self) -> impl Iterator<Item = &dyn SceneNode> {
        self.members
            .iter()
            .filter(|node| !node.role().is_persistent())
            .map(|node| node.as_ref())
    }

    /// The single asset root, if one is displayed.
    pub fn asset(&self) -> Option<&dyn SceneNode> {
        self.asset_roots().next()
    }

    pub fn persistent_ids(&self) -> Vec<NodeId> {
        self.members
            .iter()
            .filter(|node| node.role().is_persistent())
            .map(|node| node.id())
            .collect()
    }

    pub fn find(&self, id: NodeId) -> Option<&dyn SceneNode> {
        self.members
            .iter()
            .find(|node| node.id() == id)
            .map(|node| node.as_ref())
    }

    /// Uploads every member that has not been uploaded yet.
    pub fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) -> anyhow::Result<()> {
        for member in self.members.iter_mut() {
            member.write_to_buffers(queue, device)?;
        }
        Ok(())
    }
}

fn grid(size: f32, divisions: u32) -> MeshNode {
    let half = size / 2.0;
    let step = size / divisions as f32;
    let mut positions = Vec::with_capacity((divisions as usize + 1) * 4);
    for i in 0..=divisions {
        let offset = -half + step * i as f32;
        positions.push([offset, 0.0, -half]);
        positions.push([offset, 0.0, half]);
        positions.push([-half, 0.0, offset]);
        positions.push([half, 0.0, offset]);
    }
    let primitive = Primitive {
        topology: Topology::LineList,
        ..Primitive::from_positions(positions)
    };
    MeshNode::new(
        "grid",
        vec![primitive],
        vec![MaterialDesc::untextured("grid", [0.53, 0.53, 0.53, 1.0])],
    )
    .with_role(Role::Persistent(Fixture::Grid))
}

fn ground(size: f32) -> MeshNode {
    let half = size / 2.0;
    // Slightly below the grid so the lines stay visible.
    let y = -0.001;
    let primitive = Primitive {
        normals: vec![[0.0, 1.0, 0.0]; 4],
        tex_coords: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        indices: vec![0, 2, 1, 0, 3, 2],
        ..Primitive::from_positions(vec![
            [-half, y, -half],
            [half, y, -half],
            [half, y, half],
            [-half, y, half],
        ])
    };
    MeshNode::new(
        "ground",
        vec![primitive],
        vec![MaterialDesc::untextured("ground", [0.6, 0.6, 0.6, 1.0])],
    )
    .with_role(Role::Persistent(Fixture::Ground))
}

fn axes(length: f32) -> MeshNode {
    let colors = [[1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0], [0.0, 0.0, 1.0, 1.0]];
    let primitives = (0..3)
        .map(|axis| {
            let mut end = [0.0; 3];
            end[axis] = length;
            Primitive {
                topology: Topology::LineList,
                material: Some(axis),
                ..Primitive::from_positions(vec![[0.0; 3], end])
            }
        })
        .collect();
    let materials = ["x", "y", "z"]
        .iter()
        .zip(colors)
        .map(|(name, color)| MaterialDesc::untextured(&format!("axis-{name}"), color))
        .collect();
    MeshNode::new("axes", primitives, materials).with_role(Role::Persistent(Fixture::Axes))
}
