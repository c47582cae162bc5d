//! Axis-aligned bounds of scene node trees.
//!
//! [`BoundingVolume::of`] walks a node and all of its descendants, moves every
//! geometry position into world space and folds it into an [`Aabb`]. Nothing
//! is cached: the volume always reflects the transforms at the time of the
//! call.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Transform, Vector3};

use crate::data_structures::scene_graph::SceneNode;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// Returns None for an empty slice.
    pub fn from_points(points: &[Point3<f32>]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let seed = Self::new(*first, *first);
        Some(rest.iter().fold(seed, |aabb, point| aabb.expand(*point)))
    }

    pub fn expand(&self, point: Point3<f32>) -> Self {
        Self {
            min: Point3::new(
                self.min.x.min(point.x),
                self.min.y.min(point.y),
                self.min.z.min(point.z),
            ),
            max: Point3::new(
                self.max.x.max(point.x),
                self.max.y.max(point.y),
                self.max.z.max(point.z),
            ),
        }
    }

    pub fn merge(&self, other: &Aabb) -> Self {
        self.expand(other.min).expand(other.max)
    }

    pub fn corners(&self) -> [Point3<f32>; 8] {
        [
            Point3::new(self.min.x, self.min.y, self.min.z),
            Point3::new(self.max.x, self.min.y, self.min.z),
            Point3::new(self.min.x, self.max.y, self.min.z),
            Point3::new(self.max.x, self.max.y, self.min.z),
            Point3::new(self.min.x, self.min.y, self.max.z),
            Point3::new(self.max.x, self.min.y, self.max.z),
            Point3::new(self.min.x, self.max.y, self.max.z),
            Point3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    /// Box around the eight transformed corners. Rotations make the result
    /// looser than the box of the transformed geometry itself.
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let corners = self.corners().map(|corner| matrix.transform_point(corner));
        let seed = Self::new(corners[0], corners[0]);
        corners[1..].iter().fold(seed, |aabb, corner| aabb.expand(*corner))
    }

    pub fn contains_point(&self, point: Point3<f32>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    pub fn center(&self) -> Point3<f32> {
        self.min.midpoint(self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }
}

/// World-space extent of a node tree.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingVolume {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
    pub center: Point3<f32>,
    pub size: Vector3<f32>,
    pub diagonal: f32,
}

impl BoundingVolume {
    /// Zero-size volume at the origin, used for nodes without geometry.
    pub fn empty() -> Self {
        Self {
            min: Point3::origin(),
            max: Point3::origin(),
            center: Point3::origin(),
            size: Vector3::new(0.0, 0.0, 0.0),
            diagonal: 0.0,
        }
    }

    pub fn from_aabb(aabb: Aabb) -> Self {
        let size = aabb.size();
        Self {
            min: aabb.min,
            max: aabb.max,
            center: aabb.center(),
            size,
            diagonal: size.magnitude(),
        }
    }

    pub fn of(node: &dyn SceneNode) -> Self {
        let mut aabb = None;
        accumulate(node, &Matrix4::identity(), &mut aabb);
        aabb.map(Self::from_aabb).unwrap_or_else(Self::empty)
    }

    /// True when the volume covers no geometry at all. A single point also
    /// has a zero diagonal but is not considered empty.
    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.min, self.max)
    }
}

fn accumulate(node: &dyn SceneNode, parent_world: &Matrix4<f32>, aabb: &mut Option<Aabb>) {
    let world = parent_world * node.get_local_transform().to_matrix();

    for primitive in node.get_primitives() {
        for position in &primitive.positions {
            let point = world.transform_point(Point3::from(*position));
            *aabb = Some(match aabb {
                Some(current) => current.expand(point),
                None => Aabb::new(point, point),
            });
        }
    }

    for child in node.get_children() {
        accumulate(child.as_ref(), &world, aabb);
    }
}

/// Read-only summary of the displayed asset, for property panels.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetInfo {
    pub name: String,
    pub size: [f32; 3],
    pub center: [f32; 3],
    pub diagonal: f32,
    pub node_count: usize,
}

impl AssetInfo {
    pub fn of(node: &dyn SceneNode) -> Self {
        let volume = BoundingVolume::of(node);
        Self {
            name: node.name().to_string(),
            size: volume.size.into(),
            center: volume.center.into(),
            diagonal: volume.diagonal,
            node_count: crate::data_structures::scene_graph::count_nodes(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, Quaternion, Rotation3};

    use super::*;
    use crate::data_structures::{
        instance::Instance,
        model::Primitive,
        scene_graph::{ContainerNode, MeshNode},
    };

    fn unit_cube() -> Primitive {
        Primitive::from_positions(vec![[-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]])
    }

    #[test]
    fn aabb_from_points_and_contains() {
        assert!(Aabb::from_points(&[]).is_none());
        let aabb = Aabb::from_points(&[Point3::new(1.0, 2.0, 3.0), Point3::new(-1.0, 0.0, 5.0)])
            .unwrap();
        assert_eq!(aabb.min, Point3::new(-1.0, 0.0, 3.0));
        assert_eq!(aabb.max, Point3::new(1.0, 2.0, 5.0));
        assert!(aabb.contains_point(Point3::new(0.0, 1.0, 4.0)));
        assert!(!aabb.contains_point(Point3::new(0.0, 3.0, 4.0)));
    }

    #[test]
    fn merge_covers_both() {
        let a = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Point3::new(-2.0, 0.5, 0.5), Point3::new(0.0, 3.0, 0.5));
        let merged = a.merge(&b);
        assert_eq!(merged.min, Point3::new(-2.0, 0.0, 0.0));
        assert_eq!(merged.max, Point3::new(1.0, 3.0, 1.0));
    }

    #[test]
    fn transformed_box_encloses_rotated_corners() {
        let aabb = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        let matrix = Matrix4::from_translation(Vector3::new(5.0, 0.0, 0.0))
            * Matrix4::from(Quaternion::from_angle_z(Deg(45.0)));
        let moved = aabb.transform(&matrix);

        let reach = 2f32.sqrt();
        assert!((moved.min.x - (5.0 - reach)).abs() < 1e-5);
        assert!((moved.max.x - (5.0 + reach)).abs() < 1e-5);
        assert!((moved.max.y - reach).abs() < 1e-5);
        assert!((moved.max.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_tree_has_zero_volume_at_origin() {
        let mut root = ContainerNode::new("empty");
        root.add_child(Box::new(ContainerNode::new("child")));
        let volume = BoundingVolume::of(&root);
        assert!(volume.is_empty());
        assert_eq!(volume.diagonal, 0.0);
        assert_eq!(volume.center, Point3::origin());
    }

    #[test]
    fn child_transforms_are_composed() {
        let mut root = ContainerNode::new("root");
        root.set_local_transform(Instance::from(Vector3::new(10.0, 0.0, 0.0)));
        let mut child = MeshNode::new("cube", vec![unit_cube()], vec![]);
        child.set_local_transform(Instance::new().scaled_by(2.0));
        root.add_child(Box::new(child));

        let volume = BoundingVolume::of(&root);
        assert_eq!(volume.min, Point3::new(8.0, -2.0, -2.0));
        assert_eq!(volume.max, Point3::new(12.0, 2.0, 2.0));
        assert_eq!(volume.center, Point3::new(10.0, 0.0, 0.0));
        assert!((volume.diagonal - 4.0 * 3f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn rotation_is_applied_to_positions() {
        let mut node = MeshNode::new(
            "rod",
            vec![Primitive::from_positions(vec![[0.0, 0.0, 0.0], [4.0, 0.0, 0.0]])],
            vec![],
        );
        node.set_local_transform(Instance {
            rotation: Quaternion::from_angle_z(Deg(90.0)),
            ..Default::default()
        });
        let volume = BoundingVolume::of(&node);
        assert!(volume.size.x.abs() < 1e-5);
        assert!((volume.size.y - 4.0).abs() < 1e-5);
    }
}
