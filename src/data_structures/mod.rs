//! Viewer data structures: scene graph, geometry, bounds and GPU resources.
//!
//! - `instance` holds a node's local transformation
//! - `model` contains CPU-side primitives and materials and their GPU counterparts
//! - `texture` wraps GPU textures owned by materials
//! - `scene_graph` defines the node trait, node types and role tags
//! - `scene` is the ordered list of top-level members, fixtures included
//! - `bounds` computes world-space bounding volumes of node trees

pub mod bounds;
pub mod instance;
pub mod model;
pub mod scene;
pub mod scene_graph;
pub mod texture;
