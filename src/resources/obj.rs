//! Wavefront OBJ to scene nodes.

use std::io::{BufReader, Cursor};

use anyhow::{Context, bail};
use log::{debug, warn};

use crate::data_structures::{
    model::{MaterialDesc, Primitive},
    scene_graph::{ContainerNode, MeshNode, SceneNode},
};

/// Parses OBJ text into one [`MeshNode`] per object under a container named
/// after the file.
///
/// A selected OBJ arrives without its `.mtl` sidecar, so every mesh gets the
/// default material.
pub async fn parse_obj(bytes: &[u8], file_name: &str) -> anyhow::Result<Box<dyn SceneNode>> {
    let mut obj_reader = BufReader::new(Cursor::new(bytes));

    let (models, _) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |mtl| async move {
            warn!("Material library {mtl} is not available, using the default material");
            let unavailable: tobj::MTLLoadResult = Err(tobj::LoadError::OpenFileFailed);
            unavailable
        },
    )
    .await
    .with_context(|| format!("{file_name} is not valid OBJ"))?;

    if models.iter().all(|m| m.mesh.positions.is_empty()) {
        bail!("{file_name} contains no geometry");
    }

    let mut root = ContainerNode::new(file_name);
    for (idx, model) in models.iter().enumerate() {
        let mesh = &model.mesh;
        let primitive = Primitive {
            positions: mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect(),
            normals: mesh
                .normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect(),
            // OBJ's v axis points up, wgpu's down
            tex_coords: mesh
                .texcoords
                .chunks_exact(2)
                .map(|t| [t[0], 1.0 - t[1]])
                .collect(),
            indices: mesh.indices.clone(),
            material: Some(0),
            ..Default::default()
        };
        let name = if model.name.is_empty() {
            format!("object-{idx}")
        } else {
            model.name.clone()
        };
        root.add_child(Box::new(MeshNode::new(
            &name,
            vec![primitive],
            vec![MaterialDesc::default()],
        )));
    }
    debug!("Parsed {file_name}: {} objects", models.len());
    Ok(Box::new(root))
}
