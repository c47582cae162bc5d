use std::rc::Rc;

use flow_viewer::{
    config::ViewerConfig,
    context::ViewerContext,
    data_structures::{bounds::BoundingVolume, scene_graph::count_nodes},
    error::LoadError,
    loader::{AssetLoader, progress_channel},
    resources::{FormatParser, LocalFile},
};
use futures::{StreamExt, executor::block_on};

const CUBE_OBJ: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/cube.obj");

/// A parent node translated by (10, 0, 0) holding a triangle scaled by 2.
const NESTED_TRIANGLE_GLTF: &str = r#"{
    "asset": { "version": "2.0" },
    "scene": 0,
    "scenes": [{ "nodes": [0] }],
    "nodes": [
        { "name": "root", "translation": [10.0, 0.0, 0.0], "children": [1] },
        { "name": "triangle", "mesh": 0, "scale": [2.0, 2.0, 2.0] }
    ],
    "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }] }],
    "materials": [{ "name": "red", "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0] } }],
    "buffers": [{
        "byteLength": 36,
        "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
    }],
    "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
    "accessors": [{
        "bufferView": 0,
        "componentType": 5126,
        "count": 3,
        "type": "VEC3",
        "min": [0.0, 0.0, 0.0],
        "max": [1.0, 1.0, 0.0]
    }]
}"#;

#[tokio::test]
async fn cube_obj_loads_from_disk() {
    let mut ctx = ViewerContext::new(ViewerConfig::default());
    let mut loader = AssetLoader::from_config(Rc::new(FormatParser::new()), &ctx.config);
    let (sink, progress) = progress_channel();

    let report = loader
        .load(&mut ctx, &[LocalFile::new(CUBE_OBJ)], sink)
        .await
        .unwrap();

    assert_eq!(report.file_name, "cube.obj");
    assert!((report.info.diagonal - 2.0 * 3f32.sqrt()).abs() < 1e-5);
    assert_eq!(report.info.center, [0.0, 0.0, 0.0]);

    let updates: Vec<_> = progress.collect().await;
    let last = updates.last().unwrap();
    assert_eq!(Some(last.loaded), last.total);
    assert!(last.total.unwrap() > 0);
}

#[tokio::test]
async fn missing_file_is_reported_as_parse_failure() {
    let mut ctx = ViewerContext::new(ViewerConfig::default());
    let mut loader = AssetLoader::new(Rc::new(FormatParser::new()));
    let missing = LocalFile::new("/definitely/not/here.glb");

    let err = loader
        .load(&mut ctx, &[missing], flow_viewer::loader::ProgressSink::discard())
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::ParseFailure { .. }));
    assert!(!loader.is_loading());
}

#[test]
fn gltf_hierarchy_and_materials_are_kept() {
    let parser = FormatParser::new();
    let root = block_on(parser.parse_bytes("triangle.gltf", None, NESTED_TRIANGLE_GLTF.as_bytes()))
        .unwrap();

    assert_eq!(root.name(), "triangle.gltf");
    // file root, glTF root, triangle
    assert_eq!(count_nodes(root.as_ref()), 3);

    let volume = BoundingVolume::of(root.as_ref());
    assert!((volume.min.x - 10.0).abs() < 1e-5);
    assert!((volume.max.x - 12.0).abs() < 1e-5);
    assert!((volume.max.y - 2.0).abs() < 1e-5);
    assert_eq!(volume.size.z, 0.0);

    let triangle = &root.get_children()[0].get_children()[0];
    assert_eq!(triangle.name(), "triangle");
    assert_eq!(triangle.get_primitives()[0].material, Some(0));
}

#[test]
fn garbage_is_rejected() {
    let parser = FormatParser::new();
    assert!(block_on(parser.parse_bytes("broken.glb", None, b"glTF\x02\0\0\0garbage")).is_err());
    assert!(block_on(parser.parse_bytes("photo", Some("image/png"), b"\x89PNG\r\n")).is_err());
}
