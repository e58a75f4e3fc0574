//! Shared fixtures for the conversion integration tests.

#![allow(dead_code)]

use stagehand_core::{ConversionResult, FileStore};

pub const CUBE_OBJ: &[u8] = include_bytes!("../fixtures/cube_usemtl.obj");
pub const CUBE_MTL: &[u8] = include_bytes!("../fixtures/cube_usemtl.mtl");
pub const BROKEN_OBJ: &[u8] = include_bytes!("../fixtures/broken.obj");
pub const TETRA_OFF: &[u8] = include_bytes!("../fixtures/tetra.off");
pub const SCENE_X3D: &[u8] = include_bytes!("../fixtures/scene.x3d");
pub const SCENE_IRR: &[u8] = include_bytes!("../fixtures/scene.irr");

/// First bytes of a PNG file.
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn store(files: &[(&str, &[u8])]) -> FileStore {
    files.iter().map(|&(path, content)| (path, content)).collect()
}

/// The first output of a successful conversion, parsed as JSON.
pub fn first_output_json(result: &ConversionResult) -> serde_json::Value {
    let output = result.output_at(0).expect("conversion produced no output");
    serde_json::from_slice(output.content()).expect("output is not JSON")
}

/// Every ordering of `items`.
pub fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut result = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let first = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, first.clone());
            result.push(tail);
        }
    }
    result
}

/// Binary buffer for [`triangle_gltf`]: three positions then three u16
/// indices.
pub fn triangle_bin() -> Vec<u8> {
    let positions = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let mut bin: Vec<u8> = positions.iter().flat_map(|f| f.to_le_bytes()).collect();
    for index in [0u16, 1, 2] {
        bin.extend_from_slice(&index.to_le_bytes());
    }
    bin
}

/// A one-triangle glTF whose buffer lives in `buffer_uri`.
pub fn triangle_gltf(buffer_uri: &str) -> Vec<u8> {
    triangle_gltf_with(buffer_uri, "")
}

/// Like [`triangle_gltf`], with extra top-level JSON members spliced in.
pub fn triangle_gltf_with(buffer_uri: &str, extra: &str) -> Vec<u8> {
    format!(
        r#"{{
  "asset": {{ "version": "2.0" }},{extra}
  "scene": 0,
  "scenes": [ {{ "nodes": [0] }} ],
  "nodes": [ {{ "name": "tri", "mesh": 0 }} ],
  "meshes": [ {{ "primitives": [ {{ "attributes": {{ "POSITION": 0 }}, "indices": 1 }} ] }} ],
  "buffers": [ {{ "uri": "{buffer_uri}", "byteLength": 42 }} ],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
       "min": [0, 0, 0], "max": [1, 1, 0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ]
}}"#
    )
    .into_bytes()
}
