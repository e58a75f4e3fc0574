//! Multi-file packaging and re-import of exported outputs.

mod common;

use common::*;
use stagehand_core::{convert_file_set, convert_single_file, OutputFile};

fn paths(outputs: &[OutputFile]) -> Vec<&str> {
    outputs.iter().map(OutputFile::path).collect()
}

#[test]
fn test_gltf_separate_and_binary() {
    init_logging();
    let files = store(&[("cube_usemtl.obj", CUBE_OBJ), ("cube_usemtl.mtl", CUBE_MTL)]);

    let separate = convert_file_set(&files, "gltf2");
    assert!(separate.is_success(), "{}", separate.diagnostic());
    assert_eq!(paths(separate.outputs()), ["result.gltf", "result.bin"]);

    let binary = convert_file_set(&files, "glb2");
    assert!(binary.is_success(), "{}", binary.diagnostic());
    assert_eq!(paths(binary.outputs()), ["result.glb"]);
    assert!(binary.output_at(0).unwrap().content().starts_with(b"glTF"));
}

#[test]
fn test_obj_export_writes_material_library() {
    let result = convert_file_set(&store(&[("tetra.off", TETRA_OFF)]), "obj");
    assert!(result.is_success(), "{}", result.diagnostic());
    assert_eq!(paths(result.outputs()), ["result.obj", "result.mtl"]);

    let obj = std::str::from_utf8(result.output_at(0).unwrap().content()).unwrap();
    assert!(obj.contains("mtllib result.mtl"));
    assert_eq!(obj.lines().filter(|l| l.starts_with("v ")).count(), 4);
    assert_eq!(obj.lines().filter(|l| l.starts_with("f ")).count(), 4);
}

#[test]
fn test_off_to_assjson() {
    let result = convert_file_set(&store(&[("tetra.off", TETRA_OFF)]), "assjson");
    assert!(result.is_success(), "{}", result.diagnostic());
    assert_eq!(paths(result.outputs()), ["result.json"]);

    let doc = first_output_json(&result);
    assert_eq!(doc["__metadata__"]["format"], "assimp2json");
    assert_eq!(doc["meshes"].as_array().unwrap().len(), 1);
    assert_eq!(doc["meshes"][0]["faces"].as_array().unwrap().len(), 4);
    assert_eq!(doc["meshes"][0]["vertices"].as_array().unwrap().len(), 12);
}

#[test]
fn test_glb_output_reimports() {
    let first = convert_file_set(&store(&[("tetra.off", TETRA_OFF)]), "glb2");
    let glb = first.into_outputs().unwrap().remove(0).into_content();

    let second = convert_file_set(&store(&[("model.glb", &glb[..])]), "assjson");
    assert!(second.is_success(), "{}", second.diagnostic());

    let doc = first_output_json(&second);
    assert_eq!(doc["meshes"][0]["faces"].as_array().unwrap().len(), 4);
}

#[test]
fn test_gltf_pair_reimports_through_callbacks() {
    let exported = convert_file_set(&store(&[("tetra.off", TETRA_OFF)]), "gltf2")
        .into_outputs()
        .unwrap();
    let (gltf, bin) = (&exported[0], &exported[1]);
    assert_eq!(bin.path(), "result.bin");

    let result = convert_single_file(
        gltf.path(),
        gltf.content().to_vec(),
        "stl",
        |name| name == "result.bin",
        |_| Some(bin.content().to_vec()),
    );
    assert!(result.is_success(), "{}", result.diagnostic());

    let stl = std::str::from_utf8(result.output_at(0).unwrap().content()).unwrap();
    assert_eq!(stl.matches("facet normal").count(), 4);
}

#[test]
fn test_failed_conversion_has_no_outputs() {
    let result = convert_file_set(&store(&[("broken.obj", BROKEN_OBJ)]), "gltf2");
    assert!(!result.is_success());
    assert_eq!(result.output_count(), 0);
    assert!(result.diagnostic().contains("broken.obj"));
}

#[test]
fn test_obj_lines_stay_lines() {
    let obj = b"v 0 0 0\nv 1 0 0\nv 0 1 0\nl 1 2\nl 2 3\n";
    let result = convert_file_set(&store(&[("path.obj", &obj[..])]), "assjson");
    assert!(result.is_success(), "{}", result.diagnostic());

    let doc = first_output_json(&result);
    assert_eq!(doc["meshes"][0]["primitivetypes"], 2);
    assert_eq!(doc["meshes"][0]["faces"], serde_json::json!([[0, 1], [1, 2]]));
}

#[test]
fn test_obj_point_cloud_keeps_vertices() {
    let obj = b"v 0 0 0\nv 1 0 0\nv 0 1 0\n";
    let result = convert_file_set(&store(&[("cloud.obj", &obj[..])]), "assjson");
    assert!(result.is_success(), "{}", result.diagnostic());

    let doc = first_output_json(&result);
    assert_eq!(doc["meshes"][0]["primitivetypes"], 1);
    assert_eq!(doc["meshes"][0]["vertices"].as_array().unwrap().len(), 9);
}

#[test]
fn test_oversized_off_header_fails_cleanly() {
    for off in ["OFF\n1000000000000000000 0 0\n0 0 0\n", "OFF\n3 18446744073709551615 0\n0 0 0\n"] {
        let result = convert_file_set(&store(&[("a.off", off.as_bytes())]), "assjson");
        assert!(!result.is_success());
        assert!(result.diagnostic().contains("line 2"), "{}", result.diagnostic());
    }
}
