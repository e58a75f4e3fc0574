//! `assjson`: a JSON dump of the scene in the layout of assimp2json.
//!
//! Matrices are written row-major, vertex data flattened, and materials as
//! ordered `{key, semantic, index, type, value}` property lists.

use serde::Serialize;

use crate::error::ExportFailure;
use crate::export::{ExportCollector, Exporter};
use crate::mesh::{Mesh, PrimitiveKind};
use crate::registry::FormatInfo;
use crate::scene::{Material, Node, PropertyValue, Scene};

static ASSJSON_INFO: FormatInfo = FormatInfo {
    id: "assjson",
    name: "Assimp JSON",
    extensions: &["json"],
};

/// JSON scene dump exporter. Emits `{stem}.json`.
pub struct AssJsonExporter;

impl Exporter for AssJsonExporter {
    fn info(&self) -> &FormatInfo {
        &ASSJSON_INFO
    }

    fn write(&self, scene: &Scene, out: &mut ExportCollector) -> Result<(), ExportFailure> {
        let document = Document::from_scene(scene);
        let json = serde_json::to_vec(&document)?;
        out.emit(out.default_path("json"), json);
        Ok(())
    }
}

#[derive(Serialize)]
struct Document<'a> {
    #[serde(rename = "__metadata__")]
    metadata: Metadata,
    rootnode: JsonNode<'a>,
    flags: u32,
    meshes: Vec<JsonMesh<'a>>,
    materials: Vec<JsonMaterial>,
}

#[derive(Serialize)]
struct Metadata {
    format: &'static str,
    version: u32,
}

#[derive(Serialize)]
struct JsonNode<'a> {
    name: &'a str,
    transformation: [f32; 16],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    meshes: &'a [usize],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<JsonNode<'a>>,
}

#[derive(Serialize)]
struct JsonMesh<'a> {
    name: &'a str,
    materialindex: usize,
    primitivetypes: u32,
    vertices: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    normals: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    numuvcomponents: Option<[u32; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    texturecoords: Option<[Vec<f32>; 1]>,
    faces: Vec<&'a [u32]>,
}

#[derive(Serialize)]
struct JsonMaterial {
    properties: Vec<JsonProperty>,
}

#[derive(Serialize)]
struct JsonProperty {
    key: &'static str,
    semantic: u32,
    index: u32,
    #[serde(rename = "type")]
    type_code: u32,
    value: JsonValue,
}

#[derive(Serialize)]
#[serde(untagged)]
enum JsonValue {
    String(String),
    Int(i32),
    Float(f32),
    Floats([f32; 3]),
}

impl<'a> Document<'a> {
    fn from_scene(scene: &'a Scene) -> Self {
        Self {
            metadata: Metadata {
                format: "assimp2json",
                version: 100,
            },
            rootnode: JsonNode::from_node(&scene.root),
            flags: 0,
            meshes: scene.meshes.iter().map(JsonMesh::from_mesh).collect(),
            materials: scene.materials.iter().map(JsonMaterial::from_material).collect(),
        }
    }
}

impl<'a> JsonNode<'a> {
    fn from_node(node: &'a Node) -> Self {
        Self {
            name: &node.name,
            transformation: node.transform.transpose().to_cols_array(),
            meshes: &node.meshes,
            children: node.children.iter().map(JsonNode::from_node).collect(),
        }
    }
}

impl<'a> JsonMesh<'a> {
    fn from_mesh(mesh: &'a Mesh) -> Self {
        let primitivetypes = match mesh.primitive {
            PrimitiveKind::Points => 1,
            PrimitiveKind::Lines => 2,
            PrimitiveKind::Triangles => 4,
        };
        Self {
            name: &mesh.name,
            materialindex: mesh.material,
            primitivetypes,
            vertices: mesh.positions.iter().flat_map(|p| p.to_array()).collect(),
            normals: mesh
                .normals
                .as_ref()
                .map(|normals| normals.iter().flat_map(|n| n.to_array()).collect()),
            numuvcomponents: mesh.uvs.as_ref().map(|_| [2]),
            texturecoords: mesh
                .uvs
                .as_ref()
                .map(|uvs| [uvs.iter().flatten().copied().collect()]),
            faces: mesh.faces().collect(),
        }
    }
}

impl JsonMaterial {
    fn from_material(material: &Material) -> Self {
        let properties = material
            .properties()
            .into_iter()
            .map(|prop| JsonProperty {
                key: prop.key,
                semantic: prop.semantic,
                index: prop.index,
                type_code: prop.value.type_code(),
                value: match prop.value {
                    PropertyValue::String(s) => JsonValue::String(s),
                    PropertyValue::Int(i) => JsonValue::Int(i),
                    PropertyValue::Float(f) => JsonValue::Float(f),
                    PropertyValue::Color(c) => JsonValue::Floats(c),
                },
            })
            .collect();
        Self { properties }
    }
}
