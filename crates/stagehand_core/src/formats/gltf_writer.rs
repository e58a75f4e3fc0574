//! glTF 2.0 export, either as `.gltf` + `.bin` or as a single `.glb`.

use std::collections::BTreeMap;

use glam::{Mat4, Vec3};
use gltf::json as gj;
use gj::validation::{Checked, USize64};

use crate::error::ExportFailure;
use crate::export::{ExportCollector, Exporter};
use crate::mesh::{Mesh, PrimitiveKind};
use crate::registry::FormatInfo;
use crate::scene::{Material, Node, Scene};

static GLTF2_INFO: FormatInfo = FormatInfo {
    id: "gltf2",
    name: "glTF 2.0 (separate buffer)",
    extensions: &["gltf"],
};

static GLB2_INFO: FormatInfo = FormatInfo {
    id: "glb2",
    name: "glTF 2.0 (binary)",
    extensions: &["glb"],
};

const GLB_MAGIC: u32 = 0x4654_6C67;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const ARRAY_BUFFER: gj::buffer::Target = gj::buffer::Target::ArrayBuffer;

/// glTF exporter.
pub struct GltfExporter {
    binary: bool,
}

impl GltfExporter {
    /// `gltf2`: JSON document plus an external `.bin` buffer.
    pub fn separate() -> Self {
        Self { binary: false }
    }

    /// `glb2`: one binary container.
    pub fn binary() -> Self {
        Self { binary: true }
    }
}

impl Exporter for GltfExporter {
    fn info(&self) -> &FormatInfo {
        if self.binary {
            &GLB2_INFO
        } else {
            &GLTF2_INFO
        }
    }

    fn write(&self, scene: &Scene, out: &mut ExportCollector) -> Result<(), ExportFailure> {
        let mut builder = GltfBuilder::default();
        builder.add_scene(scene);

        if self.binary {
            let root = builder.document(None);
            let json = serde_json::to_vec(&root)?;
            out.emit(out.default_path("glb"), assemble_glb(&json, &builder.buffer));
        } else {
            let bin_path = out.default_path("bin");
            let root = builder.document(Some(&bin_path));
            let json = serde_json::to_vec_pretty(&root)?;
            out.emit(out.default_path("gltf"), json);
            out.emit(bin_path, builder.buffer);
        }
        Ok(())
    }
}

/// Accumulates the typed document and the single binary buffer.
#[derive(Default)]
struct GltfBuilder {
    root: gj::Root,
    buffer: Vec<u8>,
}

impl GltfBuilder {
    fn add_scene(&mut self, scene: &Scene) {
        self.root.materials = scene.materials.iter().map(convert_material).collect();

        // Scene mesh index -> glTF mesh index; meshes without vertices are dropped
        let mesh_map: Vec<Option<u32>> =
            scene.meshes.iter().map(|mesh| self.add_mesh(mesh)).collect();

        let root_node = self.add_node(&scene.root, &mesh_map);
        self.root.scenes.push(gj::Scene {
            name: None,
            nodes: vec![gj::Index::new(root_node)],
            extensions: None,
            extras: gj::Extras::default(),
        });
        self.root.scene = Some(gj::Index::new(0));
    }

    /// The finished document. The buffer is referenced by `buffer_uri`, or
    /// left without a URI for the GLB binary chunk.
    fn document(&self, buffer_uri: Option<&str>) -> gj::Root {
        let mut root = self.root.clone();
        root.asset = gj::Asset {
            generator: Some("stagehand".into()),
            version: "2.0".into(),
            ..Default::default()
        };

        if !self.buffer.is_empty() {
            root.buffers.push(gj::Buffer {
                byte_length: USize64(self.buffer.len() as u64),
                name: None,
                uri: buffer_uri.map(String::from),
                extensions: None,
                extras: gj::Extras::default(),
            });
        }
        root
    }

    fn add_mesh(&mut self, mesh: &Mesh) -> Option<u32> {
        if mesh.positions.is_empty() {
            log::debug!("Skipping mesh '{}' without vertices", mesh.name);
            return None;
        }

        let mut attributes = BTreeMap::new();

        let positions: Vec<f32> = mesh.positions.iter().flat_map(|p| p.to_array()).collect();
        let (min, max) = mesh.bounds().unwrap_or((Vec3::ZERO, Vec3::ZERO));
        let view = self.push_view(bytemuck::cast_slice(&positions), ARRAY_BUFFER);
        let accessor = self.push_accessor(
            view,
            mesh.positions.len(),
            gj::accessor::ComponentType::F32,
            gj::accessor::Type::Vec3,
            Some((min, max)),
        );
        attributes.insert(Checked::Valid(gj::mesh::Semantic::Positions), accessor);

        if let Some(normals) = &mesh.normals {
            let data: Vec<f32> = normals.iter().flat_map(|n| n.to_array()).collect();
            let view = self.push_view(bytemuck::cast_slice(&data), ARRAY_BUFFER);
            let accessor = self.push_accessor(
                view,
                normals.len(),
                gj::accessor::ComponentType::F32,
                gj::accessor::Type::Vec3,
                None,
            );
            attributes.insert(Checked::Valid(gj::mesh::Semantic::Normals), accessor);
        }

        if let Some(uvs) = &mesh.uvs {
            let view = self.push_view(bytemuck::cast_slice(uvs), ARRAY_BUFFER);
            let accessor = self.push_accessor(
                view,
                uvs.len(),
                gj::accessor::ComponentType::F32,
                gj::accessor::Type::Vec2,
                None,
            );
            attributes.insert(Checked::Valid(gj::mesh::Semantic::TexCoords(0)), accessor);
        }

        let indices = (!mesh.indices.is_empty()).then(|| {
            let view = self.push_view(
                bytemuck::cast_slice(&mesh.indices),
                gj::buffer::Target::ElementArrayBuffer,
            );
            self.push_accessor(
                view,
                mesh.indices.len(),
                gj::accessor::ComponentType::U32,
                gj::accessor::Type::Scalar,
                None,
            )
        });

        let mode = match mesh.primitive {
            PrimitiveKind::Points => gj::mesh::Mode::Points,
            PrimitiveKind::Lines => gj::mesh::Mode::Lines,
            PrimitiveKind::Triangles => gj::mesh::Mode::Triangles,
        };
        let primitive = gj::mesh::Primitive {
            attributes,
            extensions: None,
            extras: gj::Extras::default(),
            indices,
            material: Some(gj::Index::new(mesh.material as u32)),
            mode: Checked::Valid(mode),
            targets: None,
        };

        self.root.meshes.push(gj::Mesh {
            name: (!mesh.name.is_empty()).then(|| mesh.name.clone()),
            primitives: vec![primitive],
            weights: None,
            extensions: None,
            extras: gj::Extras::default(),
        });
        Some(self.root.meshes.len() as u32 - 1)
    }

    fn add_node(&mut self, node: &Node, mesh_map: &[Option<u32>]) -> u32 {
        let mut children: Vec<gj::Index<gj::Node>> = node
            .children
            .iter()
            .map(|child| gj::Index::new(self.add_node(child, mesh_map)))
            .collect();

        let meshes: Vec<u32> = node
            .meshes
            .iter()
            .filter_map(|&m| mesh_map.get(m).copied().flatten())
            .collect();

        let mesh = match meshes.as_slice() {
            [] => None,
            [single] => Some(gj::Index::new(*single)),
            // A glTF node holds one mesh: extra meshes go on child nodes
            several => {
                for &mesh in several {
                    self.root.nodes.push(gj::Node {
                        mesh: Some(gj::Index::new(mesh)),
                        ..Default::default()
                    });
                    children.push(gj::Index::new(self.root.nodes.len() as u32 - 1));
                }
                None
            }
        };

        self.root.nodes.push(gj::Node {
            name: (!node.name.is_empty()).then(|| node.name.clone()),
            mesh,
            children: (!children.is_empty()).then_some(children),
            matrix: (node.transform != Mat4::IDENTITY).then(|| node.transform.to_cols_array()),
            ..Default::default()
        });
        self.root.nodes.len() as u32 - 1
    }

    fn align(&mut self) {
        let padding = (4 - self.buffer.len() % 4) % 4;
        self.buffer.extend(std::iter::repeat(0u8).take(padding));
    }

    fn push_view(
        &mut self,
        data: &[u8],
        target: gj::buffer::Target,
    ) -> gj::Index<gj::buffer::View> {
        self.align();
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(data);
        self.root.buffer_views.push(gj::buffer::View {
            buffer: gj::Index::new(0),
            byte_offset: Some(USize64(offset as u64)),
            byte_length: USize64(data.len() as u64),
            byte_stride: None,
            target: Some(Checked::Valid(target)),
            name: None,
            extensions: None,
            extras: gj::Extras::default(),
        });
        gj::Index::new(self.root.buffer_views.len() as u32 - 1)
    }

    fn push_accessor(
        &mut self,
        view: gj::Index<gj::buffer::View>,
        count: usize,
        component_type: gj::accessor::ComponentType,
        type_: gj::accessor::Type,
        bounds: Option<(Vec3, Vec3)>,
    ) -> gj::Index<gj::Accessor> {
        let json_vec3 = |v: Vec3| gj::Value::from(v.to_array().to_vec());
        self.root.accessors.push(gj::Accessor {
            buffer_view: Some(view),
            byte_offset: None,
            count: USize64(count as u64),
            component_type: Checked::Valid(gj::accessor::GenericComponentType(component_type)),
            type_: Checked::Valid(type_),
            min: bounds.map(|(min, _)| json_vec3(min)),
            max: bounds.map(|(_, max)| json_vec3(max)),
            normalized: false,
            name: None,
            sparse: None,
            extensions: None,
            extras: gj::Extras::default(),
        });
        gj::Index::new(self.root.accessors.len() as u32 - 1)
    }
}

fn convert_material(material: &Material) -> gj::Material {
    let d = material.diffuse;
    let alpha_mode = if material.opacity < 1.0 {
        gj::material::AlphaMode::Blend
    } else {
        gj::material::AlphaMode::Opaque
    };

    gj::Material {
        name: Some(material.name.clone()),
        alpha_cutoff: None,
        alpha_mode: Checked::Valid(alpha_mode),
        double_sided: false,
        pbr_metallic_roughness: gj::material::PbrMetallicRoughness {
            base_color_factor: gj::material::PbrBaseColorFactor([d.x, d.y, d.z, material.opacity]),
            base_color_texture: None,
            metallic_factor: gj::material::StrengthFactor(0.0),
            roughness_factor: gj::material::StrengthFactor(1.0),
            metallic_roughness_texture: None,
            extensions: None,
            extras: gj::Extras::default(),
        },
        normal_texture: None,
        occlusion_texture: None,
        emissive_texture: None,
        emissive_factor: gj::material::EmissiveFactor(material.emissive.to_array()),
        extensions: None,
        extras: gj::Extras::default(),
    }
}

/// Wrap a JSON document and binary buffer into a GLB container.
fn assemble_glb(json: &[u8], bin: &[u8]) -> Vec<u8> {
    let json_pad = (4 - json.len() % 4) % 4;
    let json_len = json.len() + json_pad;
    let bin_pad = (4 - bin.len() % 4) % 4;
    let bin_len = bin.len() + bin_pad;

    let total = 12 + 8 + json_len + if bin.is_empty() { 0 } else { 8 + bin_len };
    let mut glb = Vec::with_capacity(total);

    glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total as u32).to_le_bytes());

    glb.extend_from_slice(&(json_len as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb.extend_from_slice(json);
    glb.extend(std::iter::repeat(b' ').take(json_pad));

    if !bin.is_empty() {
        glb.extend_from_slice(&(bin_len as u32).to_le_bytes());
        glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        glb.extend_from_slice(bin);
        glb.extend(std::iter::repeat(0u8).take(bin_pad));
    }

    glb
}
