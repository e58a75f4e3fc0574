//! glTF 2.0 import, text (`.gltf`) and binary (`.glb`).
//!
//! External buffers are required dependencies: a missing `.bin` fails the
//! import. Embedded `data:` buffers are decoded in place. Documents that
//! use a disabled extension are refused before any geometry is read.

use base64::Engine as _;
use glam::{Mat4, Vec3};
use gltf::mesh::Mode;

use crate::error::ImportFailure;
use crate::import::{Candidate, ImportContext, Importer, Recognition};
use crate::mesh::{Mesh, PrimitiveKind};
use crate::registry::FormatInfo;
use crate::scene::{Material, Node, Scene, ShadingModel};

pub(crate) const GLB_MAGIC: &[u8; 4] = b"glTF";

static GLTF_INFO: FormatInfo = FormatInfo {
    id: "gltf2",
    name: "glTF 2.0",
    extensions: &["gltf", "glb"],
};

/// glTF 2.0 importer.
pub struct GltfImporter;

impl Importer for GltfImporter {
    fn info(&self) -> &FormatInfo {
        &GLTF_INFO
    }

    fn recognize(&self, candidate: &Candidate<'_>, ctx: &ImportContext<'_>) -> Recognition {
        let is_glb = candidate.content().starts_with(GLB_MAGIC);
        if !is_glb && !GLTF_INFO.matches_extension(candidate.path()) {
            return Recognition::NotRecognized;
        }
        Recognition::from_result(load_gltf(candidate, ctx, is_glb))
    }
}

fn load_gltf(
    candidate: &Candidate<'_>,
    ctx: &ImportContext<'_>,
    is_glb: bool,
) -> Result<Scene, ImportFailure> {
    let content = candidate.content();
    check_header(content, is_glb, ctx)?;

    let gltf = gltf::Gltf::from_slice(content).map_err(|e| ImportFailure::Parse(e.to_string()))?;
    let buffers = resolve_buffers(&gltf, ctx)?;
    check_ranges(&gltf, &buffers)?;

    let mut scene = Scene::new(candidate.stem());
    scene.add_material(Material::fallback());
    for material in gltf.materials() {
        scene.add_material(convert_material(&material));
    }

    // glTF mesh index -> scene mesh indices, one per primitive
    let mut mesh_map: Vec<Vec<usize>> = Vec::new();
    for mesh in gltf.meshes() {
        let mut indices = Vec::new();
        let primitive_count = mesh.primitives().count();
        for (prim_idx, primitive) in mesh.primitives().enumerate() {
            let name = match (mesh.name(), primitive_count) {
                (Some(name), 1) => name.to_string(),
                (Some(name), _) => format!("{name}_{prim_idx}"),
                (None, _) => format!("mesh{}_{}", mesh.index(), prim_idx),
            };
            let converted = convert_primitive(&primitive, &buffers, name)?;
            indices.push(scene.add_mesh(converted));
        }
        mesh_map.push(indices);
    }

    let roots: Vec<Node> = match gltf.default_scene().or_else(|| gltf.scenes().next()) {
        Some(gltf_scene) => gltf_scene
            .nodes()
            .map(|node| convert_node(&node, &mesh_map))
            .collect(),
        None => mesh_map
            .iter()
            .enumerate()
            .map(|(i, meshes)| Node {
                name: format!("mesh{i}"),
                meshes: meshes.clone(),
                ..Default::default()
            })
            .collect(),
    };
    scene.root.children = roots;

    log::debug!(
        "glTF {}: {} meshes, {} materials, {} buffers",
        candidate.path(),
        scene.mesh_count(),
        scene.material_count() - 1,
        buffers.len()
    );
    Ok(scene)
}

/// Read the raw JSON for the version and extension checks.
///
/// Runs before the full parse, which refuses unknown required extensions
/// with a less useful message.
fn check_header(
    content: &[u8],
    is_glb: bool,
    ctx: &ImportContext<'_>,
) -> Result<(), ImportFailure> {
    let value: serde_json::Value = if is_glb {
        let glb = gltf::Glb::from_slice(content).map_err(|e| ImportFailure::Parse(e.to_string()))?;
        serde_json::from_slice(&glb.json)?
    } else {
        serde_json::from_slice(content)?
    };

    let version = value
        .get("asset")
        .and_then(|asset| asset.get("version"))
        .and_then(serde_json::Value::as_str)
        .unwrap_or("");
    if !version.starts_with('2') {
        return Err(ImportFailure::Unsupported(format!("glTF version '{version}'")));
    }

    for key in ["extensionsRequired", "extensionsUsed"] {
        let names = value.get(key).and_then(serde_json::Value::as_array);
        for name in names.into_iter().flatten().filter_map(serde_json::Value::as_str) {
            if ctx.is_extension_disabled(GLTF_INFO.id, name) {
                return Err(ImportFailure::DisabledExtension(name.to_string()));
            }
        }
    }

    Ok(())
}

fn resolve_buffers(
    gltf: &gltf::Gltf,
    ctx: &ImportContext<'_>,
) -> Result<Vec<Vec<u8>>, ImportFailure> {
    let mut buffers = Vec::new();

    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .ok_or_else(|| ImportFailure::Parse("GLB binary chunk missing".to_string()))?,
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => decode_data_uri(uri)?,
            gltf::buffer::Source::Uri(uri) => ctx.require(uri)?.into_owned(),
        };

        if data.len() < buffer.length() {
            return Err(ImportFailure::Parse(format!(
                "buffer {} holds {} bytes, {} declared",
                buffer.index(),
                data.len(),
                buffer.length()
            )));
        }
        buffers.push(data);
    }

    Ok(buffers)
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>, ImportFailure> {
    let encoded = uri
        .find(";base64,")
        .map(|i| &uri[i + ";base64,".len()..])
        .ok_or_else(|| ImportFailure::Unsupported("data URI without base64 payload".to_string()))?;

    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| ImportFailure::Parse(format!("data URI: {e}")))
}

/// Make sure every view and accessor lies inside its buffer.
fn check_ranges(gltf: &gltf::Gltf, buffers: &[Vec<u8>]) -> Result<(), ImportFailure> {
    for view in gltf.views() {
        let available = buffers.get(view.buffer().index()).map_or(0, Vec::len);
        if view.offset() + view.length() > available {
            return Err(ImportFailure::Parse(format!(
                "buffer view {} exceeds buffer {}",
                view.index(),
                view.buffer().index()
            )));
        }
    }

    for accessor in gltf.accessors() {
        let (Some(view), Some(last)) = (accessor.view(), accessor.count().checked_sub(1)) else {
            continue;
        };
        let stride = view.stride().unwrap_or(accessor.size());
        let end = accessor.offset() + stride * last + accessor.size();
        if end > view.length() {
            return Err(ImportFailure::Parse(format!(
                "accessor {} exceeds buffer view {}",
                accessor.index(),
                view.index()
            )));
        }
    }

    Ok(())
}

fn convert_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[Vec<u8>],
    name: String,
) -> Result<Mesh, ImportFailure> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let positions: Vec<Vec3> = reader
        .read_positions()
        .ok_or_else(|| ImportFailure::Parse(format!("primitive of {name} has no positions")))?
        .map(Vec3::from)
        .collect();

    let raw_indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let (primitive_kind, indices) = unroll(primitive.mode(), &raw_indices);
    let mut mesh = Mesh::new(name, positions, indices).with_primitive(primitive_kind);

    if let Some(normals) = reader.read_normals() {
        mesh.normals = Some(normals.map(Vec3::from).collect());
    }
    if let Some(uvs) = reader.read_tex_coords(0) {
        mesh.uvs = Some(uvs.into_f32().collect());
    }
    mesh.material = primitive.material().index().map_or(0, |i| i + 1);

    Ok(mesh)
}

/// Convert strips, fans and loops into plain lists.
fn unroll(mode: Mode, indices: &[u32]) -> (PrimitiveKind, Vec<u32>) {
    match mode {
        Mode::Points => (PrimitiveKind::Points, indices.to_vec()),
        Mode::Lines => (PrimitiveKind::Lines, indices.to_vec()),
        Mode::LineStrip | Mode::LineLoop => {
            let mut lines: Vec<u32> = indices.windows(2).flatten().copied().collect();
            if mode == Mode::LineLoop && indices.len() > 2 {
                lines.extend([indices[indices.len() - 1], indices[0]]);
            }
            (PrimitiveKind::Lines, lines)
        }
        Mode::Triangles => (PrimitiveKind::Triangles, indices.to_vec()),
        Mode::TriangleStrip => {
            let triangles = indices
                .windows(3)
                .enumerate()
                .flat_map(|(i, w)| if i % 2 == 0 { [w[0], w[1], w[2]] } else { [w[1], w[0], w[2]] })
                .collect();
            (PrimitiveKind::Triangles, triangles)
        }
        Mode::TriangleFan => {
            let triangles = match indices.split_first() {
                Some((&center, rest)) => {
                    rest.windows(2).flat_map(|w| [center, w[0], w[1]]).collect()
                }
                None => Vec::new(),
            };
            (PrimitiveKind::Triangles, triangles)
        }
    }
}

fn convert_material(source: &gltf::Material<'_>) -> Material {
    let pbr = source.pbr_metallic_roughness();
    let [r, g, b, a] = pbr.base_color_factor();

    Material {
        name: source
            .name()
            .map_or_else(|| format!("material{}", source.index().unwrap_or(0)), str::to_string),
        shading: ShadingModel::Pbr,
        diffuse: Vec3::new(r, g, b),
        emissive: Vec3::from(source.emissive_factor()),
        opacity: a,
        diffuse_texture: pbr.base_color_texture().map(|info| texture_path(&info.texture())),
        normal_texture: source.normal_texture().map(|info| texture_path(&info.texture())),
        ..Default::default()
    }
}

/// Texture reference as written: the URI, or `*N` for an embedded image.
fn texture_path(texture: &gltf::Texture<'_>) -> String {
    let image = texture.source();
    match image.source() {
        gltf::image::Source::Uri { uri, .. } => uri.to_string(),
        gltf::image::Source::View { .. } => format!("*{}", image.index()),
    }
}

fn convert_node(node: &gltf::Node<'_>, mesh_map: &[Vec<usize>]) -> Node {
    Node {
        name: node
            .name()
            .map_or_else(|| format!("node{}", node.index()), str::to_string),
        transform: Mat4::from_cols_array_2d(&node.transform().matrix()),
        meshes: node
            .mesh()
            .and_then(|mesh| mesh_map.get(mesh.index()))
            .cloned()
            .unwrap_or_default(),
        children: node
            .children()
            .map(|child| convert_node(&child, mesh_map))
            .collect(),
    }
}
