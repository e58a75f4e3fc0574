//! Wavefront OBJ with MTL material libraries.
//!
//! Import goes through `tobj`. Material libraries are optional
//! dependencies: an OBJ whose `mtllib` cannot be found still imports, with
//! every face on the default material, unless the conversion is strict.

use std::fmt::Write as _;
use std::io::BufReader;
use std::path::Path;

use glam::Vec3;

use crate::error::{ExportFailure, ImportFailure};
use crate::export::{ExportCollector, Exporter};
use crate::import::{Candidate, ImportContext, Importer, Recognition};
use crate::mesh::{Mesh, PrimitiveKind};
use crate::registry::FormatInfo;
use crate::scene::{Material, Node, Scene, ShadingModel};

static OBJ_INFO: FormatInfo = FormatInfo {
    id: "obj",
    name: "Wavefront OBJ",
    extensions: &["obj"],
};

/// OBJ importer.
pub struct ObjImporter;

impl Importer for ObjImporter {
    fn info(&self) -> &FormatInfo {
        &OBJ_INFO
    }

    fn recognize(&self, candidate: &Candidate<'_>, ctx: &ImportContext<'_>) -> Recognition {
        if !OBJ_INFO.matches_extension(candidate.path()) {
            return Recognition::NotRecognized;
        }
        Recognition::from_result(load_obj(candidate, ctx))
    }
}

fn load_obj(candidate: &Candidate<'_>, ctx: &ImportContext<'_>) -> Result<Scene, ImportFailure> {
    let options = tobj::LoadOptions {
        single_index: true,
        triangulate: false,
        ..Default::default()
    };

    let mut reader = BufReader::new(candidate.content());
    let (models, materials) = tobj::load_obj_buf(&mut reader, &options, |mtl_path: &Path| {
        let reference = mtl_path.to_string_lossy();
        match ctx.optional(&reference) {
            Some(bytes) => {
                let mut slice: &[u8] = &bytes;
                tobj::load_mtl_buf(&mut slice)
            }
            None => Err(tobj::LoadError::OpenFileFailed),
        }
    })
    .map_err(|e| ImportFailure::Parse(e.to_string()))?;

    let materials = match materials {
        Ok(materials) => materials,
        Err(e) => {
            // A library that exists but does not parse is still an error.
            // Libraries that were not found have already been recorded.
            if ctx.misses().is_empty() {
                return Err(ImportFailure::Parse(format!("material library: {e}")));
            }
            Vec::new()
        }
    };

    let mut scene = Scene::new(candidate.stem());
    scene.add_material(Material::fallback());
    for material in &materials {
        scene.add_material(convert_material(material));
    }

    for model in &models {
        let mut node = Node::new(model.name.clone());
        for mesh in convert_model(model, scene.material_count()) {
            node.meshes.push(scene.add_mesh(mesh));
        }
        if !node.meshes.is_empty() {
            scene.root.children.push(node);
        }
    }

    // A file without faces is a point cloud over every vertex
    if scene.meshes.is_empty() {
        let text = candidate
            .text()
            .ok_or_else(|| ImportFailure::Parse("not a text file".to_string()))?;
        let cloud = point_cloud(text, candidate.stem())?;
        if cloud.positions.is_empty() {
            return Err(ImportFailure::Parse("no geometry".to_string()));
        }
        let index = scene.add_mesh(cloud);
        scene.root.meshes.push(index);
    }

    log::debug!(
        "OBJ {}: {} meshes, {} materials",
        candidate.path(),
        scene.mesh_count(),
        materials.len()
    );
    Ok(scene)
}

/// Split one OBJ object into a mesh per face kind: points, lines, then
/// triangles. Polygons are fan-triangulated. Meshes share the object's
/// vertex buffer.
fn convert_model(model: &tobj::Model, material_count: usize) -> Vec<Mesh> {
    let source = &model.mesh;

    let mut points = Vec::new();
    let mut lines = Vec::new();
    let mut triangles = Vec::new();
    if source.face_arities.is_empty() {
        triangles.extend_from_slice(&source.indices);
    } else {
        let mut offset = 0;
        for &arity in &source.face_arities {
            let Some(face) = source.indices.get(offset..offset + arity as usize) else {
                break;
            };
            offset += face.len();
            match face {
                [] => {}
                [a] => points.push(*a),
                [a, b] => lines.extend([*a, *b]),
                [first, rest @ ..] => {
                    for pair in rest.windows(2) {
                        triangles.extend([*first, pair[0], pair[1]]);
                    }
                }
            }
        }
    }

    let positions: Vec<Vec3> = source
        .positions
        .chunks_exact(3)
        .map(|p| Vec3::new(p[0], p[1], p[2]))
        .collect();
    let normals = (source.normals.len() == source.positions.len()).then(|| {
        source
            .normals
            .chunks_exact(3)
            .map(|n| Vec3::new(n[0], n[1], n[2]))
            .collect::<Vec<_>>()
    });
    let uvs = (!source.texcoords.is_empty() && source.texcoords.len() / 2 == positions.len())
        .then(|| source.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]).collect::<Vec<_>>());

    // Index 0 is the default material, library materials follow
    let material = source
        .material_id
        .map(|id| id + 1)
        .filter(|&id| id < material_count)
        .unwrap_or(0);

    [
        (PrimitiveKind::Points, points),
        (PrimitiveKind::Lines, lines),
        (PrimitiveKind::Triangles, triangles),
    ]
    .into_iter()
    .filter(|(_, indices)| !indices.is_empty())
    .map(|(primitive, indices)| {
        let mut mesh = Mesh::new(model.name.clone(), positions.clone(), indices)
            .with_primitive(primitive)
            .with_material(material);
        mesh.normals = normals.clone();
        mesh.uvs = uvs.clone();
        mesh
    })
    .collect()
}

/// Every `v` line as one point.
fn point_cloud(text: &str, name: &str) -> Result<Mesh, ImportFailure> {
    let mut positions = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let mut words = line.split_whitespace();
        if words.next() != Some("v") {
            continue;
        }
        let rest: Vec<&str> = words.take(3).collect();
        let position = parse_vec3(&rest.join(" ")).ok_or_else(|| ImportFailure::ParseAt {
            line: i + 1,
            message: "expected three vertex coordinates".to_string(),
        })?;
        positions.push(position);
    }

    let indices = (0..positions.len() as u32).collect();
    Ok(Mesh::new(name, positions, indices).with_primitive(PrimitiveKind::Points))
}

fn convert_material(source: &tobj::Material) -> Material {
    let defaults = Material::default();
    Material {
        name: source.name.clone(),
        shading: source
            .illumination_model
            .map_or(ShadingModel::Gouraud, ShadingModel::from_illum),
        ambient: source.ambient.map_or(defaults.ambient, Vec3::from),
        diffuse: source.diffuse.map_or(defaults.diffuse, Vec3::from),
        specular: source.specular.map_or(defaults.specular, Vec3::from),
        emissive: source
            .unknown_param
            .get("Ke")
            .and_then(|value| parse_vec3(value))
            .unwrap_or(defaults.emissive),
        shininess: source.shininess.unwrap_or(defaults.shininess),
        opacity: source.dissolve.unwrap_or(defaults.opacity),
        refraction_index: source.optical_density.unwrap_or(defaults.refraction_index),
        diffuse_texture: source.diffuse_texture.clone(),
        specular_texture: source.specular_texture.clone(),
        normal_texture: source.normal_texture.clone(),
    }
}

fn parse_vec3(value: &str) -> Option<Vec3> {
    let mut parts = value.split_whitespace().map(str::parse::<f32>);
    let x = parts.next()?.ok()?;
    let y = parts.next()?.ok()?;
    let z = parts.next()?.ok()?;
    Some(Vec3::new(x, y, z))
}

/// OBJ exporter. Emits `{stem}.obj` then `{stem}.mtl`.
pub struct ObjExporter;

impl Exporter for ObjExporter {
    fn info(&self) -> &FormatInfo {
        &OBJ_INFO
    }

    fn write(&self, scene: &Scene, out: &mut ExportCollector) -> Result<(), ExportFailure> {
        let obj_path = out.default_path("obj");
        let mtl_path = out.default_path("mtl");

        let obj = write_obj(scene, &mtl_path);
        let mtl = write_mtl(scene);

        out.emit(obj_path, obj.into_bytes());
        out.emit(mtl_path, mtl.into_bytes());
        Ok(())
    }
}

fn write_obj(scene: &Scene, mtl_name: &str) -> String {
    let mut obj = String::new();
    let _ = writeln!(obj, "# {}", scene.name);
    let _ = writeln!(obj, "mtllib {}", mtl_name);

    // OBJ indices are 1-based and global across objects
    let mut base = [1usize; 3];

    for instance in scene.instances() {
        let Some(mesh) = scene.meshes.get(instance.mesh) else {
            continue;
        };

        let name = if mesh.name.is_empty() { "mesh" } else { &mesh.name };
        let _ = writeln!(obj, "o {}", name);

        for p in &mesh.positions {
            let p = instance.point(*p);
            let _ = writeln!(obj, "v {} {} {}", p.x, p.y, p.z);
        }
        if let Some(uvs) = &mesh.uvs {
            for uv in uvs {
                let _ = writeln!(obj, "vt {} {}", uv[0], uv[1]);
            }
        }
        if let Some(normals) = &mesh.normals {
            for n in normals {
                let n = instance.normal(*n);
                let _ = writeln!(obj, "vn {} {} {}", n.x, n.y, n.z);
            }
        }

        if let Some(material) = scene.materials.get(mesh.material) {
            let _ = writeln!(obj, "usemtl {}", material.name);
        }

        let keyword = match mesh.primitive {
            PrimitiveKind::Points => "p",
            PrimitiveKind::Lines => "l",
            PrimitiveKind::Triangles => "f",
        };
        for face in mesh.faces() {
            obj.push_str(keyword);
            for &index in face {
                let i = index as usize;
                let v = base[0] + i;
                let _ = match (mesh.uvs.is_some(), mesh.normals.is_some()) {
                    (true, true) => write!(obj, " {}/{}/{}", v, base[1] + i, base[2] + i),
                    (true, false) => write!(obj, " {}/{}", v, base[1] + i),
                    (false, true) => write!(obj, " {}//{}", v, base[2] + i),
                    (false, false) => write!(obj, " {}", v),
                };
            }
            obj.push('\n');
        }

        base[0] += mesh.positions.len();
        base[1] += mesh.uvs.as_ref().map_or(0, Vec::len);
        base[2] += mesh.normals.as_ref().map_or(0, Vec::len);
    }

    obj
}

fn write_mtl(scene: &Scene) -> String {
    let mut mtl = String::new();
    for material in &scene.materials {
        let illum = match material.shading {
            ShadingModel::Unlit => 0,
            ShadingModel::Phong | ShadingModel::Blinn => 2,
            _ => 1,
        };
        let _ = writeln!(mtl, "newmtl {}", material.name);
        for (key, c) in [
            ("Ka", material.ambient),
            ("Kd", material.diffuse),
            ("Ks", material.specular),
            ("Ke", material.emissive),
        ] {
            let _ = writeln!(mtl, "{} {} {} {}", key, c.x, c.y, c.z);
        }
        let _ = writeln!(mtl, "Ns {}", material.shininess);
        let _ = writeln!(mtl, "d {}", material.opacity);
        let _ = writeln!(mtl, "Ni {}", material.refraction_index);
        let _ = writeln!(mtl, "illum {}", illum);
        if let Some(texture) = &material.diffuse_texture {
            let _ = writeln!(mtl, "map_Kd {}", texture);
        }
        if let Some(texture) = &material.specular_texture {
            let _ = writeln!(mtl, "map_Ks {}", texture);
        }
        if let Some(texture) = &material.normal_texture {
            let _ = writeln!(mtl, "norm {}", texture);
        }
        mtl.push('\n');
    }
    mtl
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DEFAULT_GATES;
    use crate::source::FileStore;

    const CUBE_OBJ: &str = "mtllib cube.mtl\n\
        v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
        usemtl red\n\
        f 1 2 3 4\n";

    const CUBE_MTL: &str = "newmtl red\nKd 1 0 0\nKs 0.5 0.5 0.5\nillum 2\n";

    fn import(store: &FileStore, entry: &str) -> Recognition {
        let content = store.lookup(entry).unwrap();
        let candidate = Candidate::new(entry, content);
        let ctx = ImportContext::new(store, entry, &DEFAULT_GATES);
        ObjImporter.recognize(&candidate, &ctx)
    }

    #[test]
    fn test_import_with_library() {
        let store: FileStore = [("cube.obj", CUBE_OBJ), ("cube.mtl", CUBE_MTL)]
            .into_iter()
            .collect();

        let Recognition::Parsed(scene) = import(&store, "cube.obj") else {
            panic!("expected parsed scene");
        };
        assert_eq!(scene.material_count(), 2);
        assert_eq!(scene.materials[0].name, Material::DEFAULT_NAME);

        let red = &scene.materials[1];
        assert_eq!(red.diffuse, Vec3::X);
        assert_eq!(red.specular, Vec3::splat(0.5));
        assert_eq!(red.shading, ShadingModel::Phong);

        // Quad is triangulated
        assert_eq!(scene.meshes[0].face_count(), 2);
        assert_eq!(scene.meshes[0].material, 1);
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_missing_library_recorded() {
        let store: FileStore = [("cube.obj", CUBE_OBJ)].into_iter().collect();
        let content = store.lookup("cube.obj").unwrap();
        let candidate = Candidate::new("cube.obj", content);
        let ctx = ImportContext::new(&store, "cube.obj", &DEFAULT_GATES);

        let Recognition::Parsed(scene) = ObjImporter.recognize(&candidate, &ctx) else {
            panic!("expected parsed scene");
        };
        assert_eq!(scene.material_count(), 1);
        assert_eq!(scene.meshes[0].material, 0);
        assert_eq!(ctx.misses(), ["cube.mtl"]);
    }

    #[test]
    fn test_other_extensions_ignored() {
        let store: FileStore = [("cube.mtl", CUBE_MTL)].into_iter().collect();
        assert!(matches!(import(&store, "cube.mtl"), Recognition::NotRecognized));
    }

    #[test]
    fn test_bad_vertex_fails() {
        let store: FileStore = [("bad.obj", "v 1 2 x\nf 1 1 1\n")].into_iter().collect();
        assert!(matches!(import(&store, "bad.obj"), Recognition::Failed(_)));
    }

    #[test]
    fn test_lines_and_points_keep_their_kind() {
        let store: FileStore = [(
            "mixed.obj",
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nl 1 2\nl 2 3\nf 1 2 4 3\n",
        )]
        .into_iter()
        .collect();
        let Recognition::Parsed(scene) = import(&store, "mixed.obj") else {
            panic!("expected parsed scene");
        };

        let kinds: Vec<_> = scene.meshes.iter().map(|m| m.primitive).collect();
        assert_eq!(kinds, [PrimitiveKind::Lines, PrimitiveKind::Triangles]);

        let lines: Vec<_> = scene.meshes[0].faces().map(|f| f.len()).collect();
        assert_eq!(lines, [2, 2]);
        assert_eq!(scene.meshes[1].face_count(), 2);
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_vertex_only_file_is_point_cloud() {
        let store: FileStore = [("cloud.obj", "# scan\nv 0 0 0\nv 1 0 0\nv 0 1 0\n")]
            .into_iter()
            .collect();
        let Recognition::Parsed(scene) = import(&store, "cloud.obj") else {
            panic!("expected parsed scene");
        };

        assert_eq!(scene.mesh_count(), 1);
        let cloud = &scene.meshes[0];
        assert_eq!(cloud.primitive, PrimitiveKind::Points);
        assert_eq!(cloud.positions, [Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(cloud.face_count(), 3);
        assert_eq!(scene.root.meshes, [0]);
    }

    #[test]
    fn test_empty_file_fails() {
        let store: FileStore = [("empty.obj", "# nothing\n")].into_iter().collect();
        assert!(matches!(import(&store, "empty.obj"), Recognition::Failed(_)));
    }

    #[test]
    fn test_export_round_trip_names() {
        let store: FileStore = [("cube.obj", CUBE_OBJ), ("cube.mtl", CUBE_MTL)]
            .into_iter()
            .collect();
        let Recognition::Parsed(scene) = import(&store, "cube.obj") else {
            panic!("expected parsed scene");
        };

        let mut out = ExportCollector::new("result");
        ObjExporter.write(&scene, &mut out).unwrap();
        let outputs = out.into_outputs();

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].path(), "result.obj");
        assert_eq!(outputs[1].path(), "result.mtl");

        let obj = std::str::from_utf8(outputs[0].content()).unwrap();
        assert!(obj.contains("mtllib result.mtl"));
        assert!(obj.contains("usemtl red"));
        assert_eq!(obj.lines().filter(|l| l.starts_with("f ")).count(), 2);

        let mtl = std::str::from_utf8(outputs[1].content()).unwrap();
        assert!(mtl.contains("newmtl DefaultMaterial"));
        assert!(mtl.contains("newmtl red"));
    }
}
