//! Stereolithography, ASCII and binary on import, ASCII on export.

use std::fmt::Write as _;
use std::str::SplitWhitespace;

use glam::Vec3;

use crate::error::{ExportFailure, ImportFailure};
use crate::export::{ExportCollector, Exporter};
use crate::import::{Candidate, ImportContext, Importer, Recognition};
use crate::mesh::{Mesh, PrimitiveKind};
use crate::registry::FormatInfo;
use crate::scene::{Material, Scene};

static STL_INFO: FormatInfo = FormatInfo {
    id: "stl",
    name: "Stereolithography",
    extensions: &["stl"],
};

const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;

/// STL importer.
pub struct StlImporter;

impl Importer for StlImporter {
    fn info(&self) -> &FormatInfo {
        &STL_INFO
    }

    fn recognize(&self, candidate: &Candidate<'_>, _ctx: &ImportContext<'_>) -> Recognition {
        if !STL_INFO.matches_extension(candidate.path()) {
            return Recognition::NotRecognized;
        }
        Recognition::from_result(load_stl(candidate))
    }
}

fn load_stl(candidate: &Candidate<'_>) -> Result<Scene, ImportFailure> {
    let content = candidate.content();

    let mesh = if is_binary(content) {
        parse_binary(content)?
    } else {
        let text = candidate
            .text()
            .ok_or_else(|| ImportFailure::Parse("neither binary nor ASCII STL".to_string()))?;
        parse_ascii(text)?
    };

    if mesh.positions.is_empty() {
        return Err(ImportFailure::Parse("no facets".to_string()));
    }

    let mut scene = Scene::new(candidate.stem());
    scene.add_material(Material::fallback());
    let index = scene.add_mesh(mesh);
    scene.root.meshes.push(index);
    Ok(scene)
}

/// Binary files declare their triangle count; an exact size match wins over
/// a header that happens to start with `solid`.
fn is_binary(content: &[u8]) -> bool {
    if content.len() < HEADER_LEN + 4 {
        return false;
    }
    let count = u32::from_le_bytes([content[80], content[81], content[82], content[83]]) as usize;
    let expected = count.checked_mul(TRIANGLE_LEN).map(|body| HEADER_LEN + 4 + body);
    expected == Some(content.len()) || !content.trim_ascii_start().starts_with(b"solid")
}

fn parse_binary(content: &[u8]) -> Result<Mesh, ImportFailure> {
    let count = u32::from_le_bytes([content[80], content[81], content[82], content[83]]) as usize;
    let body = &content[HEADER_LEN + 4..];
    if count.checked_mul(TRIANGLE_LEN).map_or(true, |needed| body.len() < needed) {
        return Err(ImportFailure::Parse(format!(
            "binary STL declares {} facets but holds {} bytes",
            count,
            body.len()
        )));
    }

    let read_vec3 = |bytes: &[u8]| {
        let f = |i: usize| f32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Vec3::new(f(0), f(4), f(8))
    };

    let mut positions = Vec::with_capacity(count * 3);
    let mut normals = Vec::with_capacity(count * 3);
    for facet in body.chunks_exact(TRIANGLE_LEN).take(count) {
        let normal = read_vec3(&facet[0..12]);
        for corner in 0..3 {
            let start = 12 + corner * 12;
            positions.push(read_vec3(&facet[start..start + 12]));
            normals.push(normal);
        }
    }

    Ok(facet_mesh(String::new(), positions, normals))
}

fn parse_ascii(text: &str) -> Result<Mesh, ImportFailure> {
    let mut name = String::new();
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut facet_normal = Vec3::ZERO;
    let mut corners = 0;

    for (line_no, line) in text.lines().enumerate() {
        let mut words = line.split_whitespace();
        let parse_vec3 = |words: &mut SplitWhitespace<'_>| -> Result<Vec3, ImportFailure> {
            let mut v = [0.0f32; 3];
            for slot in &mut v {
                *slot = words
                    .next()
                    .and_then(|w| w.parse().ok())
                    .ok_or_else(|| ImportFailure::ParseAt {
                        line: line_no + 1,
                        message: "expected three numbers".to_string(),
                    })?;
            }
            Ok(Vec3::from(v))
        };

        match words.next() {
            Some("solid") => name = words.collect::<Vec<_>>().join(" "),
            Some("facet") => {
                if words.next() != Some("normal") {
                    return Err(ImportFailure::ParseAt {
                        line: line_no + 1,
                        message: "expected 'facet normal'".to_string(),
                    });
                }
                facet_normal = parse_vec3(&mut words)?;
                corners = 0;
            }
            Some("vertex") => {
                positions.push(parse_vec3(&mut words)?);
                normals.push(facet_normal);
                corners += 1;
            }
            Some("endfacet") if corners != 3 => {
                return Err(ImportFailure::ParseAt {
                    line: line_no + 1,
                    message: format!("facet with {corners} vertices"),
                });
            }
            _ => {}
        }
    }

    if positions.len() % 3 != 0 {
        return Err(ImportFailure::Parse("unterminated facet".to_string()));
    }

    Ok(facet_mesh(name, positions, normals))
}

/// Unshared facet vertices; a zero facet normal is replaced by a computed one.
fn facet_mesh(name: String, positions: Vec<Vec3>, normals: Vec<Vec3>) -> Mesh {
    let indices = (0..positions.len() as u32).collect();
    let mut mesh = Mesh::new(name, positions, indices);
    if normals.iter().all(|n| *n == Vec3::ZERO) {
        mesh.compute_normals();
    } else {
        mesh.normals = Some(normals);
    }
    mesh
}

/// ASCII STL exporter. Only triangle meshes are written.
pub struct StlExporter;

impl Exporter for StlExporter {
    fn info(&self) -> &FormatInfo {
        &STL_INFO
    }

    fn write(&self, scene: &Scene, out: &mut ExportCollector) -> Result<(), ExportFailure> {
        let mut stl = String::new();
        let _ = writeln!(stl, "solid {}", scene.name);

        let mut facets = 0usize;
        for instance in scene.instances() {
            let Some(mesh) = scene.meshes.get(instance.mesh) else {
                continue;
            };
            if mesh.primitive != PrimitiveKind::Triangles {
                continue;
            }
            for face in mesh.faces() {
                let [a, b, c] = [0, 1, 2].map(|i| instance.point(mesh.positions[face[i] as usize]));
                let normal = (b - a).cross(c - a).normalize_or_zero();
                let _ = writeln!(stl, "  facet normal {} {} {}", normal.x, normal.y, normal.z);
                stl.push_str("    outer loop\n");
                for v in [a, b, c] {
                    let _ = writeln!(stl, "      vertex {} {} {}", v.x, v.y, v.z);
                }
                stl.push_str("    endloop\n  endfacet\n");
                facets += 1;
            }
        }

        let _ = writeln!(stl, "endsolid {}", scene.name);
        log::debug!("STL export: {} facets", facets);
        out.emit(out.default_path("stl"), stl.into_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_TRIANGLE: &str = "solid tri\n\
        facet normal 0 0 1\n\
        outer loop\n\
        vertex 0 0 0\n\
        vertex 1 0 0\n\
        vertex 0 1 0\n\
        endloop\n\
        endfacet\n\
        endsolid tri\n";

    fn binary_triangle() -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data.extend_from_slice(&1u32.to_le_bytes());
        let floats = [0.0f32, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        for f in floats {
            data.extend_from_slice(&f.to_le_bytes());
        }
        data.extend_from_slice(&0u16.to_le_bytes());
        data
    }

    #[test]
    fn test_parse_ascii() {
        let mesh = parse_ascii(ASCII_TRIANGLE).unwrap();
        assert_eq!(mesh.name, "tri");
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.normals.as_ref().unwrap()[0], Vec3::Z);
    }

    #[test]
    fn test_parse_binary() {
        let data = binary_triangle();
        assert!(is_binary(&data));

        let mesh = parse_binary(&data).unwrap();
        assert_eq!(mesh.positions, [Vec3::ZERO, Vec3::X, Vec3::Y]);
    }

    #[test]
    fn test_binary_header_starting_with_solid() {
        let mut data = binary_triangle();
        data[..5].copy_from_slice(b"solid");
        assert!(is_binary(&data));
    }

    #[test]
    fn test_declared_count_exceeds_body() {
        let mut data = binary_triangle();
        data[80..84].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(parse_binary(&data), Err(ImportFailure::Parse(_))));
    }

    #[test]
    fn test_bad_vertex_reports_line() {
        let text = "solid x\nfacet normal 0 0 1\nvertex 0 zero 0\n";
        let err = parse_ascii(text).unwrap_err();
        assert!(matches!(err, ImportFailure::ParseAt { line: 3, .. }));
    }

    #[test]
    fn test_export_ascii() {
        let mut scene = Scene::new("tri");
        scene.add_material(Material::fallback());
        let mesh = scene.add_mesh(parse_ascii(ASCII_TRIANGLE).unwrap());
        scene.root.meshes.push(mesh);

        let mut out = ExportCollector::new("result");
        StlExporter.write(&scene, &mut out).unwrap();
        let outputs = out.into_outputs();

        assert_eq!(outputs[0].path(), "result.stl");
        let text = std::str::from_utf8(outputs[0].content()).unwrap();
        assert!(text.starts_with("solid tri\n"));
        assert!(text.contains("facet normal 0 0 1"));
        assert_eq!(text.matches("vertex").count(), 3);
    }
}
