//! Object File Format (`OFF`, `COFF`, `NOFF`).

use glam::Vec3;

use crate::error::ImportFailure;
use crate::import::{Candidate, ImportContext, Importer, Recognition};
use crate::mesh::Mesh;
use crate::registry::FormatInfo;
use crate::scene::{Material, Scene};

static OFF_INFO: FormatInfo = FormatInfo {
    id: "off",
    name: "Object File Format",
    extensions: &["off"],
};

/// OFF importer. Polygons are fan-triangulated.
pub struct OffImporter;

impl Importer for OffImporter {
    fn info(&self) -> &FormatInfo {
        &OFF_INFO
    }

    fn recognize(&self, candidate: &Candidate<'_>, _ctx: &ImportContext<'_>) -> Recognition {
        if !OFF_INFO.matches_extension(candidate.path()) {
            return Recognition::NotRecognized;
        }
        let Some(text) = candidate.text() else {
            return Recognition::Failed(ImportFailure::Parse("not a text file".to_string()));
        };
        Recognition::from_result(parse_off(text).map(|mesh| {
            let mut scene = Scene::new(candidate.stem());
            scene.add_material(Material::fallback());
            let index = scene.add_mesh(mesh);
            scene.root.meshes.push(index);
            scene
        }))
    }
}

/// Non-empty, comment-stripped lines with their 1-based line numbers.
fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines().enumerate().filter_map(|(i, line)| {
        let line = line.split('#').next().unwrap_or("").trim();
        (!line.is_empty()).then_some((i + 1, line))
    })
}

fn parse_off(text: &str) -> Result<Mesh, ImportFailure> {
    let mut lines = content_lines(text).collect::<Vec<_>>().into_iter();

    let (line, header) = lines
        .next()
        .ok_or_else(|| ImportFailure::Parse("empty file".to_string()))?;
    let mut header_words = header.split_whitespace();
    let keyword = header_words.next().unwrap_or("");
    let has_normals = match keyword {
        "OFF" | "COFF" => false,
        "NOFF" | "CNOFF" => true,
        _ => {
            return Err(ImportFailure::ParseAt {
                line,
                message: format!("expected OFF header, found '{keyword}'"),
            })
        }
    };

    // Counts may share the header line
    let rest: Vec<&str> = header_words.collect();
    let (line, counts) = if rest.is_empty() {
        let (line, counts) = lines
            .next()
            .ok_or_else(|| ImportFailure::Parse("missing element counts".to_string()))?;
        (line, counts.split_whitespace().collect::<Vec<_>>())
    } else {
        (line, rest)
    };
    let count = |i: usize| -> Result<usize, ImportFailure> {
        counts
            .get(i)
            .and_then(|w| w.parse().ok())
            .ok_or_else(|| ImportFailure::ParseAt {
                line,
                message: "expected vertex and face counts".to_string(),
            })
    };
    let vertex_count = count(0)?;
    let face_count = count(1)?;

    // Every vertex and face takes a line of its own
    let remaining = lines.len();
    if vertex_count.checked_add(face_count).map_or(true, |needed| needed > remaining) {
        return Err(ImportFailure::ParseAt {
            line,
            message: format!(
                "header declares {vertex_count} vertices and {face_count} faces \
                 but only {remaining} lines follow"
            ),
        });
    }

    let mut positions = Vec::with_capacity(vertex_count);
    let mut normals = Vec::with_capacity(if has_normals { vertex_count } else { 0 });
    for _ in 0..vertex_count {
        let (line, text) = lines
            .next()
            .ok_or_else(|| ImportFailure::Parse("unexpected end of vertex list".to_string()))?;
        let values = parse_floats(text, line)?;
        let needed = if has_normals { 6 } else { 3 };
        if values.len() < needed {
            return Err(ImportFailure::ParseAt {
                line,
                message: format!("expected {needed} numbers per vertex"),
            });
        }
        positions.push(Vec3::new(values[0], values[1], values[2]));
        if has_normals {
            normals.push(Vec3::new(values[3], values[4], values[5]));
        }
    }

    let mut indices = Vec::with_capacity(face_count * 3);
    for _ in 0..face_count {
        let (line, text) = lines
            .next()
            .ok_or_else(|| ImportFailure::Parse("unexpected end of face list".to_string()))?;
        let mut words = text.split_whitespace().map(str::parse::<u32>);
        let corner_count = match words.next() {
            Some(Ok(n)) => n as usize,
            _ => {
                return Err(ImportFailure::ParseAt {
                    line,
                    message: "expected corner count".to_string(),
                })
            }
        };
        let corners = words
            .take(corner_count)
            .collect::<Result<Vec<u32>, _>>()
            .map_err(|e| ImportFailure::ParseAt {
                line,
                message: e.to_string(),
            })?;
        if corners.len() != corner_count {
            return Err(ImportFailure::ParseAt {
                line,
                message: format!("face declares {corner_count} corners"),
            });
        }
        if let Some(bad) = corners.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(ImportFailure::ParseAt {
                line,
                message: format!("vertex index {bad} out of range"),
            });
        }
        if let Some((&first, rest)) = corners.split_first() {
            for pair in rest.windows(2) {
                indices.extend([first, pair[0], pair[1]]);
            }
        }
    }

    let mut mesh = Mesh::new(String::new(), positions, indices);
    if has_normals {
        mesh.normals = Some(normals);
    }
    Ok(mesh)
}

fn parse_floats(text: &str, line: usize) -> Result<Vec<f32>, ImportFailure> {
    text.split_whitespace()
        .map(|w| {
            w.parse::<f32>().map_err(|_| ImportFailure::ParseAt {
                line,
                message: format!("invalid number '{w}'"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "OFF\n\
        # unit square\n\
        4 1 0\n\
        0 0 0\n1 0 0\n1 1 0\n0 1 0\n\
        4 0 1 2 3\n";

    #[test]
    fn test_parse_square() {
        let mesh = parse_off(SQUARE).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices, [0, 1, 2, 0, 2, 3]);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_counts_on_header_line() {
        let mesh = parse_off("OFF 3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n").unwrap();
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn test_colored_faces_ignored() {
        let mesh = parse_off("COFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2 255 0 0\n").unwrap();
        assert_eq!(mesh.indices, [0, 1, 2]);
    }

    #[test]
    fn test_out_of_range_index() {
        let err = parse_off("OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 7\n").unwrap_err();
        assert!(matches!(err, ImportFailure::ParseAt { line: 6, .. }));
    }

    #[test]
    fn test_counts_larger_than_file() {
        let err = parse_off("OFF\n1000000000000000000 0 0\n0 0 0\n").unwrap_err();
        assert!(matches!(err, ImportFailure::ParseAt { line: 2, .. }));

        let err = parse_off("OFF\n3 18446744073709551615 0\n0 0 0\n1 0 0\n0 1 0\n").unwrap_err();
        assert!(matches!(err, ImportFailure::ParseAt { line: 2, .. }));
    }

    #[test]
    fn test_bad_header() {
        let err = parse_off("PLY\n").unwrap_err();
        assert!(matches!(err, ImportFailure::ParseAt { line: 1, .. }));
    }
}
