//! Mesh geometry shared by every importer and exporter.
//!
//! Importers fill a [`Mesh`] from whatever their format stores; exporters
//! read it back. Positions and normals are `glam` vectors, indices are
//! grouped into faces by the mesh's [`PrimitiveKind`].

use glam::Vec3;

/// Face topology of a mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// One index per face.
    Points,
    /// Two indices per face.
    Lines,
    /// Three indices per face.
    #[default]
    Triangles,
}

impl PrimitiveKind {
    /// Number of indices making up one face.
    pub fn indices_per_face(self) -> usize {
        match self {
            Self::Points => 1,
            Self::Lines => 2,
            Self::Triangles => 3,
        }
    }
}

/// A mesh with positions, optional normals/UVs, and indexed faces.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    /// Mesh name (may be empty)
    pub name: String,

    /// Vertex positions
    pub positions: Vec<Vec3>,

    /// Vertex normals, one per position when present
    pub normals: Option<Vec<Vec3>>,

    /// First UV channel, one per position when present
    pub uvs: Option<Vec<[f32; 2]>>,

    /// Face indices, grouped by `primitive`
    pub indices: Vec<u32>,

    /// Face topology
    pub primitive: PrimitiveKind,

    /// Index into `Scene::materials`
    pub material: usize,
}

impl Mesh {
    /// Create a triangle mesh from positions and indices.
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            positions,
            indices,
            ..Default::default()
        }
    }

    /// Set vertex normals.
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Set the material index.
    pub fn with_material(mut self, material: usize) -> Self {
        self.material = material;
        self
    }

    /// Set the face topology.
    pub fn with_primitive(mut self, primitive: PrimitiveKind) -> Self {
        self.primitive = primitive;
        self
    }

    /// Axis-aligned bounds as `(min, max)`, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))),
        )
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Faces are counter-clockwise. Only triangle meshes get normals.
    pub fn compute_normals(&mut self) {
        if self.primitive != PrimitiveKind::Triangles {
            return;
        }

        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for face in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            *normal = normal.try_normalize().unwrap_or(Vec3::Y);
        }

        self.normals = Some(normals);
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of faces.
    pub fn face_count(&self) -> usize {
        self.indices.len() / self.primitive.indices_per_face()
    }

    /// Iterate complete faces.
    pub fn faces(&self) -> impl Iterator<Item = &[u32]> {
        self.indices.chunks_exact(self.primitive.indices_per_face())
    }

    /// Check that every index points at a vertex and that per-vertex
    /// attributes match the vertex count.
    pub fn validate(&self) -> Result<(), String> {
        let count = self.positions.len();
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= count) {
            return Err(format!(
                "mesh '{}' index {} out of range for {} vertices",
                self.name, bad, count
            ));
        }
        if self.normals.as_ref().is_some_and(|n| n.len() != count) {
            return Err(format!("mesh '{}' normal count does not match vertex count", self.name));
        }
        if self.uvs.as_ref().is_some_and(|uv| uv.len() != count) {
            return Err(format!("mesh '{}' uv count does not match vertex count", self.name));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Mesh {
        Mesh::new(
            "tri",
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = triangle();

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.face_count(), 1);
        assert!(mesh.normals.is_none());
        assert_eq!(mesh.primitive, PrimitiveKind::Triangles);
    }

    #[test]
    fn test_compute_normals_ccw() {
        let mut mesh = triangle();
        mesh.compute_normals();

        // CCW triangle in the XY plane faces +Z
        for normal in mesh.normals.as_ref().unwrap() {
            assert!((normal.z - 1.0).abs() < 0.001);
        }
    }

    #[test]
    fn test_bounds_computation() {
        let mesh = Mesh::new(
            "b",
            vec![
                Vec3::new(-1.0, -2.0, -3.0),
                Vec3::new(4.0, 5.0, 6.0),
                Vec3::ZERO,
            ],
            vec![0, 1, 2],
        );

        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(max, Vec3::new(4.0, 5.0, 6.0));
        assert!(Mesh::default().bounds().is_none());
    }

    #[test]
    fn test_faces_by_primitive() {
        let mesh = Mesh::new("l", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 1, 2])
            .with_primitive(PrimitiveKind::Lines);

        assert_eq!(mesh.face_count(), 2);
        let faces: Vec<_> = mesh.faces().collect();
        assert_eq!(faces, [&[0, 1][..], &[1, 2][..]]);
    }

    #[test]
    fn test_validate_rejects_bad_index() {
        let mesh = Mesh::new("bad", vec![Vec3::ZERO], vec![0, 1, 2]);
        assert!(mesh.validate().is_err());
        assert!(triangle().validate().is_ok());
    }
}
