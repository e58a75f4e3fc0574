//! Scene graph produced by importers and consumed by exporters.
//!
//! The model is deliberately small: a node hierarchy referencing meshes by
//! index, and a material list referenced by each mesh.

use glam::{Mat4, Vec3};

use crate::mesh::Mesh;

/// Lighting model of a material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShadingModel {
    Flat,
    #[default]
    Gouraud,
    Phong,
    Blinn,
    Unlit,
    Pbr,
}

impl ShadingModel {
    /// Numeric code written to `$mat.shadingm`.
    pub fn code(self) -> i32 {
        match self {
            Self::Flat => 1,
            Self::Gouraud => 2,
            Self::Phong => 3,
            Self::Blinn => 4,
            Self::Unlit => 9,
            Self::Pbr => 11,
        }
    }

    /// Map a Wavefront `illum` model onto a shading model.
    pub fn from_illum(illum: u8) -> Self {
        match illum {
            0 => Self::Unlit,
            1 => Self::Gouraud,
            2 => Self::Phong,
            _ => Self::Gouraud,
        }
    }
}

/// Value of a single material property.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    String(String),
    Int(i32),
    Float(f32),
    Color([f32; 3]),
}

impl PropertyValue {
    /// Property type code: 1 float data, 3 string, 4 integer.
    pub fn type_code(&self) -> u32 {
        match self {
            Self::Float(_) | Self::Color(_) => 1,
            Self::String(_) => 3,
            Self::Int(_) => 4,
        }
    }
}

/// One entry of a material's ordered property list.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialProperty {
    pub key: &'static str,
    /// Texture slot for `$tex.*` keys, 0 otherwise
    pub semantic: u32,
    pub index: u32,
    pub value: PropertyValue,
}

impl MaterialProperty {
    fn plain(key: &'static str, value: PropertyValue) -> Self {
        Self {
            key,
            semantic: 0,
            index: 0,
            value,
        }
    }
}

/// Texture slot codes used as `semantic` for `$tex.file` properties.
pub const TEXTURE_DIFFUSE: u32 = 1;
pub const TEXTURE_SPECULAR: u32 = 2;
pub const TEXTURE_NORMALS: u32 = 6;

/// A Phong-style material with optional texture references.
///
/// Texture paths are kept as written in the source file; they are never
/// resolved or loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub shading: ShadingModel,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub emissive: Vec3,
    pub shininess: f32,
    /// 0 = transparent, 1 = opaque
    pub opacity: f32,
    pub refraction_index: f32,
    pub diffuse_texture: Option<String>,
    pub specular_texture: Option<String>,
    pub normal_texture: Option<String>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            shading: ShadingModel::Gouraud,
            ambient: Vec3::ZERO,
            diffuse: Vec3::splat(0.6),
            specular: Vec3::ZERO,
            emissive: Vec3::ZERO,
            shininess: 0.0,
            opacity: 1.0,
            refraction_index: 1.0,
            diffuse_texture: None,
            specular_texture: None,
            normal_texture: None,
        }
    }
}

impl Material {
    /// Name of the fallback material importers put at index 0.
    pub const DEFAULT_NAME: &'static str = "DefaultMaterial";

    /// Create a material with a name and diffuse color.
    pub fn new(name: impl Into<String>, diffuse: Vec3) -> Self {
        Self {
            name: name.into(),
            diffuse,
            ..Default::default()
        }
    }

    /// The fallback material.
    pub fn fallback() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            ..Default::default()
        }
    }

    /// Ordered property list.
    ///
    /// Order is fixed: name, shading model, ambient, diffuse, specular,
    /// emissive, shininess, opacity, refraction index, then texture slots.
    pub fn properties(&self) -> Vec<MaterialProperty> {
        let color = |v: Vec3| PropertyValue::Color(v.to_array());
        let mut props = vec![
            MaterialProperty::plain("?mat.name", PropertyValue::String(self.name.clone())),
            MaterialProperty::plain("$mat.shadingm", PropertyValue::Int(self.shading.code())),
            MaterialProperty::plain("$clr.ambient", color(self.ambient)),
            MaterialProperty::plain("$clr.diffuse", color(self.diffuse)),
            MaterialProperty::plain("$clr.specular", color(self.specular)),
            MaterialProperty::plain("$clr.emissive", color(self.emissive)),
            MaterialProperty::plain("$mat.shininess", PropertyValue::Float(self.shininess)),
            MaterialProperty::plain("$mat.opacity", PropertyValue::Float(self.opacity)),
            MaterialProperty::plain("$mat.refracti", PropertyValue::Float(self.refraction_index)),
        ];

        let textures = [
            (TEXTURE_DIFFUSE, &self.diffuse_texture),
            (TEXTURE_SPECULAR, &self.specular_texture),
            (TEXTURE_NORMALS, &self.normal_texture),
        ];
        for (semantic, texture) in textures {
            if let Some(path) = texture {
                props.push(MaterialProperty {
                    key: "$tex.file",
                    semantic,
                    index: 0,
                    value: PropertyValue::String(path.clone()),
                });
            }
        }

        props
    }
}

/// A node in the scene hierarchy.
#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    /// Transform relative to the parent
    pub transform: Mat4,
    /// Indices into `Scene::meshes`
    pub meshes: Vec<usize>,
    pub children: Vec<Node>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Mat4::IDENTITY,
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl Node {
    /// Create an empty node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Visit this node and its descendants depth-first, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// A mesh placed in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instance {
    /// Index into `Scene::meshes`
    pub mesh: usize,
    pub world: Mat4,
}

impl Instance {
    /// Transform a position into world space.
    pub fn point(&self, p: Vec3) -> Vec3 {
        self.world.transform_point3(p)
    }

    /// Transform a normal into world space.
    pub fn normal(&self, n: Vec3) -> Vec3 {
        let normal_matrix = self.world.inverse().transpose();
        normal_matrix.transform_vector3(n).try_normalize().unwrap_or(n)
    }
}

fn collect_instances(node: &Node, parent: Mat4, out: &mut Vec<Instance>) {
    let world = parent * node.transform;
    out.extend(node.meshes.iter().map(|&mesh| Instance { mesh, world }));
    for child in &node.children {
        collect_instances(child, world, out);
    }
}

/// A complete imported scene.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    /// Scene name (usually the entry file's stem)
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub root: Node,
}

impl Scene {
    /// Create an empty scene with a root node of the same name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            root: Node::new(name.clone()),
            name,
            ..Default::default()
        }
    }

    /// Add a material and return its index.
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Add a mesh and return its index.
    pub fn add_mesh(&mut self, mesh: Mesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    /// Number of meshes.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Number of materials.
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Every placement of a mesh in the hierarchy, with its world matrix.
    ///
    /// A mesh referenced by several nodes appears once per node. Order is
    /// the depth-first node order.
    pub fn instances(&self) -> Vec<Instance> {
        let mut instances = Vec::new();
        collect_instances(&self.root, Mat4::IDENTITY, &mut instances);
        instances
    }

    /// Check internal references: mesh indices, material indices, and
    /// per-mesh attribute counts.
    pub fn validate(&self) -> Result<(), String> {
        for mesh in &self.meshes {
            mesh.validate()?;
            if mesh.material >= self.materials.len() {
                return Err(format!(
                    "mesh '{}' references material {} of {}",
                    mesh.name,
                    mesh.material,
                    self.materials.len()
                ));
            }
        }

        let mut error = None;
        self.root.walk(&mut |node| {
            if error.is_none() {
                if let Some(&bad) = node.meshes.iter().find(|&&m| m >= self.meshes.len()) {
                    error = Some(format!("node '{}' references mesh {}", node.name, bad));
                }
            }
        });
        error.map_or(Ok(()), Err)
    }
}
