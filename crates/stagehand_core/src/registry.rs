//! Format descriptions, the disabled-format table, and the ordered set of
//! importers and exporters a conversion runs against.

use crate::export::Exporter;
use crate::formats;
use crate::import::Importer;
use crate::source;

/// Static description of a format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatInfo {
    /// Identifier used as conversion target and in diagnostics
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Lower-case file extensions without the dot
    pub extensions: &'static [&'static str],
}

impl FormatInfo {
    /// Whether `path` carries one of this format's extensions.
    pub fn matches_extension(&self, path: &str) -> bool {
        source::extension(path).is_some_and(|ext| self.extensions.contains(&ext.as_str()))
    }
}

/// One administratively disabled format or format extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    /// A whole import format, matched by file extension.
    Format {
        id: &'static str,
        extensions: &'static [&'static str],
    },
    /// A named extension inside an otherwise enabled format.
    Extension {
        format: &'static str,
        name: &'static str,
    },
}

/// Fixed table of [`Gate`]s consulted during import.
#[derive(Debug)]
pub struct FormatGates {
    gates: &'static [Gate],
}

impl FormatGates {
    /// Wrap a static gate list.
    pub const fn new(gates: &'static [Gate]) -> Self {
        Self { gates }
    }

    /// Whether the table disables nothing.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Iterate gates in table order.
    pub fn iter(&self) -> impl Iterator<Item = &Gate> {
        self.gates.iter()
    }

    /// Id of the disabled format `path`'s extension belongs to, if any.
    pub fn disabled_format_for(&self, path: &str) -> Option<&'static str> {
        let ext = source::extension(path)?;
        self.gates.iter().find_map(|gate| match gate {
            Gate::Format { id, extensions } if extensions.contains(&ext.as_str()) => Some(*id),
            _ => None,
        })
    }

    /// Whether format extension `name` of `format` is disabled.
    pub fn is_extension_disabled(&self, format: &str, name: &str) -> bool {
        self.gates.iter().any(|gate| {
            matches!(gate, Gate::Extension { format: f, name: n } if *f == format && *n == name)
        })
    }
}

/// Formats disabled in the standard build.
pub static DEFAULT_GATES: FormatGates = FormatGates::new(&[
    Gate::Format {
        id: "x3d",
        extensions: &["x3d", "x3db", "x3dv", "wrl"],
    },
    Gate::Format {
        id: "irr",
        extensions: &["irr"],
    },
    Gate::Format {
        id: "irrmesh",
        extensions: &["irrmesh"],
    },
    Gate::Format {
        id: "raw",
        extensions: &["raw"],
    },
    Gate::Format {
        id: "ter",
        extensions: &["ter"],
    },
    Gate::Format {
        id: "m3d",
        extensions: &["m3d", "a3d"],
    },
    Gate::Extension {
        format: "gltf2",
        name: "KHR_draco_mesh_compression",
    },
]);

/// Ordered importers and exporters.
///
/// Importers are asked in registration order; the first one that claims a
/// candidate decides its outcome.
#[derive(Default)]
pub struct FormatRegistry {
    importers: Vec<Box<dyn Importer>>,
    exporters: Vec<Box<dyn Exporter>>,
}

impl FormatRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in importer and exporter.
    pub fn standard() -> Self {
        Self::new()
            .with_importer(formats::obj::ObjImporter)
            .with_importer(formats::gltf_reader::GltfImporter)
            .with_importer(formats::stl::StlImporter)
            .with_importer(formats::off::OffImporter)
            .with_exporter(formats::assjson::AssJsonExporter)
            .with_exporter(formats::gltf_writer::GltfExporter::separate())
            .with_exporter(formats::gltf_writer::GltfExporter::binary())
            .with_exporter(formats::obj::ObjExporter)
            .with_exporter(formats::stl::StlExporter)
    }

    /// Append an importer.
    pub fn with_importer(mut self, importer: impl Importer + 'static) -> Self {
        self.importers.push(Box::new(importer));
        self
    }

    /// Append an exporter.
    pub fn with_exporter(mut self, exporter: impl Exporter + 'static) -> Self {
        self.exporters.push(Box::new(exporter));
        self
    }

    /// Importers in probe order.
    pub fn importers(&self) -> impl Iterator<Item = &dyn Importer> {
        self.importers.iter().map(|i| i.as_ref())
    }

    /// Exporter for target `id`.
    pub fn exporter(&self, id: &str) -> Option<&dyn Exporter> {
        self.exporters
            .iter()
            .find(|e| e.info().id == id)
            .map(|e| e.as_ref())
    }

    /// Ids of every export target.
    pub fn export_ids(&self) -> Vec<&'static str> {
        self.exporters.iter().map(|e| e.info().id).collect()
    }

    /// Ids of every import format.
    pub fn import_ids(&self) -> Vec<&'static str> {
        self.importers.iter().map(|i| i.info().id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_format_lookup() {
        assert_eq!(DEFAULT_GATES.disabled_format_for("scene/a.X3D"), Some("x3d"));
        assert_eq!(DEFAULT_GATES.disabled_format_for("world.wrl"), Some("x3d"));
        assert_eq!(DEFAULT_GATES.disabled_format_for("a.irrmesh"), Some("irrmesh"));
        assert_eq!(DEFAULT_GATES.disabled_format_for("cube.obj"), None);
        assert_eq!(DEFAULT_GATES.disabled_format_for("noext"), None);
    }

    #[test]
    fn test_disabled_extension_lookup() {
        assert!(DEFAULT_GATES.is_extension_disabled("gltf2", "KHR_draco_mesh_compression"));
        assert!(!DEFAULT_GATES.is_extension_disabled("gltf2", "KHR_materials_unlit"));
        assert!(!DEFAULT_GATES.is_extension_disabled("obj", "KHR_draco_mesh_compression"));
    }

    #[test]
    fn test_standard_registry_order() {
        let registry = FormatRegistry::standard();
        assert_eq!(registry.import_ids(), ["obj", "gltf2", "stl", "off"]);
        assert_eq!(registry.export_ids(), ["assjson", "gltf2", "glb2", "obj", "stl"]);
        assert!(registry.exporter("glb2").is_some());
        assert!(registry.exporter("fbx").is_none());
    }

    #[test]
    fn test_extension_match() {
        let info = FormatInfo {
            id: "obj",
            name: "Wavefront OBJ",
            extensions: &["obj"],
        };
        assert!(info.matches_extension("Models/Cube.OBJ"));
        assert!(!info.matches_extension("cube.mtl"));
    }
}
