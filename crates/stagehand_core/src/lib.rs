//! Stagehand Core - file staging and resolution for 3D model conversion.
//!
//! This crate provides:
//!
//! - **Staging**: `FileStore` for a complete file set, `CallbackFileSource`
//!   for a root file plus host `exists`/`read` callbacks
//! - **Resolution**: `ImportResolver` finds the entry file in any supply
//!   order and imports it with its side files
//! - **Packaging**: `ExportCollector` gathers every file an exporter writes
//! - **Formats**: OBJ/MTL, glTF 2.0, STL and OFF import; assjson, glTF,
//!   GLB, OBJ and STL export
//!
//! # Example
//!
//! ```
//! use stagehand_core::{convert_file_set, FileStore};
//!
//! let mut files = FileStore::new();
//! files.add_file("cube.mtl", b"newmtl red\nKd 1 0 0\n".to_vec());
//! files.add_file(
//!     "cube.obj",
//!     b"mtllib cube.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl red\nf 1 2 3\n".to_vec(),
//! );
//!
//! let result = convert_file_set(&files, "gltf2");
//! assert!(result.is_success(), "{}", result.diagnostic());
//! assert_eq!(result.output_count(), 2);
//! ```

pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod formats;
pub mod import;
pub mod mesh;
pub mod registry;
pub mod scene;
pub mod source;
pub mod state;

// Re-export commonly used types
pub use batch::{convert_batch, BatchJob};
pub use config::{ConvertOptions, ConvertOptionsBuilder, DependencyPolicy};
pub use convert::{
    convert_file_set, convert_single_file, convert_with, convert_with_registry, ConversionResult,
};
pub use error::{ConvertError, ErrorKind, ExportFailure, ImportFailure};
pub use export::{ExportCollector, Exporter, OutputFile};
pub use import::{Candidate, ImportContext, ImportResolver, Importer, Recognition};
pub use mesh::{Mesh, PrimitiveKind};
pub use registry::{FormatGates, FormatInfo, FormatRegistry, Gate, DEFAULT_GATES};
pub use scene::{Material, Node, Scene};
pub use source::{CallbackFileSource, FileSource, FileStore, StagedFile};
