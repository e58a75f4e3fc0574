//! Export side: the exporter interface and the collector that packages
//! every file an exporter writes.

use crate::error::ExportFailure;
use crate::registry::FormatInfo;
use crate::scene::Scene;

/// Writes a [`Scene`] as one or more files.
pub trait Exporter: Send + Sync {
    /// Static format description.
    fn info(&self) -> &FormatInfo;

    /// Serialize `scene`, emitting every produced file into `out`.
    fn write(&self, scene: &Scene, out: &mut ExportCollector) -> Result<(), ExportFailure>;
}

/// One packaged output file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputFile {
    path: String,
    content: Vec<u8>,
}

impl OutputFile {
    pub fn new(path: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            content,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Take the content.
    pub fn into_content(self) -> Vec<u8> {
        self.content
    }
}

/// Receives exporter output in emission order.
///
/// Names and bytes are kept exactly as emitted.
#[derive(Debug)]
pub struct ExportCollector {
    stem: String,
    outputs: Vec<OutputFile>,
}

impl ExportCollector {
    /// Create a collector whose generated names use `stem`.
    pub fn new(stem: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            outputs: Vec::new(),
        }
    }

    /// Stem of generated output names.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// `{stem}.{extension}`.
    pub fn default_path(&self, extension: &str) -> String {
        format!("{}.{}", self.stem, extension)
    }

    /// Append an output file.
    pub fn emit(&mut self, path: impl Into<String>, content: Vec<u8>) {
        let file = OutputFile::new(path, content);
        log::trace!("Emitted {} ({} bytes)", file.path(), file.content().len());
        self.outputs.push(file);
    }

    /// Number of files emitted so far.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Finish collecting.
    pub fn into_outputs(self) -> Vec<OutputFile> {
        self.outputs
    }
}
