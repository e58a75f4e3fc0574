//! Conversion entry points and their result type.

use crate::config::ConvertOptions;
use crate::error::{ConvertError, ErrorKind, ExportFailure};
use crate::export::{ExportCollector, OutputFile};
use crate::import::ImportResolver;
use crate::registry::FormatRegistry;
use crate::source::{CallbackFileSource, FileSource, FileStore};
use crate::state::ConversionState;

/// Outcome of one conversion request.
///
/// Either every output file the exporter produced, or the error that
/// stopped the conversion. Never both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionResult {
    outputs: Vec<OutputFile>,
    error: Option<ConvertError>,
}

impl ConversionResult {
    /// A successful result.
    pub fn success(outputs: Vec<OutputFile>) -> Self {
        Self {
            outputs,
            error: None,
        }
    }

    /// A failed result. Carries no outputs.
    pub fn failure(error: ConvertError) -> Self {
        Self {
            outputs: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Number of output files, 0 on failure.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Output file at `index`, in emission order.
    pub fn output_at(&self, index: usize) -> Option<&OutputFile> {
        self.outputs.get(index)
    }

    pub fn outputs(&self) -> &[OutputFile] {
        &self.outputs
    }

    /// Human-readable failure description, empty on success.
    pub fn diagnostic(&self) -> String {
        self.error.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    pub fn error(&self) -> Option<&ConvertError> {
        self.error.as_ref()
    }

    /// Kind of the failure, `None` on success.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(ConvertError::kind)
    }

    /// Take the outputs, or the error.
    pub fn into_outputs(self) -> Result<Vec<OutputFile>, ConvertError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.outputs),
        }
    }
}

impl From<Result<Vec<OutputFile>, ConvertError>> for ConversionResult {
    fn from(result: Result<Vec<OutputFile>, ConvertError>) -> Self {
        match result {
            Ok(outputs) => Self::success(outputs),
            Err(error) => Self::failure(error),
        }
    }
}

/// Convert a fully staged file set to `target`.
///
/// # Example
///
/// ```
/// use stagehand_core::{convert_file_set, FileStore};
///
/// let mut files = FileStore::new();
/// files.add_file("tri.obj", b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".to_vec());
///
/// let result = convert_file_set(&files, "glb2");
/// assert!(result.is_success());
/// assert_eq!(result.output_at(0).unwrap().path(), "result.glb");
/// ```
pub fn convert_file_set(files: &FileStore, target: &str) -> ConversionResult {
    convert_with(files, target, &ConvertOptions::eager())
}

/// Convert a single root file, fetching every other file through the host
/// callbacks.
pub fn convert_single_file<E, R>(
    root_path: &str,
    root_content: impl Into<Vec<u8>>,
    target: &str,
    exists: E,
    read: R,
) -> ConversionResult
where
    E: Fn(&str) -> bool,
    R: Fn(&str) -> Option<Vec<u8>>,
{
    let source = CallbackFileSource::new(root_path, root_content, exists, read);
    convert_with(&source, target, &ConvertOptions::delayed())
}

/// Convert whatever `source` stages, with explicit options and the standard
/// format registry.
pub fn convert_with(
    source: &dyn FileSource,
    target: &str,
    options: &ConvertOptions,
) -> ConversionResult {
    let registry = FormatRegistry::standard();
    convert_with_registry(&registry, source, target, options)
}

/// Convert against a caller-supplied registry.
pub fn convert_with_registry(
    registry: &FormatRegistry,
    source: &dyn FileSource,
    target: &str,
    options: &ConvertOptions,
) -> ConversionResult {
    let mut state = ConversionState::Idle;
    let result = run(registry, source, target, options, &mut state);

    match &result {
        Ok(outputs) => log::info!(
            "Converted to {}: {} output file(s)",
            target,
            outputs.len()
        ),
        Err(err) => log::debug!("Conversion to {} failed: {}", target, err),
    }
    result.into()
}

fn run(
    registry: &FormatRegistry,
    source: &dyn FileSource,
    target: &str,
    options: &ConvertOptions,
    state: &mut ConversionState,
) -> Result<Vec<OutputFile>, ConvertError> {
    if source.entry_count() == 0 {
        state.advance(ConversionState::Failed, "no input files");
        return Err(ConvertError::EmptyInput);
    }

    let Some(exporter) = registry.exporter(target) else {
        state.advance(ConversionState::Failed, "unknown target");
        return Err(ConvertError::from_export(
            ExportFailure::UnsupportedFormat(target.to_string()),
            target,
        ));
    };

    let resolved = ImportResolver::new(registry, options).resolve(source, state)?;

    state.advance(
        ConversionState::Exporting,
        &format!("{} -> {}", resolved.entry, target),
    );
    let mut out = ExportCollector::new(options.output_stem.as_str());
    if let Err(failure) = exporter.write(&resolved.scene, &mut out) {
        let err = ConvertError::from_export(failure, target);
        state.advance(ConversionState::Failed, &err.to_string());
        return Err(err);
    }

    state.advance(
        ConversionState::Packaged,
        &format!("{} output file(s)", out.len()),
    );
    Ok(out.into_outputs())
}
