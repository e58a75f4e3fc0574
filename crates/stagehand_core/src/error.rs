//! Error types for conversion requests and format collaborators.

use thiserror::Error;

/// Why a conversion request failed.
///
/// Every failure reaches the caller as one of these inside a failed
/// [`ConversionResult`](crate::ConversionResult). Nothing is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("No files were supplied")]
    EmptyInput,

    #[error("No importer recognized any of the {candidates} supplied file(s)")]
    NoRecognizedEntry { candidates: usize },

    #[error("{format} importer recognized {path} but failed: {message}")]
    RecognizedButFailed {
        path: String,
        format: String,
        message: String,
    },

    #[error("Dependency {reference} requested by {requested_by} could not be found")]
    MissingDependency {
        reference: String,
        requested_by: String,
    },

    #[error("Format {format} is disabled (entry {path})")]
    DisabledFormat { format: String, path: String },

    #[error("Export to {format} failed: {message}")]
    ExportFailed { format: String, message: String },
}

/// Payload-free discriminant of [`ConvertError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyInput,
    NoRecognizedEntry,
    RecognizedButFailed,
    MissingDependency,
    DisabledFormat,
    ExportFailed,
}

impl ConvertError {
    /// The error's kind, for matching without payloads.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput => ErrorKind::EmptyInput,
            Self::NoRecognizedEntry { .. } => ErrorKind::NoRecognizedEntry,
            Self::RecognizedButFailed { .. } => ErrorKind::RecognizedButFailed,
            Self::MissingDependency { .. } => ErrorKind::MissingDependency,
            Self::DisabledFormat { .. } => ErrorKind::DisabledFormat,
            Self::ExportFailed { .. } => ErrorKind::ExportFailed,
        }
    }

    /// Attach the importer and entry path to an importer failure.
    pub fn from_import(failure: ImportFailure, format: &str, path: &str) -> Self {
        match failure {
            ImportFailure::MissingDependency(reference) => Self::MissingDependency {
                reference,
                requested_by: path.to_string(),
            },
            ImportFailure::DisabledExtension(name) => Self::DisabledFormat {
                format: format!("{format}/{name}"),
                path: path.to_string(),
            },
            other => Self::RecognizedButFailed {
                path: path.to_string(),
                format: format.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Attach the exporter id to an exporter failure.
    pub fn from_export(failure: ExportFailure, format: &str) -> Self {
        Self::ExportFailed {
            format: format.to_string(),
            message: failure.to_string(),
        }
    }
}

/// Failure reported by an importer after it claimed a file.
#[derive(Error, Debug)]
pub enum ImportFailure {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Parse error at line {line}: {message}")]
    ParseAt { line: usize, message: String },

    #[error("Unsupported content: {0}")]
    Unsupported(String),

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Disabled format extension: {0}")]
    DisabledExtension(String),

    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure reported by an exporter.
#[derive(Error, Debug)]
pub enum ExportFailure {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
