//! Import side: the importer interface, the per-candidate context that
//! importers resolve dependencies through, and the entry resolver.

mod resolver;

use std::borrow::Cow;
use std::cell::RefCell;

pub use resolver::{ImportResolver, Resolved};

use crate::error::ImportFailure;
use crate::registry::{FormatGates, FormatInfo};
use crate::scene::Scene;
use crate::source::{self, FileSource};

/// An importer's answer for one entry candidate.
#[derive(Debug)]
pub enum Recognition {
    /// Not this importer's format. The resolver moves on.
    NotRecognized,
    /// Recognized and parsed.
    Parsed(Scene),
    /// Recognized but could not be parsed. Terminal for the conversion.
    Failed(ImportFailure),
}

impl Recognition {
    /// Turn a parse result into a recognition for a file already claimed.
    pub fn from_result(result: Result<Scene, ImportFailure>) -> Self {
        match result {
            Ok(scene) => Self::Parsed(scene),
            Err(failure) => Self::Failed(failure),
        }
    }
}

/// Reads one format into a [`Scene`].
pub trait Importer: Send + Sync {
    /// Static format description.
    fn info(&self) -> &FormatInfo;

    /// Decide whether `candidate` is this format and parse it if so.
    ///
    /// Side files are fetched through `ctx`, never from the filesystem.
    fn recognize(&self, candidate: &Candidate<'_>, ctx: &ImportContext<'_>) -> Recognition;
}

/// A staged file being probed as the conversion's entry.
#[derive(Clone, Copy, Debug)]
pub struct Candidate<'a> {
    path: &'a str,
    content: &'a [u8],
}

impl<'a> Candidate<'a> {
    pub fn new(path: &'a str, content: &'a [u8]) -> Self {
        Self { path, content }
    }

    pub fn path(&self) -> &'a str {
        self.path
    }

    pub fn content(&self) -> &'a [u8] {
        self.content
    }

    /// Lower-cased extension.
    pub fn extension(&self) -> Option<String> {
        source::extension(self.path)
    }

    /// File name without directory or extension.
    pub fn stem(&self) -> &'a str {
        let name = source::file_name(self.path);
        match name.rfind('.') {
            Some(dot) if dot > 0 => &name[..dot],
            _ => name,
        }
    }

    /// Content as UTF-8 text, with a leading byte order mark removed.
    pub fn text(&self) -> Option<&'a str> {
        let text = std::str::from_utf8(self.content).ok()?;
        Some(text.strip_prefix('\u{feff}').unwrap_or(text))
    }
}

/// Dependency access for one importer working on one candidate.
///
/// References are resolved relative to the entry first, then verbatim, then
/// by bare file name. Optional references that cannot be found are
/// remembered so the resolver can apply the conversion's
/// [`DependencyPolicy`](crate::DependencyPolicy).
pub struct ImportContext<'a> {
    source: &'a dyn FileSource,
    entry: &'a str,
    gates: &'a FormatGates,
    misses: RefCell<Vec<String>>,
}

impl<'a> ImportContext<'a> {
    pub fn new(source: &'a dyn FileSource, entry: &'a str, gates: &'a FormatGates) -> Self {
        Self {
            source,
            entry,
            gates,
            misses: RefCell::new(Vec::new()),
        }
    }

    /// Path of the entry file being imported.
    pub fn entry(&self) -> &'a str {
        self.entry
    }

    /// Fetch a dependency the format cannot do without.
    pub fn require(&self, reference: &str) -> Result<Cow<'a, [u8]>, ImportFailure> {
        self.find(reference)
            .ok_or_else(|| ImportFailure::MissingDependency(reference.to_string()))
    }

    /// Fetch a dependency the format can degrade without.
    pub fn optional(&self, reference: &str) -> Option<Cow<'a, [u8]>> {
        let found = self.find(reference);
        if found.is_none() {
            self.misses.borrow_mut().push(reference.to_string());
        }
        found
    }

    /// Whether a named extension of `format` is disabled for this conversion.
    pub fn is_extension_disabled(&self, format: &str, name: &str) -> bool {
        self.gates.is_extension_disabled(format, name)
    }

    /// Optional references that could not be found, in request order.
    pub fn misses(&self) -> Vec<String> {
        self.misses.borrow().clone()
    }

    fn find(&self, reference: &str) -> Option<Cow<'a, [u8]>> {
        for name in source::reference_candidates(self.entry, reference) {
            log::trace!("{} lookup {} for {}", self.source.label(), name, self.entry);
            if let Some(bytes) = self.source.lookup(&name) {
                return Some(bytes);
            }
        }
        log::debug!("Dependency {} of {} not found", reference, self.entry);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DEFAULT_GATES;
    use crate::source::FileStore;

    #[test]
    fn test_candidate_parts() {
        let candidate = Candidate::new("models/Cube.Final.OBJ", b"\xEF\xBB\xBFv 0 0 0");
        assert_eq!(candidate.stem(), "Cube.Final");
        assert_eq!(candidate.extension().as_deref(), Some("obj"));
        assert_eq!(candidate.text(), Some("v 0 0 0"));
        assert_eq!(Candidate::new(".hidden", b"").stem(), ".hidden");
    }

    #[test]
    fn test_require_and_optional() {
        let store: FileStore = [
            ("scene/cube.obj", b"obj".to_vec()),
            ("scene/cube.mtl", b"mtl".to_vec()),
        ]
        .into_iter()
        .collect();
        let ctx = ImportContext::new(&store, "scene/cube.obj", &DEFAULT_GATES);

        assert_eq!(ctx.require("cube.mtl").unwrap().as_ref(), b"mtl");
        assert!(matches!(
            ctx.require("cube.bin"),
            Err(ImportFailure::MissingDependency(name)) if name == "cube.bin"
        ));
        // Required misses are reported through the error, not the miss log
        assert!(ctx.misses().is_empty());

        assert!(ctx.optional("other.mtl").is_none());
        assert_eq!(ctx.misses(), ["other.mtl"]);
    }

    #[test]
    fn test_bare_name_fallback() {
        let store: FileStore = [("cube.obj", b"".to_vec()), ("wood.mtl", b"m".to_vec())]
            .into_iter()
            .collect();
        let ctx = ImportContext::new(&store, "cube.obj", &DEFAULT_GATES);

        assert!(ctx.optional("materials/wood.mtl").is_some());
    }
}
