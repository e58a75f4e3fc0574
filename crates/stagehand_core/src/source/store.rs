//! Eager staging: an insertion-ordered bag of named byte buffers.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use super::FileSource;

/// One staged input file.
///
/// The path is a logical name used as a lookup key. It carries no
/// filesystem semantics beyond uniqueness within a [`FileStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedFile {
    path: String,
    content: Arc<[u8]>,
}

impl StagedFile {
    /// Create a staged file.
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: Arc::from(content.into()),
        }
    }

    /// Logical path of the file.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// File content.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Content length in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Insertion-ordered collection of [`StagedFile`]s with lookup by path.
///
/// Adding a file under an existing path replaces its content but keeps the
/// original insertion position.
///
/// # Example
///
/// ```
/// use stagehand_core::FileStore;
///
/// let mut store = FileStore::new();
/// store.add_file("models/cube.obj", b"v 0 0 0\n".to_vec());
/// store.add_file("models/cube.mtl", b"newmtl red\n".to_vec());
///
/// assert_eq!(store.len(), 2);
/// assert!(store.lookup("models/cube.mtl").is_some());
/// assert!(store.lookup("cube.mtl").is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct FileStore {
    files: Vec<StagedFile>,
    index: HashMap<String, usize>,
}

impl FileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file, replacing any earlier file with the same path.
    pub fn add_file(&mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) {
        let file = StagedFile::new(path, content);
        match self.index.get(file.path()) {
            Some(&slot) => {
                log::trace!("Replacing staged file {}", file.path());
                self.files[slot] = file;
            }
            None => {
                self.index.insert(file.path.clone(), self.files.len());
                self.files.push(file);
            }
        }
    }

    /// Exact-match lookup. No normalization of any kind.
    pub fn lookup(&self, path: &str) -> Option<&[u8]> {
        self.index.get(path).map(|&slot| self.files[slot].content())
    }

    /// Number of staged files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the store has no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File at `index` in insertion order.
    pub fn entry_at(&self, index: usize) -> Option<&StagedFile> {
        self.files.get(index)
    }

    /// Iterate files in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &StagedFile> {
        self.files.iter()
    }
}

impl<P, C> FromIterator<(P, C)> for FileStore
where
    P: Into<String>,
    C: Into<Vec<u8>>,
{
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut store = Self::new();
        store.extend(iter);
        store
    }
}

impl<P, C> Extend<(P, C)> for FileStore
where
    P: Into<String>,
    C: Into<Vec<u8>>,
{
    fn extend<I: IntoIterator<Item = (P, C)>>(&mut self, iter: I) {
        for (path, content) in iter {
            self.add_file(path, content);
        }
    }
}

impl FileSource for FileStore {
    fn lookup(&self, path: &str) -> Option<Cow<'_, [u8]>> {
        FileStore::lookup(self, path).map(Cow::Borrowed)
    }

    fn entry_count(&self) -> usize {
        self.len()
    }

    fn entry_at(&self, index: usize) -> Option<(&str, &[u8])> {
        self.files.get(index).map(|f| (f.path(), f.content()))
    }

    fn label(&self) -> &'static str {
        "store"
    }
}
