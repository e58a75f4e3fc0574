//! Lazy staging: one eagerly supplied root file plus host callbacks.

use std::borrow::Cow;

use super::{FileSource, StagedFile};

/// File source backed by host-supplied `exists` / `read` functions.
///
/// The root file is the only entry candidate. Every other lookup is
/// forwarded to the callbacks on the calling thread, every time: nothing is
/// cached, so asking for the same name twice calls `exists` twice.
///
/// Hosts with asynchronous I/O adapt it into blocking calls inside the
/// closures.
///
/// # Example
///
/// ```
/// use stagehand_core::{CallbackFileSource, FileSource};
///
/// let source = CallbackFileSource::new(
///     "cube.obj",
///     b"mtllib cube.mtl\n".to_vec(),
///     |name| name == "cube.mtl",
///     |_name| Some(b"newmtl red\n".to_vec()),
/// );
///
/// assert!(source.lookup("cube.obj").is_some());
/// assert!(source.lookup("cube.mtl").is_some());
/// assert!(source.lookup("missing.mtl").is_none());
/// ```
pub struct CallbackFileSource<E, R>
where
    E: Fn(&str) -> bool,
    R: Fn(&str) -> Option<Vec<u8>>,
{
    root: StagedFile,
    exists: E,
    read: R,
}

impl<E, R> CallbackFileSource<E, R>
where
    E: Fn(&str) -> bool,
    R: Fn(&str) -> Option<Vec<u8>>,
{
    /// Create a source from the root file and the two host callbacks.
    pub fn new(
        root_path: impl Into<String>,
        root_content: impl Into<Vec<u8>>,
        exists: E,
        read: R,
    ) -> Self {
        Self {
            root: StagedFile::new(root_path, root_content),
            exists,
            read,
        }
    }

    /// The eagerly supplied root file.
    pub fn root(&self) -> &StagedFile {
        &self.root
    }
}

impl<E, R> FileSource for CallbackFileSource<E, R>
where
    E: Fn(&str) -> bool,
    R: Fn(&str) -> Option<Vec<u8>>,
{
    fn lookup(&self, path: &str) -> Option<Cow<'_, [u8]>> {
        if path == self.root.path() {
            return Some(Cow::Borrowed(self.root.content()));
        }

        log::trace!("Forwarding exists({path}) to host");
        if !(self.exists)(path) {
            return None;
        }

        log::trace!("Forwarding read({path}) to host");
        match (self.read)(path) {
            Some(bytes) => Some(Cow::Owned(bytes)),
            None => {
                log::debug!("Host reported {path} as existing but returned no content");
                None
            }
        }
    }

    fn entry_count(&self) -> usize {
        1
    }

    fn entry_at(&self, index: usize) -> Option<(&str, &[u8])> {
        (index == 0).then(|| (self.root.path(), self.root.content()))
    }

    fn label(&self) -> &'static str {
        "callback"
    }
}
