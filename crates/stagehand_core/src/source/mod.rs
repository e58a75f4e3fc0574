//! File staging: the capability the resolver reads files through.
//!
//! ```text
//!   FileStore ───────────┐
//!   (every file staged)  │
//!                        ├──► dyn FileSource ──► ImportResolver / importers
//!   CallbackFileSource ──┘
//!   (root + host exists/read)
//! ```
//!
//! Both sources expose the same two things: the entry candidates to probe,
//! and a `lookup` for any file an importer asks for while parsing.

mod callback;
mod store;

use std::borrow::Cow;

pub use callback::CallbackFileSource;
pub use store::{FileStore, StagedFile};

/// Read-only file capability shared by eager and lazy staging.
pub trait FileSource {
    /// Exact-match lookup. `None` means "not found".
    fn lookup(&self, path: &str) -> Option<Cow<'_, [u8]>>;

    /// Number of entry candidates.
    fn entry_count(&self) -> usize;

    /// Entry candidate at `index`, in probe order.
    fn entry_at(&self, index: usize) -> Option<(&str, &[u8])>;

    /// Short name used in log lines.
    fn label(&self) -> &'static str;
}

/// Directory part of a logical path, without the trailing separator.
pub fn parent_dir(path: &str) -> Option<&str> {
    path.rfind(['/', '\\']).map(|i| &path[..i])
}

/// Final component of a logical path.
pub fn file_name(path: &str) -> &str {
    path.rfind(['/', '\\']).map_or(path, |i| &path[i + 1..])
}

/// Lower-cased extension of a logical path, if any.
pub fn extension(path: &str) -> Option<String> {
    let name = file_name(path);
    let dot = name.rfind('.')?;
    (dot + 1 < name.len()).then(|| name[dot + 1..].to_ascii_lowercase())
}

/// Names to try, in order, when resolving `reference` made from inside
/// `entry`: relative to the entry's directory, verbatim, then bare file name.
pub fn reference_candidates(entry: &str, reference: &str) -> Vec<String> {
    let reference = reference.trim().replace('\\', "/");
    let reference = reference.strip_prefix("./").unwrap_or(&reference).to_string();

    let mut names = Vec::with_capacity(3);
    if let Some(dir) = parent_dir(entry) {
        names.push(format!("{}/{}", dir.replace('\\', "/"), reference));
    }
    names.push(reference.clone());
    names.push(file_name(&reference).to_string());

    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !name.is_empty() && !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}
