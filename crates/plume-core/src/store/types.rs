//! Shared store data types
//!
//! Object ids (`sha` fields) are opaque strings handed back by the store.
//! They are never interpreted, only threaded through subsequent calls.

use serde::Serialize;

/// A file read from the remote store
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    /// Repository-relative path
    pub path: String,
    /// Decoded file bytes
    pub content: Vec<u8>,
    /// Concurrency token for the current version
    pub sha: String,
}

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks, submodules - anything this core doesn't publish
    Other,
}

/// One entry in a directory listing
#[derive(Debug, Clone, PartialEq)]
pub struct DirEntry {
    /// Entry name (final path component)
    pub name: String,
    /// Repository-relative path
    pub path: String,
    pub kind: EntryKind,
}

/// One file in a batch write
#[derive(Debug, Clone, PartialEq)]
pub struct FileWrite {
    /// Repository-relative POSIX-style path
    pub path: String,
    /// Exact bytes to persist
    pub content: Vec<u8>,
    /// Concurrency token of the version being replaced; `None` to create.
    ///
    /// Honored by single-file upserts. Batch commits rebuild the tree from
    /// the live branch head instead and ignore this field.
    pub expected_sha: Option<String>,
}

impl FileWrite {
    /// Convenience constructor for a token-less (create-or-overwrite) write
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            expected_sha: None,
        }
    }
}

/// Result of a successful single-file write
#[derive(Debug, Clone, PartialEq)]
pub struct PutOutcome {
    /// Id of the commit that carries the write
    pub commit_id: String,
    /// Concurrency token of the new file version
    pub content_sha: String,
}

/// Commit metadata needed to build on top of it
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    pub commit_id: String,
    /// Root tree of the commit
    pub tree_id: String,
}

/// One overlay entry for tree creation: path -> blob
#[derive(Debug, Clone, PartialEq)]
pub struct TreeWrite {
    /// Repository-relative path (slashes allowed; the store nests as needed)
    pub path: String,
    /// Blob id produced by a prior create-blob call
    pub blob_sha: String,
}

/// Result of a commit reaching the branch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitResult {
    /// Id of the newly created commit
    pub commit_id: String,
    /// Branch head after the write (equals `commit_id` on success)
    pub branch_head: String,
}
