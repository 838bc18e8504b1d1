//! Remote object store access
//!
//! The store is a git-shaped object graph behind a REST API: content-addressed
//! blobs, trees mapping paths to blobs, commits pointing at trees, and mutable
//! branch refs. This module defines the typed accessor trait plus two
//! implementations:
//!
//! - [`github::GithubClient`]: the real thing, over the GitHub REST API
//! - [`memory::MemoryStore`]: an in-memory graph with the same
//!   compare-and-swap semantics, for tests and offline use
//!
//! The trait is deliberately thin. It distinguishes "absent" (a 404-class
//! answer, returned as `None`) from everything else, and maps rejected
//! conditional writes to `ConcurrencyConflict`; all other interpretation
//! belongs to the sync engine.

pub mod github;
pub mod memory;
mod types;

pub use github::GithubClient;
pub use memory::MemoryStore;
pub use types::{
    CommitInfo, CommitResult, DirEntry, EntryKind, FileWrite, PutOutcome, RemoteFile, TreeWrite,
};

use crate::error::SyncResult;

/// Typed accessor over the remote store's plumbing endpoints
///
/// One instance is scoped to a single repository and branch. Every method is
/// a stateless network call; no remote state is cached between calls.
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    /// Fetch a file's content and concurrency token at the configured branch.
    ///
    /// Returns `None` when the path is absent or names a directory.
    async fn get_file(&self, path: &str) -> SyncResult<Option<RemoteFile>>;

    /// List directory entries. Returns `None` when the directory is absent.
    async fn list_dir(&self, path: &str) -> SyncResult<Option<Vec<DirEntry>>>;

    /// Create or replace a single file in one commit.
    ///
    /// `expected_sha` is the concurrency token of the version being replaced;
    /// `None` means "create". A stale token yields `ConcurrencyConflict`.
    async fn put_file(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        expected_sha: Option<&str>,
    ) -> SyncResult<PutOutcome>;

    /// Resolve the branch ref to its current head commit id
    async fn get_branch_head(&self) -> SyncResult<String>;

    /// Fetch a commit's metadata (notably its root tree id)
    async fn get_commit(&self, commit_id: &str) -> SyncResult<CommitInfo>;

    /// Create a content-addressed blob holding `content`
    async fn create_blob(&self, content: &[u8]) -> SyncResult<String>;

    /// Create a tree overlaying `entries` onto `base_tree`.
    ///
    /// Paths not named in `entries` are preserved from the base tree.
    async fn create_tree(&self, base_tree: &str, entries: &[TreeWrite]) -> SyncResult<String>;

    /// Create a commit with a single parent
    async fn create_commit(
        &self,
        tree_id: &str,
        parent: &str,
        message: &str,
    ) -> SyncResult<String>;

    /// Move the branch ref to `new_commit`, conditioned on the branch still
    /// pointing at `expected_old`.
    ///
    /// Returns the new head on success; `ConcurrencyConflict` if another
    /// writer advanced the branch in the interim.
    async fn update_branch(&self, new_commit: &str, expected_old: &str) -> SyncResult<String>;
}
