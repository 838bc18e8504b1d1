//! Sync engine
//!
//! Orchestrates reads and writes against an [`ObjectStore`]. Owns the
//! optimistic-concurrency and multi-file-commit algorithms; holds no locks
//! and no state between calls. Concurrent callers are serialized only by
//! the store's own compare-and-swap checks.
//!
//! Nothing here retries. A `ConcurrencyConflict` means another writer won
//! the race and the caller must restart the whole read-modify-write
//! sequence; retry policy (and backoff) is deliberately a caller concern.

use futures_util::future::try_join_all;
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::models::MARKUP_EXTENSION;
use crate::store::{CommitResult, EntryKind, FileWrite, ObjectStore, TreeWrite};

/// Fetch a file's current content at the configured branch.
///
/// Read-only. Fails with `NotFound` when the path is absent or names a
/// directory.
pub async fn fetch_file<S: ObjectStore>(store: &S, path: &str) -> SyncResult<Vec<u8>> {
    match store.get_file(path).await? {
        Some(file) => Ok(file.content),
        None => Err(SyncError::not_found(path)),
    }
}

/// Create or replace a single file as one commit.
///
/// Reads the path's current concurrency token first; absence means
/// "create". The write carries that token, so a writer that raced ahead
/// surfaces as `ConcurrencyConflict` rather than a silent overwrite.
pub async fn upsert_file<S: ObjectStore>(
    store: &S,
    path: &str,
    content: &[u8],
    message: &str,
) -> SyncResult<CommitResult> {
    let path = normalize_path(path)?;

    let current = store.get_file(path).await?;
    let token = current.as_ref().map(|file| file.sha.as_str());
    debug!(path, create = token.is_none(), "upserting file");

    let outcome = store.put_file(path, content, message, token).await?;
    info!(path, commit = %outcome.commit_id, "file upserted");

    Ok(CommitResult {
        branch_head: outcome.commit_id.clone(),
        commit_id: outcome.commit_id,
    })
}

/// Commit a batch of files atomically.
///
/// Builds the store's object graph bottom-up:
/// 1. read the branch's live head commit and its root tree
/// 2. create one blob per file (no ordering requirement; issued concurrently)
/// 3. create a tree overlaying the new entries onto the head tree
/// 4. create a commit parented on the head from step 1
/// 5. move the branch ref, conditioned on it still pointing at that head
///
/// Readers of the branch see either the pre-batch or the post-batch state,
/// never an interleaving. If step 5 loses the race, the objects created in
/// steps 2-4 stay unreferenced orphans and `ConcurrencyConflict` is
/// returned; the caller retries from step 1 if it wants to.
///
/// Per-file `expected_sha` tokens are ignored here: the batch is rebuilt on
/// whatever head is live at step 1, so the last writer to reach step 5 wins.
pub async fn commit_batch<S: ObjectStore>(
    store: &S,
    files: &[FileWrite],
    message: &str,
) -> SyncResult<CommitResult> {
    if files.is_empty() {
        return Err(SyncError::InvalidArgument(
            "commit batch must contain at least one file".to_string(),
        ));
    }
    for file in files {
        normalize_path(&file.path)?;
    }

    let head = store.get_branch_head().await?;
    let head_commit = store.get_commit(&head).await?;
    debug!(files = files.len(), head = %head, "starting batch commit");

    let blob_shas = try_join_all(files.iter().map(|file| store.create_blob(&file.content))).await?;

    let entries: Vec<TreeWrite> = files
        .iter()
        .zip(blob_shas)
        .map(|(file, blob_sha)| TreeWrite {
            path: normalized(&file.path),
            blob_sha,
        })
        .collect();

    let tree_id = store.create_tree(&head_commit.tree_id, &entries).await?;
    let commit_id = store.create_commit(&tree_id, &head, message).await?;
    let branch_head = store.update_branch(&commit_id, &head).await?;

    info!(files = files.len(), commit = %commit_id, "batch committed");
    Ok(CommitResult {
        commit_id,
        branch_head,
    })
}

/// List file paths under `directory` that carry the markup extension.
///
/// A missing directory yields an empty list, not an error; listing callers
/// shouldn't have to special-case "nothing published yet".
pub async fn list_markup_files<S: ObjectStore>(
    store: &S,
    directory: &str,
) -> SyncResult<Vec<String>> {
    let Some(entries) = store.list_dir(directory).await? else {
        return Ok(Vec::new());
    };

    Ok(entries
        .into_iter()
        .filter(|entry| entry.kind == EntryKind::File && entry.name.ends_with(MARKUP_EXTENSION))
        .map(|entry| entry.path)
        .collect())
}

/// Reject empty paths and strip any leading/trailing slashes
fn normalize_path(path: &str) -> SyncResult<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(SyncError::InvalidArgument(
            "file path must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

fn normalized(path: &str) -> String {
    path.trim_matches('/').to_string()
}
