//! In-memory object store
//!
//! A complete object graph (blobs, trees, commits, branch refs) behind the
//! same trait as the real client, with the same compare-and-swap behavior:
//! stale file tokens and moved branch heads are rejected, never overwritten.
//!
//! Used by the engine tests; also handy for trying the engine without a
//! remote repository.
//!
//! Trees are modeled as flat path -> blob maps. The real store nests
//! sub-trees, but the engine only ever addresses full slash paths, so the
//! flat form is observationally equivalent.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use sha2::{Digest, Sha256};

use super::types::{CommitInfo, DirEntry, EntryKind, PutOutcome, RemoteFile, TreeWrite};
use super::ObjectStore;
use crate::error::{SyncError, SyncResult};

/// In-memory object graph with compare-and-swap writes
pub struct MemoryStore {
    branch: String,
    inner: Mutex<Graph>,
}

#[derive(Default)]
struct Graph {
    blobs: HashMap<String, Vec<u8>>,
    /// tree id -> (path -> blob id)
    trees: HashMap<String, BTreeMap<String, String>>,
    commits: HashMap<String, StoredCommit>,
    branches: HashMap<String, String>,
    /// Nonce so identical commits still get distinct ids
    commit_seq: u64,
}

struct StoredCommit {
    tree: String,
    #[allow(dead_code)]
    parent: Option<String>,
    #[allow(dead_code)]
    message: String,
}

impl MemoryStore {
    /// Create a store whose branch starts at an empty root commit
    pub fn new(branch: impl Into<String>) -> Self {
        let branch = branch.into();
        let mut graph = Graph::default();

        let empty_tree = object_id("tree", b"");
        graph.trees.insert(empty_tree.clone(), BTreeMap::new());

        let root_commit = object_id("commit", b"root");
        graph.commits.insert(
            root_commit.clone(),
            StoredCommit {
                tree: empty_tree,
                parent: None,
                message: "root".to_string(),
            },
        );
        graph.branches.insert(branch.clone(), root_commit);

        Self {
            branch,
            inner: Mutex::new(graph),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Graph> {
        // Lock poisoning only happens if a test panicked mid-mutation.
        self.inner.lock().unwrap()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("main")
    }
}

impl Graph {
    fn head(&self, branch: &str) -> SyncResult<String> {
        self.branches
            .get(branch)
            .cloned()
            .ok_or_else(|| SyncError::StoreUnavailable(format!("unknown branch '{}'", branch)))
    }

    fn head_tree(&self, branch: &str) -> SyncResult<&BTreeMap<String, String>> {
        let head = self.head(branch)?;
        let commit = self
            .commits
            .get(&head)
            .ok_or_else(|| SyncError::StoreUnavailable("dangling branch head".to_string()))?;
        self.trees
            .get(&commit.tree)
            .ok_or_else(|| SyncError::StoreUnavailable("dangling commit tree".to_string()))
    }
}

impl ObjectStore for MemoryStore {
    async fn get_file(&self, path: &str) -> SyncResult<Option<RemoteFile>> {
        let graph = self.lock();
        let tree = graph.head_tree(&self.branch)?;

        let Some(blob_sha) = tree.get(path) else {
            return Ok(None);
        };
        let content = graph
            .blobs
            .get(blob_sha)
            .cloned()
            .ok_or_else(|| SyncError::StoreUnavailable("dangling blob".to_string()))?;

        Ok(Some(RemoteFile {
            path: path.to_string(),
            content,
            sha: blob_sha.clone(),
        }))
    }

    async fn list_dir(&self, path: &str) -> SyncResult<Option<Vec<DirEntry>>> {
        let graph = self.lock();
        let tree = graph.head_tree(&self.branch)?;

        let dir = path.trim_matches('/');
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };

        let mut entries = Vec::new();
        let mut seen_dirs: Vec<String> = Vec::new();
        for full_path in tree.keys() {
            let Some(rest) = full_path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                None => entries.push(DirEntry {
                    name: rest.to_string(),
                    path: full_path.clone(),
                    kind: EntryKind::File,
                }),
                Some((child, _)) => {
                    if !seen_dirs.iter().any(|d| d == child) {
                        seen_dirs.push(child.to_string());
                        entries.push(DirEntry {
                            name: child.to_string(),
                            path: format!("{}{}", prefix, child),
                            kind: EntryKind::Dir,
                        });
                    }
                }
            }
        }

        if entries.is_empty() && !prefix.is_empty() {
            return Ok(None);
        }
        Ok(Some(entries))
    }

    async fn put_file(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        expected_sha: Option<&str>,
    ) -> SyncResult<PutOutcome> {
        let mut graph = self.lock();

        let head = graph.head(&self.branch)?;
        let mut tree = graph.head_tree(&self.branch)?.clone();

        // Token check mirrors the real store: a create must not clobber an
        // existing path, and a replace must name the live version.
        match (tree.get(path), expected_sha) {
            (None, None) => {}
            (Some(live), Some(expected)) if live == expected => {}
            _ => {
                return Err(SyncError::ConcurrencyConflict(format!(
                    "file '{}' changed since it was read",
                    path
                )))
            }
        }

        let blob_sha = object_id("blob", content);
        graph.blobs.insert(blob_sha.clone(), content.to_vec());
        tree.insert(path.to_string(), blob_sha.clone());

        let tree_sha = store_tree(&mut graph, tree);
        let commit_sha = store_commit(&mut graph, tree_sha, Some(head), message);
        graph
            .branches
            .insert(self.branch.clone(), commit_sha.clone());

        Ok(PutOutcome {
            commit_id: commit_sha,
            content_sha: blob_sha,
        })
    }

    async fn get_branch_head(&self) -> SyncResult<String> {
        self.lock().head(&self.branch)
    }

    async fn get_commit(&self, commit_id: &str) -> SyncResult<CommitInfo> {
        let graph = self.lock();
        let commit = graph
            .commits
            .get(commit_id)
            .ok_or_else(|| SyncError::StoreUnavailable(format!("unknown commit {}", commit_id)))?;
        Ok(CommitInfo {
            commit_id: commit_id.to_string(),
            tree_id: commit.tree.clone(),
        })
    }

    async fn create_blob(&self, content: &[u8]) -> SyncResult<String> {
        let mut graph = self.lock();
        let sha = object_id("blob", content);
        graph.blobs.insert(sha.clone(), content.to_vec());
        Ok(sha)
    }

    async fn create_tree(&self, base_tree: &str, entries: &[TreeWrite]) -> SyncResult<String> {
        let mut graph = self.lock();
        let mut tree = graph
            .trees
            .get(base_tree)
            .ok_or_else(|| SyncError::StoreUnavailable(format!("unknown tree {}", base_tree)))?
            .clone();

        for entry in entries {
            if !graph.blobs.contains_key(&entry.blob_sha) {
                return Err(SyncError::StoreUnavailable(format!(
                    "unknown blob {}",
                    entry.blob_sha
                )));
            }
            tree.insert(entry.path.clone(), entry.blob_sha.clone());
        }

        Ok(store_tree(&mut graph, tree))
    }

    async fn create_commit(
        &self,
        tree_id: &str,
        parent: &str,
        message: &str,
    ) -> SyncResult<String> {
        let mut graph = self.lock();
        if !graph.trees.contains_key(tree_id) {
            return Err(SyncError::StoreUnavailable(format!(
                "unknown tree {}",
                tree_id
            )));
        }
        if !graph.commits.contains_key(parent) {
            return Err(SyncError::StoreUnavailable(format!(
                "unknown parent commit {}",
                parent
            )));
        }
        Ok(store_commit(
            &mut graph,
            tree_id.to_string(),
            Some(parent.to_string()),
            message,
        ))
    }

    async fn update_branch(&self, new_commit: &str, expected_old: &str) -> SyncResult<String> {
        let mut graph = self.lock();

        if !graph.commits.contains_key(new_commit) {
            return Err(SyncError::StoreUnavailable(format!(
                "unknown commit {}",
                new_commit
            )));
        }

        let live = graph.head(&self.branch)?;
        if live != expected_old {
            return Err(SyncError::ConcurrencyConflict(format!(
                "branch '{}' no longer points at {}",
                self.branch, expected_old
            )));
        }

        graph
            .branches
            .insert(self.branch.clone(), new_commit.to_string());
        Ok(new_commit.to_string())
    }
}

fn store_tree(graph: &mut Graph, tree: BTreeMap<String, String>) -> String {
    let mut hasher = Sha256::new();
    for (path, blob) in &tree {
        hasher.update(path.as_bytes());
        hasher.update(b"\0");
        hasher.update(blob.as_bytes());
        hasher.update(b"\0");
    }
    let sha = hex_digest(hasher);
    graph.trees.insert(sha.clone(), tree);
    sha
}

fn store_commit(
    graph: &mut Graph,
    tree: String,
    parent: Option<String>,
    message: &str,
) -> String {
    graph.commit_seq += 1;
    let mut hasher = Sha256::new();
    hasher.update(tree.as_bytes());
    if let Some(ref p) = parent {
        hasher.update(p.as_bytes());
    }
    hasher.update(message.as_bytes());
    hasher.update(graph.commit_seq.to_be_bytes());
    let sha = hex_digest(hasher);

    graph.commits.insert(
        sha.clone(),
        StoredCommit {
            tree,
            parent,
            message: message.to_string(),
        },
    );
    sha
}

/// Content-addressed id for a raw payload
fn object_id(kind: &str, payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(b"\0");
    hasher.update(payload);
    hex_digest(hasher)
}

fn hex_digest(hasher: Sha256) -> String {
    let digest = hasher.finalize();
    digest.iter().take(20).map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryStore::default();
        let outcome = store
            .put_file("posts/a.md", b"hello", "add a", None)
            .await
            .unwrap();

        let file = store.get_file("posts/a.md").await.unwrap().unwrap();
        assert_eq!(file.content, b"hello");
        assert_eq!(file.sha, outcome.content_sha);
        assert_eq!(store.get_branch_head().await.unwrap(), outcome.commit_id);
    }

    #[tokio::test]
    async fn test_create_without_token_on_existing_path_conflicts() {
        let store = MemoryStore::default();
        store.put_file("a.md", b"one", "add", None).await.unwrap();

        let err = store.put_file("a.md", b"two", "add", None).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_stale_token_conflicts() {
        let store = MemoryStore::default();
        let first = store.put_file("a.md", b"one", "add", None).await.unwrap();
        store
            .put_file("a.md", b"two", "update", Some(&first.content_sha))
            .await
            .unwrap();

        // Replaying the original token must fail
        let err = store
            .put_file("a.md", b"three", "update", Some(&first.content_sha))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_update_branch_cas() {
        let store = MemoryStore::default();
        let head = store.get_branch_head().await.unwrap();
        let info = store.get_commit(&head).await.unwrap();

        let blob = store.create_blob(b"x").await.unwrap();
        let tree = store
            .create_tree(
                &info.tree_id,
                &[TreeWrite {
                    path: "x.md".to_string(),
                    blob_sha: blob,
                }],
            )
            .await
            .unwrap();
        let commit = store.create_commit(&tree, &head, "add x").await.unwrap();

        // CAS against a stale head fails once the branch has moved
        store.update_branch(&commit, &head).await.unwrap();
        let err = store.update_branch(&commit, &head).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_list_dir_and_missing_dir() {
        let store = MemoryStore::default();
        store
            .put_file("posts/a.md", b"a", "add", None)
            .await
            .unwrap();
        store
            .put_file("posts/sub/b.md", b"b", "add", None)
            .await
            .unwrap();

        let entries = store.list_dir("posts").await.unwrap().unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.md", "sub"]);
        assert_eq!(entries[1].kind, EntryKind::Dir);

        assert!(store.list_dir("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_file_on_directory_is_none() {
        let store = MemoryStore::default();
        store
            .put_file("posts/a.md", b"a", "add", None)
            .await
            .unwrap();
        assert!(store.get_file("posts").await.unwrap().is_none());
    }
}
