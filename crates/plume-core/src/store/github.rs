//! GitHub REST implementation of the object store
//!
//! Uses two API families:
//! - the contents API for reads, listings, and single-file upserts
//! - the git data API (blobs/trees/commits/refs) for multi-file commits
//!
//! File bytes cross the wire base64-encoded in both directions. The
//! conditional branch move is expressed as a non-force ref update: the store
//! rejects anything that is not a fast-forward, which is exactly the
//! compare-and-swap this core relies on.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::types::{CommitInfo, DirEntry, EntryKind, PutOutcome, RemoteFile, TreeWrite};
use super::ObjectStore;
use crate::config::RemoteConfig;
use crate::error::{SyncError, SyncResult};

/// Default API root (overridable for self-hosted instances)
const DEFAULT_API_ROOT: &str = "https://api.github.com";

/// File mode for regular files in tree entries
const REGULAR_FILE_MODE: &str = "100644";

/// GitHub object store client, scoped to one repository and branch
pub struct GithubClient {
    http: Client,
    api_root: String,
    owner: String,
    repo: String,
    token: String,
    branch: String,
}

impl GithubClient {
    /// Create a client from remote settings
    pub fn new(remote: &RemoteConfig) -> Self {
        Self {
            http: Client::new(),
            api_root: DEFAULT_API_ROOT.to_string(),
            owner: remote.owner.clone(),
            repo: remote.repo.clone(),
            token: remote.token.clone(),
            branch: remote.branch.clone(),
        }
    }

    /// Override the API root (GitHub Enterprise, local test server)
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into().trim_end_matches('/').to_string();
        self
    }

    /// Branch this client operates on
    pub fn branch(&self) -> &str {
        &self.branch
    }

    fn repo_url(&self, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_root, self.owner, self.repo, tail
        )
    }

    /// Contents API URL for a repository path.
    ///
    /// Each path segment is percent-encoded; the separating slashes stay.
    fn contents_url(&self, path: &str) -> String {
        let encoded = path
            .trim_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        self.repo_url(&format!("contents/{}", encoded))
    }

    /// Attach the standard headers. The token goes out as a bearer
    /// credential and is never logged.
    fn prepare(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", concat!("plume/", env!("CARGO_PKG_VERSION")))
    }

    async fn get(&self, url: &str) -> SyncResult<Response> {
        debug!(%url, "store GET");
        Ok(self.prepare(self.http.get(url)).send().await?)
    }

    async fn post(&self, url: &str, body: serde_json::Value) -> SyncResult<Response> {
        debug!(%url, "store POST");
        Ok(self.prepare(self.http.post(url)).json(&body).send().await?)
    }

    /// Fetch raw blob bytes by id via the git data API.
    ///
    /// Used when a contents-API read cannot carry the bytes inline.
    async fn get_blob(&self, sha: &str) -> SyncResult<Vec<u8>> {
        let url = self.repo_url(&format!("git/blobs/{}", sha));
        let response = self.get(&url).await?;
        if !response.status().is_success() {
            return Err(Self::store_error(response).await);
        }
        let blob: BlobResponse = response.json().await?;
        if blob.encoding != "base64" {
            return Err(SyncError::StoreUnavailable(format!(
                "blob {} has unsupported encoding '{}'",
                sha, blob.encoding
            )));
        }
        decode_base64_content(&blob.content)
    }

    /// Turn a failed response into `StoreUnavailable`, keeping the store's
    /// own message when it sends one
    async fn store_error(response: Response) -> SyncError {
        let status = response.status();
        let detail = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.message)
            .unwrap_or_default();
        if detail.is_empty() {
            SyncError::StoreUnavailable(format!("store returned status {}", status))
        } else {
            SyncError::StoreUnavailable(format!("store returned status {}: {}", status, detail))
        }
    }
}

impl ObjectStore for GithubClient {
    async fn get_file(&self, path: &str) -> SyncResult<Option<RemoteFile>> {
        let url = format!("{}?ref={}", self.contents_url(path), self.branch);
        let response = self.get(&url).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::store_error(response).await);
        }

        // The same endpoint answers with an array for directories.
        let body: serde_json::Value = response.json().await?;
        if body.is_array() {
            return Ok(None);
        }

        let item: ContentItem =
            serde_json::from_value(body).map_err(|e| SyncError::StoreUnavailable(e.to_string()))?;
        if item.kind != "file" {
            return Ok(None);
        }

        // Above the contents API's size cap the item arrives with
        // encoding "none" and empty content; the bytes must come from the
        // blob endpoint instead.
        let content = match inline_content(&item) {
            Some(raw) => decode_base64_content(raw)?,
            None => self.get_blob(&item.sha).await?,
        };
        Ok(Some(RemoteFile {
            path: item.path,
            content,
            sha: item.sha,
        }))
    }

    async fn list_dir(&self, path: &str) -> SyncResult<Option<Vec<DirEntry>>> {
        let url = format!("{}?ref={}", self.contents_url(path), self.branch);
        let response = self.get(&url).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::store_error(response).await);
        }

        let body: serde_json::Value = response.json().await?;
        let items: Vec<ContentItem> = if body.is_array() {
            serde_json::from_value(body).map_err(|e| SyncError::StoreUnavailable(e.to_string()))?
        } else {
            // A file path: present it as a single-entry listing.
            vec![serde_json::from_value(body)
                .map_err(|e| SyncError::StoreUnavailable(e.to_string()))?]
        };

        Ok(Some(items.into_iter().map(DirEntry::from).collect()))
    }

    async fn put_file(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        expected_sha: Option<&str>,
    ) -> SyncResult<PutOutcome> {
        let mut body = json!({
            "message": message,
            "content": BASE64.encode(content),
            "branch": self.branch,
        });
        if let Some(sha) = expected_sha {
            body["sha"] = json!(sha);
        }

        let url = self.contents_url(path);
        debug!(%url, "store PUT");
        let response = self.prepare(self.http.put(&url)).json(&body).send().await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let put: PutResponse = response.json().await?;
                Ok(PutOutcome {
                    commit_id: put.commit.sha,
                    content_sha: put.content.sha,
                })
            }
            // The store rejects writes whose token no longer matches the
            // live version (409), or that omit/mismatch a required token
            // for an existing path (422).
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                warn!(path, "single-file write rejected: token stale");
                Err(SyncError::ConcurrencyConflict(format!(
                    "file '{}' changed since it was read",
                    path
                )))
            }
            _ => Err(Self::store_error(response).await),
        }
    }

    async fn get_branch_head(&self) -> SyncResult<String> {
        let url = self.repo_url(&format!("git/ref/heads/{}", self.branch));
        let response = self.get(&url).await?;
        if !response.status().is_success() {
            return Err(Self::store_error(response).await);
        }
        let reference: RefResponse = response.json().await?;
        Ok(reference.object.sha)
    }

    async fn get_commit(&self, commit_id: &str) -> SyncResult<CommitInfo> {
        let url = self.repo_url(&format!("git/commits/{}", commit_id));
        let response = self.get(&url).await?;
        if !response.status().is_success() {
            return Err(Self::store_error(response).await);
        }
        let commit: CommitObject = response.json().await?;
        Ok(CommitInfo {
            commit_id: commit.sha,
            tree_id: commit.tree.sha,
        })
    }

    async fn create_blob(&self, content: &[u8]) -> SyncResult<String> {
        let url = self.repo_url("git/blobs");
        let body = json!({
            "content": BASE64.encode(content),
            "encoding": "base64",
        });
        let response = self.post(&url, body).await?;
        if !response.status().is_success() {
            return Err(Self::store_error(response).await);
        }
        let created: ShaOnly = response.json().await?;
        Ok(created.sha)
    }

    async fn create_tree(&self, base_tree: &str, entries: &[TreeWrite]) -> SyncResult<String> {
        let url = self.repo_url("git/trees");
        let tree: Vec<serde_json::Value> = entries
            .iter()
            .map(|entry| {
                json!({
                    "path": entry.path,
                    "mode": REGULAR_FILE_MODE,
                    "type": "blob",
                    "sha": entry.blob_sha,
                })
            })
            .collect();
        let body = json!({ "base_tree": base_tree, "tree": tree });

        let response = self.post(&url, body).await?;
        if !response.status().is_success() {
            return Err(Self::store_error(response).await);
        }
        let created: ShaOnly = response.json().await?;
        Ok(created.sha)
    }

    async fn create_commit(
        &self,
        tree_id: &str,
        parent: &str,
        message: &str,
    ) -> SyncResult<String> {
        let url = self.repo_url("git/commits");
        let body = json!({
            "message": message,
            "tree": tree_id,
            "parents": [parent],
        });
        let response = self.post(&url, body).await?;
        if !response.status().is_success() {
            return Err(Self::store_error(response).await);
        }
        let created: ShaOnly = response.json().await?;
        Ok(created.sha)
    }

    async fn update_branch(&self, new_commit: &str, expected_old: &str) -> SyncResult<String> {
        let url = self.repo_url(&format!("git/refs/heads/{}", self.branch));
        // force=false makes this a fast-forward-only move. Callers always
        // pass an expected_old that is the sole parent of new_commit, so a
        // rejected update means the branch no longer points at expected_old.
        let body = json!({ "sha": new_commit, "force": false });

        debug!(%url, "store PATCH");
        let response = self
            .prepare(self.http.patch(&url))
            .json(&body)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let reference: RefResponse = response.json().await?;
                Ok(reference.object.sha)
            }
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                warn!(
                    branch = %self.branch,
                    "branch moved past {} before the update landed", expected_old
                );
                Err(SyncError::ConcurrencyConflict(format!(
                    "branch '{}' no longer points at {}",
                    self.branch, expected_old
                )))
            }
            _ => Err(Self::store_error(response).await),
        }
    }
}

/// Decode contents-API base64, which arrives with embedded newlines
fn decode_base64_content(raw: &str) -> SyncResult<Vec<u8>> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(compact.as_bytes())
        .map_err(|e| SyncError::StoreUnavailable(format!("invalid base64 content: {}", e)))
}

/// Inline bytes from a contents-API item, when they are actually usable
fn inline_content(item: &ContentItem) -> Option<&str> {
    match (item.encoding.as_deref(), item.content.as_deref()) {
        (Some("base64"), Some(content)) => Some(content),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    name: String,
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

impl From<ContentItem> for DirEntry {
    fn from(item: ContentItem) -> Self {
        let kind = match item.kind.as_str() {
            "file" => EntryKind::File,
            "dir" => EntryKind::Dir,
            _ => EntryKind::Other,
        };
        DirEntry {
            name: item.name,
            path: item.path,
            kind,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BlobResponse {
    content: String,
    encoding: String,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: ShaOnly,
    commit: ShaOnly,
}

#[derive(Debug, Deserialize)]
struct ShaOnly {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: ShaOnly,
}

#[derive(Debug, Deserialize)]
struct CommitObject {
    sha: String,
    tree: ShaOnly,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}
