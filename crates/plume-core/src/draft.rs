//! Local draft persistence
//!
//! Drafts live outside the remote repository until published. The store is
//! an explicit collaborator interface so composition code can swap the
//! medium (the tests use an in-memory implementation); the default is a
//! JSON file under the data directory, written atomically (temp file, then
//! rename) to prevent corruption.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::models::Draft;

/// Persistence interface for unpublished drafts
pub trait DraftStore {
    /// Load all drafts. An empty store yields an empty list.
    fn load(&self) -> Result<Vec<Draft>>;

    /// Replace the stored draft list
    fn save(&self, drafts: &[Draft]) -> Result<()>;

    /// Delete a draft by id. Returns whether anything was removed.
    fn delete(&self, id: Uuid) -> Result<bool>;

    /// Find a draft whose id starts with `prefix`
    fn find_by_prefix(&self, prefix: &str) -> Result<Option<Draft>> {
        let matches: Vec<Draft> = self
            .load()?
            .into_iter()
            .filter(|draft| draft.id.to_string().starts_with(prefix))
            .collect();
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches.into_iter().next().unwrap())),
            n => anyhow::bail!("Draft id prefix '{}' is ambiguous ({} matches)", prefix, n),
        }
    }

    /// Add a single draft to the store
    fn add(&self, draft: &Draft) -> Result<()> {
        let mut drafts = self.load()?;
        drafts.push(draft.clone());
        self.save(&drafts)
    }
}

/// JSON-file draft store
pub struct FileDraftStore {
    path: PathBuf,
}

impl FileDraftStore {
    /// Create a store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File this store persists to
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DraftStore for FileDraftStore {
    fn load(&self) -> Result<Vec<Draft>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read drafts from {:?}", self.path))?;
        let drafts: Vec<Draft> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse drafts in {:?}", self.path))?;
        Ok(drafts)
    }

    fn save(&self, drafts: &[Draft]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(drafts).context("Failed to serialize drafts")?;
        atomic_write(&self.path, content.as_bytes())
            .with_context(|| format!("Failed to save drafts to {:?}", self.path))?;
        Ok(())
    }

    fn delete(&self, id: Uuid) -> Result<bool> {
        let mut drafts = self.load()?;
        let before = drafts.len();
        drafts.retain(|draft| draft.id != id);

        if drafts.len() == before {
            return Ok(false);
        }
        self.save(&drafts)?;
        Ok(true)
    }
}

/// Write to a temp file in the same directory, then rename into place
fn atomic_write(target: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = target.with_extension("tmp");

    let mut file = File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp file {:?}", tmp_path))?;
    file.write_all(bytes)
        .with_context(|| format!("Failed to write temp file {:?}", tmp_path))?;
    file.sync_all()
        .with_context(|| format!("Failed to sync temp file {:?}", tmp_path))?;

    fs::rename(&tmp_path, target)
        .with_context(|| format!("Failed to rename {:?} to {:?}", tmp_path, target))?;
    Ok(())
}
