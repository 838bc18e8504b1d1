//! Publish command handler
//!
//! Turns drafts into repository file writes and hands them to the sync
//! engine: one draft is a single-file upsert, several drafts go out as one
//! atomic batch commit so readers never see a partially published set.

use anyhow::{bail, Context, Result};

use plume_core::store::FileWrite;
use plume_core::{engine, Config, Draft, DraftStore, GithubClient, SyncError};

use crate::output::Output;

/// Publish one draft (by id prefix) or all drafts (`--all`)
pub async fn publish(
    store: &dyn DraftStore,
    config: &Config,
    id: Option<String>,
    all: bool,
    message: Option<String>,
    keep: bool,
    output: &Output,
) -> Result<()> {
    let drafts = select_drafts(store, id, all)?;

    let remote = config.remote()?;
    let client = GithubClient::new(&remote);

    let commit_message = message.unwrap_or_else(|| default_message(&drafts));
    output.message(&format!(
        "Publishing {} document(s) to {}/{} ({})...",
        drafts.len(),
        remote.owner,
        remote.repo,
        remote.branch
    ));

    let result = if drafts.len() == 1 {
        let write = drafts[0].to_file_write(&config.content_dir);
        engine::upsert_file(&client, &write.path, &write.content, &commit_message).await
    } else {
        let writes: Vec<FileWrite> = drafts
            .iter()
            .map(|draft| draft.to_file_write(&config.content_dir))
            .collect();
        engine::commit_batch(&client, &writes, &commit_message).await
    };

    let result = match result {
        Ok(r) => r,
        Err(e) if e.is_conflict() => {
            bail!(
                "Publish lost a race with another writer: {}\n\
                 Nothing was partially published. Re-run the command to retry.",
                e
            );
        }
        Err(SyncError::InvalidArgument(msg)) => bail!("Invalid publish request: {}", msg),
        Err(e) => return Err(e).context("Publish failed"),
    };

    if !keep {
        for draft in &drafts {
            store.delete(draft.id)?;
        }
    }

    output.print_commit(&result);
    output.success(&format!("Published {} document(s)", drafts.len()));
    Ok(())
}

fn select_drafts(store: &dyn DraftStore, id: Option<String>, all: bool) -> Result<Vec<Draft>> {
    if all {
        let drafts = store.load().context("Failed to load drafts")?;
        if drafts.is_empty() {
            bail!("No drafts to publish.");
        }
        return Ok(drafts);
    }

    let Some(id) = id else {
        bail!("Provide a draft id, or --all to publish every draft.");
    };
    let draft = store
        .find_by_prefix(&id)?
        .ok_or_else(|| anyhow::anyhow!("Draft not found: {}", id))?;
    Ok(vec![draft])
}

fn default_message(drafts: &[Draft]) -> String {
    match drafts {
        [single] => format!("publish: {}", single.title),
        many => format!("publish {} documents", many.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// In-memory draft store for exercising selection logic
    struct MemDrafts(Mutex<Vec<Draft>>);

    impl MemDrafts {
        fn with(drafts: Vec<Draft>) -> Self {
            Self(Mutex::new(drafts))
        }
    }

    impl DraftStore for MemDrafts {
        fn load(&self) -> Result<Vec<Draft>> {
            Ok(self.0.lock().unwrap().clone())
        }
        fn save(&self, drafts: &[Draft]) -> Result<()> {
            *self.0.lock().unwrap() = drafts.to_vec();
            Ok(())
        }
        fn delete(&self, id: Uuid) -> Result<bool> {
            let mut drafts = self.0.lock().unwrap();
            let before = drafts.len();
            drafts.retain(|d| d.id != id);
            Ok(drafts.len() != before)
        }
    }

    #[test]
    fn test_default_message() {
        let one = vec![Draft::new("Hello", "body")];
        assert_eq!(default_message(&one), "publish: Hello");

        let two = vec![Draft::new("A", "a"), Draft::new("B", "b")];
        assert_eq!(default_message(&two), "publish 2 documents");
    }

    #[test]
    fn test_select_all_drafts() {
        let store = MemDrafts::with(vec![Draft::new("A", "a"), Draft::new("B", "b")]);
        let selected = select_drafts(&store, None, true).unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_select_all_with_no_drafts_fails() {
        let store = MemDrafts::with(Vec::new());
        assert!(select_drafts(&store, None, true).is_err());
    }

    #[test]
    fn test_select_by_prefix() {
        let draft = Draft::new("Target", "body");
        let prefix = draft.id.to_string()[..8].to_string();
        let store = MemDrafts::with(vec![draft.clone(), Draft::new("Other", "o")]);

        let selected = select_drafts(&store, Some(prefix), false).unwrap();
        assert_eq!(selected, vec![draft]);
    }

    #[test]
    fn test_select_without_id_or_all_fails() {
        let store = MemDrafts::with(vec![Draft::new("A", "a")]);
        assert!(select_drafts(&store, None, false).is_err());
    }
}
