//! Preview command handler
//!
//! Renders markdown to sanitized HTML locally, without touching the
//! remote store.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use plume_core::render::render;
use plume_core::DraftStore;

use crate::output::Output;

/// Render a draft (by id prefix) or a local file to sanitized HTML
pub fn preview(
    store: &dyn DraftStore,
    id: Option<String>,
    file: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    let markup = match (id, file) {
        (Some(id), None) => {
            let draft = store
                .find_by_prefix(&id)?
                .ok_or_else(|| anyhow::anyhow!("Draft not found: {}", id))?;
            draft.body
        }
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?,
        (None, None) => bail!("Provide a draft id or --file <path>."),
        (Some(_), Some(_)) => bail!("Provide a draft id or --file <path>, not both."),
    };

    let html = render(&markup);
    if output.is_json() {
        println!("{}", serde_json::json!({ "html": html }));
    } else {
        println!("{}", html);
    }
    Ok(())
}
