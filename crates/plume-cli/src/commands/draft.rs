//! Draft command handlers
//!
//! Drafts are local documents; nothing here touches the remote store.

use std::io::Read;

use anyhow::{bail, Context, Result};

use plume_core::render::extract_title;
use plume_core::{Draft, DraftStore};

use crate::output::Output;

/// Create a new draft
pub fn create(
    store: &dyn DraftStore,
    title: Option<String>,
    body: Option<String>,
    output: &Output,
) -> Result<()> {
    let body_content = match body {
        Some(b) => b,
        None => {
            // Read the body from stdin (pipe or heredoc)
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read draft body from stdin")?;
            buffer.trim().to_string()
        }
    };

    if body_content.is_empty() {
        bail!("Draft body cannot be empty");
    }

    let title = title.unwrap_or_else(|| extract_title(&body_content));
    let draft = Draft::new(title, body_content);
    let draft_id = draft.id;

    store.add(&draft).context("Failed to save draft")?;

    if output.is_quiet() {
        println!("{}", draft_id);
    } else {
        output.success(&format!(
            "Created draft {} - {}",
            &draft_id.to_string()[..8],
            draft.title
        ));
    }
    Ok(())
}

/// List all drafts
pub fn list(store: &dyn DraftStore, output: &Output) -> Result<()> {
    let drafts = store.load().context("Failed to load drafts")?;
    output.print_drafts(&drafts);
    Ok(())
}

/// Show a draft in full
pub fn show(store: &dyn DraftStore, id: String, output: &Output) -> Result<()> {
    let draft = store
        .find_by_prefix(&id)?
        .ok_or_else(|| anyhow::anyhow!("Draft not found: {}", id))?;
    output.print_draft(&draft);
    Ok(())
}

/// Delete a draft
pub fn delete(store: &dyn DraftStore, id: String, output: &Output) -> Result<()> {
    let draft = store
        .find_by_prefix(&id)?
        .ok_or_else(|| anyhow::anyhow!("Draft not found: {}", id))?;

    if output.should_prompt() && !confirm(&format!("Delete draft '{}'?", draft.title))? {
        output.message("Cancelled.");
        return Ok(());
    }

    store.delete(draft.id)?;
    output.success(&format!("Deleted draft {}", &draft.id.to_string()[..8]));
    Ok(())
}

/// Ask a yes/no question on stdin, defaulting to no
fn confirm(question: &str) -> Result<bool> {
    use std::io::Write;

    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
