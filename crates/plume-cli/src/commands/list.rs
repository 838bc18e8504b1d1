//! List command handler

use anyhow::{Context, Result};

use plume_core::{engine, Config, GithubClient};

use crate::output::Output;

/// List published markdown files in a repository directory
pub async fn list(config: &Config, dir: Option<String>, output: &Output) -> Result<()> {
    let remote = config.remote()?;
    let client = GithubClient::new(&remote);

    let directory = dir.unwrap_or_else(|| config.content_dir.clone());
    let paths = engine::list_markup_files(&client, &directory)
        .await
        .context("Listing failed")?;

    output.print_paths(&paths);
    Ok(())
}
