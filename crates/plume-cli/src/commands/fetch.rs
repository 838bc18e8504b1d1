//! Fetch command handler

use anyhow::{bail, Context, Result};

use plume_core::{engine, Config, GithubClient, SyncError};

use crate::output::Output;

/// Fetch a published file and print its content
pub async fn fetch(config: &Config, path: String, output: &Output) -> Result<()> {
    let remote = config.remote()?;
    let client = GithubClient::new(&remote);

    let content = match engine::fetch_file(&client, &path).await {
        Ok(bytes) => bytes,
        Err(SyncError::NotFound { path }) => bail!("No file at '{}'", path),
        Err(e) => return Err(e).context("Fetch failed"),
    };

    let text = String::from_utf8_lossy(&content);
    if output.is_json() {
        println!(
            "{}",
            serde_json::json!({ "path": path, "content": text })
        );
    } else {
        print!("{}", text);
    }
    Ok(())
}
