//! Config command handlers

use anyhow::{bail, Context, Result};

use plume_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    // The token is shown only as present/absent, never in clear form.
    let token_display = if config.token.is_some() {
        "(set)"
    } else {
        "(not set)"
    };

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "content_dir": config.content_dir,
                    "owner": config.owner,
                    "repo": config.repo,
                    "branch": config.branch,
                    "token": token_display,
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:    {}", config.data_dir.display());
            println!("  content_dir: {}", config.content_dir);
            println!("  owner:       {}", config.owner.as_deref().unwrap_or("(not set)"));
            println!("  repo:        {}", config.repo.as_deref().unwrap_or("(not set)"));
            println!("  branch:      {}", config.branch.as_deref().unwrap_or("(not set)"));
            println!("  token:       {}", token_display);
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;

    match key.as_str() {
        "data_dir" => {
            config.data_dir = value.clone().into();
        }
        "content_dir" => {
            config.content_dir = value.clone();
        }
        "owner" => {
            config.owner = optional(&value);
        }
        "repo" => {
            config.repo = optional(&value);
        }
        "branch" => {
            config.branch = optional(&value);
        }
        "token" => {
            config.token = optional(&value);
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, content_dir, owner, repo, branch, token",
                key
            );
        }
    }

    config.save().context("Failed to save configuration")?;

    // Echo the key only; the value may be a credential.
    if key == "token" {
        output.success(&format!("Set {}", key));
    } else {
        output.success(&format!("Set {} = {}", key, value));
    }

    Ok(())
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}
