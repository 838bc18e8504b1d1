//! Plume CLI
//!
//! Command-line interface for Plume - write markdown locally, publish it
//! as committed files in a remote repository.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use plume_core::{Config, FileDraftStore};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "plume")]
#[command(about = "Plume - publish markdown documents to a git-backed repository")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage local drafts
    Draft {
        #[command(subcommand)]
        command: DraftCommands,
    },
    /// Publish drafts to the remote repository
    Publish {
        /// Draft ID (full UUID or prefix)
        id: Option<String>,
        /// Publish every draft as one atomic commit
        #[arg(long, conflicts_with = "id")]
        all: bool,
        /// Commit message (defaults to a message naming the documents)
        #[arg(short, long)]
        message: Option<String>,
        /// Keep drafts locally after publishing
        #[arg(long)]
        keep: bool,
    },
    /// Fetch a published file and print it
    Fetch {
        /// Repository-relative path
        path: String,
    },
    /// List published markdown files
    #[command(alias = "ls")]
    List {
        /// Repository directory (defaults to the configured content_dir)
        dir: Option<String>,
    },
    /// Render a draft or file to sanitized HTML
    Preview {
        /// Draft ID (full UUID or prefix)
        id: Option<String>,
        /// Render a local file instead of a draft
        #[arg(long, conflicts_with = "id")]
        file: Option<PathBuf>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum DraftCommands {
    /// Create a new draft (body from --body or stdin)
    #[command(alias = "new")]
    Create {
        /// Draft title (derived from the body if omitted)
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// Draft body (reads stdin if not provided)
        #[arg(short, long)]
        body: Option<String>,
    },
    /// List all drafts
    #[command(alias = "ls")]
    List,
    /// Show a draft in full
    Show {
        /// Draft ID (full UUID or prefix)
        id: String,
    },
    /// Delete a draft
    #[command(alias = "rm")]
    Delete {
        /// Draft ID (full UUID or prefix)
        id: String,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, content_dir, owner, repo, branch, token)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need the draft store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), &output);
    }

    let config = Config::load()?;
    config.ensure_data_dir()?;
    let drafts = FileDraftStore::new(config.drafts_path());

    match cli.command {
        Commands::Draft { command } => handle_draft_command(command, &drafts, &output),
        Commands::Publish {
            id,
            all,
            message,
            keep,
        } => commands::publish::publish(&drafts, &config, id, all, message, keep, &output).await,
        Commands::Fetch { path } => commands::fetch::fetch(&config, path, &output).await,
        Commands::List { dir } => commands::list::list(&config, dir, &output).await,
        Commands::Preview { id, file } => commands::preview::preview(&drafts, id, file, &output),
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_draft_command(
    command: DraftCommands,
    store: &FileDraftStore,
    output: &Output,
) -> Result<()> {
    match command {
        DraftCommands::Create { title, body } => commands::draft::create(store, title, body, output),
        DraftCommands::List => commands::draft::list(store, output),
        DraftCommands::Show { id } => commands::draft::show(store, id, output),
        DraftCommands::Delete { id } => commands::draft::delete(store, id, output),
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}
