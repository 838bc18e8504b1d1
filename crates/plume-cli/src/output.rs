//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use plume_core::store::CommitResult;
use plume_core::Draft;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is in JSON mode
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single draft in full
    pub fn print_draft(&self, draft: &Draft) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", draft.id);
                println!("Title:   {}", draft.title);
                println!("Created: {}", draft.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated: {}", draft.updated_at.format("%Y-%m-%d %H:%M"));
                println!();
                println!("{}", draft.body);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(draft).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", draft.id);
            }
        }
    }

    /// Print a list of drafts
    pub fn print_drafts(&self, drafts: &[Draft]) {
        match self.format {
            OutputFormat::Human => {
                if drafts.is_empty() {
                    println!("No drafts found.");
                    return;
                }
                for draft in drafts {
                    println!(
                        "{} | {} | {}",
                        &draft.id.to_string()[..8],
                        truncate(&draft.title, 40),
                        draft.updated_at.format("%Y-%m-%d %H:%M")
                    );
                }
                println!("\n{} draft(s)", drafts.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(drafts).unwrap());
            }
            OutputFormat::Quiet => {
                for draft in drafts {
                    println!("{}", draft.id);
                }
            }
        }
    }

    /// Print a list of repository paths
    pub fn print_paths(&self, paths: &[String]) {
        match self.format {
            OutputFormat::Human => {
                if paths.is_empty() {
                    println!("No published documents found.");
                    return;
                }
                for path in paths {
                    println!("{}", path);
                }
                println!("\n{} file(s)", paths.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(paths).unwrap());
            }
            OutputFormat::Quiet => {
                for path in paths {
                    println!("{}", path);
                }
            }
        }
    }

    /// Print the result of a commit reaching the branch
    pub fn print_commit(&self, result: &CommitResult) {
        match self.format {
            OutputFormat::Human => {
                println!("Commit: {}", result.commit_id);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(result).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", result.commit_id);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}
