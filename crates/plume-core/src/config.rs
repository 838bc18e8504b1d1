//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/plume/config.toml)
//! 3. Environment variables (PLUME_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Environment variable prefix
const ENV_PREFIX: &str = "PLUME";

/// Branch used when the config does not name one
pub const DEFAULT_BRANCH: &str = "main";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for local data (draft store)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Repository directory that published documents land in
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    /// Remote repository owner (user or organization)
    #[serde(default)]
    pub owner: Option<String>,

    /// Remote repository name
    #[serde(default)]
    pub repo: Option<String>,

    /// Target branch (defaults to "main" when absent)
    #[serde(default)]
    pub branch: Option<String>,

    /// Access token for the remote store
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            content_dir: default_content_dir(),
            owner: None,
            repo: None,
            branch: None,
            token: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (PLUME_DATA_DIR, PLUME_GITHUB_OWNER, ...)
    /// 2. Config file (~/.config/plume/config.toml or PLUME_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_CONTENT_DIR", ENV_PREFIX)) {
            if !val.is_empty() {
                self.content_dir = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_GITHUB_OWNER", ENV_PREFIX)) {
            self.owner = non_empty(val);
        }

        if let Ok(val) = std::env::var(format!("{}_GITHUB_REPO", ENV_PREFIX)) {
            self.repo = non_empty(val);
        }

        if let Ok(val) = std::env::var(format!("{}_GITHUB_BRANCH", ENV_PREFIX)) {
            self.branch = non_empty(val);
        }

        if let Ok(val) = std::env::var(format!("{}_GITHUB_TOKEN", ENV_PREFIX)) {
            self.token = non_empty(val);
        }
    }

    /// Ensure data directory exists
    pub fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default file location
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with PLUME_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("plume")
            .join("config.toml")
    }

    /// Get the path to the draft store file
    pub fn drafts_path(&self) -> PathBuf {
        self.data_dir.join("drafts.json")
    }

    /// Build the remote store configuration, validating required fields
    pub fn remote(&self) -> Result<RemoteConfig> {
        let owner = match self.owner.as_deref() {
            Some(o) => o.to_string(),
            None => {
                bail!("Remote owner not configured. Set it with:\n  plume config set owner <name>")
            }
        };
        let repo = match self.repo.as_deref() {
            Some(r) => r.to_string(),
            None => {
                bail!("Remote repo not configured. Set it with:\n  plume config set repo <name>")
            }
        };
        let token = match self.token.as_deref() {
            Some(t) => t.to_string(),
            None => bail!(
                "Access token not configured. Set it with:\n  \
                 plume config set token <token>\n\
                 or export PLUME_GITHUB_TOKEN"
            ),
        };

        Ok(RemoteConfig {
            owner,
            repo,
            token,
            branch: self
                .branch
                .clone()
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
        })
    }
}

fn non_empty(val: String) -> Option<String> {
    if val.is_empty() {
        None
    } else {
        Some(val)
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plume")
}

fn default_content_dir() -> String {
    "posts".to_string()
}

/// Immutable remote store settings for one operation
///
/// Constructed per call from [`Config::remote`] and passed explicitly to
/// the store client; nothing mutates it afterwards.
#[derive(Clone)]
pub struct RemoteConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Access token, sent as a bearer credential and never logged
    pub token: String,
    /// Target branch
    pub branch: String,
}

// Manual Debug so the token cannot leak through diagnostic output.
impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &"<redacted>")
            .field("branch", &self.branch)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap();
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            // Clear all the vars
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "PLUME_DATA_DIR",
        "PLUME_CONTENT_DIR",
        "PLUME_GITHUB_OWNER",
        "PLUME_GITHUB_REPO",
        "PLUME_GITHUB_BRANCH",
        "PLUME_GITHUB_TOKEN",
    ];

    #[test]
    fn test_default_config() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::default();
        assert!(config.owner.is_none());
        assert!(config.token.is_none());
        assert_eq!(config.content_dir, "posts");
        assert!(config.data_dir.ends_with("plume"));
    }

    #[test]
    fn test_env_overrides() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("PLUME_DATA_DIR", "/tmp/plume-test");
        env::set_var("PLUME_GITHUB_OWNER", "octocat");
        env::set_var("PLUME_GITHUB_TOKEN", "tok-123");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/plume-test"));
        assert_eq!(config.owner.as_deref(), Some("octocat"));
        assert_eq!(config.token.as_deref(), Some("tok-123"));

        // Empty string clears optional values
        env::set_var("PLUME_GITHUB_OWNER", "");
        config.apply_env_overrides();
        assert!(config.owner.is_none());
    }

    #[test]
    fn test_remote_requires_owner_repo_token() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        assert!(config.remote().is_err());

        config.owner = Some("octocat".to_string());
        config.repo = Some("blog".to_string());
        assert!(config.remote().is_err());

        config.token = Some("tok".to_string());
        let remote = config.remote().unwrap();
        assert_eq!(remote.owner, "octocat");
        assert_eq!(remote.branch, DEFAULT_BRANCH);
    }

    #[test]
    fn test_remote_branch_override() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            owner: Some("octocat".to_string()),
            repo: Some("blog".to_string()),
            token: Some("tok".to_string()),
            branch: Some("gh-pages".to_string()),
            ..Config::default()
        };
        assert_eq!(config.remote().unwrap().branch, "gh-pages");
    }

    #[test]
    fn test_debug_redacts_token() {
        let remote = RemoteConfig {
            owner: "octocat".to_string(),
            repo: "blog".to_string(),
            token: "ghp_supersecret".to_string(),
            branch: "main".to_string(),
        };

        let rendered = format!("{:?}", remote);
        assert!(!rendered.contains("supersecret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            content_dir = "articles"
            owner = "octocat"
            repo = "blog"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.content_dir, "articles");
        assert_eq!(config.owner.as_deref(), Some("octocat"));
        assert!(config.branch.is_none());
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        // Should return defaults when file doesn't exist
        assert!(config.owner.is_none());
        assert_eq!(config.content_dir, "posts");
    }

    #[test]
    fn test_serialization_round_trip() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/plume"),
            content_dir: "posts".to_string(),
            owner: Some("octocat".to_string()),
            repo: Some("blog".to_string()),
            branch: Some("main".to_string()),
            token: None,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.owner, config.owner);
        assert_eq!(parsed.branch, config.branch);
    }
}
