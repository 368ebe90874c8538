//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Two configuration scopes share the [`FileConfig`] schema:
//! - **Global**: User-level settings
//! - **Repo**: Repository-level overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. Explicit `CommitOptions` fields (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$COMMITWORK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/commitwork/config.toml`
//! 3. `~/.commitwork/config.toml`
//!
//! # Repo Config Location
//!
//! `<git_dir>/commitwork/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use commitwork::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/repo/.git"))).unwrap();
//! let config = result.config;
//!
//! println!("Commits advance: {}", config.update_ref());
//! if let Some(identity) = config.identity() {
//!     println!("Default identity: {} <{}>", identity.name, identity.email);
//! }
//! ```

pub mod schema;

pub use schema::{FileConfig, IdentityConfig};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::signature::Identity;
use crate::core::types::RefName;

/// Environment variable overriding the global config path.
pub const CONFIG_ENV: &str = "COMMITWORK_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence: repo config overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: FileConfig,
    /// Repository configuration (if in a repo)
    pub repo: Option<FileConfig>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Build a config from in-memory scopes, without touching the filesystem.
    pub fn from_scopes(global: FileConfig, repo: Option<FileConfig>) -> Self {
        Self {
            global,
            repo,
            global_path: None,
            repo_path: None,
        }
    }

    /// Load configuration from default locations.
    ///
    /// If `git_dir` is provided, also loads repo-specific config from it.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or
    /// contain invalid values. Missing files are not an error.
    pub fn load(git_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let (global, global_path) = Self::load_global()?;

        let (repo, repo_path) = match git_dir {
            Some(dir) => Self::load_repo(dir)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        // An identity split across scopes is almost always a mistake.
        if let Some(path) = &repo_path {
            let repo_identity = repo.as_ref().and_then(|r| r.identity.as_ref());
            if let Some(identity) = repo_identity {
                if identity.name.is_some() != identity.email.is_some() {
                    warnings.push(ConfigWarning {
                        message: "repo identity sets only one of name/email; \
                                  the other falls back to global config"
                            .to_string(),
                        path: path.clone(),
                    });
                }
            }
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo,
                global_path,
                repo_path,
            },
            warnings,
        })
    }

    fn load_global() -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
        // 1. $COMMITWORK_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 2. $XDG_CONFIG_HOME/commitwork/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("commitwork/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 3. ~/.commitwork/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".commitwork/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((FileConfig::default(), None))
    }

    fn load_repo(git_dir: &Path) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigError> {
        let path = Self::repo_config_path(git_dir);
        if !path.exists() {
            return Ok((None, None));
        }
        let config = Self::read_config(&path)?;
        Ok((Some(config), Some(path)))
    }

    fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the path for repo config (`<git_dir>/commitwork/config.toml`).
    pub fn repo_config_path(git_dir: &Path) -> PathBuf {
        git_dir.join("commitwork/config.toml")
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Reference advanced by commit creation.
    ///
    /// Defaults to `HEAD` if not configured. Values were validated at load.
    pub fn update_ref(&self) -> RefName {
        self.repo
            .as_ref()
            .and_then(|r| r.update_ref.as_deref())
            .or(self.global.update_ref.as_deref())
            .and_then(|name| RefName::new(name).ok())
            .unwrap_or_default()
    }

    /// Default identity, merged field by field (repo over global).
    pub fn identity(&self) -> Option<Identity> {
        let repo = self.repo.as_ref().and_then(|r| r.identity.as_ref());
        let global = self.global.identity.as_ref();

        IdentityConfig {
            name: repo
                .and_then(|i| i.name.clone())
                .or_else(|| global.and_then(|i| i.name.clone())),
            email: repo
                .and_then(|i| i.email.clone())
                .or_else(|| global.and_then(|i| i.email.clone())),
        }
        .to_identity()
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}
