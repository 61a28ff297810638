//! Gate configuration and project layout.
//!
//! Configuration can only relocate state; it never adds or removes checks.
//! Precedence for the session log: `DELEGATE_GATE_SESSION_LOG` env var, then
//! `session_log` in `.claude/hooks/delegate-gate.toml`, then the default
//! `.claude/state/delegation.log`. The config file lives inside the
//! integrity-protected hook namespace so an agent cannot point the gate at a
//! log it controls.

use crate::core::error::GateError;
use crate::core::paths;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const SESSION_LOG_ENV: &str = "DELEGATE_GATE_SESSION_LOG";
pub const PROJECT_DIR_ENV: &str = "CLAUDE_PROJECT_DIR";
pub const LOG_FILTER_ENV: &str = "DELEGATE_GATE_LOG";
pub const HOME_ENV: &str = "HOME";

pub const CONFIG_NAMESPACE: &str = ".claude";
pub const HOOKS_DIR: &str = "hooks";
pub const EXTENSIONS_DIR: &str = "extensions";
pub const STATE_DIR: &str = "state";
pub const SESSION_LOG_FILE: &str = "delegation.log";
pub const CONFIG_FILE: &str = "delegate-gate.toml";

/// Project-scoped locations, rooted at a canonical project directory, plus
/// the user-level config namespace under `$HOME`.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
    home: Option<PathBuf>,
}

impl ProjectLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: paths::canonicalize_dir(root),
            home: env_path(HOME_ENV).map(|home| paths::canonicalize_dir(&home)),
        }
    }

    /// Replace the home directory taken from the environment.
    pub fn with_home(mut self, home: Option<&Path>) -> Self {
        self.home = home.map(paths::canonicalize_dir);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `$HOME/.claude`, when a home directory is known.
    pub fn user_config_dir(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|home| home.join(CONFIG_NAMESPACE))
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_NAMESPACE)
    }

    pub fn hooks_dir(&self) -> PathBuf {
        self.config_dir().join(HOOKS_DIR)
    }

    pub fn extensions_dir(&self) -> PathBuf {
        self.hooks_dir().join(EXTENSIONS_DIR)
    }

    pub fn default_session_log(&self) -> PathBuf {
        self.config_dir().join(STATE_DIR).join(SESSION_LOG_FILE)
    }

    pub fn config_file(&self) -> PathBuf {
        self.hooks_dir().join(CONFIG_FILE)
    }
}

/// On-disk shape of `delegate-gate.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Session log location; relative paths are taken from the project root.
    pub session_log: Option<PathBuf>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub layout: ProjectLayout,
    pub session_log: PathBuf,
}

impl GateConfig {
    /// Layer env override, file config and defaults for `layout`.
    pub fn layered(layout: ProjectLayout, file: FileConfig, env_log: Option<PathBuf>) -> Self {
        let session_log = env_log
            .or(file.session_log)
            .map(|p| {
                if p.is_absolute() {
                    p
                } else {
                    layout.root().join(p)
                }
            })
            .unwrap_or_else(|| layout.default_session_log());
        Self {
            layout,
            session_log,
        }
    }

    /// Resolve from the process environment. `project_dir` wins over
    /// `CLAUDE_PROJECT_DIR`, which wins over the current directory.
    pub fn from_env(project_dir: Option<PathBuf>) -> Result<Self, GateError> {
        let layout = ProjectLayout::new(&resolve_root(project_dir)?);
        let file = load_file_config(&layout.config_file())?;
        Ok(Self::layered(layout, file, env_path(SESSION_LOG_ENV)))
    }

    /// Like [`GateConfig::from_env`], but a broken config file falls back to defaults.
    pub fn from_env_lenient(project_dir: Option<PathBuf>) -> Result<Self, GateError> {
        let layout = ProjectLayout::new(&resolve_root(project_dir)?);
        let file = load_file_config(&layout.config_file()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable gate config");
            FileConfig::default()
        });
        Ok(Self::layered(layout, file, env_path(SESSION_LOG_ENV)))
    }
}

fn resolve_root(project_dir: Option<PathBuf>) -> Result<PathBuf, GateError> {
    match project_dir.or_else(|| env_path(PROJECT_DIR_ENV)) {
        Some(dir) => Ok(dir),
        None => Ok(std::env::current_dir()?),
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Missing file = defaults (not an error).
pub fn load_file_config(path: &Path) -> Result<FileConfig, GateError> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| GateError::ConfigError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
