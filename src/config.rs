//! Board configuration.
//!
//! Configuration is resolved from three tiers, highest first:
//! 1. Explicit path (`--config` / `SPRINT_BOARD_CONFIG_PATH`)
//! 2. User file at `~/.sprint-board/config.yaml`
//! 3. Built-in defaults
//!
//! `SPRINT_BOARD_DB_PATH` overrides the database path from any tier.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SPRINT_BOARD_CONFIG_PATH";
/// Environment variable overriding the database path.
pub const DB_PATH_ENV: &str = "SPRINT_BOARD_DB_PATH";

/// One status column on the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// Column id used as the task `status` value.
    pub id: String,
    /// Display name for rendering.
    pub name: String,
    /// Optional WIP limit. `None` means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<usize>,
}

impl ColumnConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            wip_limit: None,
        }
    }

    pub fn with_wip_limit(mut self, limit: usize) -> Self {
        self.wip_limit = Some(limit);
        self
    }
}

/// Sprint scheduling defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintConfig {
    /// Default window length for sprint generation.
    #[serde(default = "default_duration_weeks")]
    pub duration_weeks: u32,
}

fn default_duration_weeks() -> u32 {
    2
}

impl Default for SprintConfig {
    fn default() -> Self {
        Self {
            duration_weeks: default_duration_weeks(),
        }
    }
}

/// Top-level configuration for the board engine and CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Ordered column list. Order is the display order.
    #[serde(default = "default_columns")]
    pub columns: Vec<ColumnConfig>,

    #[serde(default)]
    pub sprint: SprintConfig,

    /// Database file path. Relative paths resolve against the working dir.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_columns() -> Vec<ColumnConfig> {
    vec![
        ColumnConfig::new("todo", "To Do"),
        ColumnConfig::new("doing", "Doing").with_wip_limit(5),
        ColumnConfig::new("done", "Done"),
    ]
}

fn default_db_path() -> PathBuf {
    PathBuf::from("sprint-board.db")
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            sprint: SprintConfig::default(),
            db_path: default_db_path(),
        }
    }
}

impl BoardConfig {
    /// Load configuration from an explicit file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: BoardConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Resolve configuration through the tier lookup.
    ///
    /// `explicit` wins if given; otherwise `SPRINT_BOARD_CONFIG_PATH`, then
    /// the user file, then defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::from_file(Path::new(&path));
        }
        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::from_file(&user_path);
            }
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Path of the per-user config file (`~/.sprint-board/config.yaml`).
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".sprint-board").join("config.yaml"))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(db_path) = std::env::var(DB_PATH_ENV) {
            self.db_path = PathBuf::from(db_path);
        }
    }

    /// Look up a column definition by id.
    pub fn find_column(&self, id: &str) -> Option<&ColumnConfig> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// The WIP limit for a column, if it has one and the column exists.
    pub fn wip_limit(&self, id: &str) -> Option<usize> {
        self.find_column(id).and_then(|c| c.wip_limit)
    }

    /// Id of the first column, where new tasks land by default.
    pub fn initial_column(&self) -> &str {
        &self.columns[0].id
    }
}
