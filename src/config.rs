//! Configuration loading and management.
//!
//! Lookup order: explicit path, `SPACEBOARD_CONFIG_PATH`,
//! `./.spaceboard/config.yaml`, `~/.spaceboard/config.yaml`, then defaults.
//! Environment overrides are applied last:
//! - `SPACEBOARD_DB_PATH` - Database path
//! - `SPACEBOARD_PAGE_WINDOW` - Items per group before "show more"
//! - `SPACEBOARD_LOG` - Log target (`off`, `stdout`, `stderr`, or a file path)
//! - `SPACEBOARD_LOG_LEVEL` - Log level filter

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub view: ViewConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Record store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".spaceboard/spaceboard.db")
}

/// Board and dashboard presentation limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Items shown per group, and the "show more" increment.
    #[serde(default = "default_page_window")]
    pub page_window: usize,

    /// Tasks listed under "recent" on the dashboard.
    #[serde(default = "default_recent_tasks_limit")]
    pub recent_tasks_limit: usize,

    /// Events listed under "upcoming" on the dashboard.
    #[serde(default = "default_upcoming_events_limit")]
    pub upcoming_events_limit: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_window: default_page_window(),
            recent_tasks_limit: default_recent_tasks_limit(),
            upcoming_events_limit: default_upcoming_events_limit(),
        }
    }
}

fn default_page_window() -> usize {
    crate::view::DEFAULT_PAGE_WINDOW
}

fn default_recent_tasks_limit() -> usize {
    10
}

fn default_upcoming_events_limit() -> usize {
    8
}

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `off`, `stdout`, `stderr`, or a file path (appended to).
    #[serde(default = "default_log_target")]
    pub target: String,

    /// Filter directive, e.g. `info` or `spaceboard=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            target: default_log_target(),
            level: default_log_level(),
        }
    }
}

fn default_log_target() -> String {
    "stderr".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Candidate config files, highest priority first.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(explicit) = std::env::var("SPACEBOARD_CONFIG_PATH") {
            paths.push(PathBuf::from(explicit));
        }
        paths.push(PathBuf::from(".spaceboard/config.yaml"));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".spaceboard").join("config.yaml"));
        }
        paths
    }

    /// Load the first config file found, or defaults, then apply
    /// environment overrides.
    pub fn load_or_default() -> Result<Self> {
        let mut config = Self::default();
        for path in Self::search_paths() {
            if path.exists() {
                config = Self::load(&path)?;
                break;
            }
        }
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `SPACEBOARD_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db_path) = lookup("SPACEBOARD_DB_PATH") {
            self.store.db_path = PathBuf::from(db_path);
        }

        if let Some(window) = lookup("SPACEBOARD_PAGE_WINDOW") {
            match window.parse() {
                Ok(window) => self.view.page_window = window,
                Err(_) => warn!(value = %window, "ignoring unparseable SPACEBOARD_PAGE_WINDOW"),
            }
        }

        if let Some(target) = lookup("SPACEBOARD_LOG") {
            self.logging.target = target;
        }

        if let Some(level) = lookup("SPACEBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Reject values the board cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.view.page_window == 0 {
            bail!("view.page_window must be at least 1");
        }
        Ok(())
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.store.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.store.db_path, PathBuf::from(".spaceboard/spaceboard.db"));
        assert_eq!(config.view.page_window, 50);
        assert_eq!(config.view.recent_tasks_limit, 10);
        assert_eq!(config.view.upcoming_events_limit, 8);
        assert_eq!(config.logging.target, "stderr");
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config: Config = serde_yaml::from_str("view:\n  page_window: 20\n").unwrap();
        assert_eq!(config.view.page_window, 20);
        assert_eq!(config.view.recent_tasks_limit, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn overrides_apply_and_bad_numbers_are_ignored() {
        let env: HashMap<&str, &str> = [
            ("SPACEBOARD_DB_PATH", "/tmp/board.db"),
            ("SPACEBOARD_PAGE_WINDOW", "lots"),
            ("SPACEBOARD_LOG", "off"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.store.db_path, PathBuf::from("/tmp/board.db"));
        assert_eq!(config.view.page_window, 50);
        assert_eq!(config.logging.target, "off");
    }

    #[test]
    fn zero_page_window_fails_validation() {
        let mut config = Config::default();
        config.view.page_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "store:\n  db_path: boards/main.db\nview:\n  page_window: 25\n")
            .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.store.db_path, PathBuf::from("boards/main.db"));
        assert_eq!(config.view.page_window, 25);
    }
}
