//! Runtime configuration from `ONCOSCREEN_*` environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `ONCOSCREEN_DB_PATH` | `oncoscreen.db` |
//! | `ONCOSCREEN_LOG_MODE` | `auto` (`file`, `stderr`) |
//! | `ONCOSCREEN_LOG_FILE` | `oncoscreen.log` |
//! | `ONCOSCREEN_PAGE_SIZE` | `20` |

use std::path::PathBuf;

use crate::ports::DEFAULT_PAGE_SIZE;

pub const DEFAULT_DB_PATH: &str = "oncoscreen.db";
pub const DEFAULT_LOG_FILE: &str = "oncoscreen.log";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// File when stdout is a terminal, stderr otherwise
    #[default]
    Auto,
    File,
    Stderr,
}

impl LogMode {
    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stderr => false,
            Self::Auto => interactive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    pub page_size: usize,
    /// Problems found while reading; logged once logging is up
    pub warnings: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            page_size: DEFAULT_PAGE_SIZE,
            warnings: Vec::new(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; unset or empty values keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get("ONCOSCREEN_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(path) = get("ONCOSCREEN_LOG_FILE") {
            config.log_file = PathBuf::from(path);
        }

        if let Some(mode) = get("ONCOSCREEN_LOG_MODE") {
            config.log_mode = match mode.trim().to_ascii_lowercase().as_str() {
                "auto" => LogMode::Auto,
                "file" => LogMode::File,
                "stderr" => LogMode::Stderr,
                other => {
                    config
                        .warnings
                        .push(format!("Unknown ONCOSCREEN_LOG_MODE '{other}', using auto"));
                    LogMode::Auto
                }
            };
        }

        if let Some(raw) = get("ONCOSCREEN_PAGE_SIZE") {
            match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => config.page_size = size,
                _ => config.warnings.push(format!(
                    "Invalid ONCOSCREEN_PAGE_SIZE '{raw}', using {DEFAULT_PAGE_SIZE}"
                )),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.page_size, 20);
        assert_eq!(config.db_path, PathBuf::from("oncoscreen.db"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("ONCOSCREEN_DB_PATH", "/tmp/screening.db"),
            ("ONCOSCREEN_LOG_MODE", "Stderr"),
            ("ONCOSCREEN_PAGE_SIZE", "50"),
        ]);
        assert_eq!(config.db_path, PathBuf::from("/tmp/screening.db"));
        assert_eq!(config.log_mode, LogMode::Stderr);
        assert_eq!(config.page_size, 50);
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("ONCOSCREEN_LOG_MODE", "syslog"),
            ("ONCOSCREEN_PAGE_SIZE", "0"),
            ("ONCOSCREEN_LOG_FILE", "  "),
        ]);
        assert_eq!(config.log_mode, LogMode::Auto);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.log_file, PathBuf::from(DEFAULT_LOG_FILE));
        assert_eq!(config.warnings.len(), 2);
    }

    #[test]
    fn test_log_mode_resolution() {
        assert!(LogMode::Auto.use_file(true));
        assert!(!LogMode::Auto.use_file(false));
        assert!(LogMode::File.use_file(false));
        assert!(!LogMode::Stderr.use_file(true));
    }
}
