//! Application configuration management.
//!
//! This module handles loading the application configuration: which
//! spreadsheet to sync, which unit to pull the roster for, the directory
//! username, where the blacklist lives, and the sheet layout.
//!
//! Configuration is stored at `~/.config/rostrum/config.json`. Values from
//! the environment (including a `.env` file and the legacy `~/.lds` file)
//! override it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blacklist::Blacklist;
use crate::models::SheetLayout;

/// Application name used for config directory paths
const APP_NAME: &str = "rostrum";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Google OAuth token file name, in the config directory
const TOKEN_FILE: &str = "google_token.json";

/// OAuth client secret file name, looked up in the config directory and then
/// the working directory
const CLIENT_SECRET_FILE: &str = "client_secret.json";

/// Blacklist file name used when no path is configured
const BLACKLIST_FILE: &str = "blacklist.txt";

/// Legacy `KEY=VALUE` credentials file in the home directory
const LEGACY_ENV_FILE: &str = ".lds";

pub const ENV_USERNAME: &str = "LDS_USER";
pub const ENV_PASSWORD: &str = "LDS_PASSWORD";
pub const ENV_UNIT_NUMBER: &str = "UNIT_NUMBER";
pub const ENV_SPREADSHEET_ID: &str = "SPREADSHEET_ID";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub base_url: String,
    pub sign_in_url: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://lcr.churchofjesuschrist.org".to_string(),
            sign_in_url: "https://id.churchofjesuschrist.org/api/authn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub spreadsheet_id: Option<String>,
    pub unit_number: Option<String>,
    pub username: Option<String>,
    /// Directory password. Normally left unset and read from the keychain.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub blacklist_path: Option<PathBuf>,
    /// When set, logs are also written to a daily file in this directory.
    pub log_dir: Option<PathBuf>,
    pub directory: DirectoryConfig,
    pub layout: SheetLayout,
}

/// The settings a sync run cannot start without.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub spreadsheet_id: String,
    pub unit_number: String,
    pub username: String,
}

impl Config {
    /// Load the config file (defaults if absent), then apply the legacy
    /// `~/.lds` file and the process environment.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file(&Self::config_path()?)?;

        if let Some(home) = dirs::home_dir() {
            let legacy = home.join(LEGACY_ENV_FILE);
            if legacy.exists() {
                config.apply_env_file(&legacy)?;
            }
        }
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Apply `KEY=VALUE` pairs from a dotenv-style file.
    pub fn apply_env_file(&mut self, path: &Path) -> Result<()> {
        let mut vars = Vec::new();
        for item in dotenvy::from_path_iter(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
        {
            vars.push(item.with_context(|| format!("Failed to parse {}", path.display()))?);
        }
        debug!(path = %path.display(), count = vars.len(), "Loaded legacy credentials file");

        self.apply_env(|key| {
            vars.iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone())
        });
        Ok(())
    }

    /// Override settings from a variable lookup. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(value) = get(ENV_USERNAME) {
            self.username = Some(value);
        }
        if let Some(value) = get(ENV_PASSWORD) {
            self.password = Some(value);
        }
        if let Some(value) = get(ENV_UNIT_NUMBER) {
            self.unit_number = Some(value);
        }
        if let Some(value) = get(ENV_SPREADSHEET_ID) {
            self.spreadsheet_id = Some(value);
        }
    }

    /// Check that everything a sync needs is present, naming what is not.
    pub fn run_settings(&self) -> Result<RunSettings> {
        let mut missing = Vec::new();
        if self.spreadsheet_id.is_none() {
            missing.push(format!("spreadsheet_id ({})", ENV_SPREADSHEET_ID));
        }
        if self.unit_number.is_none() {
            missing.push(format!("unit_number ({})", ENV_UNIT_NUMBER));
        }
        if self.username.is_none() {
            missing.push(format!("username ({})", ENV_USERNAME));
        }

        match (&self.spreadsheet_id, &self.unit_number, &self.username) {
            (Some(spreadsheet_id), Some(unit_number), Some(username)) => Ok(RunSettings {
                spreadsheet_id: spreadsheet_id.clone(),
                unit_number: unit_number.clone(),
                username: username.clone(),
            }),
            _ => Err(anyhow::anyhow!(
                "Missing configuration: {}",
                missing.join(", ")
            )),
        }
    }

    /// Load the blacklist. A configured path must exist; the default file in
    /// the config directory is optional.
    pub fn load_blacklist(&self) -> Result<Blacklist> {
        if let Some(ref path) = self.blacklist_path {
            return Blacklist::load(path);
        }

        let default_path = Self::config_dir()?.join(BLACKLIST_FILE);
        if default_path.exists() {
            Blacklist::load(&default_path)
        } else {
            debug!(path = %default_path.display(), "No blacklist file, nobody excluded");
            Ok(Blacklist::default())
        }
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    pub fn token_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(TOKEN_FILE))
    }

    /// Places to look for the OAuth client secret, in order.
    pub fn client_secret_candidates() -> Result<Vec<PathBuf>> {
        Ok(vec![
            Self::config_dir()?.join(CLIENT_SECRET_FILE),
            PathBuf::from(CLIENT_SECRET_FILE),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load_file(&dir.path().join(CONFIG_FILE)).expect("defaults");
        assert!(config.spreadsheet_id.is_none());
        assert_eq!(config.layout, SheetLayout::default());
        assert_eq!(config.directory, DirectoryConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_layout_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{
                "spreadsheet_id": "abc",
                "layout": {"adult": {"date_column": 4}}
            }"#,
        )
        .expect("write config");
        let config = Config::load_file(&path).expect("parse config");

        let defaults = SheetLayout::default();
        assert_eq!(config.spreadsheet_id.as_deref(), Some("abc"));
        assert_eq!(config.layout.adult.date_column, 4);
        assert_eq!(config.layout.adult.history_range, defaults.adult.history_range);
        assert_eq!(config.layout.adult.output_range, defaults.adult.output_range);
        assert_eq!(config.layout.youth, defaults.youth);
        assert!(config.blacklist_path.is_none());
    }

    #[test]
    fn test_layout_override_per_group() {
        let config: Config = serde_json::from_str(
            r#"{"layout": {
                "adult": {},
                "youth": {"history_range": "Youth Talks!B2:F", "output_range": "Next Youth!A2:C"}
            }}"#,
        )
        .expect("parse config");

        let defaults = SheetLayout::default();
        assert_eq!(config.layout.adult, defaults.adult);
        assert_eq!(config.layout.youth.history_range, "Youth Talks!B2:F");
        assert_eq!(config.layout.youth.output_range, "Next Youth!A2:C");
        assert_eq!(config.layout.youth.date_column, defaults.youth.date_column);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"layout": {"adult": {"date_column": "third"}}}"#).expect("write config");
        let err = Config::load_file(&path).expect_err("bad date_column");
        assert!(err.to_string().starts_with("Failed to parse config file"));
    }

    #[test]
    fn test_password_never_serialized() {
        let config = Config {
            password: Some("hunter2".to_string()),
            ..Config::default()
        };
        let json = serde_json::to_string(&config).expect("serialize");
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn test_apply_env_overrides_and_ignores_empty() {
        let mut config = Config {
            username: Some("file-user".to_string()),
            unit_number: Some("111".to_string()),
            ..Config::default()
        };
        let env: HashMap<&str, &str> = [
            (ENV_USERNAME, "env-user"),
            (ENV_UNIT_NUMBER, "  "),
            (ENV_SPREADSHEET_ID, "sheet-9"),
        ]
        .into_iter()
        .collect();

        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.username.as_deref(), Some("env-user"));
        assert_eq!(config.unit_number.as_deref(), Some("111"));
        assert_eq!(config.spreadsheet_id.as_deref(), Some("sheet-9"));
        assert!(config.password.is_none());
    }

    #[test]
    fn test_apply_legacy_env_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(LEGACY_ENV_FILE);
        std::fs::write(&path, "LDS_USER=bishop\nLDS_PASSWORD=s3cret\nUNIT_NUMBER=12345\n")
            .expect("write legacy file");
        let mut config = Config::default();
        config.apply_env_file(&path).expect("apply legacy file");

        assert_eq!(config.username.as_deref(), Some("bishop"));
        assert_eq!(config.password.as_deref(), Some("s3cret"));
        assert_eq!(config.unit_number.as_deref(), Some("12345"));
    }

    #[test]
    fn test_run_settings_reports_missing() {
        let config = Config {
            unit_number: Some("12345".to_string()),
            ..Config::default()
        };
        let err = config.run_settings().expect_err("incomplete config");
        let message = err.to_string();
        assert!(message.contains("spreadsheet_id"));
        assert!(message.contains("username"));
        assert!(!message.contains("unit_number"));

        let config = Config {
            spreadsheet_id: Some("s".to_string()),
            unit_number: Some("u".to_string()),
            username: Some("n".to_string()),
            ..Config::default()
        };
        let settings = config.run_settings().expect("complete config");
        assert_eq!(settings.unit_number, "u");
    }

    #[test]
    fn test_configured_blacklist_must_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config {
            blacklist_path: Some(dir.path().join(BLACKLIST_FILE)),
            ..Config::default()
        };
        assert!(config.load_blacklist().is_err());
    }

    #[test]
    fn test_configured_blacklist_is_loaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(BLACKLIST_FILE);
        std::fs::write(&path, "Bob\n").expect("write blacklist");
        let config = Config {
            blacklist_path: Some(path),
            ..Config::default()
        };
        let blacklist = config.load_blacklist().expect("load blacklist");
        assert!(blacklist.contains("Bob"));
    }
}
