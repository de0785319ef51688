//! # Configuration Management
//!
//! Directory layout and persisted settings for jtm. Paths follow the
//! platform conventions from `directories::ProjectDirs`; tests root the whole
//! layout in a temporary directory with [`ConfigDirs::with_root`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::email::{EmailTemplate, default_templates};

static SETTINGS_LOCK: Mutex<()> = Mutex::new(());

/// Represents the configuration directories for jtm
#[derive(Debug, Clone)]
pub struct ConfigDirs {
  pub config_dir: PathBuf,
  pub data_dir: PathBuf,
  pub cache_dir: PathBuf,
}

impl ConfigDirs {
  /// Create a new ConfigDirs instance from the platform project directories
  pub fn new() -> Result<Self> {
    let proj_dirs = ProjectDirs::from("it", "helpdesk", "jtm").context("Failed to determine project directories")?;

    Ok(Self {
      config_dir: proj_dirs.config_dir().to_path_buf(),
      data_dir: proj_dirs.data_dir().to_path_buf(),
      cache_dir: proj_dirs.cache_dir().to_path_buf(),
    })
  }

  /// Lay out every directory under a single root
  pub fn with_root(root: &Path) -> Self {
    Self {
      config_dir: root.join("config"),
      data_dir: root.join("data"),
      cache_dir: root.join("cache"),
    }
  }

  /// Create every directory that does not exist yet
  pub fn init(&self) -> Result<()> {
    for dir in [&self.config_dir, &self.data_dir, &self.cache_dir, &self.logs_dir()] {
      fs::create_dir_all(dir).with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    Ok(())
  }

  pub fn settings_path(&self) -> PathBuf {
    self.config_dir.join("settings.toml")
  }

  pub fn automation_path(&self) -> PathBuf {
    self.config_dir.join("automation.toml")
  }

  pub fn phonebook_cache_path(&self) -> PathBuf {
    self.cache_dir.join("phonebook_cache.csv")
  }

  pub fn members_cache_path(&self) -> PathBuf {
    self.cache_dir.join("organization_members_cache.csv")
  }

  pub fn access_log_path(&self) -> PathBuf {
    self.data_dir.join("access_log.txt")
  }

  pub fn logs_dir(&self) -> PathBuf {
    self.data_dir.join("logs")
  }

  /// Load settings, falling back to defaults when the file is missing
  pub fn load_settings(&self) -> Result<Settings> {
    load_toml(&self.settings_path())
  }

  /// Persist settings; concurrent writers in one process are serialized
  pub fn save_settings(&self, settings: &Settings) -> Result<()> {
    let _guard = SETTINGS_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    save_toml(&self.settings_path(), settings)
  }
}

/// Get the configuration directories
pub fn get_config_dirs() -> Result<ConfigDirs> {
  ConfigDirs::new()
}

/// How jtm authenticates against Jira
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
  /// The operator's own account, keyed by the Jira host in `.netrc`
  #[default]
  ApiToken,
  /// The shared service account entry
  ServiceAccount,
}

impl std::fmt::Display for AuthMode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      AuthMode::ApiToken => write!(f, "api-token"),
      AuthMode::ServiceAccount => write!(f, "service-account"),
    }
  }
}

/// Persisted user settings (`settings.toml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub jira_host: String,
  pub project_key: String,
  pub auth_mode: AuthMode,
  pub timeout_secs: u64,
  pub export_batch_size: u32,
  pub member_cache_max_age_hours: u64,
  pub email: BTreeMap<String, EmailTemplate>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      jira_host: String::new(),
      project_key: String::new(),
      auth_mode: AuthMode::default(),
      timeout_secs: 30,
      export_batch_size: 100,
      member_cache_max_age_hours: 24,
      email: default_templates(),
    }
  }
}

impl Settings {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs.max(1))
  }

  pub fn member_cache_max_age(&self) -> Duration {
    Duration::from_secs(self.member_cache_max_age_hours * 3600)
  }
}

/// Read a TOML file, returning `T::default()` when it does not exist
pub fn load_toml<T>(path: &Path) -> Result<T>
where
  T: DeserializeOwned + Default,
{
  if !path.exists() {
    return Ok(T::default());
  }

  let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Serialize `value` as TOML, creating the parent directory if needed
pub fn save_toml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {}", parent.display()))?;
  }

  let content = toml::to_string_pretty(value).context("Failed to serialize settings to TOML")?;
  fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  #[test]
  fn test_with_root_paths() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = ConfigDirs::with_root(temp_dir.path());

    assert_eq!(dirs.settings_path(), temp_dir.path().join("config/settings.toml"));
    assert_eq!(
      dirs.members_cache_path(),
      temp_dir.path().join("cache/organization_members_cache.csv")
    );
    assert_eq!(dirs.phonebook_cache_path(), temp_dir.path().join("cache/phonebook_cache.csv"));
    assert!(dirs.access_log_path().starts_with(&dirs.data_dir));
  }

  #[test]
  fn test_init_creates_directories() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = ConfigDirs::with_root(temp_dir.path());
    dirs.init().unwrap();

    assert!(dirs.config_dir.is_dir());
    assert!(dirs.cache_dir.is_dir());
    assert!(dirs.logs_dir().is_dir());
  }

  #[test]
  fn test_missing_settings_are_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = ConfigDirs::with_root(temp_dir.path());

    let settings = dirs.load_settings().unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.timeout(), Duration::from_secs(30));
  }

  #[test]
  fn test_settings_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = ConfigDirs::with_root(temp_dir.path());

    let settings = Settings {
      jira_host: "acme.atlassian.net".to_string(),
      project_key: "CC".to_string(),
      auth_mode: AuthMode::ServiceAccount,
      timeout_secs: 10,
      ..Default::default()
    };
    dirs.save_settings(&settings).unwrap();

    let written = fs::read_to_string(dirs.settings_path()).unwrap();
    assert!(written.contains("auth_mode = \"service-account\""));
    assert_eq!(dirs.load_settings().unwrap(), settings);
  }

  #[test]
  fn test_partial_settings_fill_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = ConfigDirs::with_root(temp_dir.path());
    fs::create_dir_all(&dirs.config_dir).unwrap();
    fs::write(dirs.settings_path(), "project_key = \"CC\"\n").unwrap();

    let settings = dirs.load_settings().unwrap();
    assert_eq!(settings.project_key, "CC");
    assert_eq!(settings.export_batch_size, 100);
    assert_eq!(settings.auth_mode, AuthMode::ApiToken);
    assert!(!settings.email.is_empty());
  }

  #[test]
  fn test_invalid_settings_report_path() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = ConfigDirs::with_root(temp_dir.path());
    fs::create_dir_all(&dirs.config_dir).unwrap();
    fs::write(dirs.settings_path(), "timeout_secs = \"soon\"\n").unwrap();

    let err = dirs.load_settings().unwrap_err();
    assert!(err.to_string().contains("settings.toml"));
  }
}
