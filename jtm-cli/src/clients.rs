//! # Client Creation
//!
//! Loads the directory layout and settings every command starts from, and
//! builds the authenticated Jira client on demand.

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::BaseDirs;
use jtm_core::{ConfigDirs, Settings, get_config_dirs};
use jtm_jira::JiraClient;
use tokio::runtime::Runtime;

/// Directories and settings for one command invocation
#[derive(Debug, Clone)]
pub struct Session {
  pub dirs: ConfigDirs,
  pub settings: Settings,
}

impl Session {
  /// Load settings from the platform configuration directory
  pub fn load() -> Result<Self> {
    let dirs = get_config_dirs()?;
    let settings = dirs.load_settings()?;
    Ok(Self { dirs, settings })
  }

  /// Project key from settings, or an error telling the user how to set it
  pub fn project_key(&self) -> Result<&str> {
    if self.settings.project_key.is_empty() {
      anyhow::bail!("No project key configured. Run 'jtm config init --project <KEY>'.");
    }
    Ok(&self.settings.project_key)
  }
}

/// The user's home directory, where `.netrc` lives
pub fn home_dir() -> Result<PathBuf> {
  let base_dirs = BaseDirs::new().context("Failed to get $HOME directory")?;
  Ok(base_dirs.home_dir().to_path_buf())
}

/// Creates a tokio runtime and an authenticated Jira client
pub fn create_jira_runtime_and_client(settings: &Settings) -> Result<(Runtime, JiraClient)> {
  let home = home_dir()?;
  jtm_jira::create_jira_runtime_and_client(&home, settings)
}
