//! Isolated home directories for testing
//!
//! Credential and configuration lookups take the home directory as an
//! argument, so tests point them at a [`TempHome`] instead of mutating the
//! process environment.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary home directory, removed when dropped
pub struct TempHome {
  temp_dir: TempDir,
}

impl Default for TempHome {
  fn default() -> Self {
    Self::new()
  }
}

impl TempHome {
  /// Create an empty temporary home directory
  pub fn new() -> Self {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    Self { temp_dir }
  }

  /// Create a temporary home directory whose `.netrc` holds `content`
  pub fn with_netrc(content: &str) -> Self {
    let home = Self::new();
    fs::write(home.netrc_path(), content).expect("Failed to write test .netrc");
    home
  }

  /// Get the path to the temporary home directory
  pub fn path(&self) -> &Path {
    self.temp_dir.path()
  }

  /// Get the path to the `.netrc` file in the temporary home
  pub fn netrc_path(&self) -> PathBuf {
    self.temp_dir.path().join(".netrc")
  }

  /// Get the path to a file in the temporary home
  pub fn join(&self, relative_path: &str) -> PathBuf {
    self.temp_dir.path().join(relative_path)
  }
}
