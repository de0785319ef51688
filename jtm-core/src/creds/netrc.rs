//! Reading and writing `.netrc` entries.
//!
//! Both the single-line (`machine h login u password p`) and the indented
//! multi-line layouts are understood. Writing rewrites the whole file and
//! tightens its permissions to `600` on Unix.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::creds::Credentials;

/// Returns the path to the `.netrc` file for the provided home directory.
///
/// ```
/// use std::path::Path;
/// use jtm_core::creds::netrc::get_netrc_path;
///
/// assert_eq!(get_netrc_path(Path::new("/home/op")), Path::new("/home/op/.netrc"));
/// ```
pub fn get_netrc_path(home: &Path) -> PathBuf {
  home.join(".netrc")
}

/// One `machine` block with whatever tokens followed it
#[derive(Debug, Default)]
struct Entry {
  machine: String,
  login: Option<String>,
  password: Option<String>,
}

impl Entry {
  fn credentials(&self) -> Option<Credentials> {
    match (&self.login, &self.password) {
      (Some(login), Some(password)) => Some(Credentials {
        username: login.clone(),
        password: password.clone(),
      }),
      _ => None,
    }
  }
}

fn parse_entries(content: &str) -> Vec<Entry> {
  let mut entries: Vec<Entry> = Vec::new();
  let mut tokens = content.split_whitespace();

  while let Some(token) = tokens.next() {
    match token {
      "machine" => {
        if let Some(machine) = tokens.next() {
          entries.push(Entry {
            machine: machine.to_string(),
            ..Default::default()
          });
        }
      }
      "login" | "password" => {
        let value = tokens.next().map(str::to_string);
        if let Some(entry) = entries.last_mut() {
          if token == "login" {
            entry.login = value;
          } else {
            entry.password = value;
          }
        }
      }
      _ => {}
    }
  }

  entries
}

/// Parses a `.netrc` file and returns credentials for the requested machine.
///
/// Returns `Ok(None)` when the machine is missing or lacks a login or
/// password. Errors only when the file cannot be read.
pub fn parse_netrc_file(path: &Path, target_machine: &str) -> Result<Option<Credentials>> {
  let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

  Ok(
    parse_entries(&content)
      .iter()
      .filter(|entry| entry.machine == target_machine)
      .find_map(Entry::credentials),
  )
}

/// Writes or replaces the `.netrc` entry for `machine`.
///
/// Lines belonging to other machines are preserved as written.
pub fn write_netrc_entry(path: &Path, machine: &str, username: &str, password: &str) -> Result<()> {
  let existing = if path.exists() {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?
  } else {
    String::new()
  };

  let mut content = String::new();
  let mut in_target = false;
  for line in existing.lines() {
    let mut words = line.split_whitespace();
    if words.next() == Some("machine") {
      in_target = words.next() == Some(machine);
    }
    if !in_target {
      content.push_str(line);
      content.push('\n');
    }
  }

  if !content.is_empty() && !content.ends_with("\n\n") {
    content.push('\n');
  }
  content.push_str(&format!("machine {machine}\n  login {username}\n  password {password}\n"));

  fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
  set_secure_permissions(path)
}

#[cfg(unix)]
fn set_secure_permissions(path: &Path) -> Result<()> {
  use std::os::unix::fs::PermissionsExt;

  let mut perms = fs::metadata(path).context("Failed to get file metadata")?.permissions();
  perms.set_mode(0o600);
  fs::set_permissions(path, perms).context("Failed to set secure permissions")
}

#[cfg(not(unix))]
fn set_secure_permissions(_path: &Path) -> Result<()> {
  Ok(())
}

/// Strips the scheme and trailing slash so a base URL can be used as a
/// machine name.
///
/// ```
/// use jtm_core::creds::netrc::normalize_host;
///
/// assert_eq!(normalize_host("https://acme.atlassian.net/"), "acme.atlassian.net");
/// assert_eq!(normalize_host("jira.example.com"), "jira.example.com");
/// ```
pub fn normalize_host(raw_host: &str) -> String {
  raw_host
    .trim()
    .trim_start_matches("https://")
    .trim_start_matches("http://")
    .trim_end_matches('/')
    .to_string()
}

#[cfg(test)]
mod tests {
  use jtm_test_utils::TempHome;

  use super::*;

  #[test]
  fn test_parse_multi_line_entries() {
    let home = TempHome::with_netrc(
      "machine acme.atlassian.net\n  login op@acme.it\n  password tok1\n\nmachine jtm-service-account\n  login bot@acme.it\n  password tok2\n",
    );

    let creds = parse_netrc_file(&home.netrc_path(), "jtm-service-account")
      .unwrap()
      .unwrap();
    assert_eq!(creds.username, "bot@acme.it");
    assert_eq!(creds.password, "tok2");
  }

  #[test]
  fn test_parse_single_line_and_mixed_entries() {
    let home = TempHome::with_netrc(
      "machine a.example login u1 password p1\nmachine b.example login u2\n  password p2\n",
    );

    let a = parse_netrc_file(&home.netrc_path(), "a.example").unwrap().unwrap();
    let b = parse_netrc_file(&home.netrc_path(), "b.example").unwrap().unwrap();
    assert_eq!((a.username.as_str(), a.password.as_str()), ("u1", "p1"));
    assert_eq!((b.username.as_str(), b.password.as_str()), ("u2", "p2"));
  }

  #[test]
  fn test_parse_incomplete_or_missing_entry() {
    let home = TempHome::with_netrc("machine a.example\n  login u1\nmachine b.example login u2 password p2\n");

    assert!(parse_netrc_file(&home.netrc_path(), "a.example").unwrap().is_none());
    assert!(parse_netrc_file(&home.netrc_path(), "c.example").unwrap().is_none());
  }

  #[test]
  fn test_parse_missing_file_is_an_error() {
    let home = TempHome::new();
    assert!(parse_netrc_file(&home.netrc_path(), "a.example").is_err());
  }

  #[test]
  fn test_write_creates_file() {
    let home = TempHome::new();
    write_netrc_entry(&home.netrc_path(), "acme.atlassian.net", "op", "secret").unwrap();

    let creds = parse_netrc_file(&home.netrc_path(), "acme.atlassian.net")
      .unwrap()
      .unwrap();
    assert_eq!(creds.username, "op");
    assert_eq!(creds.password, "secret");
  }

  #[test]
  fn test_write_replaces_existing_entry_and_keeps_others() {
    let home = TempHome::with_netrc(
      "machine github.com\n  login gh\n  password ghp\n\nmachine acme.atlassian.net\n  login old\n  password stale\n",
    );

    write_netrc_entry(&home.netrc_path(), "acme.atlassian.net", "new", "fresh").unwrap();

    let content = fs::read_to_string(home.netrc_path()).unwrap();
    assert!(!content.contains("stale"));
    assert_eq!(content.matches("machine acme.atlassian.net").count(), 1);

    let github = parse_netrc_file(&home.netrc_path(), "github.com").unwrap().unwrap();
    assert_eq!(github.password, "ghp");
    let jira = parse_netrc_file(&home.netrc_path(), "acme.atlassian.net")
      .unwrap()
      .unwrap();
    assert_eq!(jira.username, "new");
  }

  #[cfg(unix)]
  #[test]
  fn test_write_sets_owner_only_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let home = TempHome::new();
    write_netrc_entry(&home.netrc_path(), "acme.atlassian.net", "op", "secret").unwrap();

    let mode = fs::metadata(home.netrc_path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
  }

  #[test]
  fn test_normalize_host() {
    assert_eq!(normalize_host("http://jira.example.com"), "jira.example.com");
    assert_eq!(normalize_host(" https://acme.atlassian.net/ "), "acme.atlassian.net");
  }
}
