//! # Credential Management
//!
//! Jira credentials live in the user's `.netrc`, never in settings. API-token
//! users are keyed by the Jira host; the shared service account uses a fixed
//! machine name so it can coexist with a personal entry for the same host.

pub mod netrc;

pub use netrc::{get_netrc_path, normalize_host, parse_netrc_file, write_netrc_entry};

/// Machine name of the shared service-account entry
pub const SERVICE_ACCOUNT_MACHINE: &str = "jtm-service-account";

/// Machine name tried when the exact Jira host has no entry
pub const FALLBACK_MACHINE: &str = "atlassian.net";

/// A login/password pair read from `.netrc`
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
  pub username: String,
  pub password: String,
}

impl std::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credentials")
      .field("username", &self.username)
      .field("password", &"<redacted>")
      .finish()
  }
}
