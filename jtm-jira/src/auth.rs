//! # Jira Authentication
//!
//! Resolves `.netrc` credentials for the configured auth mode and builds an
//! authenticated [`JiraClient`] from the user's settings.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jtm_core::config::{AuthMode, Settings};
use jtm_core::creds::{
  Credentials, FALLBACK_MACHINE, SERVICE_ACCOUNT_MACHINE, get_netrc_path, normalize_host, parse_netrc_file,
};
use jtm_core::url::resolve_jira_base_url;
use tokio::runtime::Runtime;

use crate::client::JiraClient;
use crate::models::JiraAuth;

/// Look up Jira credentials in `$home/.netrc`.
///
/// `api-token` mode tries the exact Jira host, then `atlassian.net`.
/// `service-account` mode only accepts the `jtm-service-account` entry.
pub fn get_jira_credentials(home: &Path, jira_host: &str, mode: AuthMode) -> Result<Credentials> {
  let netrc_path = get_netrc_path(home);
  if !netrc_path.exists() {
    return Err(anyhow!(
      "No .netrc file found at {}. Run 'jtm creds set' first.",
      netrc_path.display()
    ));
  }

  let machines = match mode {
    AuthMode::ApiToken => vec![normalize_host(jira_host), FALLBACK_MACHINE.to_string()],
    AuthMode::ServiceAccount => vec![SERVICE_ACCOUNT_MACHINE.to_string()],
  };

  for machine in &machines {
    if let Some(creds) = parse_netrc_file(&netrc_path, machine)? {
      tracing::debug!("Using .netrc credentials for machine '{machine}'");
      return Ok(creds);
    }
  }

  Err(anyhow!(
    "Jira credentials not found in .netrc. Please add an entry for machine '{}'.",
    machines.join("' or '")
  ))
}

/// Creates an authenticated Jira client from settings and `.netrc`.
///
/// `JTM_JIRA_HOST` overrides the configured host.
pub fn create_jira_client_from_settings(home: &Path, settings: &Settings) -> Result<JiraClient> {
  let base_url = resolve_jira_base_url(&settings.jira_host)
    .context("Jira host is not configured. Run 'jtm config init' or set JTM_JIRA_HOST.")?;
  let credentials =
    get_jira_credentials(home, &base_url, settings.auth_mode).context("Failed to get credentials")?;

  Ok(JiraClient::with_timeout(
    &base_url,
    JiraAuth {
      username: credentials.username,
      api_token: credentials.password,
    },
    settings.timeout(),
  ))
}

/// Creates a tokio runtime and an authenticated Jira client.
pub fn create_jira_runtime_and_client(home: &Path, settings: &Settings) -> Result<(Runtime, JiraClient)> {
  let rt = Runtime::new().context("Failed to create async runtime")?;
  let client = create_jira_client_from_settings(home, settings)?;
  Ok((rt, client))
}
