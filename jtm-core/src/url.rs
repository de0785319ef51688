//! URL helpers for the Jira host setting.

use anyhow::{Result, bail};
use url::Url;

/// Environment variable that overrides the configured Jira host.
pub const ENV_JIRA_HOST: &str = "JTM_JIRA_HOST";

/// Ensure a host has an `http://` or `https://` scheme, assuming `https://`.
///
/// Trailing slashes are dropped so the result can be joined with API paths.
pub fn ensure_url_scheme(input: &str) -> Result<String> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    bail!("Host cannot be empty");
  }

  let lowered = trimmed.to_ascii_lowercase();
  let candidate = if lowered.starts_with("http://") || lowered.starts_with("https://") {
    trimmed.to_string()
  } else {
    format!("https://{trimmed}")
  };

  let url = Url::parse(&candidate).map_err(|e| anyhow::anyhow!("Invalid Jira host '{input}': {e}"))?;
  if url.host_str().is_none() {
    bail!("Invalid Jira host '{input}': missing host name");
  }

  Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Pick the Jira host: an explicit override wins over the configured value.
pub fn resolve_host(override_host: Option<&str>, configured: &str) -> Result<String> {
  let host = override_host.filter(|h| !h.trim().is_empty()).unwrap_or(configured);
  ensure_url_scheme(host)
}

/// Resolve the Jira base URL from `JTM_JIRA_HOST` or the configured host.
pub fn resolve_jira_base_url(configured: &str) -> Result<String> {
  let from_env = std::env::var(ENV_JIRA_HOST).ok();
  resolve_host(from_env.as_deref(), configured)
}
