//! # Jira Errors
//!
//! Error taxonomy for Jira API calls. Callers can tell "no data" apart from
//! "the call failed", and transient failures apart from permanent ones.

use reqwest::StatusCode;
use thiserror::Error;

/// Result alias for Jira client operations
pub type Result<T, E = JiraError> = std::result::Result<T, E>;

/// Errors returned by the Jira client
#[derive(Debug, Error)]
pub enum JiraError {
  #[error("Authentication failed. Please check your Jira credentials.")]
  Unauthorized,

  #[error("{0} not found")]
  NotFound(String),

  #[error("Invalid transition for {key}: {message}")]
  InvalidTransition { key: String, message: String },

  #[error("Transient Jira failure: {0}")]
  Transient(String),

  #[error("Unexpected error: HTTP {status} - {body}")]
  Fatal { status: StatusCode, body: String },

  #[error("Failed to parse Jira response: {0}")]
  Parse(String),
}

impl JiraError {
  /// Whether retrying the same request later could succeed
  pub fn is_transient(&self) -> bool {
    matches!(self, JiraError::Transient(_))
  }

  /// Classify a non-success HTTP status.
  ///
  /// `what` names the resource for 404 messages (e.g. `Issue PROJ-1`).
  pub fn from_status(status: StatusCode, body: String, what: &str) -> Self {
    match status {
      StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => JiraError::Unauthorized,
      StatusCode::NOT_FOUND => JiraError::NotFound(what.to_string()),
      StatusCode::TOO_MANY_REQUESTS => JiraError::Transient(format!("HTTP {status} - {body}")),
      s if s.is_server_error() => JiraError::Transient(format!("HTTP {status} - {body}")),
      _ => JiraError::Fatal { status, body },
    }
  }
}

impl From<reqwest::Error> for JiraError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      JiraError::Parse(err.to_string())
    } else if let Some(status) = err.status() {
      JiraError::from_status(status, err.to_string(), "Resource")
    } else {
      // timeouts, refused connections, DNS and TLS failures
      JiraError::Transient(err.to_string())
    }
  }
}

impl From<serde_json::Error> for JiraError {
  fn from(err: serde_json::Error) -> Self {
    JiraError::Parse(err.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_status_classification() {
    assert!(matches!(
      JiraError::from_status(StatusCode::UNAUTHORIZED, String::new(), "Issue X-1"),
      JiraError::Unauthorized
    ));
    assert!(matches!(
      JiraError::from_status(StatusCode::FORBIDDEN, String::new(), "Issue X-1"),
      JiraError::Unauthorized
    ));

    let not_found = JiraError::from_status(StatusCode::NOT_FOUND, String::new(), "Issue X-1");
    assert_eq!(not_found.to_string(), "Issue X-1 not found");

    assert!(JiraError::from_status(StatusCode::BAD_GATEWAY, "down".into(), "x").is_transient());
    assert!(JiraError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new(), "x").is_transient());

    let fatal = JiraError::from_status(StatusCode::BAD_REQUEST, "bad jql".into(), "x");
    assert!(!fatal.is_transient());
    assert!(fatal.to_string().contains("bad jql"));
  }
}
