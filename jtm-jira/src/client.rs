use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use tracing::debug;

use crate::consts::{DEFAULT_TIMEOUT, USER_AGENT};
use crate::error::{JiraError, Result};
use crate::models::JiraAuth;

/// Represents a Jira API client
pub struct JiraClient {
  pub(crate) client: Client,
  pub(crate) base_url: String,
  pub(crate) auth: JiraAuth,
}

impl JiraClient {
  /// Create a new Jira client with the default request timeout
  pub fn new(base_url: &str, auth: JiraAuth) -> Self {
    Self::with_timeout(base_url, auth, DEFAULT_TIMEOUT)
  }

  /// Create a new Jira client whose requests give up after `timeout`
  pub fn with_timeout(base_url: &str, auth: JiraAuth, timeout: Duration) -> Self {
    let client = Client::builder()
      .timeout(timeout)
      .user_agent(USER_AGENT)
      .build()
      .unwrap_or_else(|_| Client::new());
    Self {
      client,
      base_url: base_url.trim_end_matches('/').to_string(),
      auth,
    }
  }

  /// Base URL requests are issued against
  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// Browser URL of a ticket
  pub fn browse_url(&self, issue_key: &str) -> String {
    format!("{}/browse/{}", self.base_url, issue_key)
  }

  pub(crate) fn get(&self, path: &str) -> RequestBuilder {
    debug!("GET {path}");
    self
      .client
      .get(format!("{}{}", self.base_url, path))
      .basic_auth(&self.auth.username, Some(&self.auth.api_token))
  }

  pub(crate) fn post(&self, path: &str) -> RequestBuilder {
    debug!("POST {path}");
    self
      .client
      .post(format!("{}{}", self.base_url, path))
      .basic_auth(&self.auth.username, Some(&self.auth.api_token))
  }

  pub(crate) fn put(&self, path: &str) -> RequestBuilder {
    debug!("PUT {path}");
    self
      .client
      .put(format!("{}{}", self.base_url, path))
      .basic_auth(&self.auth.username, Some(&self.auth.api_token))
  }

  /// Test the Jira connection by fetching the current user
  pub async fn test_connection(&self) -> Result<bool> {
    let response = self.get("/rest/api/2/myself").send().await?;

    Ok(response.status().is_success())
  }
}

/// Turn a non-success response into a classified error
pub(crate) async fn error_for(response: reqwest::Response, what: &str) -> JiraError {
  let status = response.status();
  let body = response.text().await.unwrap_or_default();
  JiraError::from_status(status, body, what)
}

/// Create a Jira client from credentials
pub fn create_jira_client(base_url: &str, username: &str, api_token: &str) -> JiraClient {
  let auth = JiraAuth {
    username: username.to_string(),
    api_token: api_token.to_string(),
  };

  JiraClient::new(base_url, auth)
}
