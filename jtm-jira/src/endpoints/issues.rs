//! # Jira Issue Endpoints
//!
//! Jira API endpoint implementations for issue operations,
//! including fetching issues, updating fields and adding comments.

use reqwest::StatusCode;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::client::{JiraClient, error_for};
use crate::consts::SEARCH_FIELDS;
use crate::error::Result;
use crate::models::JiraIssue;

impl JiraClient {
  /// Get a Jira issue by key
  pub async fn get_issue(&self, issue_key: &str) -> Result<JiraIssue> {
    let response = self
      .get(&format!("/rest/api/2/issue/{issue_key}?fields=summary,status,description"))
      .send()
      .await?;

    match response.status() {
      StatusCode::OK => Ok(response.json::<JiraIssue>().await?),
      _ => Err(error_for(response, &format!("Issue {issue_key}")).await),
    }
  }

  /// Current status name of an issue
  pub async fn get_issue_status(&self, issue_key: &str) -> Result<String> {
    Ok(self.get_issue(issue_key).await?.fields.status.name)
  }

  /// Get an issue as raw JSON with the standard search field set
  pub async fn get_issue_raw(&self, issue_key: &str) -> Result<Value> {
    let fields = SEARCH_FIELDS.join(",");
    let response = self
      .get(&format!("/rest/api/2/issue/{issue_key}?fields={fields}"))
      .send()
      .await?;

    match response.status() {
      StatusCode::OK => Ok(response.json::<Value>().await?),
      _ => Err(error_for(response, &format!("Issue {issue_key}")).await),
    }
  }

  /// Set fields (including custom fields) on an issue
  pub async fn update_issue_fields(&self, issue_key: &str, fields: &Map<String, Value>) -> Result<()> {
    if fields.is_empty() {
      return Ok(());
    }

    let response = self
      .put(&format!("/rest/api/2/issue/{issue_key}"))
      .json(&json!({ "fields": fields }))
      .send()
      .await?;

    match response.status() {
      StatusCode::NO_CONTENT | StatusCode::OK => {
        info!("Updated {} field(s) on {issue_key}", fields.len());
        Ok(())
      }
      _ => Err(error_for(response, &format!("Issue {issue_key}")).await),
    }
  }

  /// Add a plain-text comment to an issue
  pub async fn add_comment(&self, issue_key: &str, body: &str) -> Result<()> {
    let response = self
      .post(&format!("/rest/api/2/issue/{issue_key}/comment"))
      .json(&json!({ "body": body }))
      .send()
      .await?;

    match response.status() {
      StatusCode::CREATED | StatusCode::OK => Ok(()),
      _ => Err(error_for(response, &format!("Issue {issue_key}")).await),
    }
  }
}
