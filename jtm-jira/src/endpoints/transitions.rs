use reqwest::StatusCode;
use tracing::{info, warn};

use crate::client::{JiraClient, error_for};
use crate::error::{JiraError, Result};
use crate::models::{JiraTransition, JiraTransitions, TransitionId, TransitionRequest};

impl JiraClient {
  /// Get available transitions for an issue.
  ///
  /// Asks API v2 first and retries once against v3 when that fails.
  pub async fn get_transitions(&self, issue_key: &str) -> Result<Vec<JiraTransition>> {
    match self.get_transitions_from(issue_key, 2).await {
      Ok(transitions) => Ok(transitions),
      Err(err) => {
        warn!("Fetching transitions for {issue_key} via API v2 failed ({err}); retrying with v3");
        self.get_transitions_from(issue_key, 3).await
      }
    }
  }

  async fn get_transitions_from(&self, issue_key: &str, api_version: u8) -> Result<Vec<JiraTransition>> {
    let response = self
      .get(&format!("/rest/api/{api_version}/issue/{issue_key}/transitions"))
      .send()
      .await?;

    match response.status() {
      StatusCode::OK => Ok(response.json::<JiraTransitions>().await?.transitions),
      _ => Err(error_for(response, &format!("Issue {issue_key}")).await),
    }
  }

  /// Transition an issue along the edge `transition_id`
  pub async fn transition_issue(&self, issue_key: &str, transition_id: &str) -> Result<()> {
    let payload = TransitionRequest {
      transition: TransitionId {
        id: transition_id.to_string(),
      },
    };

    let response = self
      .post(&format!("/rest/api/2/issue/{issue_key}/transitions"))
      .json(&payload)
      .send()
      .await?;

    match response.status() {
      StatusCode::NO_CONTENT | StatusCode::OK => {
        info!("Transitioned {issue_key} via transition {transition_id}");
        Ok(())
      }
      StatusCode::BAD_REQUEST => Err(JiraError::InvalidTransition {
        key: issue_key.to_string(),
        message: response.text().await.unwrap_or_default(),
      }),
      _ => Err(error_for(response, &format!("Issue {issue_key}")).await),
    }
  }
}

#[cfg(test)]
mod tests {
  use jtm_test_utils::jira::transitions_json;
  use serde_json::json;
  use wiremock::matchers::{basic_auth, body_json, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  use crate::client::create_jira_client;
  use crate::error::JiraError;

  #[tokio::test]
  async fn test_get_transitions() -> anyhow::Result<()> {
    let mock_server = MockServer::start().await;
    let client = create_jira_client(&mock_server.uri(), "test_user", "test_token");

    Mock::given(method("GET"))
      .and(path("/rest/api/2/issue/CC-123/transitions"))
      .and(basic_auth("test_user", "test_token"))
      .respond_with(ResponseTemplate::new(200).set_body_json(transitions_json(&[
        ("11", "Prendi in carico", "Preso In Carico"),
        ("21", "Pianifica", "Pianificazione Attività"),
      ])))
      .mount(&mock_server)
      .await;

    let transitions = client.get_transitions("CC-123").await?;
    assert_eq!(transitions.len(), 2);
    assert_eq!(transitions[0].id, "11");
    assert_eq!(transitions[1].to_status, "Pianificazione Attività");

    Ok(())
  }

  #[tokio::test]
  async fn test_get_transitions_falls_back_to_v3() -> anyhow::Result<()> {
    let mock_server = MockServer::start().await;
    let client = create_jira_client(&mock_server.uri(), "test_user", "test_token");

    Mock::given(method("GET"))
      .and(path("/rest/api/2/issue/CC-123/transitions"))
      .respond_with(ResponseTemplate::new(500))
      .expect(1)
      .mount(&mock_server)
      .await;
    Mock::given(method("GET"))
      .and(path("/rest/api/3/issue/CC-123/transitions"))
      .respond_with(ResponseTemplate::new(200).set_body_json(transitions_json(&[("31", "Chiudi", "Chiuso")])))
      .expect(1)
      .mount(&mock_server)
      .await;

    let transitions = client.get_transitions("CC-123").await?;
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].name, "Chiudi");

    Ok(())
  }

  #[tokio::test]
  async fn test_transitions_not_found() -> anyhow::Result<()> {
    let mock_server = MockServer::start().await;
    let client = create_jira_client(&mock_server.uri(), "test_user", "test_token");

    Mock::given(method("GET"))
      .and(path("/rest/api/2/issue/NONEXISTENT-123/transitions"))
      .respond_with(ResponseTemplate::new(404))
      .mount(&mock_server)
      .await;
    Mock::given(method("GET"))
      .and(path("/rest/api/3/issue/NONEXISTENT-123/transitions"))
      .respond_with(ResponseTemplate::new(404))
      .mount(&mock_server)
      .await;

    let err = client.get_transitions("NONEXISTENT-123").await.unwrap_err();
    assert!(matches!(err, JiraError::NotFound(_)));

    Ok(())
  }

  #[tokio::test]
  async fn test_transition_issue() -> anyhow::Result<()> {
    let mock_server = MockServer::start().await;
    let client = create_jira_client(&mock_server.uri(), "test_user", "test_token");

    Mock::given(method("POST"))
      .and(path("/rest/api/2/issue/CC-123/transitions"))
      .and(basic_auth("test_user", "test_token"))
      .and(body_json(json!({ "transition": { "id": "21" } })))
      .respond_with(ResponseTemplate::new(204))
      .expect(1)
      .mount(&mock_server)
      .await;

    client.transition_issue("CC-123", "21").await?;

    Ok(())
  }

  #[tokio::test]
  async fn test_transition_issue_invalid_transition() -> anyhow::Result<()> {
    let mock_server = MockServer::start().await;
    let client = create_jira_client(&mock_server.uri(), "test_user", "test_token");

    Mock::given(method("POST"))
      .and(path("/rest/api/2/issue/CC-123/transitions"))
      .respond_with(ResponseTemplate::new(400).set_body_json(json!({
          "errorMessages": ["The requested transition is not available for the current status."],
          "errors": {}
      })))
      .mount(&mock_server)
      .await;

    let err = client.transition_issue("CC-123", "invalid").await.unwrap_err();
    assert!(matches!(err, JiraError::InvalidTransition { .. }));
    assert!(err.to_string().contains("not available"));

    Ok(())
  }
}
