use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consts::ORGANIZATIONS_FIELD;

/// Represents Jira authentication credentials
#[derive(Clone)]
pub struct JiraAuth {
  pub username: String,
  pub api_token: String,
}

impl std::fmt::Debug for JiraAuth {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("JiraAuth")
      .field("username", &self.username)
      .field("api_token", &"<redacted>")
      .finish()
  }
}

/// Represents a Jira issue
#[derive(Debug, Deserialize)]
pub struct JiraIssue {
  #[allow(dead_code)]
  pub id: String,
  pub key: String,
  pub fields: JiraIssueFields,
}

/// Represents Jira issue fields
#[derive(Debug, Deserialize)]
pub struct JiraIssueFields {
  pub summary: String,
  #[serde(default)]
  pub description: Option<Value>,
  pub status: JiraIssueStatus,
}

/// Represents a Jira issue status
#[derive(Debug, Deserialize)]
pub struct JiraIssueStatus {
  #[allow(dead_code)]
  pub id: Option<String>,
  pub name: String,
}

/// One page of an issue search.
///
/// Issues are kept as raw JSON; use [`TicketSummary::from_issue`] for a typed
/// projection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
  #[serde(default)]
  pub issues: Vec<Value>,
  #[serde(default)]
  pub total: u32,
  #[serde(default)]
  pub start_at: u32,
  #[serde(default)]
  pub max_results: u32,
  #[serde(default)]
  pub next_page_token: Option<String>,
  #[serde(default)]
  pub is_last: Option<bool>,
}

/// Read-only typed view of a raw issue used for tables, exports and emails
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TicketSummary {
  pub key: String,
  pub summary: String,
  pub status: String,
  pub priority: String,
  pub assignee: String,
  pub reporter: String,
  pub organizations: Vec<String>,
  pub created: String,
  pub updated: String,
  pub description: String,
}

impl TicketSummary {
  /// Project a raw search/issue payload onto the summary fields
  pub fn from_issue(issue: &Value) -> Self {
    let fields = &issue["fields"];
    let organizations = fields[ORGANIZATIONS_FIELD]
      .as_array()
      .map(|orgs| {
        orgs
          .iter()
          .filter_map(|org| org["name"].as_str().map(str::to_string))
          .collect()
      })
      .unwrap_or_default();

    Self {
      key: str_at(issue, &["key"]),
      summary: str_at(fields, &["summary"]),
      status: str_at(fields, &["status", "name"]),
      priority: str_at(fields, &["priority", "name"]),
      assignee: str_at(fields, &["assignee", "displayName"]),
      reporter: str_at(fields, &["reporter", "displayName"]),
      organizations,
      created: date_part(&str_at(fields, &["created"])),
      updated: date_part(&str_at(fields, &["updated"])),
      description: plain_text(&fields["description"]),
    }
  }

  /// Organizations joined for display
  pub fn organization_list(&self) -> String {
    self.organizations.join(", ")
  }
}

fn str_at(value: &Value, path: &[&str]) -> String {
  path
    .iter()
    .fold(value, |current, segment| &current[*segment])
    .as_str()
    .unwrap_or_default()
    .to_string()
}

/// Jira timestamps look like `2024-03-01T09:15:00.000+0100`; keep the date.
fn date_part(timestamp: &str) -> String {
  timestamp.split('T').next().unwrap_or_default().to_string()
}

/// Flatten a description into plain text.
///
/// API v2 returns a string, v3 returns an Atlassian Document Format tree
/// whose `text` leaves are concatenated, one line per block.
pub fn plain_text(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Object(_) => {
      let mut lines = Vec::new();
      collect_blocks(value, &mut lines);
      lines.join("\n")
    }
    _ => String::new(),
  }
}

fn collect_blocks(node: &Value, lines: &mut Vec<String>) {
  let Some(content) = node["content"].as_array() else {
    return;
  };

  if content.iter().any(|child| child["type"] == "text") {
    let line: String = content.iter().filter_map(|child| child["text"].as_str()).collect();
    lines.push(line);
  } else {
    for child in content {
      collect_blocks(child, lines);
    }
  }
}

/// Target status of a transition as returned by Jira
#[derive(Debug, Deserialize)]
struct TransitionTarget {
  #[serde(default)]
  id: String,
  #[serde(default)]
  name: String,
}

#[derive(Debug, Deserialize)]
struct RawTransition {
  id: String,
  name: String,
  #[serde(default)]
  to: Option<TransitionTarget>,
}

/// Represents a Jira transition: one edge out of the ticket's current status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTransition")]
pub struct JiraTransition {
  pub id: String,
  pub name: String,
  pub to_status: String,
  pub to_status_id: String,
}

impl From<RawTransition> for JiraTransition {
  fn from(raw: RawTransition) -> Self {
    let (to_status_id, to_status) = raw.to.map(|to| (to.id, to.name)).unwrap_or_default();
    Self {
      id: raw.id,
      name: raw.name,
      to_status,
      to_status_id,
    }
  }
}

/// Represents a list of Jira transitions
#[derive(Debug, Deserialize)]
pub struct JiraTransitions {
  pub transitions: Vec<JiraTransition>,
}

/// Represents a transition request payload
#[derive(Debug, Serialize)]
pub struct TransitionRequest {
  pub transition: TransitionId,
}

/// Represents a transition ID for the request
#[derive(Debug, Serialize)]
pub struct TransitionId {
  pub id: String,
}

/// Outcome of one transition attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransitionResult {
  pub ticket_key: String,
  pub success: bool,
  pub current_status: String,
  pub new_status: String,
  /// Some hops of a multi-step move succeeded before one failed
  pub partial: bool,
  pub error_message: Option<String>,
  pub available_transitions: Vec<JiraTransition>,
}

impl TransitionResult {
  pub(crate) fn failed(
    ticket_key: &str,
    current_status: &str,
    message: impl Into<String>,
    available_transitions: Vec<JiraTransition>,
  ) -> Self {
    Self {
      ticket_key: ticket_key.to_string(),
      success: false,
      current_status: current_status.to_string(),
      new_status: current_status.to_string(),
      partial: false,
      error_message: Some(message.into()),
      available_transitions,
    }
  }

  pub(crate) fn succeeded(ticket_key: &str, current_status: &str, new_status: &str) -> Self {
    Self {
      ticket_key: ticket_key.to_string(),
      success: true,
      current_status: current_status.to_string(),
      new_status: new_status.to_string(),
      partial: false,
      error_message: None,
      available_transitions: Vec::new(),
    }
  }

  pub(crate) fn with_status(mut self, status: &str) -> Self {
    self.current_status = status.to_string();
    self.new_status = status.to_string();
    self
  }

  /// Names of the transitions that were available when the attempt failed
  pub fn available_names(&self) -> Vec<&str> {
    self.available_transitions.iter().map(|t| t.name.as_str()).collect()
  }
}

/// A Jira Service Management customer organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
  pub id: String,
  pub name: String,
}

/// A customer belonging to a service-desk organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDeskUser {
  #[serde(default)]
  pub account_id: String,
  #[serde(default)]
  pub display_name: String,
  #[serde(default)]
  pub email_address: Option<String>,
}

/// Paged envelope used by the Service Desk API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ServiceDeskPage<T> {
  #[serde(default = "Vec::new")]
  pub values: Vec<T>,
  #[serde(default)]
  pub is_last_page: bool,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn test_jira_auth_debug_redacts_token() {
    let auth = JiraAuth {
      username: "test_user".to_string(),
      api_token: "test_token".to_string(),
    };

    let debug = format!("{auth:?}");
    assert!(debug.contains("test_user"));
    assert!(!debug.contains("test_token"));
  }

  #[test]
  fn test_jira_issue_deserialization() {
    let json = json!({
        "id": "10000",
        "key": "CC-123",
        "fields": {
            "summary": "Printer offline",
            "description": "Third floor printer",
            "status": {
                "name": "Nuovo"
            }
        }
    });

    let issue: JiraIssue = serde_json::from_value(json).unwrap();

    assert_eq!(issue.key, "CC-123");
    assert_eq!(issue.fields.summary, "Printer offline");
    assert_eq!(issue.fields.status.name, "Nuovo");
  }

  #[test]
  fn test_transitions_carry_target_status() {
    let json = json!({
        "transitions": [
            { "id": "11", "name": "Pianifica", "to": { "id": "3", "name": "Pianificazione Attività" } },
            { "id": "21", "name": "Chiudi" }
        ]
    });

    let transitions: JiraTransitions = serde_json::from_value(json).unwrap();

    assert_eq!(transitions.transitions.len(), 2);
    assert_eq!(transitions.transitions[0].to_status, "Pianificazione Attività");
    assert_eq!(transitions.transitions[0].to_status_id, "3");
    assert_eq!(transitions.transitions[1].to_status, "");
  }

  #[test]
  fn test_jira_transition_request_serialization() {
    let request = TransitionRequest {
      transition: TransitionId { id: "21".to_string() },
    };

    let json = serde_json::to_value(&request).unwrap();

    assert_eq!(json, json!({ "transition": { "id": "21" } }));
  }

  #[test]
  fn test_search_result_defaults_missing_fields() {
    let result: SearchResult = serde_json::from_value(json!({
        "issues": [{ "key": "CC-1" }],
        "nextPageToken": "abc"
    }))
    .unwrap();

    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.total, 0);
    assert_eq!(result.next_page_token.as_deref(), Some("abc"));
    assert_eq!(result.is_last, None);
  }

  #[test]
  fn test_ticket_summary_from_issue() {
    let issue = json!({
        "key": "CC-7",
        "fields": {
            "summary": "VPN down",
            "status": { "name": "Preso In Carico" },
            "priority": { "name": "High" },
            "assignee": { "displayName": "Giulia Rossi" },
            "reporter": null,
            "created": "2024-03-01T09:15:00.000+0100",
            "customfield_10002": [{ "id": "1", "name": "ACME" }, { "id": "2", "name": "Globex" }],
            "description": {
                "type": "doc",
                "content": [
                    { "type": "paragraph", "content": [{ "type": "text", "text": "Line " }, { "type": "text", "text": "one" }] },
                    { "type": "paragraph", "content": [{ "type": "text", "text": "Line two" }] }
                ]
            }
        }
    });

    let summary = TicketSummary::from_issue(&issue);

    assert_eq!(summary.key, "CC-7");
    assert_eq!(summary.status, "Preso In Carico");
    assert_eq!(summary.assignee, "Giulia Rossi");
    assert_eq!(summary.reporter, "");
    assert_eq!(summary.created, "2024-03-01");
    assert_eq!(summary.organization_list(), "ACME, Globex");
    assert_eq!(summary.description, "Line one\nLine two");
  }
}
