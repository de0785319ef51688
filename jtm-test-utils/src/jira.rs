//! Jira response payloads for mock servers

use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use wiremock::{Request, Respond, ResponseTemplate};

/// A minimal issue as returned by the issue and search endpoints
pub fn issue_json(key: &str, summary: &str, status: &str) -> Value {
  let id = key
    .rsplit('-')
    .next()
    .and_then(|n| n.parse::<u64>().ok())
    .map_or(10_000, |n| 10_000 + n);

  json!({
      "id": id.to_string(),
      "key": key,
      "fields": {
          "summary": summary,
          "status": { "id": "1", "name": status },
          "priority": { "name": "Medium" },
          "assignee": null,
          "created": "2024-03-01T09:15:00.000+0100",
          "updated": "2024-03-02T10:00:00.000+0100"
      }
  })
}

/// One page of `/rest/api/3/search/jql`
pub fn search_page_json(issues: Vec<Value>, start_at: usize, total: usize, next_page_token: Option<&str>) -> Value {
  let max_results = issues.len();
  let mut page = json!({
      "startAt": start_at,
      "maxResults": max_results,
      "total": total,
      "issues": issues
  });
  if let Some(token) = next_page_token {
    page["nextPageToken"] = json!(token);
  }
  page
}

/// `/issue/{key}/transitions` body from `(id, name, target status)` triples
pub fn transitions_json(transitions: &[(&str, &str, &str)]) -> Value {
  let transitions: Vec<Value> = transitions
    .iter()
    .enumerate()
    .map(|(n, (id, name, to))| {
      json!({
          "id": id,
          "name": name,
          "to": { "id": (n + 1).to_string(), "name": to }
      })
    })
    .collect();

  json!({ "transitions": transitions })
}

/// Responder that fires a cancellation token when the request arrives, as
/// if the user pressed Ctrl-C while it was in flight
pub struct CancelOnRequest {
  token: CancellationToken,
  status: u16,
}

impl Respond for CancelOnRequest {
  fn respond(&self, _request: &Request) -> ResponseTemplate {
    self.token.cancel();
    ResponseTemplate::new(self.status)
  }
}

/// Answer with `status` after cancelling `token`
pub fn cancel_on_request(token: &CancellationToken, status: u16) -> CancelOnRequest {
  CancelOnRequest {
    token: token.clone(),
    status,
  }
}
