//! # Jira Search Endpoints
//!
//! Issue search against the v3 `/search/jql` endpoint, plus the batched
//! export loop built on top of it.

use serde_json::Value;
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::client::{JiraClient, error_for};
use crate::consts::{MAX_EXPORT_BATCHES, SEARCH_FIELDS};
use crate::error::Result;
use crate::models::SearchResult;

impl JiraClient {
  /// Search issues matching `jql`, returning one page
  pub async fn search_issues(
    &self,
    jql: &str,
    start_at: u32,
    max_results: u32,
    next_page_token: Option<&str>,
  ) -> Result<SearchResult> {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query
      .append_pair("jql", jql)
      .append_pair("startAt", &start_at.to_string())
      .append_pair("maxResults", &max_results.to_string())
      .append_pair("fields", &SEARCH_FIELDS.join(","));
    if let Some(token) = next_page_token.filter(|t| !t.is_empty()) {
      query.append_pair("nextPageToken", token);
    }
    let path = format!("/rest/api/3/search/jql?{}", query.finish());

    let response = self.get(&path).send().await?;
    if !response.status().is_success() {
      return Err(error_for(response, "Search endpoint").await);
    }

    let mut result = response.json::<SearchResult>().await?;
    if result.start_at == 0 {
      result.start_at = start_at;
    }
    if result.max_results == 0 {
      result.max_results = max_results;
    }
    debug!(
      "Search returned {} issues (startAt={}, total={})",
      result.issues.len(),
      result.start_at,
      result.total
    );
    Ok(result)
  }

  /// Fetch every issue matching `jql` in batches of `batch_size`.
  ///
  /// Stops on a short batch, when the reported total is reached, when Jira
  /// flags the last page, or after [`MAX_EXPORT_BATCHES`] batches.
  pub async fn search_all_issues_for_export(&self, jql: &str, batch_size: u32) -> Result<Vec<Value>> {
    let batch_size = batch_size.max(1);
    let mut issues: Vec<Value> = Vec::new();
    let mut start_at = 0u32;
    let mut next_page_token: Option<String> = None;
    let mut total = 0u32;

    for batch in 0..MAX_EXPORT_BATCHES {
      let page = self
        .search_issues(jql, start_at, batch_size, next_page_token.as_deref())
        .await?;

      let fetched = page.issues.len() as u32;
      if page.total > 0 {
        total = page.total;
      }
      issues.extend(page.issues);
      debug!("Export batch {} fetched {fetched} issues ({} so far)", batch + 1, issues.len());

      if fetched < batch_size || page.is_last == Some(true) {
        break;
      }
      if total > 0 && issues.len() as u32 >= total {
        break;
      }
      if batch + 1 == MAX_EXPORT_BATCHES {
        warn!(
          "Export stopped after {MAX_EXPORT_BATCHES} batches with {} issues; narrow the query to export the rest",
          issues.len()
        );
      }

      start_at += fetched;
      next_page_token = page.next_page_token;
    }

    info!("Exported {} issues", issues.len());
    Ok(issues)
  }
}
