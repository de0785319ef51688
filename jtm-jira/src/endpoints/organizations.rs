//! # Service Desk Organization Endpoints
//!
//! Listing of Jira Service Management customer organizations and their
//! members. Both resources are paged with `start`/`limit`/`isLastPage`; a
//! listing stops after [`MAX_SERVICE_DESK_PAGES`] pages.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::client::{JiraClient, error_for};
use crate::consts::{MAX_SERVICE_DESK_PAGES, SERVICE_DESK_PAGE_SIZE};
use crate::error::Result;
use crate::models::{Organization, ServiceDeskPage, ServiceDeskUser};

impl JiraClient {
  /// List every customer organization
  pub async fn get_organizations(&self) -> Result<Vec<Organization>> {
    self.collect_service_desk_pages("/rest/servicedeskapi/organization").await
  }

  /// List every customer of an organization
  pub async fn get_organization_members(&self, organization_id: &str) -> Result<Vec<ServiceDeskUser>> {
    self
      .collect_service_desk_pages(&format!("/rest/servicedeskapi/organization/{organization_id}/user"))
      .await
  }

  async fn collect_service_desk_pages<T: DeserializeOwned>(&self, resource: &str) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut start = 0u32;

    for _ in 0..MAX_SERVICE_DESK_PAGES {
      let response = self
        .get(&format!("{resource}?start={start}&limit={SERVICE_DESK_PAGE_SIZE}"))
        .header("X-ExperimentalApi", "opt-in")
        .send()
        .await?;

      let page = match response.status() {
        StatusCode::OK => response.json::<ServiceDeskPage<T>>().await?,
        _ => return Err(error_for(response, resource).await),
      };

      let fetched = page.values.len() as u32;
      items.extend(page.values);
      debug!("{resource}: fetched {fetched} items at start={start}");

      if page.is_last_page || fetched == 0 {
        return Ok(items);
      }
      start += fetched;
    }

    warn!(
      "{resource}: stopped after {MAX_SERVICE_DESK_PAGES} pages with {} items",
      items.len()
    );
    Ok(items)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use wiremock::matchers::{header, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  use crate::client::create_jira_client;
  use crate::consts::MAX_SERVICE_DESK_PAGES;

  #[tokio::test]
  async fn test_get_organizations_follows_pages() -> anyhow::Result<()> {
    let mock_server = MockServer::start().await;
    let client = create_jira_client(&mock_server.uri(), "test_user", "test_token");

    Mock::given(method("GET"))
      .and(path("/rest/servicedeskapi/organization"))
      .and(query_param("start", "0"))
      .and(header("X-ExperimentalApi", "opt-in"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
          "start": 0,
          "isLastPage": false,
          "values": [{ "id": "1", "name": "ACME" }, { "id": "2", "name": "Globex" }]
      })))
      .expect(1)
      .mount(&mock_server)
      .await;
    Mock::given(method("GET"))
      .and(path("/rest/servicedeskapi/organization"))
      .and(query_param("start", "2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
          "start": 2,
          "isLastPage": true,
          "values": [{ "id": "3", "name": "Initech" }]
      })))
      .expect(1)
      .mount(&mock_server)
      .await;

    let organizations = client.get_organizations().await?;
    let names: Vec<&str> = organizations.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, ["ACME", "Globex", "Initech"]);
    Ok(())
  }

  #[tokio::test]
  async fn test_get_organization_members() -> anyhow::Result<()> {
    let mock_server = MockServer::start().await;
    let client = create_jira_client(&mock_server.uri(), "test_user", "test_token");

    Mock::given(method("GET"))
      .and(path("/rest/servicedeskapi/organization/1/user"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
          "isLastPage": true,
          "values": [
              { "accountId": "a-1", "displayName": "Mario Bianchi", "emailAddress": "mario@acme.example" },
              { "accountId": "a-2", "displayName": "Anna Verdi" }
          ]
      })))
      .mount(&mock_server)
      .await;

    let members = client.get_organization_members("1").await?;
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].email_address.as_deref(), Some("mario@acme.example"));
    assert_eq!(members[1].email_address, None);
    Ok(())
  }

  #[tokio::test]
  async fn test_endless_listing_stops_at_page_cap() -> anyhow::Result<()> {
    let mock_server = MockServer::start().await;
    let client = create_jira_client(&mock_server.uri(), "test_user", "test_token");

    Mock::given(method("GET"))
      .and(path("/rest/servicedeskapi/organization"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
          "isLastPage": false,
          "values": [{ "id": "1", "name": "ACME" }]
      })))
      .expect(MAX_SERVICE_DESK_PAGES as u64)
      .mount(&mock_server)
      .await;

    let organizations = client.get_organizations().await?;
    assert_eq!(organizations.len(), MAX_SERVICE_DESK_PAGES);
    Ok(())
  }
}
