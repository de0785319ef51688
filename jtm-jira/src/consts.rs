//! Constants for the jtm-jira client.

use std::time::Duration;

/// User-Agent header value for the Jira API client
pub const USER_AGENT: &str = concat!("jtm/", env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Default request timeout for the shared HTTP client
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Custom field holding the service-desk organizations of a request
pub const ORGANIZATIONS_FIELD: &str = "customfield_10002";

/// Fields requested for every issue search
pub const SEARCH_FIELDS: &[&str] = &[
  "summary",
  "status",
  "priority",
  "assignee",
  "reporter",
  "issuetype",
  "created",
  "updated",
  "description",
  ORGANIZATIONS_FIELD,
];

/// Default page size for issue searches
pub const DEFAULT_BATCH_SIZE: u32 = 100;

/// Upper bound on the number of batches fetched by an export
pub const MAX_EXPORT_BATCHES: usize = 100;

/// Page size used when listing service-desk organizations and their members
pub const SERVICE_DESK_PAGE_SIZE: u32 = 50;

/// Upper bound on the number of pages fetched from a service-desk listing
pub const MAX_SERVICE_DESK_PAGES: usize = 100;
