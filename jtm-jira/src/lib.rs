//! # Jira API Client
//!
//! Provides Jira REST API integration for the helpdesk ticket manager: JQL
//! construction, paginated issue search, workflow transitions, service-desk
//! organizations and the rule-driven triage batch.

pub mod auth;
pub mod automation;
mod client;
pub mod consts;
mod endpoints;
pub mod error;
pub mod jql;
pub mod models;
pub mod transitions;

pub use auth::{create_jira_client_from_settings, create_jira_runtime_and_client, get_jira_credentials};
pub use automation::{AutomationReport, AutomationRule, AutomationService, AutomationTicket};
// Re-export the client
pub use client::{JiraClient, create_jira_client};
pub use error::JiraError;
pub use jql::{JqlBuilder, Operator, SortDirection};
// Re-export models
pub use models::{
  JiraAuth, JiraIssue, JiraIssueFields, JiraIssueStatus, JiraTransition, JiraTransitions, Organization, SearchResult,
  ServiceDeskUser, TicketSummary, TransitionId, TransitionRequest, TransitionResult,
};
pub use transitions::{ChainOutcome, TransitionService};
