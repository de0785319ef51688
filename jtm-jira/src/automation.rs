//! # Rule-Driven Triage
//!
//! Batch workflow that searches the tickets selected by an [`AutomationRule`],
//! pushes the rule's field updates and walks each ticket along the status
//! chain configured for its current status.
//!
//! Tickets are processed one at a time so the Jira tenant never sees a burst
//! of writes and log lines stay in ticket order. A failure on one ticket is
//! recorded in the [`AutomationReport`] and the run moves on. Cancellation is
//! observed between tickets and between hops, never inside a request.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::client::JiraClient;
use crate::consts::DEFAULT_BATCH_SIZE;
use crate::error::Result;
use crate::models::TicketSummary;
use crate::transitions::{ChainOutcome, STATUS_NEW, STATUS_PLANNED, STATUS_PLANNING, STATUS_TAKEN, TransitionService};

/// Selection criteria and actions of a triage run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationRule {
  /// Query selecting candidate tickets
  pub jql: String,
  /// At least one must appear in the summary or description (any case).
  /// Empty matches every ticket.
  pub keywords: Vec<String>,
  /// Assignees (display name, account id or email) the rule applies to.
  /// Empty matches any assignee.
  pub assignees: Vec<String>,
  pub include_unassigned: bool,
  /// Field id → value pushed to every matching ticket
  pub field_updates: Map<String, Value>,
  /// Current status → statuses to walk through, in order
  pub status_chains: BTreeMap<String, Vec<String>>,
  pub hop_delay_ms: u64,
  pub batch_size: u32,
}

impl Default for AutomationRule {
  fn default() -> Self {
    let mut status_chains = BTreeMap::new();
    status_chains.insert(
      STATUS_NEW.to_string(),
      vec![STATUS_PLANNING.to_string(), STATUS_PLANNED.to_string()],
    );
    status_chains.insert(STATUS_TAKEN.to_string(), vec![STATUS_PLANNED.to_string()]);

    Self {
      jql: String::new(),
      keywords: Vec::new(),
      assignees: Vec::new(),
      include_unassigned: true,
      field_updates: Map::new(),
      status_chains,
      hop_delay_ms: 1000,
      batch_size: DEFAULT_BATCH_SIZE,
    }
  }
}

impl AutomationRule {
  /// Status chain for a ticket currently in `status`
  pub fn chain_for(&self, status: &str) -> Option<&[String]> {
    self
      .status_chains
      .iter()
      .find(|(from, _)| from.eq_ignore_ascii_case(status))
      .map(|(_, chain)| chain.as_slice())
  }

  pub fn hop_delay(&self) -> Duration {
    Duration::from_millis(self.hop_delay_ms)
  }
}

/// Denormalized view of an issue used during a triage run
#[derive(Debug, Clone, PartialEq)]
pub struct AutomationTicket {
  pub key: String,
  pub summary: String,
  pub description: String,
  pub status: String,
  pub assignee: Option<String>,
  pub assignee_ids: Vec<String>,
  /// Current values of the fields the run may touch
  pub fields: Map<String, Value>,
  /// Field updates staged locally and not yet pushed
  pub pending_updates: Map<String, Value>,
}

impl AutomationTicket {
  pub fn from_issue(issue: &Value) -> Self {
    let summary = TicketSummary::from_issue(issue);
    let assignee = &issue["fields"]["assignee"];
    let assignee_ids = ["accountId", "emailAddress", "name"]
      .iter()
      .filter_map(|k| assignee[*k].as_str())
      .map(str::to_string)
      .collect();
    let fields = issue["fields"].as_object().cloned().unwrap_or_default();

    Self {
      key: summary.key,
      summary: summary.summary,
      description: summary.description,
      status: summary.status,
      assignee: Some(summary.assignee).filter(|a| !a.is_empty()),
      assignee_ids,
      fields,
      pending_updates: Map::new(),
    }
  }

  /// Whether the rule's keyword and assignee filters select this ticket
  pub fn matches(&self, rule: &AutomationRule) -> bool {
    self.matches_keywords(&rule.keywords) && self.matches_assignee(rule)
  }

  fn matches_keywords(&self, keywords: &[String]) -> bool {
    let keywords: Vec<String> = keywords
      .iter()
      .map(|k| k.trim().to_lowercase())
      .filter(|k| !k.is_empty())
      .collect();
    if keywords.is_empty() {
      return true;
    }

    let haystack = format!("{}\n{}", self.summary, self.description).to_lowercase();
    keywords.iter().any(|k| haystack.contains(k))
  }

  fn matches_assignee(&self, rule: &AutomationRule) -> bool {
    let Some(assignee) = &self.assignee else {
      return rule.include_unassigned;
    };
    if rule.assignees.is_empty() {
      return true;
    }

    rule.assignees.iter().any(|wanted| {
      wanted.eq_ignore_ascii_case(assignee) || self.assignee_ids.iter().any(|id| wanted.eq_ignore_ascii_case(id))
    })
  }

  /// Stage the rule's field updates that differ from the current values.
  /// Returns how many were staged.
  pub fn stage_updates(&mut self, updates: &Map<String, Value>) -> usize {
    for (field, value) in updates {
      if self.fields.get(field) != Some(value) {
        self.fields.insert(field.clone(), value.clone());
        self.pending_updates.insert(field.clone(), value.clone());
      }
    }
    self.pending_updates.len()
  }
}

/// A ticket the run could not finish
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutomationFailure {
  pub key: String,
  pub message: String,
}

/// Summary of one triage run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AutomationReport {
  /// Tickets returned by the search
  pub found: usize,
  /// Tickets selected by the rule and processed
  pub processed: usize,
  /// Tickets filtered out by keywords or assignee
  pub skipped: usize,
  pub fields_updated: usize,
  /// Tickets that reached the end of their status chain
  pub transitioned: usize,
  pub failures: Vec<AutomationFailure>,
  pub cancelled: bool,
}

enum TicketOutcome {
  Completed { reached: String },
  NoChain,
  Stopped(String),
  Cancelled,
}

/// Runs [`AutomationRule`]s against Jira
pub struct AutomationService<'a> {
  client: &'a JiraClient,
}

impl<'a> AutomationService<'a> {
  pub fn new(client: &'a JiraClient) -> Self {
    Self { client }
  }

  /// Run the rule once over every matching ticket.
  ///
  /// Only a failed search aborts the run; per-ticket failures are collected
  /// in the report.
  pub async fn run_once(&self, rule: &AutomationRule, cancel: &CancellationToken) -> Result<AutomationReport> {
    let mut report = AutomationReport::default();
    if cancel.is_cancelled() {
      report.cancelled = true;
      return Ok(report);
    }

    let issues = self
      .client
      .search_all_issues_for_export(&rule.jql, rule.batch_size)
      .await?;
    report.found = issues.len();
    info!("Automation found {} candidate tickets", issues.len());

    for issue in &issues {
      if cancel.is_cancelled() {
        warn!("Automation cancelled after {} tickets", report.processed);
        report.cancelled = true;
        break;
      }

      let mut ticket = AutomationTicket::from_issue(issue);
      if !ticket.matches(rule) {
        debug!("{} does not match the rule", ticket.key);
        report.skipped += 1;
        continue;
      }
      report.processed += 1;

      let staged = ticket.stage_updates(&rule.field_updates);
      if staged > 0 {
        match self.client.update_issue_fields(&ticket.key, &ticket.pending_updates).await {
          Ok(()) => {
            ticket.pending_updates.clear();
            report.fields_updated += 1;
          }
          Err(err) => {
            error!("{}: field update failed: {err}", ticket.key);
            report.failures.push(AutomationFailure {
              key: ticket.key.clone(),
              message: format!("Field update failed: {err}"),
            });
            continue;
          }
        }
      }

      match self.drive_chain(&ticket, rule, cancel).await {
        Ok(TicketOutcome::Completed { reached }) => {
          info!("{}: now in '{reached}'", ticket.key);
          report.transitioned += 1;
        }
        Ok(TicketOutcome::NoChain) => debug!("{}: no status chain for '{}'", ticket.key, ticket.status),
        Ok(TicketOutcome::Stopped(message)) => {
          warn!("{}: {message}", ticket.key);
          report.failures.push(AutomationFailure {
            key: ticket.key.clone(),
            message,
          });
        }
        Ok(TicketOutcome::Cancelled) => {
          report.cancelled = true;
          break;
        }
        Err(err) => {
          error!("{}: transition failed: {err}", ticket.key);
          report.failures.push(AutomationFailure {
            key: ticket.key.clone(),
            message: err.to_string(),
          });
        }
      }
    }

    info!(
      "Automation finished: {} processed, {} skipped, {} transitioned, {} failed",
      report.processed,
      report.skipped,
      report.transitioned,
      report.failures.len()
    );
    Ok(report)
  }

  /// Run the rule every `interval` until `cancel` fires. A failed run is
  /// logged and the schedule continues.
  pub async fn run_periodic(
    &self,
    rule: &AutomationRule,
    interval: Duration,
    cancel: &CancellationToken,
  ) -> Vec<AutomationReport> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut reports = Vec::new();

    loop {
      tokio::select! {
        biased;
        _ = cancel.cancelled() => break,
        _ = ticker.tick() => {}
      }

      match self.run_once(rule, cancel).await {
        Ok(report) => {
          let cancelled = report.cancelled;
          reports.push(report);
          if cancelled {
            break;
          }
        }
        Err(err) => error!("Automation run failed: {err}"),
      }
    }

    info!("Automation schedule stopped after {} runs", reports.len());
    reports
  }

  async fn drive_chain(
    &self,
    ticket: &AutomationTicket,
    rule: &AutomationRule,
    cancel: &CancellationToken,
  ) -> Result<TicketOutcome> {
    let Some(chain) = rule.chain_for(&ticket.status) else {
      return Ok(TicketOutcome::NoChain);
    };

    let outcome = TransitionService::new(self.client)
      .with_hop_delay(rule.hop_delay())
      .transition_through_cancellable(&ticket.key, chain, cancel)
      .await?;

    match outcome {
      ChainOutcome::Cancelled(_) => Ok(TicketOutcome::Cancelled),
      ChainOutcome::Finished(result) if result.success => Ok(TicketOutcome::Completed {
        reached: result.new_status,
      }),
      ChainOutcome::Finished(result) => {
        let target = chain.last().map(String::as_str).unwrap_or_default();
        let reached = if result.new_status.is_empty() {
          ticket.status.as_str()
        } else {
          result.new_status.as_str()
        };
        let reason = result.error_message.as_deref().unwrap_or("unknown error");
        Ok(TicketOutcome::Stopped(format!(
          "Stopped at '{reached}' on the way to '{target}': {reason}"
        )))
      }
    }
  }
}
