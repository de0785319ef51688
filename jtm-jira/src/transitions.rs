//! # Workflow Transitions
//!
//! A thin client over the server-side workflow graph. Available transitions
//! are fetched fresh before every move because Jira recomputes them from the
//! ticket's current status; nothing here is cached.
//!
//! Lookup and workflow problems (unknown transition, status not reachable,
//! Jira rejecting the move with 400) come back as a [`TransitionResult`] with
//! `success == false`. Failures of the transition POST itself (auth,
//! transport, server errors) are returned as `Err`, except in a multi-step
//! move after the first hop landed: the result is then `partial` and names
//! the status reached.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::JiraClient;
use crate::error::{JiraError, Result};
use crate::models::{JiraTransition, TransitionResult};

pub const STATUS_NEW: &str = "Nuovo";
pub const STATUS_TAKEN: &str = "Preso In Carico";
pub const STATUS_PLANNING: &str = "Pianificazione Attività";
pub const STATUS_PLANNED: &str = "Attività Pianificata";

/// Pause between hops of a multi-step move so Jira can settle the new status
pub const DEFAULT_HOP_DELAY: Duration = Duration::from_secs(1);

/// Find a transition by name: exact (case-insensitive) match first, then the
/// first transition whose name contains `name`.
pub fn find_transition_by_name<'t>(transitions: &'t [JiraTransition], name: &str) -> Option<&'t JiraTransition> {
  let wanted = name.trim().to_lowercase();
  if wanted.is_empty() {
    return None;
  }

  transitions
    .iter()
    .find(|t| t.name.to_lowercase() == wanted)
    .or_else(|| transitions.iter().find(|t| t.name.to_lowercase().contains(&wanted)))
}

/// Find the transition whose target status is exactly `status`
/// (case-insensitive).
pub fn find_transition_by_status<'t>(transitions: &'t [JiraTransition], status: &str) -> Option<&'t JiraTransition> {
  let status = status.trim();
  transitions
    .iter()
    .find(|t| !t.to_status.is_empty() && t.to_status.eq_ignore_ascii_case(status))
}

/// How a walk along a status chain ended
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutcome {
  /// Every hop ran, or one failed and the walk stopped there
  Finished(TransitionResult),
  /// The token fired before the next hop. `new_status` is the status reached.
  Cancelled(TransitionResult),
}

impl ChainOutcome {
  pub fn into_result(self) -> TransitionResult {
    match self {
      Self::Finished(result) | Self::Cancelled(result) => result,
    }
  }
}

/// Executes workflow transitions against a [`JiraClient`]
pub struct TransitionService<'a> {
  client: &'a JiraClient,
  hop_delay: Duration,
}

impl<'a> TransitionService<'a> {
  pub fn new(client: &'a JiraClient) -> Self {
    Self {
      client,
      hop_delay: DEFAULT_HOP_DELAY,
    }
  }

  /// Override the pause between hops of multi-step moves
  pub fn with_hop_delay(mut self, hop_delay: Duration) -> Self {
    self.hop_delay = hop_delay;
    self
  }

  /// Transitions leaving the ticket's current status, fetched fresh
  pub async fn get_available_transitions(&self, issue_key: &str) -> Result<Vec<JiraTransition>> {
    self.client.get_transitions(issue_key).await
  }

  /// POST a transition by id without any lookup. Errors propagate.
  pub async fn execute_transition(&self, issue_key: &str, transition_id: &str) -> Result<()> {
    self.client.transition_issue(issue_key, transition_id).await
  }

  /// Execute the transition named `name` (exact match, then substring)
  pub async fn execute_transition_by_name(&self, issue_key: &str, name: &str) -> Result<TransitionResult> {
    let (current, available) = match self.snapshot(issue_key).await {
      Ok(snapshot) => snapshot,
      Err(result) => return Ok(result),
    };

    match find_transition_by_name(&available, name).cloned() {
      Some(transition) => self.apply(issue_key, &current, &transition, available).await,
      None => Ok(TransitionResult::failed(
        issue_key,
        &current,
        format!("No transition named '{name}' is available from '{current}'"),
        available,
      )),
    }
  }

  /// Execute the transition with id `transition_id` if it is currently
  /// available
  pub async fn execute_transition_by_id(&self, issue_key: &str, transition_id: &str) -> Result<TransitionResult> {
    let (current, available) = match self.snapshot(issue_key).await {
      Ok(snapshot) => snapshot,
      Err(result) => return Ok(result),
    };

    match available.iter().find(|t| t.id == transition_id).cloned() {
      Some(transition) => self.apply(issue_key, &current, &transition, available).await,
      None => Ok(TransitionResult::failed(
        issue_key,
        &current,
        format!("Transition {transition_id} is not available from '{current}'"),
        available,
      )),
    }
  }

  /// Move the ticket to `target_status`. Succeeds without a POST when the
  /// ticket is already there.
  pub async fn transition_to_status(&self, issue_key: &str, target_status: &str) -> Result<TransitionResult> {
    let current = match self.client.get_issue_status(issue_key).await {
      Ok(status) => status,
      Err(err) => return Ok(lookup_failure(issue_key, "status", err)),
    };

    if current.eq_ignore_ascii_case(target_status.trim()) {
      debug!("{issue_key} is already in '{current}'");
      return Ok(TransitionResult::succeeded(issue_key, &current, &current));
    }

    let available = match self.get_available_transitions(issue_key).await {
      Ok(available) => available,
      Err(err) => return Ok(lookup_failure(issue_key, "transitions", err).with_status(&current)),
    };

    match find_transition_by_status(&available, target_status).cloned() {
      Some(transition) => self.apply(issue_key, &current, &transition, available).await,
      None => Ok(TransitionResult::failed(
        issue_key,
        &current,
        format!("No transition leads from '{current}' to '{target_status}'"),
        available,
      )),
    }
  }

  /// Walk a ticket through `Nuovo → Pianificazione Attività → Attività
  /// Pianificata`, pausing between hops.
  ///
  /// When the second hop fails after the first succeeded the result is
  /// `partial`, with the intermediate status as `new_status`.
  pub async fn transition_to_planning_complete(&self, issue_key: &str) -> Result<TransitionResult> {
    self
      .transition_through(issue_key, &[STATUS_PLANNING, STATUS_PLANNED])
      .await
  }

  /// Move a ticket through each status of `chain` in order, stopping at the
  /// first hop that fails.
  pub async fn transition_through<S: AsRef<str>>(&self, issue_key: &str, chain: &[S]) -> Result<TransitionResult> {
    Ok(self.walk_chain(issue_key, chain, None).await?.into_result())
  }

  /// Like [`Self::transition_through`], checking `cancel` before every hop
  /// and during the pause between hops. A request already sent is never
  /// interrupted.
  pub async fn transition_through_cancellable<S: AsRef<str>>(
    &self,
    issue_key: &str,
    chain: &[S],
    cancel: &CancellationToken,
  ) -> Result<ChainOutcome> {
    self.walk_chain(issue_key, chain, Some(cancel)).await
  }

  async fn walk_chain<S: AsRef<str>>(
    &self,
    issue_key: &str,
    chain: &[S],
    cancel: Option<&CancellationToken>,
  ) -> Result<ChainOutcome> {
    let Some(target) = chain.last().map(AsRef::as_ref) else {
      return Ok(ChainOutcome::Finished(TransitionResult::failed(
        issue_key,
        "",
        "Empty status chain",
        Vec::new(),
      )));
    };

    let start = match self.client.get_issue_status(issue_key).await {
      Ok(status) => status,
      Err(err) => return Ok(ChainOutcome::Finished(lookup_failure(issue_key, "status", err))),
    };
    if start.eq_ignore_ascii_case(target) {
      return Ok(ChainOutcome::Finished(TransitionResult::succeeded(issue_key, &start, &start)));
    }

    // Skip the hops the ticket has already passed
    let remaining = chain
      .iter()
      .position(|status| status.as_ref().eq_ignore_ascii_case(&start))
      .map_or(chain, |pos| &chain[pos + 1..]);

    let mut reached = start.clone();
    for (hop, status) in remaining.iter().enumerate() {
      let status = status.as_ref();
      let resumed = hop == 0 || self.pause(cancel).await;
      if !resumed || cancel.is_some_and(CancellationToken::is_cancelled) {
        info!("{issue_key}: cancelled in '{reached}' before the hop to '{status}'");
        let mut result = TransitionResult::failed(issue_key, &start, "Cancelled", Vec::new());
        result.new_status = reached;
        result.partial = hop > 0;
        return Ok(ChainOutcome::Cancelled(result));
      }

      let step = match self.transition_to_status(issue_key, status).await {
        Ok(step) => step,
        // An earlier hop already moved the ticket
        Err(err) if hop > 0 => TransitionResult::failed(issue_key, &reached, err.to_string(), Vec::new()),
        Err(err) => return Err(err),
      };
      if !step.success {
        warn!(
          "{issue_key}: hop to '{status}' failed: {}",
          step.error_message.as_deref().unwrap_or("unknown error")
        );
        let mut result = step;
        result.current_status = start.clone();
        result.new_status = reached.clone();
        result.partial = hop > 0;
        return Ok(ChainOutcome::Finished(result));
      }
      reached = step.new_status;
    }

    info!("{issue_key}: '{start}' → '{reached}'");
    Ok(ChainOutcome::Finished(TransitionResult::succeeded(issue_key, &start, &reached)))
  }

  /// Wait out the hop delay. Returns false when `cancel` fired first.
  async fn pause(&self, cancel: Option<&CancellationToken>) -> bool {
    match cancel {
      Some(cancel) => tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(self.hop_delay) => true,
      },
      None => {
        if !self.hop_delay.is_zero() {
          tokio::time::sleep(self.hop_delay).await;
        }
        true
      }
    }
  }

  /// Current status and available transitions, or a failed result
  async fn snapshot(&self, issue_key: &str) -> Result<(String, Vec<JiraTransition>), TransitionResult> {
    let current = self
      .client
      .get_issue_status(issue_key)
      .await
      .map_err(|err| lookup_failure(issue_key, "status", err))?;
    let available = self
      .get_available_transitions(issue_key)
      .await
      .map_err(|err| lookup_failure(issue_key, "transitions", err).with_status(&current))?;
    Ok((current, available))
  }

  async fn apply(
    &self,
    issue_key: &str,
    current: &str,
    transition: &JiraTransition,
    available: Vec<JiraTransition>,
  ) -> Result<TransitionResult> {
    match self.execute_transition(issue_key, &transition.id).await {
      Ok(()) => {
        let new_status = if transition.to_status.is_empty() {
          &transition.name
        } else {
          &transition.to_status
        };
        Ok(TransitionResult::succeeded(issue_key, current, new_status))
      }
      Err(JiraError::InvalidTransition { message, .. }) => Ok(TransitionResult::failed(
        issue_key,
        current,
        format!("Jira rejected '{}': {message}", transition.name),
        available,
      )),
      Err(err) => Err(err),
    }
  }
}

fn lookup_failure(issue_key: &str, what: &str, err: JiraError) -> TransitionResult {
  warn!("Could not read {what} of {issue_key}: {err}");
  TransitionResult::failed(issue_key, "", format!("Could not read {what} of {issue_key}: {err}"), Vec::new())
}
