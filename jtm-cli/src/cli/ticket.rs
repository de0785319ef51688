//! # Ticket Commands
//!
//! Listing and executing workflow transitions, the planning walk and
//! comments. Transitions are always looked up fresh right before they are
//! executed.

use anyhow::{Result, bail};
use clap::Args;
use jtm_core::output::{format_issue_key, format_status, print_error, print_info, print_success, print_warning};
use jtm_jira::TransitionResult;
use jtm_jira::transitions::TransitionService;
use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::clients::{Session, create_jira_runtime_and_client};

/// Arguments for `jtm transitions`
#[derive(Args)]
pub struct TransitionsArgs {
  /// Ticket key (e.g. CC-123)
  pub issue_key: String,
}

/// Arguments for `jtm transition`
#[derive(Args)]
pub struct TransitionArgs {
  /// Ticket key (e.g. CC-123)
  pub issue_key: String,

  /// Transition name (exact match first, then substring), or id with --id
  pub transition: String,

  /// Treat the transition argument as a transition id
  #[arg(long)]
  pub id: bool,
}

/// Arguments for `jtm move`
#[derive(Args)]
pub struct MoveArgs {
  /// Ticket key (e.g. CC-123)
  pub issue_key: String,

  /// Name of the status to reach
  pub status: String,
}

/// Arguments for `jtm plan`
#[derive(Args)]
pub struct PlanArgs {
  /// Ticket keys to plan
  #[arg(required = true)]
  pub issue_keys: Vec<String>,
}

/// Arguments for `jtm comment`
#[derive(Args)]
pub struct CommentArgs {
  /// Ticket key (e.g. CC-123)
  pub issue_key: String,

  /// Comment text
  pub body: String,
}

#[derive(Tabled)]
struct TransitionRow {
  #[tabled(rename = "ID")]
  id: String,
  #[tabled(rename = "Transition")]
  name: String,
  #[tabled(rename = "Target Status")]
  to_status: String,
}

/// Print the outcome of a transition attempt; returns whether it succeeded
fn report_result(result: &TransitionResult) -> bool {
  let key = format_issue_key(&result.ticket_key);

  if result.success {
    if result.current_status == result.new_status {
      print_info(&format!("{key} is already in {}", format_status(&result.new_status)));
    } else {
      print_success(&format!(
        "{key}: {} → {}",
        format_status(&result.current_status),
        format_status(&result.new_status)
      ));
    }
    return true;
  }

  let message = result.error_message.as_deref().unwrap_or("Transition failed");
  if result.partial {
    print_warning(&format!(
      "{key} stopped at {} (from {}): {message}",
      format_status(&result.new_status),
      format_status(&result.current_status)
    ));
  } else {
    print_error(&format!("{key}: {message}"));
  }

  let available = result.available_names();
  if !available.is_empty() {
    println!("  Available transitions: {}", available.join(", ").dimmed());
  }
  false
}

pub(crate) fn handle_transitions_command(args: TransitionsArgs) -> Result<()> {
  let session = Session::load()?;
  let (rt, client) = create_jira_runtime_and_client(&session.settings)?;
  let service = TransitionService::new(&client);

  let transitions = rt.block_on(service.get_available_transitions(&args.issue_key))?;
  if transitions.is_empty() {
    print_warning(&format!("No transitions available for {}", args.issue_key));
    return Ok(());
  }

  let rows: Vec<TransitionRow> = transitions
    .into_iter()
    .map(|t| TransitionRow {
      id: t.id,
      name: t.name,
      to_status: t.to_status,
    })
    .collect();
  println!("{}", Table::new(rows).with(Style::sharp()));
  Ok(())
}

pub(crate) fn handle_transition_command(args: TransitionArgs) -> Result<()> {
  let session = Session::load()?;
  let (rt, client) = create_jira_runtime_and_client(&session.settings)?;
  let service = TransitionService::new(&client);

  let result = rt.block_on(async {
    if args.id {
      service.execute_transition_by_id(&args.issue_key, &args.transition).await
    } else {
      service.execute_transition_by_name(&args.issue_key, &args.transition).await
    }
  })?;

  if !report_result(&result) {
    bail!("Transition of {} failed", args.issue_key);
  }
  Ok(())
}

pub(crate) fn handle_move_command(args: MoveArgs) -> Result<()> {
  let session = Session::load()?;
  let (rt, client) = create_jira_runtime_and_client(&session.settings)?;
  let service = TransitionService::new(&client);

  let result = rt.block_on(service.transition_to_status(&args.issue_key, &args.status))?;
  if !report_result(&result) {
    bail!("Could not move {} to '{}'", args.issue_key, args.status);
  }
  Ok(())
}

pub(crate) fn handle_plan_command(args: PlanArgs) -> Result<()> {
  let session = Session::load()?;
  let (rt, client) = create_jira_runtime_and_client(&session.settings)?;
  let service = TransitionService::new(&client);

  let total = args.issue_keys.len();
  let mut failed = 0;
  rt.block_on(async {
    for key in &args.issue_keys {
      match service.transition_to_planning_complete(key).await {
        Ok(result) => {
          if !report_result(&result) {
            failed += 1;
          }
        }
        Err(err) => {
          print_error(&format!("{}: {err}", format_issue_key(key)));
          failed += 1;
        }
      }
    }
  });

  if failed > 0 {
    bail!("{failed} of {total} tickets could not be planned");
  }
  Ok(())
}

pub(crate) fn handle_comment_command(args: CommentArgs) -> Result<()> {
  if args.body.trim().is_empty() {
    bail!("Comment text cannot be empty");
  }

  let session = Session::load()?;
  let (rt, client) = create_jira_runtime_and_client(&session.settings)?;

  rt.block_on(client.add_comment(&args.issue_key, &args.body))?;
  print_success(&format!("Comment added to {}", format_issue_key(&args.issue_key)));
  Ok(())
}
