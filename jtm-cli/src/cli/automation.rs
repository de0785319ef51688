//! # Automation Command
//!
//! Runs the triage rule from `automation.toml`, once or on a schedule, until
//! it finishes or Ctrl-C is pressed.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use jtm_core::config::{load_toml, save_toml};
use jtm_core::output::{print_error, print_header, print_info, print_success, print_warning};
use jtm_jira::{AutomationReport, AutomationRule, AutomationService, JqlBuilder, SortDirection};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::clients::{Session, create_jira_runtime_and_client};

/// Command for the triage automation
#[derive(Args)]
pub struct AutomationArgs {
  #[command(subcommand)]
  pub subcommand: AutomationSubcommands,
}

#[derive(Subcommand)]
pub enum AutomationSubcommands {
  /// Run the rule
  Run {
    /// Repeat every N seconds until interrupted
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,
  },

  /// Print the effective rule
  Show,

  /// Write the default rule to automation.toml if it does not exist
  Init,
}

/// Fill in the rule's query when automation.toml leaves it empty: every
/// ticket of the project sitting in a status that has a chain.
pub fn effective_rule(mut rule: AutomationRule, project_key: &str) -> AutomationRule {
  if rule.jql.trim().is_empty() {
    let statuses: Vec<&String> = rule.status_chains.keys().collect();
    rule.jql = JqlBuilder::new()
      .project(project_key)
      .where_in("status", &statuses, false)
      .order_by("created", SortDirection::Asc)
      .build();
  }
  rule
}

pub(crate) fn handle_automation_command(args: AutomationArgs) -> Result<()> {
  let session = Session::load()?;
  let path = session.dirs.automation_path();

  match args.subcommand {
    AutomationSubcommands::Init => {
      if path.exists() {
        print_warning(&format!("{} already exists", path.display()));
        return Ok(());
      }
      save_toml(&path, &AutomationRule::default())?;
      print_success(&format!("Wrote default rule to {}", path.display()));
      Ok(())
    }
    AutomationSubcommands::Show => {
      let rule = effective_rule(load_toml(&path)?, &session.settings.project_key);
      let rendered = toml::to_string_pretty(&rule).context("Failed to render rule")?;
      println!("{rendered}");
      Ok(())
    }
    AutomationSubcommands::Run { interval } => {
      let rule: AutomationRule = load_toml(&path)?;
      let rule = effective_rule(rule, session.project_key()?);
      run_rule(&session, &rule, interval.map(Duration::from_secs))
    }
  }
}

fn run_rule(session: &Session, rule: &AutomationRule, interval: Option<Duration>) -> Result<()> {
  let (rt, client) = create_jira_runtime_and_client(&session.settings)?;
  let service = AutomationService::new(&client);
  let cancel = CancellationToken::new();

  print_info(&format!("Running automation: {}", rule.jql));

  let reports = rt.block_on(async {
    let token = cancel.clone();
    tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        warn!("Interrupted, stopping after the current ticket");
        token.cancel();
      }
    });

    match interval {
      Some(every) => Ok(service.run_periodic(rule, every, &cancel).await),
      None => service.run_once(rule, &cancel).await.map(|report| vec![report]),
    }
  })?;

  for report in &reports {
    print_report(report);
  }
  Ok(())
}

#[derive(Tabled)]
struct FailureRow {
  #[tabled(rename = "Ticket")]
  key: String,
  #[tabled(rename = "Problem")]
  message: String,
}

fn print_report(report: &AutomationReport) {
  print_header("Automation run");
  let summary = format!(
    "{} found, {} processed, {} skipped, {} updated, {} transitioned",
    report.found, report.processed, report.skipped, report.fields_updated, report.transitioned
  );

  if report.cancelled {
    print_warning(&format!("Cancelled: {summary}"));
  } else if report.failures.is_empty() {
    print_success(&summary);
  } else {
    print_error(&format!("{summary}, {} failed", report.failures.len()));
  }

  if !report.failures.is_empty() {
    print_header("Failures");
    let rows: Vec<FailureRow> = report
      .failures
      .iter()
      .map(|f| FailureRow {
        key: f.key.clone(),
        message: f.message.clone(),
      })
      .collect();
    println!("{}", Table::new(rows).with(Style::sharp()));
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_effective_rule_builds_query_from_chains() {
    let rule = effective_rule(AutomationRule::default(), "CC");

    assert_eq!(
      rule.jql,
      r#"project = CC AND status in ("Nuovo", "Preso In Carico") ORDER BY created ASC"#
    );
  }

  #[test]
  fn test_effective_rule_keeps_explicit_query() {
    let rule = AutomationRule {
      jql: "project = HD".to_string(),
      ..Default::default()
    };

    assert_eq!(effective_rule(rule, "CC").jql, "project = HD");
  }

  #[test]
  fn test_print_report_with_failures() {
    let report = AutomationReport {
      found: 2,
      processed: 2,
      transitioned: 1,
      failures: vec![jtm_jira::automation::AutomationFailure {
        key: "CC-6".to_string(),
        message: "Stopped at 'Pianificazione Attività' on the way to 'Attività Pianificata'".to_string(),
      }],
      ..Default::default()
    };

    print_report(&report);
    print_report(&AutomationReport {
      cancelled: true,
      ..Default::default()
    });
  }
}

