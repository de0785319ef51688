//! # Search and Export Commands
//!
//! Both commands share the same filter flags, turned into JQL by
//! [`SearchFilters::to_jql`].

use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::Args;
use jtm_core::output::{format_issue_key, format_status, print_info, print_success, print_warning};
use jtm_jira::jql::is_valid_jql;
use jtm_jira::{JqlBuilder, SortDirection, TicketSummary};
use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::clients::{Session, create_jira_runtime_and_client};
use crate::export::write_export;

/// Ticket filters combined with AND
#[derive(Args, Debug, Clone, Default)]
pub struct SearchFilters {
  /// Project key (defaults to the configured project)
  #[arg(long)]
  pub project: Option<String>,

  /// Status name, or one of the categories Completato / In corso / Da fare
  #[arg(long)]
  pub status: Option<String>,

  /// Service-desk organization name
  #[arg(long)]
  pub organization: Option<String>,

  #[arg(long)]
  pub priority: Option<String>,

  #[arg(long)]
  pub assignee: Option<String>,

  /// Only tickets with no assignee
  #[arg(long, conflicts_with = "assignee")]
  pub unassigned: bool,

  #[arg(long)]
  pub reporter: Option<String>,

  /// Issue type name
  #[arg(long = "type")]
  pub issue_type: Option<String>,

  /// Full-text search across summary, description and comments
  #[arg(long)]
  pub text: Option<String>,

  /// Text the summary must contain
  #[arg(long)]
  pub summary: Option<String>,

  #[arg(long, value_name = "YYYY-MM-DD")]
  pub created_after: Option<NaiveDate>,

  #[arg(long, value_name = "YYYY-MM-DD")]
  pub created_before: Option<NaiveDate>,

  #[arg(long, value_name = "YYYY-MM-DD")]
  pub updated_after: Option<NaiveDate>,

  #[arg(long, value_name = "YYYY-MM-DD")]
  pub updated_before: Option<NaiveDate>,

  /// Relative period such as -30d or -2w
  #[arg(long, value_name = "PERIOD", allow_hyphen_values = true)]
  pub created_within: Option<String>,

  /// Relative period such as -7d
  #[arg(long, value_name = "PERIOD", allow_hyphen_values = true)]
  pub updated_within: Option<String>,

  /// Raw JQL; replaces every other filter
  #[arg(long, conflicts_with_all = ["status", "organization", "text", "summary"])]
  pub jql: Option<String>,
}

fn with_opt(builder: JqlBuilder, value: Option<&str>, apply: impl FnOnce(JqlBuilder, &str) -> JqlBuilder) -> JqlBuilder {
  match value {
    Some(value) => apply(builder, value),
    None => builder,
  }
}

impl SearchFilters {
  /// Build the query, newest tickets first.
  ///
  /// `default_project` is used when `--project` is not given.
  pub fn to_jql(&self, default_project: &str) -> Result<String> {
    if let Some(jql) = &self.jql {
      if !is_valid_jql(jql) {
        bail!("The JQL query looks malformed: {jql}");
      }
      return Ok(jql.trim().to_string());
    }

    let project = self.project.as_deref().unwrap_or(default_project);
    if project.trim().is_empty() {
      bail!("No project key configured. Run 'jtm config init --project <KEY>' or pass --project.");
    }
    let mut builder = JqlBuilder::new().project(project);
    builder = with_opt(builder, self.status.as_deref(), JqlBuilder::status);
    builder = with_opt(builder, self.organization.as_deref(), JqlBuilder::organization);
    builder = with_opt(builder, self.priority.as_deref(), JqlBuilder::priority);
    builder = with_opt(builder, self.assignee.as_deref(), JqlBuilder::assignee);
    builder = with_opt(builder, self.reporter.as_deref(), JqlBuilder::reporter);
    builder = with_opt(builder, self.issue_type.as_deref(), JqlBuilder::issue_type);
    builder = with_opt(builder, self.text.as_deref(), JqlBuilder::text);
    builder = with_opt(builder, self.summary.as_deref(), JqlBuilder::summary_contains);
    builder = with_opt(builder, self.created_within.as_deref(), JqlBuilder::created_within);
    builder = with_opt(builder, self.updated_within.as_deref(), JqlBuilder::updated_within);
    if self.unassigned {
      builder = builder.unassigned();
    }
    if let Some(date) = self.created_after {
      builder = builder.created_after(date);
    }
    if let Some(date) = self.created_before {
      builder = builder.created_before(date);
    }
    if let Some(date) = self.updated_after {
      builder = builder.updated_after(date);
    }
    if let Some(date) = self.updated_before {
      builder = builder.updated_before(date);
    }

    let jql = builder.order_by("created", SortDirection::Desc).build();
    Ok(jql)
  }
}

/// Arguments for `jtm search`
#[derive(Args)]
pub struct SearchArgs {
  #[command(flatten)]
  pub filters: SearchFilters,

  /// Maximum number of tickets to show
  #[arg(long, short = 'n', default_value_t = 50)]
  pub limit: u32,

  /// Print the generated JQL without searching
  #[arg(long)]
  pub show_jql: bool,
}

/// Arguments for `jtm export`
#[derive(Args)]
pub struct ExportArgs {
  #[command(flatten)]
  pub filters: SearchFilters,

  /// Destination CSV file
  #[arg(long, short = 'o')]
  pub output: PathBuf,

  /// Tickets fetched per request (defaults to the configured batch size)
  #[arg(long)]
  pub batch_size: Option<u32>,
}

#[derive(Tabled)]
struct TicketRow {
  #[tabled(rename = "Key")]
  key: String,
  #[tabled(rename = "Status")]
  status: String,
  #[tabled(rename = "Priority")]
  priority: String,
  #[tabled(rename = "Assignee")]
  assignee: String,
  #[tabled(rename = "Organizations")]
  organizations: String,
  #[tabled(rename = "Summary")]
  summary: String,
}

fn truncate(text: &str, max_chars: usize) -> String {
  if text.chars().count() <= max_chars {
    return text.to_string();
  }
  let mut short: String = text.chars().take(max_chars.saturating_sub(1)).collect();
  short.push('…');
  short
}

impl From<&TicketSummary> for TicketRow {
  fn from(ticket: &TicketSummary) -> Self {
    Self {
      key: format_issue_key(&ticket.key),
      status: format_status(&ticket.status),
      priority: ticket.priority.clone(),
      assignee: if ticket.assignee.is_empty() {
        "Unassigned".to_string()
      } else {
        ticket.assignee.clone()
      },
      organizations: ticket.organization_list(),
      summary: truncate(&ticket.summary, 60),
    }
  }
}

pub(crate) fn handle_search_command(args: SearchArgs) -> Result<()> {
  let session = Session::load()?;
  let jql = args.filters.to_jql(&session.settings.project_key)?;

  if args.show_jql {
    println!("{jql}");
    return Ok(());
  }

  let (rt, client) = create_jira_runtime_and_client(&session.settings)?;
  print_info(&format!("Searching: {}", jql.dimmed()));

  let result = rt.block_on(client.search_issues(&jql, 0, args.limit, None))?;
  if result.issues.is_empty() {
    print_warning("No tickets match the filters.");
    return Ok(());
  }

  let rows: Vec<TicketRow> = result
    .issues
    .iter()
    .map(TicketSummary::from_issue)
    .map(|ticket| TicketRow::from(&ticket))
    .collect();
  let shown = rows.len();
  println!("\n{}", Table::new(rows).with(Style::sharp()));

  if result.total as usize > shown {
    print_info(&format!(
      "Showing {shown} of {} tickets. Use --limit or 'jtm export' for more.",
      result.total
    ));
  } else {
    print_info(&format!("{shown} tickets"));
  }
  Ok(())
}

pub(crate) fn handle_export_command(args: ExportArgs) -> Result<()> {
  let session = Session::load()?;
  let jql = args.filters.to_jql(&session.settings.project_key)?;
  let batch_size = args.batch_size.unwrap_or(session.settings.export_batch_size).max(1);

  let (rt, client) = create_jira_runtime_and_client(&session.settings)?;
  print_info(&format!("Exporting: {}", jql.dimmed()));

  let issues = rt.block_on(client.search_all_issues_for_export(&jql, batch_size))?;
  let written = write_export(&args.output, &issues)?;

  print_success(&format!("Exported {written} tickets to {}", args.output.display()));
  Ok(())
}
