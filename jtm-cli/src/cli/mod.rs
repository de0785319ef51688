//! # Command Line Interface
//!
//! Defines the CLI structure and dispatches to the command handlers for
//! searching, exporting, transitioning and annotating helpdesk tickets.

mod automation;
mod config;
mod creds;
mod email;
mod orgs;
mod phonebook;
pub mod search;
mod ticket;

use anyhow::Result;
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

pub use orgs::sync_organization_members;

/// Top-level CLI command for jtm
#[derive(Parser)]
#[command(name = "jtm")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(about = "Browse, filter, annotate and transition helpdesk Jira tickets")]
#[command(
  long_about = "jtm is a terminal client for a helpdesk Jira project.\n\n\
        It builds JQL from simple filters, exports search results to CSV, moves tickets\n\
        through the workflow, runs the rule-driven triage batch and composes emails\n\
        about tickets."
)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
#[command(subcommand_required(true))]
#[command(disable_help_subcommand = true)]
#[command(max_term_width = 120)]
#[command(styles = Styles::styled()
    .header(AnsiColor::BrightBlue.on_default().bold().underline())
    .usage(AnsiColor::Blue.on_default().bold())
    .literal(AnsiColor::BrightBlue.on_default().bold())
    .placeholder(AnsiColor::BrightWhite.on_default().italic())
    .valid(AnsiColor::Green.on_default())
    .invalid(AnsiColor::BrightRed.on_default().bold())
)]
pub struct Cli {
  /// Sets the level of verbosity (can be used multiple times)
  #[arg(
    short = 'v',
    long = "verbose",
    action = ArgAction::Count,
    global = true,
    long_help = "Sets the level of verbosity for tracing and logging output.\n\n\
             -v: Show info level messages\n\
             -vv: Show debug level messages\n\
             -vvv: Show trace level messages"
  )]
  pub verbose: u8,

  /// Controls when colored output is used
  #[arg(long, value_enum, ignore_case = true, global = true, default_value_t = ColorMode::Auto)]
  pub colors: ColorMode,

  /// Subcommands
  #[command(subcommand)]
  pub command: Commands,
}

/// When to color terminal output
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
  /// Always color
  Always,
  /// Color when writing to a terminal
  Auto,
  /// Never color
  Never,
}

/// Subcommands for jtm
#[derive(Subcommand)]
pub enum Commands {
  /// Run the triage automation
  #[command(long_about = "Run the rule-driven triage batch.\n\n\
            The rule in automation.toml selects tickets by JQL, keywords and assignee,\n\
            pushes field updates and walks each ticket through its status chain.")]
  #[command(arg_required_else_help = true)]
  Automation(automation::AutomationArgs),

  /// Add a comment to a ticket
  Comment(ticket::CommentArgs),

  /// Manage settings
  #[command(arg_required_else_help = true)]
  Config(config::ConfigArgs),

  /// Manage Jira credentials in .netrc
  #[command(long_about = "Manage the Jira credentials stored in your .netrc file.\n\n\
            API-token mode uses the entry for the Jira host (or 'atlassian.net');\n\
            service-account mode uses the 'jtm-service-account' entry.")]
  #[command(arg_required_else_help = true)]
  Creds(creds::CredsArgs),

  /// Compose an email about a ticket
  #[command(long_about = "Render an email template for a ticket and open it in the mail client.\n\n\
            Recipients default to the cached members of the ticket's organizations.")]
  Email(email::EmailArgs),

  /// Export matching tickets to CSV
  #[command(long_about = "Fetch every ticket matching the filters in batches and write them to a CSV file.\n\n\
            The export stops after 100 batches even if Jira reports more results.")]
  Export(search::ExportArgs),

  /// Move a ticket to a target status
  #[command(name = "move")]
  Move(ticket::MoveArgs),

  /// Service-desk organizations and their members
  #[command(arg_required_else_help = true)]
  Orgs(orgs::OrgsArgs),

  /// Phone-book cache
  #[command(arg_required_else_help = true)]
  Phonebook(phonebook::PhonebookArgs),

  /// Walk tickets to "Attività Pianificata"
  #[command(long_about = "Move tickets through the planning workflow.\n\n\
            Tickets in 'Nuovo' go through 'Pianificazione Attività' to 'Attività Pianificata';\n\
            tickets already past a step skip it.")]
  Plan(ticket::PlanArgs),

  /// Search tickets
  #[command(long_about = "Search tickets in the configured project.\n\n\
            Filters are combined with AND. Use --jql to pass a raw query instead.")]
  #[command(alias = "s")]
  Search(search::SearchArgs),

  /// Execute a transition by name or id
  Transition(ticket::TransitionArgs),

  /// List the transitions available for a ticket
  Transitions(ticket::TransitionsArgs),
}

impl Commands {
  /// Short name recorded in the access log
  pub fn name(&self) -> &'static str {
    match self {
      Commands::Automation(_) => "automation",
      Commands::Comment(_) => "comment",
      Commands::Config(_) => "config",
      Commands::Creds(_) => "creds",
      Commands::Email(_) => "email",
      Commands::Export(_) => "export",
      Commands::Move(_) => "move",
      Commands::Orgs(_) => "orgs",
      Commands::Phonebook(_) => "phonebook",
      Commands::Plan(_) => "plan",
      Commands::Search(_) => "search",
      Commands::Transition(_) => "transition",
      Commands::Transitions(_) => "transitions",
    }
  }
}

pub fn handle_cli(cli: Cli) -> Result<()> {
  match cli.colors {
    ColorMode::Always => owo_colors::set_override(true),
    ColorMode::Never => owo_colors::set_override(false),
    ColorMode::Auto => {}
  }

  match cli.command {
    Commands::Automation(args) => automation::handle_automation_command(args),
    Commands::Comment(args) => ticket::handle_comment_command(args),
    Commands::Config(args) => config::handle_config_command(args),
    Commands::Creds(args) => creds::handle_creds_command(args),
    Commands::Email(args) => email::handle_email_command(args),
    Commands::Export(args) => search::handle_export_command(args),
    Commands::Move(args) => ticket::handle_move_command(args),
    Commands::Orgs(args) => orgs::handle_orgs_command(args),
    Commands::Phonebook(args) => phonebook::handle_phonebook_command(args),
    Commands::Plan(args) => ticket::handle_plan_command(args),
    Commands::Search(args) => search::handle_search_command(args),
    Commands::Transition(args) => ticket::handle_transition_command(args),
    Commands::Transitions(args) => ticket::handle_transitions_command(args),
  }
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
  }

  #[test]
  fn test_parse_plan_with_verbosity() {
    let cli = Cli::try_parse_from(["jtm", "-vv", "plan", "CC-1", "CC-2"]).unwrap();
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.command.name(), "plan");
  }

  #[test]
  fn test_parse_move_subcommand() {
    let cli = Cli::try_parse_from(["jtm", "move", "CC-1", "Completato"]).unwrap();
    assert_eq!(cli.command.name(), "move");
  }
}
