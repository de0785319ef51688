//! # jtm CLI Entry Point
//!
//! The main entry point for the `jtm` command-line tool, a terminal client for
//! a helpdesk Jira project.

use std::process::ExitCode;

use clap::Parser;
use jtm_cli::cli::{Cli, handle_cli};
use jtm_core::get_config_dirs;
use jtm_core::logging::{current_user, init_tracing, record_access};
use jtm_core::output::print_error;
use tracing::{debug, warn};

fn main() -> ExitCode {
  // Parse CLI arguments using the derive-based implementation
  let cmd = Cli::parse();

  let dirs = get_config_dirs().ok();
  let logs_dir = dirs.as_ref().map(|d| d.logs_dir());

  // Held until exit so buffered file log lines are flushed
  let _guard = match init_tracing(cmd.verbose, logs_dir.as_deref()) {
    Ok(guard) => guard,
    Err(e) => {
      eprintln!("Failed to set up logging: {e:#}");
      None
    }
  };

  let command = cmd.command.name();
  let invocation = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
  if let Some(dirs) = &dirs
    && let Err(e) = record_access(&dirs.access_log_path(), &current_user(), &invocation)
  {
    warn!("Could not write access log: {e:#}");
  }
  debug!("Running command '{command}'");

  match handle_cli(cmd) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{e:#}"));
      ExitCode::FAILURE
    }
  }
}
