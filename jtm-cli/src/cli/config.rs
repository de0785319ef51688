//! # Config Command
//!
//! Creates and shows `settings.toml`.

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use jtm_core::config::AuthMode;
use jtm_core::output::{print_info, print_success};
use jtm_core::url::{ENV_JIRA_HOST, ensure_url_scheme};
use owo_colors::OwoColorize;

use crate::clients::Session;

/// Command for settings management
#[derive(Args)]
pub struct ConfigArgs {
  #[command(subcommand)]
  pub subcommand: ConfigSubcommands,
}

#[derive(Subcommand)]
pub enum ConfigSubcommands {
  /// Create the directories and write settings
  #[command(long_about = "Create the configuration directories and write settings.toml.\n\n\
            Only the given options change; existing values are kept.")]
  Init {
    /// Jira host (e.g. acme.atlassian.net)
    #[arg(long)]
    host: Option<String>,

    /// Project key used when a command gets no --project
    #[arg(long)]
    project: Option<String>,

    /// Which .netrc entry to authenticate with
    #[arg(long, value_enum)]
    auth_mode: Option<AuthModeArg>,

    /// HTTP timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
  },

  /// Show the effective settings and file locations
  Show,
}

/// Auth mode argument for the CLI
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum AuthModeArg {
  /// Personal API token stored for the Jira host
  ApiToken,
  /// Shared service account
  ServiceAccount,
}

impl From<AuthModeArg> for AuthMode {
  fn from(mode: AuthModeArg) -> Self {
    match mode {
      AuthModeArg::ApiToken => AuthMode::ApiToken,
      AuthModeArg::ServiceAccount => AuthMode::ServiceAccount,
    }
  }
}

pub(crate) fn handle_config_command(args: ConfigArgs) -> Result<()> {
  let session = Session::load()?;

  match args.subcommand {
    ConfigSubcommands::Init {
      host,
      project,
      auth_mode,
      timeout,
    } => {
      let Session { dirs, mut settings } = session;
      dirs.init()?;

      if let Some(host) = host {
        settings.jira_host = ensure_url_scheme(&host)?;
      }
      if let Some(project) = project {
        settings.project_key = project.trim().to_uppercase();
      }
      if let Some(mode) = auth_mode {
        settings.auth_mode = mode.into();
      }
      if let Some(timeout) = timeout {
        settings.timeout_secs = timeout;
      }

      dirs.save_settings(&settings)?;
      print_success(&format!("Settings saved to {}", dirs.settings_path().display()));
      Ok(())
    }
    ConfigSubcommands::Show => {
      let Session { dirs, settings } = session;
      let host_override = std::env::var(ENV_JIRA_HOST).ok();

      print_info("Current settings:");
      let host = if settings.jira_host.is_empty() {
        "Not configured".dimmed().to_string()
      } else {
        settings.jira_host.clone()
      };
      println!("  Jira host:        {host}");
      if let Some(value) = host_override {
        println!("  {ENV_JIRA_HOST}:    {value} (overrides the host)");
      }
      println!("  Project:          {}", settings.project_key);
      println!("  Auth mode:        {}", settings.auth_mode);
      println!("  Timeout:          {}s", settings.timeout_secs);
      println!("  Export batch:     {}", settings.export_batch_size);
      println!("  Member cache age: {}h", settings.member_cache_max_age_hours);
      println!(
        "  Email templates:  {}",
        settings.email.keys().cloned().collect::<Vec<_>>().join(", ")
      );

      print_info("Files:");
      println!("  Settings:   {}", dirs.settings_path().display());
      println!("  Automation: {}", dirs.automation_path().display());
      println!("  Cache:      {}", dirs.cache_dir.display());
      println!("  Logs:       {}", dirs.logs_dir().display());
      Ok(())
    }
  }
}
