//! # Credentials Command
//!
//! Stores Jira credentials in `.netrc` and checks that they work.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use dialoguer::{Input, Password};
use jtm_core::config::AuthMode;
use jtm_core::creds::{SERVICE_ACCOUNT_MACHINE, get_netrc_path, normalize_host, write_netrc_entry};
use jtm_core::output::{format_command, print_error, print_info, print_success, print_warning};
use jtm_core::url::resolve_jira_base_url;
use jtm_jira::{create_jira_client, get_jira_credentials};
use tokio::runtime::Runtime;

use crate::clients::{Session, home_dir};

/// Command for credential management
#[derive(Args)]
pub struct CredsArgs {
  #[command(subcommand)]
  pub subcommand: CredsSubcommands,
}

#[derive(Subcommand)]
pub enum CredsSubcommands {
  /// Check that credentials exist, are private and are accepted by Jira
  Check,

  /// Store credentials in .netrc
  #[command(long_about = "Store a login and API token in your .netrc file.\n\n\
            The entry is keyed by the Jira host, or by 'jtm-service-account' with\n\
            --service-account. Missing values are prompted for; the token is never echoed.")]
  Set {
    /// Store the shared service-account entry instead of your own
    #[arg(long)]
    service_account: bool,

    /// Login (email address); prompted for when omitted
    #[arg(long)]
    username: Option<String>,

    /// Skip the connection test after saving
    #[arg(long)]
    no_verify: bool,
  },
}

pub(crate) fn handle_creds_command(args: CredsArgs) -> Result<()> {
  match args.subcommand {
    CredsSubcommands::Check => handle_check_command(),
    CredsSubcommands::Set {
      service_account,
      username,
      no_verify,
    } => handle_set_command(service_account, username, no_verify),
  }
}

fn verify(base_url: &str, username: &str, token: &str) -> Result<bool> {
  let rt = Runtime::new().context("Failed to create async runtime")?;
  let client = create_jira_client(base_url, username, token);
  Ok(rt.block_on(client.test_connection())?)
}

fn handle_set_command(service_account: bool, username: Option<String>, no_verify: bool) -> Result<()> {
  let session = Session::load()?;
  let base_url = resolve_jira_base_url(&session.settings.jira_host)
    .context("Jira host is not configured. Run 'jtm config init --host <HOST>' first.")?;

  let machine = if service_account {
    SERVICE_ACCOUNT_MACHINE.to_string()
  } else {
    normalize_host(&base_url)
  };

  let username = match username {
    Some(username) => username,
    None => Input::new()
      .with_prompt(format!("Login for {machine}"))
      .interact_text()
      .context("Failed to read login")?,
  };
  let token = Password::new()
    .with_prompt("API token")
    .interact()
    .context("Failed to read API token")?;

  let netrc_path = get_netrc_path(&home_dir()?);
  write_netrc_entry(&netrc_path, &machine, &username, &token)?;
  print_success(&format!("Saved credentials for '{machine}' in {}", netrc_path.display()));

  if service_account && session.settings.auth_mode != AuthMode::ServiceAccount {
    print_info(&format!(
      "Switch to the service account with {}",
      format_command("jtm config init --auth-mode service-account")
    ));
  }

  if !no_verify {
    match verify(&base_url, &username, &token) {
      Ok(true) => print_success("Jira accepted the credentials."),
      Ok(false) => print_warning("Jira rejected the credentials. Check the login and token."),
      Err(e) => print_warning(&format!("Could not reach Jira: {e}")),
    }
  }
  Ok(())
}

fn handle_check_command() -> Result<()> {
  let session = Session::load()?;
  let home = home_dir()?;
  let netrc_path = get_netrc_path(&home);

  if !netrc_path.exists() {
    print_error("No .netrc file found.");
    println!("Run {} to create one.", format_command("jtm creds set"));
    return Ok(());
  }

  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(&netrc_path)?.permissions().mode();
    if mode & 0o077 != 0 {
      print_warning("Your .netrc file has insecure permissions.");
      println!(
        "For security, change permissions to 600: {}",
        format_command(&format!("chmod 600 {}", netrc_path.display()))
      );
    } else {
      print_success(".netrc file has secure permissions.");
    }
  }

  let base_url = resolve_jira_base_url(&session.settings.jira_host)
    .context("Jira host is not configured. Run 'jtm config init --host <HOST>' first.")?;

  let credentials = match get_jira_credentials(&home, &base_url, session.settings.auth_mode) {
    Ok(credentials) => credentials,
    Err(e) => {
      print_error(&e.to_string());
      return Ok(());
    }
  };
  print_success(&format!(
    "Found {} credentials for {}",
    session.settings.auth_mode, credentials.username
  ));

  match verify(&base_url, &credentials.username, &credentials.password) {
    Ok(true) => print_success(&format!("Connected to {base_url}")),
    Ok(false) => print_error("Jira rejected the stored credentials."),
    Err(e) => print_error(&format!("Could not reach Jira: {e}")),
  }
  Ok(())
}
