//! # Organizations Command
//!
//! Lists service-desk organizations and keeps the organization-member cache
//! used for email recipients.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use jtm_core::cache::{OrganizationMember, is_fresh, read_records, write_records};
use jtm_core::output::{print_info, print_success, print_warning};
use jtm_jira::JiraClient;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::info;

use crate::clients::{Session, create_jira_runtime_and_client};

/// Command for service-desk organizations
#[derive(Args)]
pub struct OrgsArgs {
  #[command(subcommand)]
  pub subcommand: OrgsSubcommands,
}

#[derive(Subcommand)]
pub enum OrgsSubcommands {
  /// List organizations from Jira
  List,

  /// Refresh the organization-member cache
  Sync,

  /// Show cached organization members
  Members {
    /// Only organizations whose name contains this text
    #[arg(long)]
    org: Option<String>,

    /// Refresh the cache first even if it is fresh
    #[arg(long)]
    refresh: bool,
  },
}

#[derive(Tabled)]
struct OrganizationRow {
  #[tabled(rename = "ID")]
  id: String,
  #[tabled(rename = "Organization")]
  name: String,
}

#[derive(Tabled)]
struct MemberRow {
  #[tabled(rename = "Organization")]
  organization: String,
  #[tabled(rename = "Name")]
  name: String,
  #[tabled(rename = "Email")]
  email: String,
}

/// Download every organization's members and replace the cache at `path`.
///
/// Returns the number of members written.
pub async fn sync_organization_members(client: &JiraClient, path: &Path) -> Result<usize> {
  let organizations = client.get_organizations().await.context("Failed to list organizations")?;

  let mut members = Vec::new();
  for organization in &organizations {
    let users = client
      .get_organization_members(&organization.id)
      .await
      .with_context(|| format!("Failed to list members of '{}'", organization.name))?;

    members.extend(users.into_iter().map(|user| OrganizationMember {
      organization_id: organization.id.clone(),
      organization_name: organization.name.clone(),
      account_id: user.account_id,
      display_name: user.display_name,
      email: user.email_address.unwrap_or_default(),
    }));
  }

  write_records(path, &members)?;
  info!(
    "Cached {} members of {} organizations in {}",
    members.len(),
    organizations.len(),
    path.display()
  );
  Ok(members.len())
}

/// Load the member cache, refreshing it from Jira when stale or forced
pub(crate) fn load_members(session: &Session, refresh: bool) -> Result<Vec<OrganizationMember>> {
  let path = session.dirs.members_cache_path();
  if refresh || !is_fresh(&path, session.settings.member_cache_max_age()) {
    let (rt, client) = create_jira_runtime_and_client(&session.settings)?;
    print_info("Refreshing organization members from Jira...");
    rt.block_on(sync_organization_members(&client, &path))?;
  }
  read_records(&path)
}

pub(crate) fn handle_orgs_command(args: OrgsArgs) -> Result<()> {
  let session = Session::load()?;

  match args.subcommand {
    OrgsSubcommands::List => {
      let (rt, client) = create_jira_runtime_and_client(&session.settings)?;
      let organizations = rt.block_on(client.get_organizations())?;
      if organizations.is_empty() {
        print_warning("No organizations found.");
        return Ok(());
      }
      let rows: Vec<OrganizationRow> = organizations
        .into_iter()
        .map(|o| OrganizationRow { id: o.id, name: o.name })
        .collect();
      println!("{}", Table::new(rows).with(Style::sharp()));
      Ok(())
    }
    OrgsSubcommands::Sync => {
      let (rt, client) = create_jira_runtime_and_client(&session.settings)?;
      let path = session.dirs.members_cache_path();
      let count = rt.block_on(sync_organization_members(&client, &path))?;
      print_success(&format!("Cached {count} organization members"));
      Ok(())
    }
    OrgsSubcommands::Members { org, refresh } => {
      let members = load_members(&session, refresh)?;
      let needle = org.as_deref().map(str::to_lowercase);
      let rows: Vec<MemberRow> = members
        .into_iter()
        .filter(|m| {
          needle
            .as_deref()
            .is_none_or(|n| m.organization_name.to_lowercase().contains(n))
        })
        .map(|m| MemberRow {
          organization: m.organization_name,
          name: m.display_name,
          email: m.email,
        })
        .collect();

      if rows.is_empty() {
        print_warning("No cached members match.");
      } else {
        println!("{}", Table::new(rows).with(Style::sharp()));
      }
      Ok(())
    }
  }
}

#[cfg(test)]
mod tests {
  use jtm_jira::create_jira_client;
  use serde_json::json;
  use tempfile::TempDir;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  use super::*;

  #[tokio::test]
  async fn test_sync_writes_every_member() -> Result<()> {
    let mock_server = MockServer::start().await;
    let client = create_jira_client(&mock_server.uri(), "op@acme.it", "token");

    Mock::given(method("GET"))
      .and(path("/rest/servicedeskapi/organization"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
          "values": [{ "id": "1", "name": "ACME, S.p.A." }, { "id": "2", "name": "Globex" }],
          "isLastPage": true
      })))
      .mount(&mock_server)
      .await;

    Mock::given(method("GET"))
      .and(path("/rest/servicedeskapi/organization/1/user"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
          "values": [
              { "accountId": "a1", "displayName": "Anna", "emailAddress": "anna@acme.it" },
              { "accountId": "a2", "displayName": "Bruno" }
          ],
          "isLastPage": true
      })))
      .mount(&mock_server)
      .await;

    Mock::given(method("GET"))
      .and(path("/rest/servicedeskapi/organization/2/user"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "values": [], "isLastPage": true })))
      .mount(&mock_server)
      .await;

    let temp_dir = TempDir::new()?;
    let cache = temp_dir.path().join("organization_members_cache.csv");

    let count = sync_organization_members(&client, &cache).await?;
    assert_eq!(count, 2);

    let members: Vec<OrganizationMember> = read_records(&cache)?;
    assert_eq!(members[0].organization_name, "ACME, S.p.A.");
    assert_eq!(members[0].email, "anna@acme.it");
    assert_eq!(members[1].email, "");

    Ok(())
  }

  #[tokio::test]
  async fn test_sync_failure_keeps_old_cache() -> Result<()> {
    let mock_server = MockServer::start().await;
    let client = create_jira_client(&mock_server.uri(), "op@acme.it", "token");

    Mock::given(method("GET"))
      .and(path("/rest/servicedeskapi/organization"))
      .respond_with(ResponseTemplate::new(401))
      .mount(&mock_server)
      .await;

    let temp_dir = TempDir::new()?;
    let cache = temp_dir.path().join("organization_members_cache.csv");
    std::fs::write(&cache, "old")?;

    assert!(sync_organization_members(&client, &cache).await.is_err());
    assert_eq!(std::fs::read_to_string(&cache)?, "old");

    Ok(())
  }
}
