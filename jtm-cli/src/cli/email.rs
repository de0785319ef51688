//! # Email Command
//!
//! Renders an email template for a ticket and hands the `mailto:` URL to the
//! system mail client.

use anyhow::{Result, bail};
use clap::Args;
use jtm_core::cache::OrganizationMember;
use jtm_core::email::{DEFAULT_TEMPLATE, TemplateContext, mailto_url, open_mailto};
use jtm_core::output::{print_info, print_success, print_warning};
use jtm_jira::TicketSummary;

use crate::cli::orgs::load_members;
use crate::clients::{Session, create_jira_runtime_and_client};

/// Arguments for `jtm email`
#[derive(Args)]
pub struct EmailArgs {
  /// Ticket key (e.g. CC-123)
  pub issue_key: String,

  /// Template name from settings
  #[arg(long, short = 't', default_value = DEFAULT_TEMPLATE)]
  pub template: String,

  /// Recipient; repeat for several. Defaults to the ticket's organization members
  #[arg(long)]
  pub to: Vec<String>,

  /// Carbon-copy recipient; repeat for several
  #[arg(long)]
  pub cc: Vec<String>,

  /// Print the email instead of opening the mail client
  #[arg(long)]
  pub print: bool,
}

/// Values a template can reference for one ticket
pub fn template_context(ticket: &TicketSummary, browse_url: String) -> TemplateContext {
  TemplateContext {
    key: ticket.key.clone(),
    summary: ticket.summary.clone(),
    status: ticket.status.clone(),
    assignee: ticket.assignee.clone(),
    organization: ticket.organization_list(),
    url: browse_url,
  }
}

/// Email addresses of cached members belonging to any of `organizations`
pub fn recipients_for(members: &[OrganizationMember], organizations: &[String]) -> Vec<String> {
  let mut recipients: Vec<String> = members
    .iter()
    .filter(|m| !m.email.is_empty())
    .filter(|m| organizations.iter().any(|o| o.eq_ignore_ascii_case(&m.organization_name)))
    .map(|m| m.email.clone())
    .collect();
  recipients.sort();
  recipients.dedup();
  recipients
}

pub(crate) fn handle_email_command(args: EmailArgs) -> Result<()> {
  let session = Session::load()?;
  let Some(template) = session.settings.email.get(&args.template) else {
    let known: Vec<&str> = session.settings.email.keys().map(String::as_str).collect();
    bail!("Unknown template '{}'. Available: {}", args.template, known.join(", "));
  };

  let (rt, client) = create_jira_runtime_and_client(&session.settings)?;
  let issue = rt.block_on(client.get_issue_raw(&args.issue_key))?;
  let ticket = TicketSummary::from_issue(&issue);
  let email = template.render(&template_context(&ticket, client.browse_url(&ticket.key)));

  let to = if args.to.is_empty() && !ticket.organizations.is_empty() {
    let members = load_members(&session, false)?;
    recipients_for(&members, &ticket.organizations)
  } else {
    args.to
  };
  if to.is_empty() {
    print_warning("No recipients found; the mail client will ask for them.");
  }

  if args.print {
    println!("To: {}", to.join(", "));
    if !args.cc.is_empty() {
      println!("Cc: {}", args.cc.join(", "));
    }
    println!("Subject: {}\n\n{}", email.subject, email.body);
    return Ok(());
  }

  let url = mailto_url(&to, &args.cc, &email.subject, &email.body);
  print_info(&format!("Opening mail client for {}", ticket.key));
  open_mailto(&url)?;
  print_success("Draft created");
  Ok(())
}

#[cfg(test)]
mod tests {
  use jtm_core::email::default_templates;
  use serde_json::json;

  use super::*;

  fn member(org: &str, email: &str) -> OrganizationMember {
    OrganizationMember {
      organization_name: org.to_string(),
      email: email.to_string(),
      ..Default::default()
    }
  }

  #[test]
  fn test_template_context_from_ticket() {
    let ticket = TicketSummary::from_issue(&json!({
        "key": "CC-9",
        "fields": {
            "summary": "Badge non funziona",
            "status": { "name": "Nuovo" },
            "assignee": { "displayName": "Luca" },
            "customfield_10002": [{ "id": "1", "name": "ACME" }]
        }
    }));

    let context = template_context(&ticket, "https://acme.atlassian.net/browse/CC-9".to_string());
    let email = default_templates()[DEFAULT_TEMPLATE].render(&context);

    assert_eq!(email.subject, "[CC-9] Badge non funziona");
    assert!(email.body.contains("Luca"));
    assert!(email.body.contains("ACME"));
  }

  #[test]
  fn test_recipients_for_organizations() {
    let members = vec![
      member("ACME", "b@acme.it"),
      member("acme", "a@acme.it"),
      member("ACME", "a@acme.it"),
      member("ACME", ""),
      member("Globex", "g@globex.it"),
    ];

    assert_eq!(
      recipients_for(&members, &["ACME".to_string()]),
      vec!["a@acme.it".to_string(), "b@acme.it".to_string()]
    );
    assert!(recipients_for(&members, &[]).is_empty());
  }
}
