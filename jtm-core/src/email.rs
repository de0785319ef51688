//! # Email Templates
//!
//! Named subject/body templates with `{placeholder}` substitution, and the
//! `mailto:` URL handed to the system mail client.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Name of the template used when none is given
pub const DEFAULT_TEMPLATE: &str = "status-update";

/// A subject and body with `{key}`-style placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
  pub subject: String,
  pub body: String,
}

/// The templates written into fresh settings
pub fn default_templates() -> BTreeMap<String, EmailTemplate> {
  let mut templates = BTreeMap::new();
  templates.insert(
    DEFAULT_TEMPLATE.to_string(),
    EmailTemplate {
      subject: "[{key}] {summary}".to_string(),
      body: "Gentile cliente {organization},\n\nil ticket {key} \"{summary}\" è ora nello stato \"{status}\".\nReferente: {assignee}\n\nDettagli: {url}\n"
        .to_string(),
    },
  );
  templates.insert(
    "planned".to_string(),
    EmailTemplate {
      subject: "[{key}] Attività pianificata".to_string(),
      body: "Gentile cliente {organization},\n\nl'attività relativa al ticket {key} \"{summary}\" è stata pianificata.\nVi contatteremo per confermare la data.\n\n{url}\n"
        .to_string(),
    },
  );
  templates
}

/// Values substituted into a template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
  pub key: String,
  pub summary: String,
  pub status: String,
  pub assignee: String,
  pub organization: String,
  pub url: String,
}

impl TemplateContext {
  fn pairs(&self) -> [(&'static str, &str); 6] {
    [
      ("{key}", self.key.as_str()),
      ("{summary}", self.summary.as_str()),
      ("{status}", self.status.as_str()),
      ("{assignee}", self.assignee.as_str()),
      ("{organization}", self.organization.as_str()),
      ("{url}", self.url.as_str()),
    ]
  }

  /// Substitute every known placeholder; unknown ones are left untouched
  pub fn fill(&self, text: &str) -> String {
    self
      .pairs()
      .iter()
      .fold(text.to_string(), |acc, &(placeholder, value)| acc.replace(placeholder, value))
  }
}

/// A template with its placeholders filled in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
  pub subject: String,
  pub body: String,
}

impl EmailTemplate {
  pub fn render(&self, context: &TemplateContext) -> RenderedEmail {
    RenderedEmail {
      subject: context.fill(&self.subject),
      body: context.fill(&self.body),
    }
  }
}

fn encode(value: &str) -> String {
  // form encoding turns spaces into '+', which mail clients show literally
  form_urlencoded::byte_serialize(value.as_bytes())
    .collect::<String>()
    .replace('+', "%20")
}

/// Build a `mailto:` URL with percent-encoded subject and body
pub fn mailto_url(to: &[String], cc: &[String], subject: &str, body: &str) -> String {
  let mut url = format!("mailto:{}", to.join(","));

  let mut params = Vec::new();
  if !cc.is_empty() {
    params.push(format!("cc={}", cc.join(",")));
  }
  params.push(format!("subject={}", encode(subject)));
  params.push(format!("body={}", encode(&body.replace('\n', "\r\n"))));

  url.push('?');
  url.push_str(&params.join("&"));
  url
}

/// Hand a `mailto:` URL to the system mail client
pub fn open_mailto(url: &str) -> Result<()> {
  open::that(url).context("Failed to open the default mail client")
}
