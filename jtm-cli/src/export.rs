//! # CSV Export
//!
//! Turns raw search results into CSV rows, one ticket per line.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use jtm_core::cache::to_csv;
use jtm_jira::TicketSummary;
use serde_json::Value;

pub const EXPORT_HEADER: &[&str] = &[
  "Key",
  "Summary",
  "Status",
  "Priority",
  "Assignee",
  "Reporter",
  "Organizations",
  "Created",
  "Updated",
  "Description",
];

/// Project an issue onto the export columns
pub fn export_row(summary: &TicketSummary) -> Vec<String> {
  vec![
    summary.key.clone(),
    summary.summary.clone(),
    summary.status.clone(),
    summary.priority.clone(),
    summary.assignee.clone(),
    summary.reporter.clone(),
    summary.organization_list(),
    summary.created.clone(),
    summary.updated.clone(),
    summary.description.clone(),
  ]
}

/// Write `issues` to `path` as CSV, returning the number of rows written
pub fn write_export(path: &Path, issues: &[Value]) -> Result<usize> {
  let rows = issues.iter().map(TicketSummary::from_issue).map(|s| export_row(&s));
  let content = to_csv(EXPORT_HEADER, rows);

  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {}", parent.display()))?;
  }
  // BOM so spreadsheet applications pick UTF-8
  fs::write(path, format!("\u{feff}{content}")).with_context(|| format!("Failed to write {}", path.display()))?;

  Ok(issues.len())
}
