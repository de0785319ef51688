//! # CSV Caches
//!
//! The organization-member and phone-book caches are plain CSV files that are
//! always written and read whole. Fields are quoted only when they contain a
//! comma, a quote or a line break; embedded quotes are doubled.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, warn};

/// A row type that can be stored in a CSV cache
pub trait CsvRecord: Sized {
  /// Column names written as the first line
  const HEADER: &'static [&'static str];

  fn to_fields(&self) -> Vec<String>;

  /// Build a record from one row; `None` rejects the row
  fn from_fields(fields: &[String]) -> Option<Self>;
}

/// One phone-book contact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhoneBookEntry {
  pub name: String,
  pub email: String,
  pub phone: String,
  pub department: String,
}

impl PhoneBookEntry {
  fn matches(&self, needle: &str) -> bool {
    [&self.name, &self.email, &self.phone, &self.department]
      .iter()
      .any(|field| field.to_lowercase().contains(needle))
  }
}

impl CsvRecord for PhoneBookEntry {
  const HEADER: &'static [&'static str] = &["name", "email", "phone", "department"];

  fn to_fields(&self) -> Vec<String> {
    vec![
      self.name.clone(),
      self.email.clone(),
      self.phone.clone(),
      self.department.clone(),
    ]
  }

  fn from_fields(fields: &[String]) -> Option<Self> {
    let [name, email, phone, department, ..] = fields else {
      return None;
    };
    Some(Self {
      name: name.clone(),
      email: email.clone(),
      phone: phone.clone(),
      department: department.clone(),
    })
  }
}

/// A service-desk customer together with the organization it belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganizationMember {
  pub organization_id: String,
  pub organization_name: String,
  pub account_id: String,
  pub display_name: String,
  pub email: String,
}

impl CsvRecord for OrganizationMember {
  const HEADER: &'static [&'static str] = &[
    "organization_id",
    "organization_name",
    "account_id",
    "display_name",
    "email",
  ];

  fn to_fields(&self) -> Vec<String> {
    vec![
      self.organization_id.clone(),
      self.organization_name.clone(),
      self.account_id.clone(),
      self.display_name.clone(),
      self.email.clone(),
    ]
  }

  fn from_fields(fields: &[String]) -> Option<Self> {
    let [organization_id, organization_name, account_id, display_name, email, ..] = fields else {
      return None;
    };
    Some(Self {
      organization_id: organization_id.clone(),
      organization_name: organization_name.clone(),
      account_id: account_id.clone(),
      display_name: display_name.clone(),
      email: email.clone(),
    })
  }
}

/// Quote a field if it needs it
pub fn escape_field(field: &str) -> String {
  if field.contains([',', '"', '\r', '\n']) {
    format!("\"{}\"", field.replace('"', "\"\""))
  } else {
    field.to_string()
  }
}

/// Render a header and rows as CSV text with CRLF line endings
pub fn to_csv<I>(header: &[&str], rows: I) -> String
where
  I: IntoIterator<Item = Vec<String>>,
{
  let mut out = String::new();
  let header: Vec<String> = header.iter().map(|h| escape_field(h)).collect();
  out.push_str(&header.join(","));
  out.push_str("\r\n");

  for row in rows {
    let row: Vec<String> = row.iter().map(|f| escape_field(f)).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
  }
  out
}

/// Split CSV text into rows of unescaped fields.
///
/// Accepts LF or CRLF line endings; line breaks inside quoted fields are kept.
pub fn parse_csv(content: &str) -> Vec<Vec<String>> {
  let mut rows = Vec::new();
  let mut row = Vec::new();
  let mut field = String::new();
  let mut in_quotes = false;
  let mut chars = content.chars().peekable();

  while let Some(c) = chars.next() {
    if in_quotes {
      match c {
        '"' if chars.peek() == Some(&'"') => {
          field.push('"');
          chars.next();
        }
        '"' => in_quotes = false,
        _ => field.push(c),
      }
      continue;
    }

    match c {
      '"' => in_quotes = true,
      ',' => row.push(std::mem::take(&mut field)),
      '\r' if chars.peek() == Some(&'\n') => {}
      '\n' | '\r' => {
        row.push(std::mem::take(&mut field));
        rows.push(std::mem::take(&mut row));
      }
      _ => field.push(c),
    }
  }

  if !field.is_empty() || !row.is_empty() {
    row.push(field);
    rows.push(row);
  }

  rows
}

/// Replace the file at `path` with `records`.
///
/// The CSV is written next to the target first and renamed into place, so a
/// reader never sees a half-written cache.
pub fn write_records<T: CsvRecord>(path: &Path, records: &[T]) -> Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {}", parent.display()))?;
  }

  let content = to_csv(T::HEADER, records.iter().map(CsvRecord::to_fields));
  let tmp_path = path.with_extension("csv.tmp");
  fs::write(&tmp_path, content).with_context(|| format!("Failed to write {}", tmp_path.display()))?;
  fs::rename(&tmp_path, path).with_context(|| format!("Failed to replace {}", path.display()))?;

  debug!("Wrote {} records to {}", records.len(), path.display());
  Ok(())
}

/// Read every record from a cache file, skipping the header and bad rows
pub fn read_records<T: CsvRecord>(path: &Path) -> Result<Vec<T>> {
  let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  let content = content.trim_start_matches('\u{feff}');

  let mut rows = parse_csv(content).into_iter();
  rows.next();

  let mut records = Vec::new();
  for (index, row) in rows.enumerate() {
    if row.iter().all(|f| f.is_empty()) {
      continue;
    }
    match T::from_fields(&row) {
      Some(record) => records.push(record),
      None => warn!("Skipping malformed row {} in {}", index + 2, path.display()),
    }
  }
  Ok(records)
}

/// Whether the file exists and was modified no longer than `max_age` ago
pub fn is_fresh(path: &Path, max_age: Duration) -> bool {
  fs::metadata(path)
    .and_then(|meta| meta.modified())
    .ok()
    .and_then(|modified| modified.elapsed().ok())
    .is_some_and(|age| age <= max_age)
}

/// Case-insensitive substring search over every phone-book column
pub fn search_phonebook<'a>(entries: &'a [PhoneBookEntry], query: &str) -> Vec<&'a PhoneBookEntry> {
  let needle = query.trim().to_lowercase();
  entries.iter().filter(|entry| entry.matches(&needle)).collect()
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  fn entry(name: &str, email: &str, phone: &str, department: &str) -> PhoneBookEntry {
    PhoneBookEntry {
      name: name.to_string(),
      email: email.to_string(),
      phone: phone.to_string(),
      department: department.to_string(),
    }
  }

  #[test]
  fn test_escape_field() {
    assert_eq!(escape_field("plain"), "plain");
    assert_eq!(escape_field("Rossi, Mario"), "\"Rossi, Mario\"");
    assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
  }

  #[test]
  fn test_parse_csv_handles_quotes_and_line_breaks() {
    let rows = parse_csv("a,\"b, c\",\"d \"\"e\"\"\"\r\n\"multi\nline\",x,\n");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], vec!["a", "b, c", "d \"e\""]);
    assert_eq!(rows[1], vec!["multi\nline", "x", ""]);
  }

  #[test]
  fn test_parse_csv_without_trailing_newline() {
    let rows = parse_csv("h1,h2\nv1,v2");
    assert_eq!(rows, vec![vec!["h1", "h2"], vec!["v1", "v2"]]);
  }

  #[test]
  fn test_cache_survives_awkward_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cache/organization_members_cache.csv");

    let members = vec![
      OrganizationMember {
        organization_id: "7".to_string(),
        organization_name: "ACME, S.p.A.".to_string(),
        account_id: "abc".to_string(),
        display_name: "Mario \"Super\" Rossi".to_string(),
        email: "mario@acme.it".to_string(),
      },
      OrganizationMember {
        organization_id: "8".to_string(),
        organization_name: "Globex\nItalia".to_string(),
        ..Default::default()
      },
    ];

    write_records(&path, &members).unwrap();
    assert!(!path.with_extension("csv.tmp").exists());

    let read: Vec<OrganizationMember> = read_records(&path).unwrap();
    assert_eq!(read, members);
  }

  #[test]
  fn test_read_records_skips_short_rows() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("phonebook_cache.csv");
    fs::write(
      &path,
      "name,email,phone,department\nAnna,anna@acme.it,123,IT\nbroken,row\n\n",
    )
    .unwrap();

    let entries: Vec<PhoneBookEntry> = read_records(&path).unwrap();
    assert_eq!(entries, vec![entry("Anna", "anna@acme.it", "123", "IT")]);
  }

  #[test]
  fn test_is_fresh() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cache.csv");

    assert!(!is_fresh(&path, Duration::from_secs(3600)));

    fs::write(&path, "x").unwrap();
    assert!(is_fresh(&path, Duration::from_secs(3600)));
  }

  #[test]
  fn test_search_phonebook_matches_any_column() {
    let entries = vec![
      entry("Anna Bianchi", "anna@acme.it", "0101", "Amministrazione"),
      entry("Luca Verdi", "luca@acme.it", "0202", "IT"),
    ];

    assert_eq!(search_phonebook(&entries, "BIANCHI").len(), 1);
    assert_eq!(search_phonebook(&entries, "0202")[0].name, "Luca Verdi");
    assert_eq!(search_phonebook(&entries, "acme.it").len(), 2);
    assert!(search_phonebook(&entries, "hr").is_empty());
  }
}
