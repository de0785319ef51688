//! # JQL Builder
//!
//! Fluent construction of Jira Query Language strings from typed filter
//! calls. Values are quoted and escaped; field names and relative date tokens
//! are emitted verbatim. Empty inputs are ignored rather than rejected, so a
//! builder fed from optional UI filters never produces a dangling clause.
//!
//! ```
//! use jtm_jira::jql::JqlBuilder;
//!
//! let jql = JqlBuilder::new().project("CC").status("Completato").build();
//! assert_eq!(jql, r#"project = CC AND statuscategory = "Complete""#);
//! ```

use std::fmt;

use chrono::NaiveDate;

/// Comparison operators supported by [`JqlBuilder::where_`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
  Equals,
  NotEquals,
  Contains,
  NotContains,
  In,
  NotIn,
}

impl Operator {
  fn as_jql(self) -> &'static str {
    match self {
      Operator::Equals => "=",
      Operator::NotEquals => "!=",
      Operator::Contains => "~",
      Operator::NotContains => "!~",
      Operator::In => "in",
      Operator::NotIn => "not in",
    }
  }
}

/// Sort direction of an `ORDER BY` clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
  Asc,
  #[default]
  Desc,
}

impl fmt::Display for SortDirection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SortDirection::Asc => f.write_str("ASC"),
      SortDirection::Desc => f.write_str("DESC"),
    }
  }
}

/// UI status labels that map onto Jira status categories instead of statuses
const STATUS_CATEGORY_LABELS: &[(&str, &str)] = &[
  ("Completato", "Complete"),
  ("In corso", "In Progress"),
  ("Da fare", "To Do"),
];

/// Keywords and fragments that never belong in a JQL search
const JQL_BLACKLIST: &[&str] = &[";", "--", "/*", "drop ", "delete ", "insert ", "update ", "<script"];

const JQL_OPERATORS: &[&str] = &["=", "!=", "~", "!~", ">", "<", " in ", " is ", " was ", " changed"];

/// Builder for JQL query strings
#[derive(Debug, Clone, Default)]
pub struct JqlBuilder {
  project: Option<String>,
  conditions: Vec<String>,
  order_by: Vec<String>,
}

impl JqlBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Restrict the query to a project key
  pub fn project(mut self, key: &str) -> Self {
    let key = key.trim();
    if !key.is_empty() {
      self.project = Some(key.to_string());
    }
    self
  }

  /// Add a `field OP "value"` condition
  pub fn where_(mut self, field: &str, value: &str, operator: Operator) -> Self {
    let (field, value) = (field.trim(), value.trim());
    if field.is_empty() || value.is_empty() {
      return self;
    }

    let quoted = format!("\"{}\"", escape_value(value));
    let condition = match operator {
      Operator::In | Operator::NotIn => format!("{field} {} ({quoted})", operator.as_jql()),
      _ => format!("{field} {} {quoted}", operator.as_jql()),
    };
    self.conditions.push(condition);
    self
  }

  /// Add a `field in ("a", "b")` (or `not in`) condition over several values
  pub fn where_in<S: AsRef<str>>(mut self, field: &str, values: &[S], negate: bool) -> Self {
    let field = field.trim();
    let quoted: Vec<String> = values
      .iter()
      .map(|v| v.as_ref().trim())
      .filter(|v| !v.is_empty())
      .map(|v| format!("\"{}\"", escape_value(v)))
      .collect();
    if field.is_empty() || quoted.is_empty() {
      return self;
    }

    let operator = if negate { Operator::NotIn } else { Operator::In };
    self
      .conditions
      .push(format!("{field} {} ({})", operator.as_jql(), quoted.join(", ")));
    self
  }

  /// Append a pre-built condition verbatim
  pub fn raw(mut self, fragment: &str) -> Self {
    let fragment = fragment.trim();
    if !fragment.is_empty() {
      self.conditions.push(fragment.to_string());
    }
    self
  }

  pub fn organization(self, name: &str) -> Self {
    self.where_("Organizations", name, Operator::Equals)
  }

  /// Filter by status. The Italian category labels used by the UI are
  /// remapped to `statuscategory`; any other value matches the status name.
  pub fn status(self, status: &str) -> Self {
    let status = status.trim();
    match STATUS_CATEGORY_LABELS
      .iter()
      .find(|(label, _)| label.eq_ignore_ascii_case(status))
    {
      Some((_, category)) => self.where_("statuscategory", category, Operator::Equals),
      None => self.where_("status", status, Operator::Equals),
    }
  }

  pub fn priority(self, priority: &str) -> Self {
    self.where_("priority", priority, Operator::Equals)
  }

  pub fn assignee(self, assignee: &str) -> Self {
    self.where_("assignee", assignee, Operator::Equals)
  }

  pub fn reporter(self, reporter: &str) -> Self {
    self.where_("reporter", reporter, Operator::Equals)
  }

  pub fn issue_type(self, issue_type: &str) -> Self {
    self.where_("issuetype", issue_type, Operator::Equals)
  }

  /// Full-text search across summary, description and comments
  pub fn text(self, text: &str) -> Self {
    self.where_("text", text, Operator::Contains)
  }

  pub fn summary_contains(self, text: &str) -> Self {
    self.where_("summary", text, Operator::Contains)
  }

  pub fn unassigned(self) -> Self {
    self.raw("assignee is EMPTY")
  }

  pub fn created_after(self, date: NaiveDate) -> Self {
    self.date_condition("created", ">=", date)
  }

  pub fn created_before(self, date: NaiveDate) -> Self {
    self.date_condition("created", "<=", date)
  }

  pub fn updated_after(self, date: NaiveDate) -> Self {
    self.date_condition("updated", ">=", date)
  }

  pub fn updated_before(self, date: NaiveDate) -> Self {
    self.date_condition("updated", "<=", date)
  }

  /// Created within a Jira relative period such as `-30d` or `-2w`
  pub fn created_within(self, relative: &str) -> Self {
    self.relative_condition("created", relative)
  }

  /// Updated within a Jira relative period such as `-7d`
  pub fn updated_within(self, relative: &str) -> Self {
    self.relative_condition("updated", relative)
  }

  pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
    let field = field.trim();
    if !field.is_empty() {
      self.order_by.push(format!("{field} {direction}"));
    }
    self
  }

  /// Whether no project, condition or ordering has been configured
  pub fn is_empty(&self) -> bool {
    self.project.is_none() && self.conditions.is_empty() && self.order_by.is_empty()
  }

  /// Assemble `project`, conditions and ordering, in that order
  pub fn build(&self) -> String {
    let mut clauses = Vec::with_capacity(self.conditions.len() + 1);
    if let Some(project) = &self.project {
      clauses.push(format!("project = {project}"));
    }
    clauses.extend(self.conditions.iter().cloned());

    let mut jql = clauses.join(" AND ");
    if !self.order_by.is_empty() {
      if !jql.is_empty() {
        jql.push(' ');
      }
      jql.push_str("ORDER BY ");
      jql.push_str(&self.order_by.join(", "));
    }
    jql
  }

  fn date_condition(mut self, field: &str, op: &str, date: NaiveDate) -> Self {
    self
      .conditions
      .push(format!("{field} {op} \"{}\"", date.format("%Y-%m-%d")));
    self
  }

  fn relative_condition(mut self, field: &str, relative: &str) -> Self {
    let relative = relative.trim();
    if !relative.is_empty() {
      self.conditions.push(format!("{field} >= {relative}"));
    }
    self
  }
}

impl fmt::Display for JqlBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.build())
  }
}

/// Escape a value for use inside a double-quoted JQL string
pub fn escape_value(value: &str) -> String {
  let mut escaped = String::with_capacity(value.len());
  for c in value.chars() {
    match c {
      '\\' => escaped.push_str("\\\\"),
      '"' => escaped.push_str("\\\""),
      '\n' => escaped.push_str("\\n"),
      '\r' => escaped.push_str("\\r"),
      '\t' => escaped.push_str("\\t"),
      _ => escaped.push(c),
    }
  }
  escaped
}

/// Cheap plausibility check for user-typed JQL.
///
/// This is a keyword blacklist plus quote and parenthesis balancing, not a
/// parser: Jira remains the authority on whether a query is valid.
pub fn is_valid_jql(jql: &str) -> bool {
  let trimmed = jql.trim();
  if trimmed.is_empty() {
    return false;
  }

  let lowered = trimmed.to_lowercase();
  if JQL_BLACKLIST.iter().any(|bad| lowered.contains(bad)) {
    return false;
  }

  let mut depth = 0i32;
  let mut in_quotes = false;
  let mut escaped = false;
  for c in trimmed.chars() {
    match c {
      _ if escaped => escaped = false,
      '\\' if in_quotes => escaped = true,
      '"' => in_quotes = !in_quotes,
      '(' if !in_quotes => depth += 1,
      ')' if !in_quotes => {
        depth -= 1;
        if depth < 0 {
          return false;
        }
      }
      _ => {}
    }
  }
  if in_quotes || depth != 0 {
    return false;
  }

  lowered.starts_with("order by") || JQL_OPERATORS.iter().any(|op| lowered.contains(op))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_project_and_status_category() {
    let jql = JqlBuilder::new().project("CC").status("Completato").build();
    assert_eq!(jql, r#"project = CC AND statuscategory = "Complete""#);
  }

  #[test]
  fn test_status_labels_map_to_categories() {
    assert_eq!(
      JqlBuilder::new().status("In corso").build(),
      r#"statuscategory = "In Progress""#
    );
    assert_eq!(JqlBuilder::new().status("Da fare").build(), r#"statuscategory = "To Do""#);
    assert_eq!(JqlBuilder::new().status("Nuovo").build(), r#"status = "Nuovo""#);
  }

  #[test]
  fn test_escaping_quotes_and_backslashes() {
    let jql = JqlBuilder::new()
      .where_("summary", r#"say "hi" C:\temp"#, Operator::Contains)
      .build();
    assert_eq!(jql, r#"summary ~ "say \"hi\" C:\\temp""#);
  }

  #[test]
  fn test_escaping_control_characters() {
    assert_eq!(escape_value("a\nb\tc\r"), r"a\nb\tc\r");
  }

  #[test]
  fn test_operators() {
    let jql = JqlBuilder::new()
      .where_("priority", "Low", Operator::NotEquals)
      .where_("summary", "spam", Operator::NotContains)
      .where_("assignee", "mrossi", Operator::In)
      .where_("reporter", "bot", Operator::NotIn)
      .build();
    assert_eq!(
      jql,
      r#"priority != "Low" AND summary !~ "spam" AND assignee in ("mrossi") AND reporter not in ("bot")"#
    );
  }

  #[test]
  fn test_where_in_quotes_each_value() {
    let jql = JqlBuilder::new()
      .where_in("status", &["Nuovo", "Preso In Carico", " "], false)
      .build();
    assert_eq!(jql, r#"status in ("Nuovo", "Preso In Carico")"#);

    let empty: &[&str] = &[];
    assert!(JqlBuilder::new().where_in("status", empty, true).is_empty());
  }

  #[test]
  fn test_empty_inputs_are_ignored() {
    let builder = JqlBuilder::new()
      .project("  ")
      .status("")
      .priority("")
      .organization("")
      .raw("   ")
      .created_within("")
      .order_by("", SortDirection::Asc);
    assert!(builder.is_empty());
    assert_eq!(builder.build(), "");
  }

  #[test]
  fn test_dates_and_relative_periods() {
    let from = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
    let to = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let jql = JqlBuilder::new()
      .created_after(from)
      .created_before(to)
      .updated_within("-30d")
      .build();
    assert_eq!(
      jql,
      r#"created >= "2024-01-05" AND created <= "2024-02-29" AND updated >= -30d"#
    );
  }

  #[test]
  fn test_order_by_only() {
    let jql = JqlBuilder::new()
      .order_by("created", SortDirection::Desc)
      .order_by("priority", SortDirection::Asc)
      .build();
    assert_eq!(jql, "ORDER BY created DESC, priority ASC");
  }

  #[test]
  fn test_full_query_order() {
    let jql = JqlBuilder::new()
      .order_by("updated", SortDirection::Desc)
      .organization("ACME")
      .unassigned()
      .project("CC")
      .build();
    assert_eq!(
      jql,
      r#"project = CC AND Organizations = "ACME" AND assignee is EMPTY ORDER BY updated DESC"#
    );
  }

  #[test]
  fn test_is_valid_jql() {
    assert!(is_valid_jql(r#"project = CC AND status = "Nuovo""#));
    assert!(is_valid_jql("assignee is EMPTY"));
    assert!(is_valid_jql("ORDER BY created DESC"));
    assert!(is_valid_jql(&JqlBuilder::new().text(r#"a "quoted" (paren"#).build()));

    assert!(!is_valid_jql(""));
    assert!(!is_valid_jql("just words"));
    assert!(!is_valid_jql(r#"status = "Nuovo"#));
    assert!(!is_valid_jql("status in (a, b"));
    assert!(!is_valid_jql("status = a; drop table issues"));
    assert!(!is_valid_jql("summary ~ <script>"));
  }
}
