//! # Output Formatting
//!
//! Colored, emoji-prefixed status lines and a few formatters for ticket
//! fields shown in tables.

use owo_colors::OwoColorize;

/// Get an emoji by shortcode, or the given fallback when it is unknown
pub fn get_emoji_or_default(name: &str, default: &str) -> String {
  emojis::get_by_shortcode(name)
    .map(|emoji| emoji.to_string())
    .unwrap_or_else(|| default.to_string())
}

/// Print a success message
pub fn print_success(message: &str) {
  let check = get_emoji_or_default("check_mark", "✓");
  println!("{} {}", check.green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
  let cross = get_emoji_or_default("cross_mark", "✗");
  eprintln!("{} {}", cross.red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
  let warning = get_emoji_or_default("warning", "⚠");
  println!("{} {}", warning.yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
  let info = get_emoji_or_default("information", "ℹ");
  println!("{} {}", info.blue().bold(), message);
}

/// Print a section header
pub fn print_header(header: &str) {
  println!("\n{}", header.blue().bold());
}

/// Color a workflow status by how far along the ticket is
pub fn format_status(status: &str) -> String {
  match status.to_lowercase().as_str() {
    "nuovo" | "to do" | "da fare" => status.bright_blue().to_string(),
    "preso in carico" | "in progress" | "in corso" => status.yellow().to_string(),
    "pianificazione attività" | "attività pianificata" => status.cyan().to_string(),
    "completato" | "done" | "chiuso" | "risolto" => status.green().to_string(),
    _ => status.to_string(),
  }
}

/// Format an issue key
pub fn format_issue_key(key: &str) -> String {
  key.bright_cyan().bold().to_string()
}

/// Format a command or command example
pub fn format_command(cmd: &str) -> String {
  cmd.purple().to_string()
}
