//! # Logging
//!
//! Tracing setup shared by the binary: a stderr layer filtered by `-v`
//! repetitions plus an optional daily-rolling file in the logs directory.
//! Also keeps the plain-text access log of commands run.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

static ACCESS_LOG_LOCK: Mutex<()> = Mutex::new(());

/// Map `-v` repetitions to a tracing level
pub fn level_for(verbosity: u8) -> Level {
  match verbosity {
    0 => Level::WARN,  // Default: warnings and errors
    1 => Level::INFO,  // -v: info, warnings, and errors
    2 => Level::DEBUG, // -vv: debug, info, warnings, and errors
    _ => Level::TRACE, // -vvv or more: trace and everything else
  }
}

/// Install the global subscriber.
///
/// When `logs_dir` is given, events are also written to `jtm.log.YYYY-MM-DD`
/// there. The returned guard flushes the file writer and must be held until
/// the process exits.
pub fn init_tracing(verbosity: u8, logs_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
  let level = level_for(verbosity);

  let (file_layer, guard) = match logs_dir {
    Some(dir) => {
      std::fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;
      let appender = tracing_appender::rolling::daily(dir, "jtm.log");
      let (writer, guard) = tracing_appender::non_blocking(appender);
      let layer = fmt::layer().with_writer(writer).with_ansi(false).with_target(true);
      (Some(layer), Some(guard))
    }
    None => (None, None),
  };

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(file_layer)
    .with(EnvFilter::from_default_env().add_directive(level.into()))
    .try_init()
    .context("Failed to initialize tracing")?;

  tracing::debug!("Tracing initialized with level: {}", level);
  Ok(guard)
}

/// Name of the operator running the process
pub fn current_user() -> String {
  std::env::var("USER")
    .or_else(|_| std::env::var("USERNAME"))
    .unwrap_or_else(|_| "unknown".to_string())
}

/// Append `timestamp\tuser\tcommand` to the access log
pub fn record_access(path: &Path, user: &str, command: &str) -> Result<()> {
  let _guard = ACCESS_LOG_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {}", parent.display()))?;
  }

  let mut file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .with_context(|| format!("Failed to open access log {}", path.display()))?;

  let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
  writeln!(file, "{timestamp}\t{user}\t{command}").context("Failed to write access log entry")
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  #[test]
  fn test_level_for_verbosity() {
    assert_eq!(level_for(0), Level::WARN);
    assert_eq!(level_for(1), Level::INFO);
    assert_eq!(level_for(2), Level::DEBUG);
    assert_eq!(level_for(7), Level::TRACE);
  }

  #[test]
  fn test_record_access_appends_lines() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data/access_log.txt");

    record_access(&path, "mrossi", "search --status Nuovo").unwrap();
    record_access(&path, "mrossi", "plan CC-1").unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);

    let fields: Vec<&str> = lines[1].split('\t').collect();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[1], "mrossi");
    assert_eq!(fields[2], "plan CC-1");
  }
}
