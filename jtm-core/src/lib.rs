//! # jtm Core Library
//!
//! Shared building blocks for the ticket manager: configuration directories
//! and settings, `.netrc` credentials, logging setup, the CSV caches, email
//! templates and terminal output helpers.

pub mod cache;
pub mod config;
pub mod creds;
pub mod email;
pub mod logging;
pub mod output;
pub mod url;

pub use config::{AuthMode, ConfigDirs, Settings, get_config_dirs};
pub use creds::Credentials;
pub use output::{print_error, print_info, print_success, print_warning};
