//! Test utilities shared across the jtm workspace
//!
//! This crate provides common testing infrastructure including:
//! - Temporary home directories with `.netrc` files ([`TempHome`])
//! - Jira JSON payload builders and responders for wiremock ([`jira`])
//!
//! The dead_code lint is disabled for this crate because test utilities may
//! not be used by all tests, and the compiler cannot detect usage across crate
//! boundaries in development dependencies.

#![allow(dead_code)]

pub mod home;
pub mod jira;

// Re-export commonly used items
pub use home::TempHome;
