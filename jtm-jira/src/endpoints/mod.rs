//! # Jira API Endpoints
//!
//! Organized endpoint implementations for different Jira API resource types:
//! issue search, issues, workflow transitions and service-desk organizations.

pub mod issues;
pub mod organizations;
pub mod search;
pub mod transitions;
