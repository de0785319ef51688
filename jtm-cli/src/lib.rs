//! # jtm CLI Library
//!
//! Command definitions and handlers for the `jtm` binary, plus the pieces of
//! command logic (filters, export rows, member sync) that are tested without
//! a terminal.

pub mod cli;
pub mod clients;
pub mod export;
