//! # Phone Book Command
//!
//! Imports a contacts CSV into the phone-book cache and searches it.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use jtm_core::cache::{PhoneBookEntry, read_records, search_phonebook, write_records};
use jtm_core::output::{print_success, print_warning};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::clients::Session;

/// Command for the phone-book cache
#[derive(Args)]
pub struct PhonebookArgs {
  #[command(subcommand)]
  pub subcommand: PhonebookSubcommands,
}

#[derive(Subcommand)]
pub enum PhonebookSubcommands {
  /// Replace the cache with a CSV of name,email,phone,department
  Import {
    /// Source CSV file (first line is the header)
    file: PathBuf,
  },

  /// Find contacts by name, email, phone or department
  Search {
    /// Text to look for (case-insensitive)
    query: String,
  },
}

#[derive(Tabled)]
struct ContactRow {
  #[tabled(rename = "Name")]
  name: String,
  #[tabled(rename = "Email")]
  email: String,
  #[tabled(rename = "Phone")]
  phone: String,
  #[tabled(rename = "Department")]
  department: String,
}

impl From<&PhoneBookEntry> for ContactRow {
  fn from(entry: &PhoneBookEntry) -> Self {
    Self {
      name: entry.name.clone(),
      email: entry.email.clone(),
      phone: entry.phone.clone(),
      department: entry.department.clone(),
    }
  }
}

pub(crate) fn handle_phonebook_command(args: PhonebookArgs) -> Result<()> {
  let session = Session::load()?;
  let cache_path = session.dirs.phonebook_cache_path();

  match args.subcommand {
    PhonebookSubcommands::Import { file } => {
      let entries: Vec<PhoneBookEntry> =
        read_records(&file).with_context(|| format!("Failed to import {}", file.display()))?;
      if entries.is_empty() {
        bail!("{} contains no contacts", file.display());
      }
      write_records(&cache_path, &entries)?;
      print_success(&format!("Imported {} contacts", entries.len()));
      Ok(())
    }
    PhonebookSubcommands::Search { query } => {
      if !cache_path.exists() {
        bail!("The phone book is empty. Run 'jtm phonebook import <file>' first.");
      }
      let entries: Vec<PhoneBookEntry> = read_records(&cache_path)?;
      let matches = search_phonebook(&entries, &query);
      if matches.is_empty() {
        print_warning(&format!("No contacts match '{query}'"));
        return Ok(());
      }
      let rows: Vec<ContactRow> = matches.into_iter().map(ContactRow::from).collect();
      println!("{}", Table::new(rows).with(Style::sharp()));
      Ok(())
    }
  }
}
