pub mod expenses;
pub mod import;
pub mod init;
pub mod list;
pub mod report;
pub mod status;

use std::io::{BufRead, Write};

use clap::{Parser, Subcommand};

use crate::db;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::settings::{load_settings, Settings};
use crate::store::SqliteStore;

/// Load and validate settings, then open the ledger on the configured database.
pub(crate) fn open_ledger() -> Result<(Settings, Ledger<SqliteStore>)> {
    let settings = load_settings();
    settings.validate()?;
    let conn = db::open(&settings.db_path())?;
    let ledger = Ledger::load(SqliteStore::new(conn))?;
    Ok((settings, ledger))
}

/// Ask a yes/no question on `input`; anything but y/yes is no.
pub(crate) fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> Result<bool> {
    write!(out, "{question} [y/N] ")?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

#[derive(Parser)]
#[command(name = "splitbook", about = "Track shared expenses and settle up.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up splitbook: choose a data directory and initialize the database.
    Init {
        /// Path for splitbook data (default: ~/Documents/splitbook)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Record an expense.
    Add {
        /// Amount; a decimal comma is accepted (17,90)
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        /// Person who paid (default: first configured person)
        #[arg(long)]
        person: Option<String>,
        /// Category (default: first configured category)
        #[arg(long)]
        category: Option<String>,
        /// Free-text description
        #[arg(long)]
        description: Option<String>,
        /// Date as YYYY-MM-DD or MM/DD/YYYY (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// List expenses with optional filters and sorting.
    List {
        /// Only this person
        #[arg(long)]
        person: Option<String>,
        /// Only this category
        #[arg(long)]
        category: Option<String>,
        /// Sort key: date, person, amount, category, description
        #[arg(long)]
        sort: Option<crate::reports::SortKey>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
    },
    /// Replace fields of an existing expense.
    Edit {
        /// Expense ID (shown in `splitbook list`)
        id: i64,
        #[arg(long)]
        person: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete an expense by ID.
    Delete {
        /// Expense ID (shown in `splitbook list`)
        id: i64,
    },
    /// Delete every expense.
    DeleteAll {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Shared-cost breakdown, settlement and totals.
    Summary,
    /// Spending per day.
    Trend,
    /// Import a bank statement CSV and review each entry before adding it.
    Import {
        /// Path to the CSV file
        file: String,
        /// Start the review filtered to this person
        #[arg(long)]
        person: Option<String>,
        /// Add the entries without the interactive review
        #[arg(long)]
        yes: bool,
    },
    /// Show settings, database location and record count.
    Status,
    /// Print a shell completion script.
    Completions {
        shell: clap_complete::Shell,
    },
}
