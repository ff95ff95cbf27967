mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod ledger;
mod models;
mod normalizer;
mod reports;
mod settings;
mod statement;
mod store;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use ledger::ExpenseDraft;

/// Logs go to stderr so command output stays pipeable. `SPLITBOOK_LOG` takes
/// the usual filter syntax (`info`, `splitbook=debug`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("SPLITBOOK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Add {
            amount,
            person,
            category,
            description,
            date,
        } => cli::expenses::add(ExpenseDraft {
            person,
            amount: Some(amount),
            category,
            description,
            date,
        }),
        Commands::List {
            person,
            category,
            sort,
            desc,
        } => cli::list::run(person, category, sort, desc),
        Commands::Edit {
            id,
            person,
            amount,
            category,
            description,
            date,
        } => cli::expenses::edit(
            id,
            ExpenseDraft {
                person,
                amount,
                category,
                description,
                date,
            },
        ),
        Commands::Delete { id } => cli::expenses::delete(id),
        Commands::DeleteAll { yes } => cli::expenses::delete_all(yes),
        Commands::Summary => cli::report::summary(),
        Commands::Trend => cli::report::trend(),
        Commands::Import { file, person, yes } => cli::import::run(&file, person, yes),
        Commands::Status => cli::status::run(),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "splitbook", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
