use std::fs::File;
use std::io::{BufRead, Write};

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::{Error, Result};
use crate::fmt::money;
use crate::importer::{ImportWizard, WizardState};
use crate::models::Selection;
use crate::settings::{CommitScope, Settings};

use super::open_ledger;

pub fn run(file: &str, person: Option<String>, yes: bool) -> Result<()> {
    let (settings, mut ledger) = open_ledger()?;
    let mut wizard = ImportWizard::new(&settings)?;

    let reader = File::open(file)?;
    let outcome = wizard.upload(reader, chrono::Local::now().date_naive())?;
    if outcome.accepted == 0 {
        println!("{}", outcome.message().yellow());
        return Ok(());
    }
    println!("{}", outcome.message());
    if outcome.rejected > 0 {
        println!("{} of {} rows skipped", outcome.rejected, outcome.rows());
    }
    if person.is_some() {
        wizard.set_person_filter(Selection::from_opt(person.as_deref()))?;
    }

    if !yes {
        let stdin = std::io::stdin();
        let proceed = review(&mut wizard, &settings, &mut stdin.lock(), &mut std::io::stdout())?;
        if !proceed {
            println!("{}", "Import cancelled, nothing added.".yellow());
            return Ok(());
        }
    }

    let commit = wizard.finish(ledger.store_mut())?;
    ledger.reload()?;
    tracing::debug!(committed = commit.committed(), total = ledger.records().len(), "ledger reloaded");
    match wizard.state() {
        WizardState::Failed {
            committed,
            not_attempted,
            reason,
        } => {
            tracing::warn!(committed, not_attempted, %reason, "import stopped early");
            Err(Error::Other(commit.message()))
        }
        WizardState::Done { committed } => {
            tracing::info!(committed, file, "import finished");
            println!("{}", commit.message().green());
            Ok(())
        }
        other => Err(Error::Workflow(format!("import ended while {:?}", other.stage()))),
    }
}

fn print_candidates<W: Write>(wizard: &ImportWizard, currency: &str, out: &mut W) -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["#", "Date", "Person", "Amount", "Description", "Category"]);
    for c in wizard.visible() {
        table.add_row(vec![
            Cell::new(c.seq + 1),
            Cell::new(&c.expense.date),
            Cell::new(&c.expense.person),
            Cell::new(money(c.expense.amount, currency)),
            Cell::new(&c.expense.description),
            Cell::new(&c.expense.category),
        ]);
    }
    let shown = wizard.visible().len();
    let total = wizard.candidates().len();
    writeln!(out, "{table}")?;
    if let Some(Selection::Only(person)) = wizard.person_filter() {
        writeln!(out, "Filtered to {person}")?;
    }
    writeln!(out, "Showing {shown} of {total} entries, {} will be added", wizard.pending().len())?;
    Ok(())
}

fn print_raw<W: Write>(wizard: &ImportWizard, entry: usize, out: &mut W) -> Result<()> {
    let Some(candidate) = wizard.candidates().iter().find(|c| c.seq + 1 == entry) else {
        writeln!(out, "{}", format!("No entry #{entry}").red())?;
        return Ok(());
    };
    writeln!(out, "Entry #{entry} as read from the statement:")?;
    for (name, value) in candidate.raw.fields() {
        writeln!(out, "  {name}: {value}")?;
    }
    Ok(())
}

fn print_menu<W: Write>(wizard: &ImportWizard, settings: &Settings, out: &mut W) -> Result<()> {
    writeln!(out, "Categories:")?;
    for (i, cat) in settings.categories.iter().enumerate() {
        writeln!(out, "  {}. {cat}", i + 1)?;
    }
    let people: Vec<String> = wizard
        .person_counts()
        .iter()
        .enumerate()
        .map(|(i, (name, n))| format!("{}. {name} ({n})", i + 1))
        .collect();
    writeln!(out, "People: all ({}), {}", wizard.candidates().len(), people.join(", "))?;
    if wizard.scope() == CommitScope::Filtered {
        writeln!(out, "Only entries shown under the person filter are added.")?;
    }
    writeln!(
        out,
        "Commands: <entry#> <category#>, p <person#|name|all>, r <entry#>, f=finish, b=back, q=quit"
    )?;
    Ok(())
}

/// Interactive review of uploaded candidates. Returns `true` when the user
/// finishes and the entries should be committed. End of input counts as quit.
pub(crate) fn review<R: BufRead, W: Write>(
    wizard: &mut ImportWizard,
    settings: &Settings,
    input: &mut R,
    out: &mut W,
) -> Result<bool> {
    print_candidates(wizard, &settings.currency, out)?;
    print_menu(wizard, settings, out)?;

    loop {
        write!(out, "> ")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(false);
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [] => continue,
            ["f"] => return Ok(true),
            ["q"] => return Ok(false),
            ["b"] => {
                wizard.back()?;
                writeln!(out, "Entries discarded.")?;
                return Ok(false);
            }
            ["p", who] => {
                let filter = match who.parse::<usize>() {
                    Ok(n) => match wizard.person_counts().get(n.wrapping_sub(1)) {
                        Some((name, _)) => Selection::Only(name.clone()),
                        None => {
                            writeln!(out, "{}", format!("No person #{n}").red())?;
                            continue;
                        }
                    },
                    Err(_) => Selection::from_opt(Some(*who)),
                };
                wizard.set_person_filter(filter)?;
                print_candidates(wizard, &settings.currency, out)?;
            }
            ["r", entry] => match entry.parse::<usize>() {
                Ok(entry) => print_raw(wizard, entry, out)?,
                Err(_) => writeln!(out, "{}", "Expected: r <entry#>".red())?,
            },
            [entry, cat] => {
                let (Ok(entry), Ok(cat)) = (entry.parse::<usize>(), cat.parse::<usize>()) else {
                    writeln!(out, "{}", "Expected: <entry#> <category#>".red())?;
                    continue;
                };
                let Some(category) = cat.checked_sub(1).and_then(|i| settings.categories.get(i)) else {
                    writeln!(out, "{}", format!("No category #{cat}").red())?;
                    continue;
                };
                match entry.checked_sub(1).map(|seq| wizard.set_category(seq, category)) {
                    Some(Ok(())) => writeln!(out, "#{entry} \u{2192} {category}")?,
                    Some(Err(Error::Workflow(_))) | None => {
                        writeln!(out, "{}", format!("No entry #{entry}").red())?
                    }
                    Some(Err(e)) => writeln!(out, "{}", e.to_string().red())?,
                }
            }
            _ => writeln!(out, "{}", "Unknown command".red())?,
        }
    }
}
