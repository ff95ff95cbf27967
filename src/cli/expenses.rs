use colored::Colorize;

use crate::error::{Error, Result};
use crate::fmt::money;
use crate::ledger::ExpenseDraft;

use super::{confirm, open_ledger};

pub fn add(draft: ExpenseDraft) -> Result<()> {
    let (settings, mut ledger) = open_ledger()?;
    let input = draft.into_new(&settings, chrono::Local::now().date_naive())?;
    let id = ledger.add(&input)?;
    println!(
        "{}",
        format!(
            "Added expense #{id}: {} {} ({}) on {}",
            input.person,
            money(input.amount, &settings.currency),
            input.category,
            input.date
        )
        .green()
    );
    Ok(())
}

pub fn edit(id: i64, draft: ExpenseDraft) -> Result<()> {
    let (settings, mut ledger) = open_ledger()?;
    let current = ledger.find(id).ok_or(Error::NotFound(id))?.to_input();
    let input = draft.apply_to(current, &settings)?;
    ledger.edit(id, &input)?;
    println!("{}", format!("Updated expense #{id}").green());
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let (_, mut ledger) = open_ledger()?;
    ledger.remove(id)?;
    println!("Deleted expense #{id}");
    Ok(())
}

pub fn delete_all(yes: bool) -> Result<()> {
    let (_, mut ledger) = open_ledger()?;
    if ledger.records().is_empty() {
        println!("No expenses to delete.");
        return Ok(());
    }
    if !yes {
        let stdin = std::io::stdin();
        let confirmed = confirm(
            &mut stdin.lock(),
            &mut std::io::stdout(),
            "Are you sure you want to delete ALL expenses? This cannot be undone.",
        )?;
        if !confirmed {
            println!("{}", "Nothing deleted.".yellow());
            return Ok(());
        }
    }
    let removed = ledger.remove_all()?;
    println!("{}", format!("Deleted {removed} expenses").red());
    Ok(())
}
