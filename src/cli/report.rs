use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::{money, percent};
use crate::reports::{self, SplitPolicy};

use super::open_ledger;

pub fn summary() -> Result<()> {
    let (settings, ledger) = open_ledger()?;
    let records = ledger.records();
    if records.is_empty() {
        println!("No expenses yet");
        return Ok(());
    }
    let cur = settings.currency.as_str();
    let policy = SplitPolicy::from_settings(&settings);
    let summary = reports::summarize(records, &policy);

    let mut table = Table::new();
    table.set_header(vec!["", "Amount"]);
    for split in &summary.splits {
        table.add_row(vec![Cell::new(split.person.as_str().bold()), Cell::new("")]);
        for shared in &split.shared {
            table.add_row(vec![
                Cell::new(format!("  {}", shared.category)),
                Cell::new(money(shared.amount, cur)),
            ]);
        }
        if let Some(personal) = split.personal.filter(|p| *p > 0.0) {
            let label = policy.personal_category.as_deref().unwrap_or("Personal");
            table.add_row(vec![
                Cell::new(format!("  {label}")),
                Cell::new(money(personal, cur)),
            ]);
        }
        table.add_row(vec![Cell::new("  Total"), Cell::new(money(split.total, cur))]);
        table.add_row(vec![
            Cell::new("  Settlement".green().bold()),
            Cell::new(money(split.settlement, cur).green().bold()),
        ]);
    }
    println!("Shared costs\n{table}");

    let mut table = Table::new();
    table.set_header(vec!["Category", "Count", "Amount", "%"]);
    for t in &summary.by_category {
        table.add_row(vec![
            Cell::new(&t.name),
            Cell::new(t.count),
            Cell::new(money(t.total, cur)),
            Cell::new(format!("{:.1}%", percent(t.total, summary.total))),
        ]);
    }
    println!("\nBy category\n{table}");

    let mut table = Table::new();
    table.set_header(vec!["Person", "Count", "Amount"]);
    for t in &summary.by_person {
        table.add_row(vec![
            Cell::new(&t.name),
            Cell::new(t.count),
            Cell::new(money(t.total, cur)),
        ]);
    }
    println!("\nBy person\n{table}");

    println!(
        "\n{} {} across {} expenses",
        "Total:".bold(),
        money(summary.total, cur),
        summary.count
    );
    Ok(())
}

pub fn trend() -> Result<()> {
    let (settings, ledger) = open_ledger()?;
    let series = reports::time_series(ledger.records());
    if series.is_empty() {
        println!("No expenses yet");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Date", "Amount"]);
    for day in &series {
        table.add_row(vec![
            Cell::new(&day.date),
            Cell::new(money(day.amount, &settings.currency)),
        ]);
    }
    println!("Spending per day\n{table}");
    Ok(())
}
