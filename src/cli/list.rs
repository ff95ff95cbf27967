use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::money;
use crate::models::{ExpenseRecord, Selection};
use crate::reports::{filter_records, sort_records, RecordFilter, SortDirection, SortKey};

use super::open_ledger;

pub fn run(
    person: Option<String>,
    category: Option<String>,
    sort: Option<SortKey>,
    desc: bool,
) -> Result<()> {
    let (settings, ledger) = open_ledger()?;
    let records = ledger.records();
    let filter = RecordFilter {
        person: Selection::from_opt(person.as_deref()),
        category: Selection::from_opt(category.as_deref()),
    };

    let mut view: Vec<&ExpenseRecord> = filter_records(records, &filter);
    if let Some(key) = sort {
        let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
        sort_records(&mut view, key, direction);
    }

    if view.is_empty() {
        if records.is_empty() || !filter.is_active() {
            println!("No expenses yet");
        } else {
            println!("No expenses match the current filters");
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Person", "Amount", "Category", "Description"]);
    for rec in &view {
        table.add_row(vec![
            Cell::new(rec.id),
            Cell::new(&rec.date),
            Cell::new(&rec.person),
            Cell::new(money(rec.amount, &settings.currency)),
            Cell::new(&rec.category),
            Cell::new(if rec.description.is_empty() { "-" } else { rec.description.as_str() }),
        ]);
    }
    println!("Expenses\n{table}");
    println!("Showing {} of {} expenses", view.len(), records.len());
    Ok(())
}
