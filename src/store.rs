use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{ExpenseInput, ExpenseRecord};

/// Persistence contract consumed by the ledger and the import workflow.
/// Every call is a single request/response; nothing is batched or retried.
pub trait RecordStore {
    /// All records, newest first.
    fn list(&self) -> Result<Vec<ExpenseRecord>>;
    /// Returns the new record's id.
    fn insert(&mut self, input: &ExpenseInput) -> Result<i64>;
    /// Full-field replace. `Error::NotFound` when `id` does not exist.
    fn update(&mut self, id: i64, input: &ExpenseInput) -> Result<()>;
    fn delete(&mut self, id: i64) -> Result<()>;
    /// Returns how many records were removed.
    fn delete_all(&mut self) -> Result<usize>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn count(&self) -> Result<i64> {
        Ok(self.conn.query_row("SELECT count(*) FROM expenses", [], |r| r.get(0))?)
    }
}

impl RecordStore for SqliteStore {
    fn list(&self) -> Result<Vec<ExpenseRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, person, amount, category, description, date, created_at \
             FROM expenses ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ExpenseRecord {
                    id: row.get(0)?,
                    person: row.get(1)?,
                    amount: row.get(2)?,
                    category: row.get(3)?,
                    description: row.get(4)?,
                    date: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn insert(&mut self, input: &ExpenseInput) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO expenses (person, amount, category, description, date) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![input.person, input.amount, input.category, input.description, input.date],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, "expense inserted");
        Ok(id)
    }

    fn update(&mut self, id: i64, input: &ExpenseInput) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE expenses SET person = ?1, amount = ?2, category = ?3, description = ?4, date = ?5 WHERE id = ?6",
            params![input.person, input.amount, input.category, input.description, input.date, id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(id));
        }
        Ok(())
    }

    fn delete(&mut self, id: i64) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM expenses WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(Error::NotFound(id));
        }
        Ok(())
    }

    fn delete_all(&mut self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM expenses", [])?)
    }
}
