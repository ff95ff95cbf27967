use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::{ExpenseInput, ExpenseRecord};
use crate::normalizer::{normalize_amount, normalize_date};
use crate::settings::Settings;
use crate::store::RecordStore;

/// The working set of records, reloaded from the store after every change.
/// Reports and the import workflow borrow from here instead of reading
/// anything global.
pub struct Ledger<S: RecordStore> {
    store: S,
    records: Vec<ExpenseRecord>,
}

impl<S: RecordStore> Ledger<S> {
    pub fn load(store: S) -> Result<Self> {
        let mut ledger = Self {
            store,
            records: Vec::new(),
        };
        ledger.reload()?;
        Ok(ledger)
    }

    pub fn records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn find(&self, id: i64) -> Option<&ExpenseRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn reload(&mut self) -> Result<()> {
        match self.store.list() {
            Ok(records) => {
                self.records = records;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "loading expenses failed");
                Err(e)
            }
        }
    }

    pub fn add(&mut self, input: &ExpenseInput) -> Result<i64> {
        let id = self
            .store
            .insert(input)
            .inspect_err(|e| tracing::error!(error = %e, "adding expense failed"))?;
        tracing::info!(id, person = %input.person, amount = input.amount, "expense added");
        self.reload()?;
        Ok(id)
    }

    pub fn edit(&mut self, id: i64, input: &ExpenseInput) -> Result<()> {
        self.store
            .update(id, input)
            .inspect_err(|e| tracing::error!(id, error = %e, "updating expense failed"))?;
        tracing::info!(id, "expense updated");
        self.reload()
    }

    pub fn remove(&mut self, id: i64) -> Result<()> {
        self.store
            .delete(id)
            .inspect_err(|e| tracing::error!(id, error = %e, "deleting expense failed"))?;
        tracing::info!(id, "expense deleted");
        self.reload()
    }

    pub fn remove_all(&mut self) -> Result<usize> {
        let removed = self
            .store
            .delete_all()
            .inspect_err(|e| tracing::error!(error = %e, "deleting all expenses failed"))?;
        tracing::info!(removed, "all expenses deleted");
        self.reload()?;
        Ok(removed)
    }
}

/// Raw field values from the add/edit commands. Unset fields fall back to the
/// configured defaults (add) or the existing record (edit).
#[derive(Debug, Clone, Default)]
pub struct ExpenseDraft {
    pub person: Option<String>,
    pub amount: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

impl ExpenseDraft {
    /// Build a new expense. Amount is required; date defaults to `today`.
    pub fn into_new(self, settings: &Settings, today: NaiveDate) -> Result<ExpenseInput> {
        if self.amount.as_deref().map_or(true, |a| a.trim().is_empty()) {
            return Err(Error::InvalidAmount("an amount is required".to_string()));
        }
        let base = ExpenseInput {
            person: settings.default_person().to_string(),
            amount: 0.0,
            category: settings.default_category().to_string(),
            description: String::new(),
            date: today.format("%Y-%m-%d").to_string(),
        };
        self.apply_to(base, settings)
    }

    /// Overlay the set fields on `base`, validating only what changes.
    pub fn apply_to(self, base: ExpenseInput, settings: &Settings) -> Result<ExpenseInput> {
        let mut out = base;
        if let Some(person) = self.person {
            let person = person.trim().to_string();
            if !settings.has_person(&person) {
                return Err(Error::UnknownPerson(person));
            }
            out.person = person;
        }
        if let Some(raw) = self.amount {
            out.amount = normalize_amount(&raw).ok_or_else(|| Error::InvalidAmount(raw.clone()))?;
        }
        if out.amount == 0.0 {
            return Err(Error::InvalidAmount("amount must not be zero".to_string()));
        }
        if let Some(category) = self.category {
            let category = category.trim().to_string();
            if !settings.has_category(&category) {
                return Err(Error::UnknownCategory(category));
            }
            out.category = category;
        }
        if let Some(description) = self.description {
            out.description = description.trim().to_string();
        }
        if let Some(raw) = self.date {
            out.date = normalize_date(&raw).ok_or_else(|| Error::InvalidDate(raw.clone()))?;
        }
        Ok(out)
    }
}
