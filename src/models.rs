use crate::statement::RawRow;

/// A persisted expense as returned by the record store.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRecord {
    pub id: i64,
    pub person: String,
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub date: String,
    pub created_at: String,
}

/// Payload for inserts and full-field updates.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseInput {
    pub person: String,
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub date: String,
}

impl ExpenseRecord {
    pub fn to_input(&self) -> ExpenseInput {
        ExpenseInput {
            person: self.person.clone(),
            amount: self.amount,
            category: self.category.clone(),
            description: self.description.clone(),
            date: self.date.clone(),
        }
    }
}

/// A normalized statement row awaiting review. `seq` is the row's position
/// among the statement's data rows.
#[derive(Debug, Clone)]
pub struct ImportCandidate {
    pub seq: usize,
    pub expense: ExpenseInput,
    pub raw: RawRow,
}

/// "Match all" or "match exactly one value", used by the list filters and the
/// import review person filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn from_opt(value: Option<&str>) -> Self {
        match value {
            None => Self::All,
            Some(v) if v.eq_ignore_ascii_case("all") => Self::All,
            Some(v) => Self::Only(v.to_string()),
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }
}
