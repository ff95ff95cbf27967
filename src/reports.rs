use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use crate::models::{ExpenseRecord, Selection};
use crate::settings::{Settings, SharedSplit};

// ---------------------------------------------------------------------------
// Grouped totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Total {
    pub name: String,
    pub total: f64,
    pub count: usize,
}

fn group_totals<'a, I, F>(records: I, key: F) -> Vec<Total>
where
    I: IntoIterator<Item = &'a ExpenseRecord>,
    F: Fn(&'a ExpenseRecord) -> &'a str,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<Total> = Vec::new();
    for rec in records {
        let name = key(rec);
        match index.get(name) {
            Some(&i) => {
                out[i].total += rec.amount;
                out[i].count += 1;
            }
            None => {
                index.insert(name, out.len());
                out.push(Total {
                    name: name.to_string(),
                    total: rec.amount,
                    count: 1,
                });
            }
        }
    }
    out
}

pub fn total<'a, I>(records: I) -> f64
where
    I: IntoIterator<Item = &'a ExpenseRecord>,
{
    records.into_iter().map(|r| r.amount).sum()
}

pub fn category_totals<'a, I>(records: I) -> Vec<Total>
where
    I: IntoIterator<Item = &'a ExpenseRecord>,
{
    group_totals(records, |r| r.category.as_str())
}

pub fn person_totals<'a, I>(records: I) -> Vec<Total>
where
    I: IntoIterator<Item = &'a ExpenseRecord>,
{
    group_totals(records, |r| r.person.as_str())
}

// ---------------------------------------------------------------------------
// Shared-cost split
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SplitPolicy {
    pub shared: Vec<SharedSplit>,
    pub personal_category: Option<String>,
    pub personal_person: Option<String>,
}

impl SplitPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            shared: settings.split.shared.clone(),
            personal_category: settings.split.personal_category.clone(),
            personal_person: settings.settlement_person().map(str::to_string),
        }
    }

    fn counts_personal(&self, rec: &ExpenseRecord) -> bool {
        matches!(
            (&self.personal_category, &self.personal_person),
            (Some(cat), Some(person)) if *cat == rec.category && *person == rec.person
        )
    }

    fn is_personal_person(&self, person: &str) -> bool {
        self.personal_category.is_some() && self.personal_person.as_deref() == Some(person)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SharedAmount {
    pub category: String,
    pub fraction: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonSplit {
    pub person: String,
    pub shared: Vec<SharedAmount>,
    /// Only present for the policy's personal person.
    pub personal: Option<f64>,
    pub total_shared: f64,
    pub total: f64,
    /// What the counter-party owes this person.
    pub settlement: f64,
}

// No intermediate rounding.
pub fn shared_breakdown<'a, I>(records: I, policy: &SplitPolicy) -> Vec<PersonSplit>
where
    I: IntoIterator<Item = &'a ExpenseRecord>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<PersonSplit> = Vec::new();
    for rec in records {
        let i = *index.entry(rec.person.as_str()).or_insert_with(|| {
            out.push(PersonSplit {
                person: rec.person.clone(),
                shared: policy
                    .shared
                    .iter()
                    .map(|s| SharedAmount {
                        category: s.category.clone(),
                        fraction: s.fraction,
                        amount: 0.0,
                    })
                    .collect(),
                personal: policy.is_personal_person(&rec.person).then_some(0.0),
                total_shared: 0.0,
                total: 0.0,
                settlement: 0.0,
            });
            out.len() - 1
        });
        let entry = &mut out[i];
        if let Some(slot) = entry.shared.iter_mut().find(|s| s.category == rec.category) {
            slot.amount += rec.amount;
        }
        if policy.counts_personal(rec) {
            if let Some(personal) = entry.personal.as_mut() {
                *personal += rec.amount;
            }
        }
    }
    for entry in &mut out {
        let personal = entry.personal.unwrap_or(0.0);
        entry.total_shared = entry.shared.iter().map(|s| s.amount).sum();
        entry.total = entry.total_shared + personal;
        entry.settlement = entry
            .shared
            .iter()
            .map(|s| s.amount * s.fraction)
            .sum::<f64>()
            + personal;
    }
    out
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DailyTotal {
    pub date: String,
    pub amount: f64,
}

pub fn time_series<'a, I>(records: I) -> Vec<DailyTotal>
where
    I: IntoIterator<Item = &'a ExpenseRecord>,
{
    let mut by_date: BTreeMap<&str, f64> = BTreeMap::new();
    for rec in records {
        *by_date.entry(rec.date.as_str()).or_default() += rec.amount;
    }
    by_date
        .into_iter()
        .map(|(date, amount)| DailyTotal {
            date: date.to_string(),
            amount,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Filter + sort
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub person: Selection,
    pub category: Selection,
}

impl RecordFilter {
    pub fn matches(&self, rec: &ExpenseRecord) -> bool {
        self.person.matches(&rec.person) && self.category.matches(&rec.category)
    }

    pub fn is_active(&self) -> bool {
        self.person != Selection::All || self.category != Selection::All
    }
}

pub fn filter_records<'a>(records: &'a [ExpenseRecord], filter: &RecordFilter) -> Vec<&'a ExpenseRecord> {
    records.iter().filter(|r| filter.matches(r)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    Person,
    Amount,
    Category,
    Description,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "person" => Ok(Self::Person),
            "amount" => Ok(Self::Amount),
            "category" => Ok(Self::Category),
            "description" => Ok(Self::Description),
            other => Err(format!(
                "unknown sort key {other:?} (expected date, person, amount, category or description)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

fn compare(a: &ExpenseRecord, b: &ExpenseRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Date => a.date.cmp(&b.date),
        SortKey::Person => a.person.cmp(&b.person),
        SortKey::Amount => a.amount.partial_cmp(&b.amount).unwrap_or(Ordering::Equal),
        SortKey::Category => a.category.cmp(&b.category),
        SortKey::Description => a.description.cmp(&b.description),
    }
}

pub fn sort_records(records: &mut [&ExpenseRecord], key: SortKey, direction: SortDirection) {
    records.sort_by(|a, b| {
        let ord = compare(a, b, key);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

pub struct Summary {
    pub count: usize,
    pub total: f64,
    pub by_category: Vec<Total>,
    pub by_person: Vec<Total>,
    pub splits: Vec<PersonSplit>,
}

pub fn summarize(records: &[ExpenseRecord], policy: &SplitPolicy) -> Summary {
    Summary {
        count: records.len(),
        total: total(records),
        by_category: category_totals(records),
        by_person: person_totals(records),
        splits: shared_breakdown(records, policy),
    }
}
