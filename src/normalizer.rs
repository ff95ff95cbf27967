use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::Result;
use crate::models::{ExpenseInput, ImportCandidate};
use crate::settings::{ColumnMap, Settings};
use crate::statement::RawRow;

/// Why a statement row did not become a candidate. Only counted, never shown
/// per row.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    ZeroAmount,
    UnparsableAmount(String),
    MissingDescription,
    MerchantNotAllowed(String),
    InvalidDate(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroAmount => write!(f, "zero amount"),
            Self::UnparsableAmount(raw) => write!(f, "unparsable amount {raw:?}"),
            Self::MissingDescription => write!(f, "missing description"),
            Self::MerchantNotAllowed(desc) => write!(f, "merchant not in allow list: {desc}"),
            Self::InvalidDate(raw) => write!(f, "invalid date {raw:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportPolicy {
    /// Any row with a description; category starts at the default and is
    /// chosen during review.
    AcceptAll { default_category: String },
    /// Only rows whose description contains one of `merchants`
    /// (lowercased); all of them get `category`.
    MerchantAllowList { merchants: Vec<String>, category: String },
}

impl ImportPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        match &settings.import.merchant_allow_list {
            Some(list) => Self::MerchantAllowList {
                merchants: list.iter().map(|m| m.to_lowercase()).collect(),
                category: settings.import.merchant_category.clone(),
            },
            None => Self::AcceptAll {
                default_category: settings.default_category().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    columns: ColumnMap,
    policy: ImportPolicy,
    unknown_person: String,
}

/// Candidates produced from one statement plus the number of rows dropped.
#[derive(Debug, Default)]
pub struct Normalized {
    pub candidates: Vec<ImportCandidate>,
    pub rejected: usize,
}

impl Normalized {
    pub fn rows(&self) -> usize {
        self.candidates.len() + self.rejected
    }
}

impl Normalizer {
    pub fn new(columns: ColumnMap, policy: ImportPolicy, unknown_person: impl Into<String>) -> Self {
        Self {
            columns,
            policy,
            unknown_person: unknown_person.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.csv.columns.clone(),
            ImportPolicy::from_settings(settings),
            settings.import.unknown_person.clone(),
        )
    }

    pub fn normalize(
        &self,
        seq: usize,
        row: RawRow,
        today: NaiveDate,
    ) -> std::result::Result<ImportCandidate, Rejection> {
        let raw_amount = row.get(&self.columns.amount).unwrap_or_default();
        let amount = normalize_amount(raw_amount)
            .ok_or_else(|| Rejection::UnparsableAmount(raw_amount.to_string()))?;
        if amount == 0.0 {
            return Err(Rejection::ZeroAmount);
        }

        let description = row
            .get(&self.columns.description)
            .unwrap_or_default()
            .trim()
            .to_string();
        let category = match &self.policy {
            ImportPolicy::AcceptAll { default_category } => {
                if description.is_empty() {
                    return Err(Rejection::MissingDescription);
                }
                default_category.clone()
            }
            ImportPolicy::MerchantAllowList { merchants, category } => {
                let lowered = description.to_lowercase();
                if !merchants.iter().any(|m| lowered.contains(m.as_str())) {
                    return Err(Rejection::MerchantNotAllowed(description));
                }
                category.clone()
            }
        };

        let raw_date = row.get(&self.columns.date).unwrap_or_default().trim();
        let date = if raw_date.is_empty() {
            today.format("%Y-%m-%d").to_string()
        } else {
            normalize_date(raw_date).ok_or_else(|| Rejection::InvalidDate(raw_date.to_string()))?
        };

        let person = row
            .get(&self.columns.person)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(self.unknown_person.as_str())
            .to_string();

        Ok(ImportCandidate {
            seq,
            expense: ExpenseInput {
                person,
                amount,
                category,
                description,
                date,
            },
            raw: row,
        })
    }

    /// Normalize every row. The first structural error aborts the whole
    /// batch; rejected rows are only counted.
    pub fn normalize_all<I>(&self, rows: I, today: NaiveDate) -> Result<Normalized>
    where
        I: IntoIterator<Item = Result<RawRow>>,
    {
        let mut out = Normalized::default();
        for (seq, row) in rows.into_iter().enumerate() {
            match self.normalize(seq, row?, today) {
                Ok(candidate) => out.candidates.push(candidate),
                Err(reason) => {
                    tracing::debug!(row = seq, %reason, "statement row rejected");
                    out.rejected += 1;
                }
            }
        }
        Ok(out)
    }
}

fn mdy_pattern() -> &'static Regex {
    static MDY: OnceLock<Regex> = OnceLock::new();
    MDY.get_or_init(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("static pattern"))
}

fn iso_pattern() -> &'static Regex {
    static ISO: OnceLock<Regex> = OnceLock::new();
    ISO.get_or_init(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("static pattern"))
}

/// `MM/DD/YYYY` to `YYYY-MM-DD`. ISO input passes through, so applying this
/// twice gives the same result. Impossible calendar dates give `None`.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let (y, m, d) = if let Some(caps) = iso_pattern().captures(raw) {
        (caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
    } else if let Some(caps) = mdy_pattern().captures(raw) {
        (caps[3].parse().ok()?, caps[1].parse().ok()?, caps[2].parse().ok()?)
    } else {
        return None;
    };
    NaiveDate::from_ymd_opt(y, m, d).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Parse a statement amount that may use a decimal comma ("17,90") and
/// spaces as thousands separators ("1 234,50").
pub fn normalize_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::parse_statement;

    const HEADER: &str = "Datum,Beskrivning,Kortmedlem,Belopp\n";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
    }

    fn accept_all() -> Normalizer {
        Normalizer::from_settings(&Settings::default())
    }

    fn merchant_only() -> Normalizer {
        let mut settings = Settings::default();
        settings.import.merchant_allow_list =
            Some(vec!["lidl".to_string(), "Coop".to_string(), "ica".to_string()]);
        Normalizer::from_settings(&settings)
    }

    fn single_row(body: &str) -> RawRow {
        let text = format!("{HEADER}{body}\n");
        parse_statement(text.as_bytes(), None)
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
    }

    fn run(normalizer: &Normalizer, body: &str) -> Normalized {
        let text = format!("{HEADER}{body}");
        let rows = parse_statement(text.as_bytes(), None).unwrap();
        normalizer.normalize_all(rows, today()).unwrap()
    }

    #[test]
    fn test_normalize_amount() {
        assert_eq!(normalize_amount("17,90"), Some(17.90));
        assert_eq!(normalize_amount("17.90"), Some(17.90));
        assert_eq!(normalize_amount("-250,00"), Some(-250.0));
        assert_eq!(normalize_amount("1 234,50"), Some(1234.5));
        assert_eq!(normalize_amount("1\u{a0}234,50"), Some(1234.5));
        assert_eq!(normalize_amount("0"), Some(0.0));
        assert_eq!(normalize_amount("abc"), None);
        assert_eq!(normalize_amount(""), None);
        assert_eq!(normalize_amount("inf"), None);
        assert_eq!(normalize_amount("NaN"), None);
    }

    #[test]
    fn test_normalize_date() {
        assert_eq!(normalize_date("01/05/2024"), Some("2024-01-05".to_string()));
        assert_eq!(normalize_date("1/5/2024"), Some("2024-01-05".to_string()));
        assert_eq!(normalize_date("12/31/2023"), Some("2023-12-31".to_string()));
        assert_eq!(normalize_date("13/01/2025"), None);
        assert_eq!(normalize_date("02/30/2025"), None);
        assert_eq!(normalize_date("yesterday"), None);
    }

    #[test]
    fn test_normalize_date_idempotent() {
        for raw in ["01/05/2024", "2/29/2024", "2024-01-05", "12/01/1999"] {
            let once = normalize_date(raw).unwrap();
            assert_eq!(normalize_date(&once), Some(once.clone()), "not idempotent for {raw}");
        }
        assert_eq!(normalize_date("2024-13-01"), None);
    }

    #[test]
    fn test_accepts_valid_row() {
        let row = single_row("01/05/2024,Lidl,Ana,\"17,90\"");
        let c = accept_all().normalize(0, row, today()).unwrap();
        assert_eq!(c.expense.amount, 17.90);
        assert_eq!(c.expense.date, "2024-01-05");
        assert_eq!(c.expense.person, "Ana");
        assert_eq!(c.expense.description, "Lidl");
        assert_eq!(c.expense.category, "Personal");
        assert_eq!(c.raw.get("Belopp"), Some("17,90"));
    }

    #[test]
    fn test_rejections() {
        let n = accept_all();
        let reject = |body: &str| n.normalize(0, single_row(body), today()).unwrap_err();
        assert_eq!(reject("01/05/2024,Rent,Ana,0"), Rejection::ZeroAmount);
        assert_eq!(reject("01/05/2024,Rent,Ana,\"0,00\""), Rejection::ZeroAmount);
        assert_eq!(
            reject("01/05/2024,Rent,Ana,abc"),
            Rejection::UnparsableAmount("abc".to_string())
        );
        assert_eq!(reject("01/05/2024,,Ana,12"), Rejection::MissingDescription);
        assert_eq!(
            reject("2024.01.05,Rent,Ana,12"),
            Rejection::InvalidDate("2024.01.05".to_string())
        );
    }

    #[test]
    fn test_empty_date_uses_today() {
        let c = accept_all().normalize(0, single_row(",Lidl,Ana,5"), today()).unwrap();
        assert_eq!(c.expense.date, "2025-03-09");
    }

    #[test]
    fn test_missing_person_uses_placeholder() {
        let c = accept_all().normalize(0, single_row("01/05/2024,Lidl,,5"), today()).unwrap();
        assert_eq!(c.expense.person, "Unknown");

        let text = "Datum,Beskrivning,Belopp\n01/05/2024,Lidl,5\n";
        let row = parse_statement(text.as_bytes(), None).unwrap().next().unwrap().unwrap();
        let c = accept_all().normalize(0, row, today()).unwrap();
        assert_eq!(c.expense.person, "Unknown");
    }

    #[test]
    fn test_missing_columns_reject_every_row() {
        let text = "Date,Merchant,Value\n01/05/2024,Lidl,5\n01/06/2024,Coop,7\n";
        let rows = parse_statement(text.as_bytes(), None).unwrap();
        let out = accept_all().normalize_all(rows, today()).unwrap();
        assert!(out.candidates.is_empty());
        assert_eq!(out.rejected, 2);
    }

    #[test]
    fn test_counts_add_up() {
        let out = run(
            &accept_all(),
            "01/05/2024,Lidl,Ana,\"17,90\"\n\
             01/05/2024,Rent,Ana,0\n\
             01/06/2024,Coop,Joel,abc\n\
             01/07/2024,ICA Nara,Joel,\"42,50\"\n",
        );
        assert_eq!(out.candidates.len(), 2);
        assert_eq!(out.rejected, 2);
        assert_eq!(out.rows(), 4);
        assert_eq!(out.candidates.len(), out.rows() - out.rejected);
        let seqs: Vec<usize> = out.candidates.iter().map(|c| c.seq).collect();
        assert_eq!(seqs, vec![0, 3]);
    }

    #[test]
    fn test_merchant_policy_filters_and_tags() {
        let out = run(
            &merchant_only(),
            "01/05/2024,LIDL SUNDBYBERG,Ana,\"17,90\"\n\
             01/05/2024,Spotify,Ana,\"119,00\"\n\
             01/06/2024,coop konsum,Joel,\"88,00\"\n",
        );
        assert_eq!(out.candidates.len(), 2);
        assert_eq!(out.rejected, 1);
        assert!(out.candidates.iter().all(|c| c.expense.category == "Shared (50/50)"));
    }

    #[test]
    fn test_merchant_policy_rejects_with_reason() {
        let row = single_row("01/05/2024,Spotify,Ana,119");
        let err = merchant_only().normalize(0, row, today()).unwrap_err();
        assert_eq!(err, Rejection::MerchantNotAllowed("Spotify".to_string()));
    }

    #[test]
    fn test_parse_error_aborts_batch() {
        let text = format!("{HEADER}01/05/2024,Lidl,Ana,5\n01/05/2024,Lidl,Ana\n");
        let rows = parse_statement(text.as_bytes(), None).unwrap();
        assert!(accept_all().normalize_all(rows, today()).is_err());
    }
}
