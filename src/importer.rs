use std::io::Read;

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::{ImportCandidate, Selection};
use crate::normalizer::Normalizer;
use crate::settings::{CommitScope, Settings};
use crate::statement::parse_statement;
use crate::store::RecordStore;

// ---------------------------------------------------------------------------
// States and outcomes
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum WizardState {
    Uploading,
    Reviewing {
        candidates: Vec<ImportCandidate>,
        person_filter: Selection,
    },
    /// Held only while `finish` is inserting.
    Committing,
    Done {
        committed: usize,
    },
    Failed {
        committed: usize,
        not_attempted: usize,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Uploading,
    Reviewing,
    Committing,
    Done,
    Failed,
}

impl WizardState {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Uploading => Stage::Uploading,
            Self::Reviewing { .. } => Stage::Reviewing,
            Self::Committing => Stage::Committing,
            Self::Done { .. } => Stage::Done,
            Self::Failed { .. } => Stage::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOutcome {
    pub accepted: usize,
    pub rejected: usize,
}

impl UploadOutcome {
    pub fn rows(&self) -> usize {
        self.accepted + self.rejected
    }

    pub fn message(&self) -> String {
        if self.accepted == 0 {
            "No valid entries found in CSV.".to_string()
        } else {
            format!("Found {} entries. Please categorize each one.", self.accepted)
        }
    }
}

#[derive(Debug)]
pub enum CommitOutcome {
    Complete {
        committed: usize,
    },
    /// Inserts stopped at the first failure; rows before it stay committed.
    /// `not_attempted` includes the row that failed.
    Partial {
        committed: usize,
        not_attempted: usize,
        error: Error,
    },
}

impl CommitOutcome {
    pub fn committed(&self) -> usize {
        match self {
            Self::Complete { committed } | Self::Partial { committed, .. } => *committed,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Complete { committed } => format!("Successfully added {committed} entries!"),
            Self::Partial {
                committed,
                not_attempted,
                error,
            } => format!(
                "Error adding entries to database: {committed} added, {not_attempted} not added ({error})."
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Wizard
// ---------------------------------------------------------------------------

pub struct ImportWizard {
    normalizer: Normalizer,
    categories: Vec<String>,
    scope: CommitScope,
    delimiter: Option<u8>,
    state: WizardState,
}

impl ImportWizard {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            normalizer: Normalizer::from_settings(settings),
            categories: settings.categories.clone(),
            scope: settings.import.commit_scope,
            delimiter: settings.csv_delimiter()?,
            state: WizardState::Uploading,
        })
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    pub fn scope(&self) -> CommitScope {
        self.scope
    }

    fn wrong_stage(&self, action: &str) -> Error {
        Error::Workflow(format!("cannot {action} while {:?}", self.stage()))
    }

    pub fn upload<R: Read>(&mut self, reader: R, today: NaiveDate) -> Result<UploadOutcome> {
        if self.stage() != Stage::Uploading {
            return Err(self.wrong_stage("upload"));
        }
        let normalized = parse_statement(reader, self.delimiter)
            .and_then(|rows| self.normalizer.normalize_all(rows, today))
            .inspect_err(|e| tracing::error!(error = %e, "statement could not be parsed"))?;
        tracing::info!(
            rows = normalized.rows(),
            accepted = normalized.candidates.len(),
            rejected = normalized.rejected,
            "statement parsed"
        );
        let outcome = UploadOutcome {
            accepted: normalized.candidates.len(),
            rejected: normalized.rejected,
        };
        if outcome.accepted > 0 {
            self.state = WizardState::Reviewing {
                candidates: normalized.candidates,
                person_filter: Selection::All,
            };
        }
        Ok(outcome)
    }

    pub fn candidates(&self) -> &[ImportCandidate] {
        match &self.state {
            WizardState::Reviewing { candidates, .. } => candidates,
            _ => &[],
        }
    }

    pub fn person_filter(&self) -> Option<&Selection> {
        match &self.state {
            WizardState::Reviewing { person_filter, .. } => Some(person_filter),
            _ => None,
        }
    }

    pub fn visible(&self) -> Vec<&ImportCandidate> {
        match &self.state {
            WizardState::Reviewing {
                candidates,
                person_filter,
            } => candidates
                .iter()
                .filter(|c| person_filter.matches(&c.expense.person))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn pending(&self) -> Vec<&ImportCandidate> {
        match self.scope {
            CommitScope::All => self.candidates().iter().collect(),
            CommitScope::Filtered => self.visible(),
        }
    }

    pub fn person_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for c in self.candidates() {
            match counts.iter_mut().find(|(p, _)| *p == c.expense.person) {
                Some((_, n)) => *n += 1,
                None => counts.push((c.expense.person.clone(), 1)),
            }
        }
        counts
    }

    pub fn set_category(&mut self, seq: usize, category: &str) -> Result<()> {
        if !self.categories.iter().any(|c| c == category) {
            return Err(Error::UnknownCategory(category.to_string()));
        }
        if let WizardState::Reviewing { candidates, .. } = &mut self.state {
            let candidate = candidates
                .iter_mut()
                .find(|c| c.seq == seq)
                .ok_or_else(|| Error::Workflow(format!("no entry #{seq}")))?;
            candidate.expense.category = category.to_string();
            return Ok(());
        }
        Err(self.wrong_stage("change a category"))
    }

    pub fn set_person_filter(&mut self, filter: Selection) -> Result<()> {
        if let WizardState::Reviewing { person_filter, .. } = &mut self.state {
            *person_filter = filter;
            return Ok(());
        }
        Err(self.wrong_stage("filter entries"))
    }

    pub fn back(&mut self) -> Result<()> {
        if self.stage() != Stage::Reviewing {
            return Err(self.wrong_stage("go back"));
        }
        self.state = WizardState::Uploading;
        Ok(())
    }

    // Stops at the first store error; earlier inserts stay.
    pub fn finish<S: RecordStore + ?Sized>(&mut self, store: &mut S) -> Result<CommitOutcome> {
        if self.stage() != Stage::Reviewing {
            return Err(self.wrong_stage("finish"));
        }
        let pending: Vec<_> = self.pending().into_iter().map(|c| c.expense.clone()).collect();
        self.state = WizardState::Committing;

        let total = pending.len();
        for (i, expense) in pending.iter().enumerate() {
            if let Err(error) = store.insert(expense) {
                let not_attempted = total - i;
                tracing::error!(committed = i, not_attempted, error = %error, "import commit failed");
                self.state = WizardState::Failed {
                    committed: i,
                    not_attempted,
                    reason: error.to_string(),
                };
                return Ok(CommitOutcome::Partial {
                    committed: i,
                    not_attempted,
                    error,
                });
            }
        }
        tracing::info!(committed = total, "import committed");
        self.state = WizardState::Done { committed: total };
        Ok(CommitOutcome::Complete { committed: total })
    }

    #[allow(dead_code)]
    pub fn reset(&mut self) {
        self.state = WizardState::Uploading;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::testing::BrokenReader;
    use crate::store::testing::MemoryStore;

    const STATEMENT: &str = "\
Datum,Beskrivning,Kortmedlem,Belopp
01/05/2024,Lidl,Ana,\"17,90\"
01/05/2024,Rent,Ana,0
01/06/2024,Coop,Joel,\"42,00\"
01/07/2024,ICA,Ana,\"8,25\"
01/08/2024,Systembolaget,Joel,\"199,00\"
01/09/2024,Hemkop,Ana,\"65,10\"
";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    fn wizard_with(settings: &Settings) -> ImportWizard {
        let mut w = ImportWizard::new(settings).unwrap();
        w.upload(STATEMENT.as_bytes(), today()).unwrap();
        w
    }

    fn wizard() -> ImportWizard {
        wizard_with(&Settings::default())
    }

    #[test]
    fn test_end_to_end_single_row() {
        let text = "Beskrivning,Belopp,Datum,Kortmedlem\nLidl,\"17,90\",01/05/2024,Ana\nRent,0,01/05/2024,Ana\n";
        let mut w = ImportWizard::new(&Settings::default()).unwrap();
        let outcome = w.upload(text.as_bytes(), today()).unwrap();
        assert_eq!(outcome, UploadOutcome { accepted: 1, rejected: 1 });
        assert_eq!(w.stage(), Stage::Reviewing);
        let c = &w.candidates()[0];
        assert_eq!(c.expense.description, "Lidl");
        assert_eq!(c.expense.amount, 17.90);
        assert_eq!(c.expense.date, "2024-01-05");
    }

    #[test]
    fn test_no_valid_entries_stays_uploading() {
        let mut w = ImportWizard::new(&Settings::default()).unwrap();
        let outcome = w
            .upload("Datum,Beskrivning,Kortmedlem,Belopp\n01/05/2024,Rent,Ana,0\n".as_bytes(), today())
            .unwrap();
        assert_eq!(outcome.accepted, 0);
        assert_eq!(outcome.message(), "No valid entries found in CSV.");
        assert_eq!(w.stage(), Stage::Uploading);
    }

    #[test]
    fn test_parse_error_stays_uploading() {
        let mut w = ImportWizard::new(&Settings::default()).unwrap();
        let reader = BrokenReader::new(b"Datum,Beskrivning,Kortmedlem,Belopp\n01/05/2024,Lidl,Ana,5\n");
        let err = w.upload(reader, today()).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(w.stage(), Stage::Uploading);
        assert!(w.candidates().is_empty());
    }

    #[test]
    fn test_summary_line_is_rejected_not_fatal() {
        let text = format!("{STATEMENT}Summa,\"59,90\"\n");
        let mut w = ImportWizard::new(&Settings::default()).unwrap();
        let outcome = w.upload(text.as_bytes(), today()).unwrap();
        assert_eq!(outcome, UploadOutcome { accepted: 5, rejected: 2 });
        assert_eq!(w.stage(), Stage::Reviewing);
    }

    #[test]
    fn test_latin1_row_is_kept() {
        let bytes: &[u8] = b"Datum,Beskrivning,Kortmedlem,Belopp\n01/05/2024,Lidl,Ana,\"17,90\"\n01/06/2024,Hemk\xf6p,Joel,\"42,00\"\n";
        let mut w = ImportWizard::new(&Settings::default()).unwrap();
        let outcome = w.upload(bytes, today()).unwrap();
        assert_eq!(outcome.accepted, 2);
        assert_eq!(w.candidates()[1].expense.description, "Hemk\u{FFFD}p");
        assert_eq!(w.candidates()[1].expense.amount, 42.0);
    }

    #[test]
    fn test_upload_message_and_counts() {
        let mut w = ImportWizard::new(&Settings::default()).unwrap();
        let outcome = w.upload(STATEMENT.as_bytes(), today()).unwrap();
        assert_eq!(outcome.accepted, 5);
        assert_eq!(outcome.rows(), 6);
        assert_eq!(outcome.message(), "Found 5 entries. Please categorize each one.");
    }

    #[test]
    fn test_upload_only_from_uploading() {
        let mut w = wizard();
        assert!(matches!(
            w.upload(STATEMENT.as_bytes(), today()),
            Err(Error::Workflow(_))
        ));
        assert_eq!(w.candidates().len(), 5);
    }

    #[test]
    fn test_set_category_by_seq() {
        let mut w = wizard();
        w.set_category(2, "Shared (50/50)").unwrap();
        let coop = w.candidates().iter().find(|c| c.seq == 2).unwrap();
        assert_eq!(coop.expense.category, "Shared (50/50)");
        assert!(matches!(w.set_category(2, "Travel"), Err(Error::UnknownCategory(_))));
        assert!(matches!(w.set_category(1, "Personal"), Err(Error::Workflow(_))));
    }

    #[test]
    fn test_filter_is_display_only_by_default() {
        let mut w = wizard();
        w.set_person_filter(Selection::Only("Joel".to_string())).unwrap();
        assert_eq!(w.visible().len(), 2);
        assert_eq!(w.pending().len(), 5);

        let mut store = MemoryStore::default();
        let outcome = w.finish(&mut store).unwrap();
        assert_eq!(outcome.committed(), 5);
        assert_eq!(store.records.len(), 5);
    }

    #[test]
    fn test_filtered_commit_scope() {
        let mut settings = Settings::default();
        settings.import.commit_scope = CommitScope::Filtered;
        let mut w = wizard_with(&settings);
        w.set_person_filter(Selection::Only("Joel".to_string())).unwrap();
        assert_eq!(w.pending().len(), 2);

        let mut store = MemoryStore::default();
        w.finish(&mut store).unwrap();
        assert_eq!(store.records.len(), 2);
        assert!(store.records.iter().all(|r| r.person == "Joel"));
    }

    #[test]
    fn test_finish_commits_reviewed_categories() {
        let mut w = wizard();
        w.set_category(0, "Shared (40/60)").unwrap();
        let mut store = MemoryStore::default();
        let outcome = w.finish(&mut store).unwrap();
        assert_eq!(outcome.message(), "Successfully added 5 entries!");
        assert!(matches!(w.state(), WizardState::Done { committed: 5 }));
        assert_eq!(store.records[0].category, "Shared (40/60)");
        assert_eq!(store.records[1].category, "Personal");
    }

    #[test]
    fn test_partial_commit_failure() {
        let mut w = wizard();
        let mut store = MemoryStore::failing_on(3);
        let outcome = w.finish(&mut store).unwrap();
        match outcome {
            CommitOutcome::Partial {
                committed,
                not_attempted,
                ..
            } => {
                assert_eq!(committed, 2);
                assert_eq!(not_attempted, 3);
            }
            other => panic!("expected partial commit, got {other:?}"),
        }
        assert_eq!(store.records.len(), 2);
        assert_eq!(w.stage(), Stage::Failed);
        w.reset();
        assert_eq!(w.stage(), Stage::Uploading);
    }

    #[test]
    fn test_back_discards_candidates() {
        let mut w = wizard();
        w.back().unwrap();
        assert_eq!(w.stage(), Stage::Uploading);
        assert!(w.candidates().is_empty());
        assert!(w.back().is_err());
    }

    #[test]
    fn test_finish_requires_review() {
        let mut w = ImportWizard::new(&Settings::default()).unwrap();
        let mut store = MemoryStore::default();
        assert!(matches!(w.finish(&mut store), Err(Error::Workflow(_))));
        assert!(store.records.is_empty());
    }

    #[test]
    fn test_done_resets_to_uploading() {
        let mut w = wizard();
        let mut store = MemoryStore::default();
        w.finish(&mut store).unwrap();
        assert!(w.set_person_filter(Selection::All).is_err());
        w.reset();
        let outcome = w.upload(STATEMENT.as_bytes(), today()).unwrap();
        assert_eq!(outcome.accepted, 5);
    }

    #[test]
    fn test_person_counts() {
        let w = wizard();
        assert_eq!(
            w.person_counts(),
            vec![("Ana".to_string(), 3), ("Joel".to_string(), 2)]
        );
    }

    #[test]
    fn test_merchant_policy_upload() {
        let mut settings = Settings::default();
        settings.import.merchant_allow_list =
            Some(vec!["lidl".into(), "coop".into(), "ica".into(), "hemkop".into()]);
        let w = wizard_with(&settings);
        let descs: Vec<&str> = w.candidates().iter().map(|c| c.expense.description.as_str()).collect();
        assert_eq!(descs, vec!["Lidl", "Coop", "ICA", "Hemkop"]);
        assert!(w
            .candidates()
            .iter()
            .all(|c| c.expense.category == "Shared (50/50)"));
    }
}
