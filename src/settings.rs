use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DB_FILE: &str = "splitbook.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    #[serde(default = "default_people")]
    pub people: Vec<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub csv: CsvConfig,
}

/// One shared category and the fraction of it owed by the counter-party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedSplit {
    pub category: String,
    pub fraction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    #[serde(default = "default_shared")]
    pub shared: Vec<SharedSplit>,
    /// Category counted at full weight for `personal_person`. `null` disables it.
    #[serde(default = "default_personal_category")]
    pub personal_category: Option<String>,
    /// Defaults to the first configured person when unset.
    #[serde(default)]
    pub personal_person: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitScope {
    /// Commit every candidate regardless of the review filter.
    #[default]
    All,
    /// Commit only the candidates visible under the review filter.
    Filtered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Case-insensitive merchant substrings. When set, only matching rows are
    /// accepted and they all get `merchant_category`.
    #[serde(default)]
    pub merchant_allow_list: Option<Vec<String>>,
    #[serde(default = "default_merchant_category")]
    pub merchant_category: String,
    #[serde(default)]
    pub commit_scope: CommitScope,
    #[serde(default = "default_unknown_person")]
    pub unknown_person: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvConfig {
    /// `auto` or a single delimiter character.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default)]
    pub columns: ColumnMap,
}

/// Statement header names for each field the normalizer reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMap {
    #[serde(default = "default_description_column")]
    pub description: String,
    #[serde(default = "default_amount_column")]
    pub amount: String,
    #[serde(default = "default_date_column")]
    pub date: String,
    #[serde(default = "default_person_column")]
    pub person: String,
}

fn default_categories() -> Vec<String> {
    vec![
        "Personal".to_string(),
        "Shared (40/60)".to_string(),
        "Shared (50/50)".to_string(),
    ]
}

fn default_people() -> Vec<String> {
    vec!["Ana".to_string(), "Joel".to_string()]
}

fn default_currency() -> String {
    "kr".to_string()
}

fn default_shared() -> Vec<SharedSplit> {
    vec![
        SharedSplit { category: "Shared (40/60)".to_string(), fraction: 0.4 },
        SharedSplit { category: "Shared (50/50)".to_string(), fraction: 0.5 },
    ]
}

fn default_personal_category() -> Option<String> {
    Some("Personal".to_string())
}

fn default_merchant_category() -> String {
    "Shared (50/50)".to_string()
}

fn default_unknown_person() -> String {
    "Unknown".to_string()
}

fn default_delimiter() -> String {
    "auto".to_string()
}

fn default_description_column() -> String {
    "Beskrivning".to_string()
}

fn default_amount_column() -> String {
    "Belopp".to_string()
}

fn default_date_column() -> String {
    "Datum".to_string()
}

fn default_person_column() -> String {
    "Kortmedlem".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir_string(),
            categories: default_categories(),
            people: default_people(),
            currency: default_currency(),
            split: SplitConfig::default(),
            import: ImportConfig::default(),
            csv: CsvConfig::default(),
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            shared: default_shared(),
            personal_category: default_personal_category(),
            personal_person: None,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            merchant_allow_list: None,
            merchant_category: default_merchant_category(),
            commit_scope: CommitScope::default(),
            unknown_person: default_unknown_person(),
        }
    }
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            columns: ColumnMap::default(),
        }
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            description: default_description_column(),
            amount: default_amount_column(),
            date: default_date_column(),
            person: default_person_column(),
        }
    }
}

impl Settings {
    pub fn default_category(&self) -> &str {
        self.categories.first().map(String::as_str).unwrap_or_default()
    }

    pub fn default_person(&self) -> &str {
        self.people.first().map(String::as_str).unwrap_or_default()
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn has_person(&self, person: &str) -> bool {
        self.people.iter().any(|p| p == person)
    }

    /// Person whose personal category counts toward the settlement.
    pub fn settlement_person(&self) -> Option<&str> {
        self.split
            .personal_person
            .as_deref()
            .or_else(|| self.people.first().map(String::as_str))
    }

    /// `None` means detect from the header line.
    pub fn csv_delimiter(&self) -> Result<Option<u8>> {
        let raw = self.csv.delimiter.as_str();
        if raw.eq_ignore_ascii_case("auto") {
            return Ok(None);
        }
        if raw == "\\t" || raw.eq_ignore_ascii_case("tab") {
            return Ok(Some(b'\t'));
        }
        match raw.as_bytes() {
            [b] if b.is_ascii() => Ok(Some(*b)),
            _ => Err(Error::Settings(format!(
                "csv.delimiter must be \"auto\" or a single ASCII character, got {raw:?}"
            ))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(Error::Settings("at least one category is required".to_string()));
        }
        if self.people.is_empty() {
            return Err(Error::Settings("at least one person is required".to_string()));
        }
        for split in &self.split.shared {
            if !(0.0..=1.0).contains(&split.fraction) {
                return Err(Error::Settings(format!(
                    "split fraction for {} must be between 0 and 1, got {}",
                    split.category, split.fraction
                )));
            }
            if !self.has_category(&split.category) {
                return Err(Error::Settings(format!(
                    "shared category {} is not a configured category",
                    split.category
                )));
            }
        }
        if self.import.merchant_allow_list.is_some() && !self.has_category(&self.import.merchant_category) {
            return Err(Error::Settings(format!(
                "merchant category {} is not a configured category",
                self.import.merchant_category
            )));
        }
        self.csv_delimiter()?;
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILE)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("splitbook")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("splitbook")
}

fn default_data_dir_string() -> String {
    default_data_dir().to_string_lossy().to_string()
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    let content = std::fs::read_to_string(&path).unwrap_or_default();
    match serde_json::from_str(&content) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable settings, using defaults");
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| Error::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
