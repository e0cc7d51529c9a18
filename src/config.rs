use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MergeError;
use crate::options::MergeOptions;
use crate::registry::AccountRegistry;
use crate::synonyms::SynonymTable;

/// On-disk configuration: header synonyms, the initial account list and
/// reader switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    pub synonyms: SynonymTable,
    pub accounts: Vec<String>,
    pub case_insensitive_headers: bool,
    pub sheet_index: usize,
    pub min_cols: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            synonyms: SynonymTable::default(),
            accounts: Vec::new(),
            case_insensitive_headers: false,
            sheet_index: 0,
            min_cols: 2,
        }
    }
}

impl MergeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, MergeError> {
        let config = serde_json::from_str::<Self>(json)?;
        config.options().validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, MergeError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    #[must_use]
    pub fn options(&self) -> MergeOptions {
        MergeOptions {
            synonyms: self.synonyms.clone(),
            case_insensitive_headers: self.case_insensitive_headers,
            sheet_index: self.sheet_index,
            min_cols: self.min_cols,
            ..MergeOptions::default()
        }
    }

    pub fn registry(&self) -> Result<AccountRegistry, MergeError> {
        AccountRegistry::from_names(&self.accounts)
    }
}
