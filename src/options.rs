use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::MergeError;
use crate::synonyms::SynonymTable;

/// What to do with PDF tables whose row widths disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityMode {
    BestEffort,
    Strict,
    SkipAmbiguous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut pages = BTreeSet::new();
        for token in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start: u32 = start
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range start: '{start}'"))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range end: '{end}'"))?;
                if start == 0 || end == 0 {
                    return Err("pages are 1-based".to_string());
                }
                if end < start {
                    return Err(format!(
                        "invalid range '{token}': end is smaller than start"
                    ));
                }
                pages.extend(start..=end);
            } else {
                let page: u32 = token
                    .parse()
                    .map_err(|_| format!("invalid page number: '{token}'"))?;
                if page == 0 {
                    return Err("pages are 1-based".to_string());
                }
                pages.insert(page);
            }
        }

        if pages.is_empty() {
            return Err("page selection cannot be empty".to_string());
        }

        Ok(Self { pages })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOptions {
    pub synonyms: SynonymTable,
    pub case_insensitive_headers: bool,
    /// Field delimiter of uploaded CSV files.
    pub delimiter: u8,
    /// Zero-based sheet to read from spreadsheet uploads.
    pub sheet_index: usize,
    pub pages: Option<PageSelection>,
    pub min_cols: usize,
    pub quality_mode: QualityMode,
}

impl MergeOptions {
    pub(crate) fn validate(&self) -> Result<(), MergeError> {
        if self.min_cols < 2 {
            return Err(MergeError::InvalidOption(
                "min_cols must be at least 2".to_string(),
            ));
        }
        if !self.delimiter.is_ascii() {
            return Err(MergeError::InvalidOption(
                "delimiter must be a single ASCII character".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            synonyms: SynonymTable::default(),
            case_insensitive_headers: false,
            delimiter: b',',
            sheet_index: 0,
            pages: None,
            min_cols: 2,
            quality_mode: QualityMode::BestEffort,
        }
    }
}
