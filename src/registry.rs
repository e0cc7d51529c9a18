use std::collections::HashMap;

use serde::Serialize;

use crate::error::MergeError;
use crate::model::{AccountUpload, UploadedFile};

/// Ordered set of marketplace account names offered for upload.
///
/// Mutations consume the registry and return the updated value, so the
/// caller owns where the current list lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccountRegistry {
    names: Vec<String>,
}

impl AccountRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Result<Self, MergeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .try_fold(Self::new(), |registry, name| registry.with_account(name.as_ref()))
    }

    pub fn with_account(mut self, name: &str) -> Result<Self, MergeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MergeError::EmptyAccountName);
        }
        if self.contains(name) {
            return Err(MergeError::DuplicateAccount(name.to_string()));
        }

        self.names.push(name.to_string());
        Ok(self)
    }

    pub fn without_account(mut self, name: &str) -> Result<Self, MergeError> {
        let name = name.trim();
        let position = self
            .names
            .iter()
            .position(|existing| existing == name)
            .ok_or_else(|| MergeError::UnknownAccount(name.to_string()))?;

        self.names.remove(position);
        Ok(self)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim();
        self.names.iter().any(|existing| existing == name)
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Pairs every registered account with its uploaded file, in registry
    /// order. Accounts without a file are kept so they can be reported.
    pub fn uploads<I>(&self, files: I) -> Result<Vec<AccountUpload>, MergeError>
    where
        I: IntoIterator<Item = (String, UploadedFile)>,
    {
        let mut by_account = HashMap::new();
        for (account, file) in files {
            let account = account.trim().to_string();
            if !self.contains(&account) {
                return Err(MergeError::UnknownAccount(account));
            }
            if by_account.insert(account.clone(), file).is_some() {
                return Err(MergeError::DuplicateAccount(account));
            }
        }

        Ok(self
            .names
            .iter()
            .map(|name| AccountUpload {
                account: name.clone(),
                file: by_account.remove(name),
            })
            .collect())
    }
}
