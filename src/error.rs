// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Errors surfaced by the account registry, the value ledger and the importers.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{what} '{key}' not found")]
    NotFound { what: &'static str, key: String },

    #[error("Account with name '{0}' already exists")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    /// The same account appeared with different categorical attributes while
    /// importing. Aborts the whole import.
    #[error(
        "Account '{account}' has inconsistent attributes across rows. \
         Existing: {existing}. Row {row}: {found}"
    )]
    InconsistentAttributes {
        account: String,
        row: usize,
        existing: String,
        found: String,
    },

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl LedgerError {
    pub fn account_not_found(name: &str) -> Self {
        LedgerError::NotFound {
            what: "Account",
            key: name.to_string(),
        }
    }

    pub fn value_not_found(id: &str) -> Self {
        LedgerError::NotFound {
            what: "Value",
            key: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound { .. })
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
