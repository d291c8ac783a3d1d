// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, LedgerResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const MAX_ACCOUNT_NAME_LEN: usize = 100;

fn fold_label(s: &str) -> String {
    s.trim().to_lowercase().replace(['-', '_'], " ")
}

/// Categorical account field stored and serialized by its display label.
macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = fold_label(s);
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| fold_label(v.as_str()) == wanted)
                    .ok_or_else(|| {
                        let labels: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        LedgerError::Validation(format!(
                            "Invalid {} '{}', expected one of: {}",
                            $field,
                            s.trim(),
                            labels.join(", ")
                        ))
                    })
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: LedgerError| FromSqlError::Other(e.to_string().into()))
            }
        }
    };
}

labelled_enum!(Term, "term" {
    ShortTerm => "Short Term",
    LongTerm => "Long Term",
});

labelled_enum!(AccountType, "type" {
    Asset => "Asset",
    Liability => "Liability",
});

labelled_enum!(Portfolio, "portfolio" {
    Liquid => "Liquid",
    Illiquid => "Illiquid",
    CashReserves => "Cash Reserves",
});

labelled_enum!(AssetClass, "asset class" {
    Cash => "Cash",
    Equities => "Equities",
    Crypto => "Crypto",
    RealEstate => "Real Estate",
});

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub term: Option<Term>,
    #[serde(default)]
    pub r#type: Option<AccountType>,
    #[serde(default)]
    pub portfolio: Option<Portfolio>,
    #[serde(default)]
    pub asset_class: Option<AssetClass>,
}

impl Account {
    pub fn new(name: impl Into<String>) -> Self {
        Account {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Copy with the name trimmed, the form in which names are stored.
    pub fn trimmed(&self) -> Account {
        Account {
            name: self.name.trim().to_string(),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::Validation("Account name is required".into()));
        }
        if self.name.chars().count() > MAX_ACCOUNT_NAME_LEN {
            return Err(LedgerError::Validation(format!(
                "Account name '{}' is longer than {} characters",
                self.name, MAX_ACCOUNT_NAME_LEN
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub id: String,
    pub account_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub date: NaiveDateTime,
}

impl Value {
    /// Calendar day the observation counts for.
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewValue {
    pub account_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub date: NaiveDateTime,
}

impl NewValue {
    pub fn new(account_name: impl Into<String>, amount: Decimal, date: NaiveDateTime) -> Self {
        NewValue {
            account_name: account_name.into(),
            amount,
            date,
        }
    }
}
