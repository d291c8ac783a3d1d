// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Aggregation of a net worth sheet export into one amount per account per
//! calendar day.
//!
//! The sheet has six attribute columns (Description, Term, Type, Portfolio,
//! Asset Class, Account) followed by one column per date. Data rows end at the
//! first row whose Description is empty; the summary rows below it are never
//! read. Several rows may describe the same account: their amounts are summed
//! per date, and their categorical attributes must agree.

use crate::error::{LedgerError, LedgerResult};
use crate::models::Account;
use crate::utils::{accumulate, normalize_label, parse_amount, parse_date_label};
use chrono::NaiveDate;
use csv::{ByteRecord, ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, hash_map::Entry};
use std::fmt;
use std::io::Read;
use std::str::FromStr;
use tracing::{debug, warn};

/// Column positions of a sheet export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    /// Also the sentinel column: an empty cell here ends the data rows.
    pub description: usize,
    pub term: usize,
    pub r#type: usize,
    pub portfolio: usize,
    pub asset_class: usize,
    pub account: usize,
    pub first_date: usize,
}

impl Default for SheetLayout {
    fn default() -> Self {
        SheetLayout {
            description: 0,
            term: 1,
            r#type: 2,
            portfolio: 3,
            asset_class: 4,
            account: 5,
            first_date: 6,
        }
    }
}

/// Categorical attributes as written in the sheet, trimmed, `none` removed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Attributes {
    pub term: Option<String>,
    pub r#type: Option<String>,
    pub portfolio: Option<String>,
    pub asset_class: Option<String>,
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "None".to_string());
        write!(
            f,
            "term={}, type={}, portfolio={}, asset_class={}",
            show(&self.term),
            show(&self.r#type),
            show(&self.portfolio),
            show(&self.asset_class)
        )
    }
}

/// Everything collected for one account across its rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountDraft {
    pub name: String,
    pub attributes: Attributes,
    pub descriptions: Vec<String>,
    pub totals: BTreeMap<NaiveDate, Decimal>,
    pub rows: usize,
}

fn parse_label<T>(account: &str, label: &Option<String>) -> LedgerResult<Option<T>>
where
    T: FromStr<Err = LedgerError>,
{
    label
        .as_deref()
        .map(|s| {
            s.parse::<T>().map_err(|e| {
                LedgerError::Validation(format!("Account '{}': {}", account, e))
            })
        })
        .transpose()
}

impl AccountDraft {
    fn new(name: String, attributes: Attributes) -> Self {
        AccountDraft {
            name,
            attributes,
            descriptions: Vec::new(),
            totals: BTreeMap::new(),
            rows: 0,
        }
    }

    /// Descriptions of all contributing rows, joined in row order.
    pub fn description(&self) -> Option<String> {
        if self.descriptions.is_empty() {
            None
        } else {
            Some(self.descriptions.join("; "))
        }
    }

    /// Typed account record. Unknown category labels are a validation error.
    pub fn to_account(&self) -> LedgerResult<Account> {
        let account = Account {
            name: self.name.clone(),
            description: self.description(),
            term: parse_label(&self.name, &self.attributes.term)?,
            r#type: parse_label(&self.name, &self.attributes.r#type)?,
            portfolio: parse_label(&self.name, &self.attributes.portfolio)?,
            asset_class: parse_label(&self.name, &self.attributes.asset_class)?,
        };
        account.validate()?;
        Ok(account)
    }
}

/// Result of aggregating a sheet.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SheetSummary {
    /// In order of first appearance.
    pub accounts: Vec<AccountDraft>,
    pub date_columns: usize,
    pub skipped_columns: usize,
    pub rows_read: usize,
    pub skipped_rows: usize,
    pub skipped_cells: usize,
    /// Line of the summary row that ended the data, if one was found.
    pub sentinel_line: Option<usize>,
}

impl SheetSummary {
    pub fn value_count(&self) -> usize {
        self.accounts.iter().map(|a| a.totals.len()).sum()
    }
}

/// Grouping state while rows are fed in.
pub struct SheetBuilder {
    layout: SheetLayout,
    dates: Vec<Option<NaiveDate>>,
    index: HashMap<String, usize>,
    summary: SheetSummary,
}

fn cell(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

impl SheetBuilder {
    pub fn new(layout: SheetLayout, header: &StringRecord) -> Self {
        let mut summary = SheetSummary::default();
        let dates: Vec<Option<NaiveDate>> = header
            .iter()
            .enumerate()
            .skip(layout.first_date)
            .map(|(col, label)| {
                let label = label.trim();
                if label.is_empty() {
                    return None;
                }
                let parsed = parse_date_label(label);
                if parsed.is_none() {
                    warn!(column = col + 1, label, "Skipping column with unparseable date label");
                    summary.skipped_columns += 1;
                }
                parsed
            })
            .collect();
        summary.date_columns = dates.iter().flatten().count();
        SheetBuilder {
            layout,
            dates,
            index: HashMap::new(),
            summary,
        }
    }

    /// Feeds one data row. Returns `Ok(false)` once the summary row is
    /// reached; callers must stop feeding rows at that point.
    pub fn push_row(&mut self, line: usize, record: &StringRecord) -> LedgerResult<bool> {
        if self.summary.sentinel_line.is_some() {
            return Ok(false);
        }
        let l = self.layout;
        let raw_description = cell(record, l.description);
        if raw_description.trim().is_empty() {
            debug!(line, "Reached summary rows, stopping");
            self.summary.sentinel_line = Some(line);
            return Ok(false);
        }
        self.summary.rows_read += 1;

        let name = cell(record, l.account).trim();
        if name.is_empty() {
            warn!(line, "Skipping row without account name");
            self.summary.skipped_rows += 1;
            return Ok(true);
        }

        let attributes = Attributes {
            term: normalize_label(cell(record, l.term)),
            r#type: normalize_label(cell(record, l.r#type)),
            portfolio: normalize_label(cell(record, l.portfolio)),
            asset_class: normalize_label(cell(record, l.asset_class)),
        };

        let pos = match self.index.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                let pos = *entry.get();
                let existing = &self.summary.accounts[pos].attributes;
                if *existing != attributes {
                    return Err(LedgerError::InconsistentAttributes {
                        account: name.to_string(),
                        row: line,
                        existing: existing.to_string(),
                        found: attributes.to_string(),
                    });
                }
                pos
            }
            Entry::Vacant(entry) => {
                let pos = self.summary.accounts.len();
                self.summary
                    .accounts
                    .push(AccountDraft::new(name.to_string(), attributes));
                *entry.insert(pos)
            }
        };

        let draft = &mut self.summary.accounts[pos];
        draft.rows += 1;
        if let Some(desc) = normalize_label(raw_description) {
            if !draft.descriptions.contains(&desc) {
                draft.descriptions.push(desc);
            }
        }

        for (offset, date) in self.dates.iter().enumerate() {
            let Some(date) = date else { continue };
            let raw = cell(record, l.first_date + offset).trim();
            if raw.is_empty() {
                continue;
            }
            let parsed = parse_amount(raw).map_err(|e| {
                LedgerError::Validation(format!(
                    "Account '{}' on {} (line {}): {}",
                    name, date, line, e
                ))
            })?;
            match parsed {
                Some(amount) => {
                    let total = draft.totals.entry(*date).or_insert(Decimal::ZERO);
                    accumulate(total, amount, || format!("account '{}' on {}", name, date))?;
                }
                None => {
                    debug!(line, account = name, %date, cell = raw, "Skipping non-numeric cell");
                    self.summary.skipped_cells += 1;
                }
            }
        }
        Ok(true)
    }

    pub fn finish(self) -> SheetSummary {
        self.summary
    }
}

/// Aggregates a CSV export of the sheet with the default column layout.
pub fn aggregate<R: Read>(reader: R) -> LedgerResult<SheetSummary> {
    aggregate_with(reader, SheetLayout::default())
}

pub fn aggregate_with<R: Read>(reader: R, layout: SheetLayout) -> LedgerResult<SheetSummary> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let header = decode(rdr.byte_headers()?, 1);
    let mut builder = SheetBuilder::new(layout, &header);
    for (i, result) in rdr.byte_records().enumerate() {
        let bytes = result?;
        let line = bytes
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(i + 2);
        if !builder.push_row(line, &decode(&bytes, line))? {
            break;
        }
    }
    Ok(builder.finish())
}

/// Exports saved in a legacy code page (a bare `£` is byte 0xA3) are read
/// with invalid bytes replaced, so one odd cell does not sink the sheet.
fn decode(bytes: &ByteRecord, line: usize) -> StringRecord {
    StringRecord::from_byte_record(bytes.clone()).unwrap_or_else(|_| {
        warn!(line, "Row is not valid UTF-8, replacing invalid bytes");
        bytes.iter().map(String::from_utf8_lossy).collect()
    })
}
