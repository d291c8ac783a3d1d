// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::accounts::{
    Created, account_exists, create_account_if_absent, delete_all_accounts,
};
use crate::commands::values::{upsert_value, value_exists_on};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Account, AccountType, AssetClass, NewValue, Portfolio, Term};
use crate::sheet::{self, SheetSummary};
use crate::utils::{
    maybe_print_json, midnight, normalize_label, parse_amount, parse_timestamp, pretty_table,
};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use rusqlite::Connection;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

/// Counts reported after an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub accounts_created: usize,
    pub accounts_existing: usize,
    pub values_created: usize,
    pub values_updated: usize,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub cells_skipped: usize,
    pub columns_skipped: usize,
    pub accounts_cleared: usize,
    pub sentinel_line: Option<usize>,
    pub dry_run: bool,
}

impl ImportReport {
    fn rows(&self) -> Vec<Vec<String>> {
        let mut rows = vec![
            vec!["Accounts created".into(), self.accounts_created.to_string()],
            vec!["Accounts existing".into(), self.accounts_existing.to_string()],
            vec!["Values created".into(), self.values_created.to_string()],
            vec!["Values updated".into(), self.values_updated.to_string()],
            vec!["Rows read".into(), self.rows_read.to_string()],
            vec!["Rows skipped".into(), self.rows_skipped.to_string()],
            vec!["Cells skipped".into(), self.cells_skipped.to_string()],
        ];
        if self.columns_skipped > 0 {
            rows.push(vec!["Columns skipped".into(), self.columns_skipped.to_string()]);
        }
        if self.accounts_cleared > 0 {
            rows.push(vec!["Accounts cleared".into(), self.accounts_cleared.to_string()]);
        }
        if let Some(line) = self.sentinel_line {
            rows.push(vec!["Stopped at line".into(), line.to_string()]);
        }
        rows
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SheetOptions {
    /// Delete every account (and value) before writing.
    pub clear: bool,
    /// Aggregate and validate only.
    pub dry_run: bool,
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("sheet", sub)) => {
            let path = sub.get_one::<String>("path").unwrap().trim();
            let opts = SheetOptions {
                clear: sub.get_flag("clear"),
                dry_run: sub.get_flag("dry-run"),
            };
            let report = import_sheet(conn, Path::new(path), opts)?;
            print_report(sub, path, &report)
        }
        Some(("values", sub)) => {
            let path = sub.get_one::<String>("path").unwrap().trim();
            let report = import_values(conn, Path::new(path))?;
            print_report(sub, path, &report)
        }
        Some(("accounts", sub)) => {
            let path = sub.get_one::<String>("path").unwrap().trim();
            let report = import_accounts(conn, Path::new(path))?;
            print_report(sub, path, &report)
        }
        _ => Ok(()),
    }
}

fn print_report(sub: &clap::ArgMatches, path: &str, report: &ImportReport) -> Result<()> {
    if !maybe_print_json(sub.get_flag("json"), false, report)? {
        let verb = if report.dry_run { "Checked" } else { "Imported" };
        println!("{} {}", verb, path);
        println!("{}", pretty_table(&["", "Count"], report.rows()));
    }
    Ok(())
}

fn open_csv(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Open CSV {}", path.display()))
}

/// Reads a sheet export, aggregates it and writes the result.
pub fn import_sheet(conn: &mut Connection, path: &Path, opts: SheetOptions) -> Result<ImportReport> {
    let summary = sheet::aggregate(open_csv(path)?)
        .with_context(|| format!("Read sheet {}", path.display()))?;
    let report = apply_sheet(conn, &summary, opts)?;
    info!(
        path = %path.display(),
        accounts = report.accounts_created,
        values = report.values_created + report.values_updated,
        "Sheet imported"
    );
    Ok(report)
}

/// Writes an aggregated sheet: one create-if-absent per account, then one
/// upsert per (account, date) total, all in one transaction. Every account is
/// converted before anything is written so a bad label leaves the store
/// untouched.
pub fn apply_sheet(
    conn: &mut Connection,
    summary: &SheetSummary,
    opts: SheetOptions,
) -> LedgerResult<ImportReport> {
    let accounts: Vec<Account> = summary
        .accounts
        .iter()
        .map(|d| d.to_account())
        .collect::<LedgerResult<_>>()?;

    let mut report = ImportReport {
        rows_read: summary.rows_read,
        rows_skipped: summary.skipped_rows,
        cells_skipped: summary.skipped_cells,
        columns_skipped: summary.skipped_columns,
        sentinel_line: summary.sentinel_line,
        dry_run: opts.dry_run,
        ..Default::default()
    };
    if opts.dry_run {
        dry_run_counts(conn, &accounts, summary, opts, &mut report)?;
        return Ok(report);
    }

    let tx = conn.transaction()?;
    if opts.clear {
        report.accounts_cleared = delete_all_accounts(&tx)?;
    }
    for (account, draft) in accounts.iter().zip(&summary.accounts) {
        match create_account_if_absent(&tx, account)? {
            Created::New => report.accounts_created += 1,
            Created::Existing => report.accounts_existing += 1,
        }
        for (date, total) in &draft.totals {
            let outcome = upsert_value(&tx, &NewValue::new(&account.name, *total, midnight(*date)))?;
            if outcome.is_created() {
                report.values_created += 1;
            } else {
                report.values_updated += 1;
            }
        }
    }
    tx.commit()?;
    Ok(report)
}

/// Fills in what a real run would create and update, without writing.
fn dry_run_counts(
    conn: &Connection,
    accounts: &[Account],
    summary: &SheetSummary,
    opts: SheetOptions,
    report: &mut ImportReport,
) -> LedgerResult<()> {
    if opts.clear {
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |r| r.get(0))?;
        report.accounts_cleared = n as usize;
        report.accounts_created = accounts.len();
        report.values_created = summary.value_count();
        return Ok(());
    }
    for (account, draft) in accounts.iter().zip(&summary.accounts) {
        if !account_exists(conn, &account.name)? {
            report.accounts_created += 1;
            report.values_created += draft.totals.len();
            continue;
        }
        report.accounts_existing += 1;
        for date in draft.totals.keys() {
            if value_exists_on(conn, &account.name, *date)? {
                report.values_updated += 1;
            } else {
                report.values_created += 1;
            }
        }
    }
    Ok(())
}

fn column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.trim();
        names.iter().any(|n| h.eq_ignore_ascii_case(n))
    })
}

fn required_column(headers: &StringRecord, names: &[&str]) -> LedgerResult<usize> {
    column(headers, names).ok_or_else(|| {
        LedgerError::Validation(format!("Missing required column '{}'", names[0]))
    })
}

/// Imports a long-format CSV (`Account, Value, Date`). Each row is upserted on
/// its own, so a later row for the same account and day replaces an earlier
/// one. Unknown accounts abort the import.
pub fn import_values(conn: &mut Connection, path: &Path) -> Result<ImportReport> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(open_csv(path)?);
    let headers = rdr.headers()?.clone();
    let acct_col = required_column(&headers, &["account", "account_name"])?;
    let amount_col = required_column(&headers, &["value", "amount"])?;
    let date_col = required_column(&headers, &["date"])?;

    let tx = conn.transaction()?;
    let mut report = ImportReport::default();
    for result in rdr.records() {
        let rec = result?;
        let line = rec.position().map(|p| p.line()).unwrap_or_default();
        report.rows_read += 1;
        let account = rec.get(acct_col).unwrap_or("").trim();
        let amount = parse_amount(rec.get(amount_col).unwrap_or(""))
            .with_context(|| format!("Line {}", line))?;
        let date = parse_timestamp(rec.get(date_col).unwrap_or(""));
        let (amount, date) = match (account.is_empty(), amount, date) {
            (false, Some(a), Ok(d)) => (a, d),
            _ => {
                warn!(line, "Skipping value row with missing account, amount or date");
                report.rows_skipped += 1;
                continue;
            }
        };
        let outcome = upsert_value(&tx, &NewValue::new(account, amount, date))
            .with_context(|| format!("Line {}", line))?;
        if outcome.is_created() {
            report.values_created += 1;
        } else {
            report.values_updated += 1;
        }
    }
    tx.commit()?;
    Ok(report)
}

struct AccountColumns {
    description: Option<usize>,
    term: Option<usize>,
    r#type: Option<usize>,
    portfolio: Option<usize>,
    asset_class: Option<usize>,
}

fn account_from_record<F>(name: &str, field: F, columns: &AccountColumns) -> LedgerResult<Account>
where
    F: Fn(Option<usize>) -> Option<String>,
{
    let mut account = Account::new(name);
    account.description = field(columns.description);
    account.term = field(columns.term).map(|v| v.parse::<Term>()).transpose()?;
    account.r#type = field(columns.r#type).map(|v| v.parse::<AccountType>()).transpose()?;
    account.portfolio = field(columns.portfolio).map(|v| v.parse::<Portfolio>()).transpose()?;
    account.asset_class = field(columns.asset_class).map(|v| v.parse::<AssetClass>()).transpose()?;
    account.validate()?;
    Ok(account)
}

/// Imports account definitions (`name` plus optional `description, term, type,
/// portfolio, asset_class` columns). Existing accounts are left as they are.
pub fn import_accounts(conn: &mut Connection, path: &Path) -> Result<ImportReport> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(open_csv(path)?);
    let headers = rdr.headers()?.clone();
    let name_col = required_column(&headers, &["name", "account"])?;
    let columns = AccountColumns {
        description: column(&headers, &["description"]),
        term: column(&headers, &["term"]),
        r#type: column(&headers, &["type"]),
        portfolio: column(&headers, &["portfolio"]),
        asset_class: column(&headers, &["asset_class", "asset class"]),
    };

    let field = |rec: &StringRecord, col: Option<usize>| {
        col.and_then(|c| rec.get(c)).and_then(normalize_label)
    };

    let tx = conn.transaction()?;
    let mut report = ImportReport::default();
    for result in rdr.records() {
        let rec = result?;
        let line = rec.position().map(|p| p.line()).unwrap_or_default();
        report.rows_read += 1;
        let name = rec.get(name_col).unwrap_or("").trim();
        if name.is_empty() {
            warn!(line, "Skipping account row without name");
            report.rows_skipped += 1;
            continue;
        }
        let account = account_from_record(name, |col| field(&rec, col), &columns)
            .with_context(|| format!("Line {}", line))?;
        match create_account_if_absent(&tx, &account).with_context(|| format!("Line {}", line))? {
            Created::New => report.accounts_created += 1,
            Created::Existing => report.accounts_existing += 1,
        }
    }
    tx.commit()?;
    Ok(report)
}
