// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, LedgerResult};
use crate::models::Account;
use crate::utils::{maybe_print_json, page_limit, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

const ACCOUNT_COLUMNS: &str = "name, description, term, type, portfolio, asset_class";

/// Outcome of [`create_account_if_absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Created {
    New,
    Existing,
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            delete_account(conn, name)?;
            println!("Removed account '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut account = Account::new(sub.get_one::<String>("name").unwrap().trim());
    account.description = sub
        .get_one::<String>("description")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if let Some(t) = sub.get_one::<String>("term") {
        account.term = Some(t.parse()?);
    }
    if let Some(t) = sub.get_one::<String>("type") {
        account.r#type = Some(t.parse()?);
    }
    if let Some(p) = sub.get_one::<String>("portfolio") {
        account.portfolio = Some(p.parse()?);
    }
    if let Some(a) = sub.get_one::<String>("asset-class") {
        account.asset_class = Some(a.parse()?);
    }
    create_account(conn, &account)?;
    println!("Added account '{}'", account.name);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let skip = sub.get_one::<usize>("skip").copied().unwrap_or(0);
    let limit = match sub.get_one::<usize>("limit") {
        Some(l) => *l,
        None => page_limit(conn)?,
    };
    let data = list_accounts(conn, skip, limit)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data.iter().map(account_cells).collect();
        println!(
            "{}",
            pretty_table(
                &["Name", "Term", "Type", "Portfolio", "Asset Class", "Description"],
                rows,
            )
        );
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim();
    let account = get_account(conn, name)?;
    if !maybe_print_json(sub.get_flag("json"), false, &account)? {
        println!(
            "{}",
            pretty_table(
                &["Name", "Term", "Type", "Portfolio", "Asset Class", "Description"],
                vec![account_cells(&account)],
            )
        );
    }
    Ok(())
}

fn account_cells(a: &Account) -> Vec<String> {
    let label = |v: Option<&'static str>| v.unwrap_or("").to_string();
    vec![
        a.name.clone(),
        label(a.term.map(|t| t.as_str())),
        label(a.r#type.map(|t| t.as_str())),
        label(a.portfolio.map(|p| p.as_str())),
        label(a.asset_class.map(|c| c.as_str())),
        a.description.clone().unwrap_or_default(),
    ]
}

fn account_from_row(r: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        name: r.get(0)?,
        description: r.get(1)?,
        term: r.get(2)?,
        r#type: r.get(3)?,
        portfolio: r.get(4)?,
        asset_class: r.get(5)?,
    })
}

pub fn account_exists(conn: &Connection, name: &str) -> LedgerResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM accounts WHERE name=?1",
            params![name],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn insert_account(conn: &Connection, account: &Account) -> LedgerResult<usize> {
    let n = conn.execute(
        "INSERT INTO accounts(name, description, term, type, portfolio, asset_class)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(name) DO NOTHING",
        params![
            account.name,
            account.description,
            account.term,
            account.r#type,
            account.portfolio,
            account.asset_class
        ],
    )?;
    Ok(n)
}

/// Creates an account under its trimmed name. Fails with `Conflict` if the
/// name is taken.
pub fn create_account(conn: &Connection, account: &Account) -> LedgerResult<Account> {
    let account = account.trimmed();
    account.validate()?;
    if account_exists(conn, &account.name)? {
        return Err(LedgerError::Conflict(account.name));
    }
    insert_account(conn, &account)?;
    Ok(account)
}

/// Idempotent create used by the importers: an existing account with the same
/// trimmed name is left untouched.
pub fn create_account_if_absent(conn: &Connection, account: &Account) -> LedgerResult<Created> {
    let account = account.trimmed();
    account.validate()?;
    match insert_account(conn, &account)? {
        0 => Ok(Created::Existing),
        _ => Ok(Created::New),
    }
}

pub fn get_account(conn: &Connection, name: &str) -> LedgerResult<Account> {
    conn.query_row(
        &format!("SELECT {} FROM accounts WHERE name=?1", ACCOUNT_COLUMNS),
        params![name],
        account_from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::account_not_found(name))
}

/// Page of accounts. Callers must not rely on the order.
pub fn list_accounts(conn: &Connection, skip: usize, limit: usize) -> LedgerResult<Vec<Account>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM accounts ORDER BY name LIMIT ?1 OFFSET ?2",
        ACCOUNT_COLUMNS
    ))?;
    let rows = stmt.query_map(params![limit as i64, skip as i64], account_from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

/// Deletes an account together with all of its values.
pub fn delete_account(conn: &Connection, name: &str) -> LedgerResult<()> {
    let n = conn.execute("DELETE FROM accounts WHERE name=?1", params![name])?;
    if n == 0 {
        return Err(LedgerError::account_not_found(name));
    }
    Ok(())
}

/// Removes every account (and through the cascade every value). Returns the
/// number of accounts removed.
pub fn delete_all_accounts(conn: &Connection) -> LedgerResult<usize> {
    let n = conn.execute("DELETE FROM accounts", [])?;
    Ok(n)
}
