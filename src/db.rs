// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Networth", "networth"));

/// Default location in the platform data directory.
pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("networth.sqlite"))
}

/// Resolves the database path: an explicit override (`--db` / `NETWORTH_DB`)
/// wins over the platform default.
pub fn resolve_path(override_path: Option<&Path>) -> Result<PathBuf> {
    match override_path {
        Some(p) => {
            if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            Ok(p.to_path_buf())
        }
        None => db_path(),
    }
}

pub fn open_or_init(override_path: Option<&Path>) -> Result<Connection> {
    let path = resolve_path(override_path)?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("Open in-memory DB")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE CHECK(length(name) BETWEEN 1 AND 100),
        description TEXT,
        term TEXT CHECK(term IN ('Short Term','Long Term')),
        type TEXT CHECK(type IN ('Asset','Liability')),
        portfolio TEXT CHECK(portfolio IN ('Liquid','Illiquid','Cash Reserves')),
        asset_class TEXT CHECK(asset_class IN ('Cash','Equities','Crypto','Real Estate')),
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    -- one observation per account per calendar day; `day` is date(`date`)
    CREATE TABLE IF NOT EXISTS account_values(
        id TEXT PRIMARY KEY,
        account_name TEXT NOT NULL,
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        day TEXT NOT NULL,
        UNIQUE(account_name, day),
        FOREIGN KEY(account_name) REFERENCES accounts(name) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_account_values_date ON account_values(date);
    "#,
    )?;
    Ok(())
}
