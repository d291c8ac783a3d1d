// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

/// Issues found by [`check`], as (kind, detail) pairs.
pub fn check(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut issues = Vec::new();

    // 1) Accounts that were never valued
    let mut stmt = conn.prepare(
        "SELECT name FROM accounts
         WHERE name NOT IN (SELECT DISTINCT account_name FROM account_values)
         ORDER BY name",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let name: String = r.get(0)?;
        issues.push(("account_without_values".to_string(), name));
    }

    // 2) Accounts missing a categorical field; reports group them under "(none)"
    let mut stmt2 = conn.prepare(
        "SELECT name, term IS NULL, type IS NULL, portfolio IS NULL, asset_class IS NULL
         FROM accounts
         WHERE term IS NULL OR type IS NULL OR portfolio IS NULL OR asset_class IS NULL
         ORDER BY name",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let name: String = r.get(0)?;
        let missing: Vec<&str> = ["term", "type", "portfolio", "asset_class"]
            .iter()
            .enumerate()
            .filter_map(|(i, field)| match r.get::<_, bool>(i + 1) {
                Ok(true) => Some(*field),
                _ => None,
            })
            .collect();
        issues.push((
            "missing_category".to_string(),
            format!("{} ({})", name, missing.join(", ")),
        ));
    }
    Ok(issues)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let rows: Vec<Vec<String>> = check(conn)?
        .into_iter()
        .map(|(kind, detail)| vec![kind, detail])
        .collect();
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
