// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{DAY_FMT, TIMESTAMP_FMT};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("values", sub)) => export_values(conn, sub),
        _ => Ok(()),
    }
}

fn export_values(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().trim().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap().trim();

    let mut stmt = conn.prepare(
        "SELECT v.date, v.account_name, v.amount, a.term, a.type, a.portfolio, a.asset_class
         FROM account_values v
         JOIN accounts a ON v.account_name=a.name
         ORDER BY v.date, v.account_name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, Option<String>>(3)?,
            r.get::<_, Option<String>>(4)?,
            r.get::<_, Option<String>>(5)?,
            r.get::<_, Option<String>>(6)?,
        ))
    })?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out).with_context(|| format!("Create {}", out))?;
            wtr.write_record([
                "date",
                "account",
                "amount",
                "term",
                "type",
                "portfolio",
                "asset_class",
            ])?;
            for row in rows {
                let (d, a, amt, term, typ, portfolio, class) = row?;
                wtr.write_record([
                    day_of(&d)?,
                    a,
                    amt,
                    term.unwrap_or_default(),
                    typ.unwrap_or_default(),
                    portfolio.unwrap_or_default(),
                    class.unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let mut items = Vec::new();
            for row in rows {
                let (d, a, amt, term, typ, portfolio, class) = row?;
                let amount: f64 = amt
                    .parse()
                    .with_context(|| format!("Invalid stored amount '{}' for {}", amt, a))?;
                items.push(json!({
                    "date": day_of(&d)?, "account": a, "amount": amount, "term": term,
                    "type": typ, "portfolio": portfolio, "asset_class": class
                }));
            }
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        _ => return Err(anyhow!("Unknown format: {} (use csv|json)", fmt)),
    }
    println!("Exported values to {}", out);
    Ok(())
}

fn day_of(stored: &str) -> Result<String> {
    let dt = NaiveDateTime::parse_from_str(stored, TIMESTAMP_FMT)
        .with_context(|| format!("Invalid stored date '{}'", stored))?;
    Ok(dt.format(DAY_FMT).to_string())
}
