// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{PAGE_LIMIT_KEY, SETTINGS, get_setting, pretty_table, set_setting};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            let mut data = Vec::new();
            for (key, default) in SETTINGS {
                let value = get_setting(conn, key)?.unwrap_or_else(|| default.to_string());
                data.push(vec![key.to_string(), value]);
            }
            println!("{}", pretty_table(&["Key", "Value"], data));
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim().replace('-', "_");
            let value = sub.get_one::<String>("value").unwrap().trim().to_string();
            set(conn, &key, &value)?;
            println!("Set {} = {}", key, value);
        }
        _ => {}
    }
    Ok(())
}

/// Validates and stores a setting.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    match key {
        PAGE_LIMIT_KEY => {
            let n: usize = value
                .parse()
                .map_err(|_| anyhow!("Invalid {} '{}', expected a positive integer", key, value))?;
            if n == 0 {
                return Err(anyhow!("{} must be at least 1", key));
            }
        }
        _ => {
            let known: Vec<&str> = SETTINGS.iter().map(|(k, _)| *k).collect();
            return Err(anyhow!(
                "Unknown setting '{}', expected one of: {}",
                key,
                known.join(", ")
            ));
        }
    }
    set_setting(conn, key, value)
}
