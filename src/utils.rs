// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, LedgerResult};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

/// Storage and display format for value timestamps.
pub const TIMESTAMP_FMT: &str = "%Y-%m-%dT%H:%M:%S%.f";
pub const DAY_FMT: &str = "%Y-%m-%d";

const DATETIME_INPUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

// Extra header spellings seen in sheet exports. Slashed dates are month first.
const LABEL_INPUTS: &[&str] = &["%m/%d/%Y", "%d-%b-%Y", "%d %b %Y", "%d %B %Y", "%b %d, %Y"];

static AMOUNT_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[£$€\x{FFFD},\s]").expect("amount noise pattern"));

pub fn midnight(d: NaiveDate) -> NaiveDateTime {
    d.and_time(NaiveTime::default())
}

/// Parses an observation timestamp. A bare date means midnight; an RFC 3339
/// offset is dropped and the wall-clock time kept.
pub fn parse_timestamp(s: &str) -> LedgerResult<NaiveDateTime> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, DAY_FMT) {
        return Ok(midnight(d));
    }
    for fmt in DATETIME_INPUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    Err(LedgerError::Validation(format!(
        "Invalid date '{}', expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS",
        s
    )))
}

pub fn parse_date(s: &str) -> LedgerResult<NaiveDate> {
    parse_timestamp(s).map(|dt| dt.date())
}

/// Parses a sheet header label into a calendar date, or `None` when the label
/// is not a date.
pub fn parse_date_label(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = parse_timestamp(s) {
        return Some(dt.date());
    }
    for fmt in LABEL_INPUTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    // "Jan 2024" -> first of the month
    let padded = format!("1 {}", s);
    ["%d %b %Y", "%d %B %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&padded, fmt).ok())
}

/// Lenient amount parsing for spreadsheet cells. Currency symbols, thousands
/// separators and accounting parentheses are accepted; anything else that is
/// not a number yields `Ok(None)`. A number too large or too precise for
/// `Decimal` is a validation error rather than a skipped cell.
pub fn parse_amount(s: &str) -> LedgerResult<Option<Decimal>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let (negative, body) = match trimmed.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };
    let cleaned = AMOUNT_NOISE.replace_all(body, "");
    if cleaned.is_empty() {
        return Ok(None);
    }
    let value = match cleaned
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(&cleaned).ok())
    {
        Some(v) => v,
        None if cleaned.parse::<f64>().is_ok_and(f64::is_finite) => {
            return Err(LedgerError::Validation(format!(
                "Amount '{}' is outside the supported range",
                trimmed
            )));
        }
        None => return Ok(None),
    };
    Ok(Some(if negative { -value } else { value }))
}

/// Adds `amount` to `total`, failing instead of overflowing. `what` names the
/// total in the error.
pub fn accumulate<F>(total: &mut Decimal, amount: Decimal, what: F) -> LedgerResult<()>
where
    F: FnOnce() -> String,
{
    *total = total.checked_add(amount).ok_or_else(|| {
        LedgerError::Validation(format!(
            "Total for {} exceeds the supported amount range",
            what()
        ))
    })?;
    Ok(())
}

/// Strict amount parsing for values typed on the command line.
pub fn parse_decimal(s: &str) -> LedgerResult<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|_| LedgerError::Validation(format!("Invalid amount '{}'", s.trim())))
}

/// Trims a categorical cell; empty text and `none` in any case mean absent.
pub fn normalize_label(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(t.to_string())
    }
}

pub fn fmt_timestamp(dt: &NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FMT).to_string()
}

pub fn fmt_amount(d: &Decimal) -> String {
    format!("{:.2}", d)
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

// Settings

pub const PAGE_LIMIT_KEY: &str = "page_limit";
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Known settings with their defaults.
pub const SETTINGS: &[(&str, &str)] = &[(PAGE_LIMIT_KEY, "100")];

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn page_limit(conn: &Connection) -> Result<usize> {
    match get_setting(conn, PAGE_LIMIT_KEY)? {
        Some(v) => v
            .parse::<usize>()
            .with_context(|| format!("Invalid {} setting '{}'", PAGE_LIMIT_KEY, v)),
        None => Ok(DEFAULT_PAGE_LIMIT),
    }
}
