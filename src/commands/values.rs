// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::accounts::account_exists;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{NewValue, Value};
use crate::utils::{
    DAY_FMT, TIMESTAMP_FMT, fmt_amount, fmt_timestamp, maybe_print_json, page_limit,
    parse_date, parse_decimal, parse_timestamp, pretty_table,
};
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Outcome of [`upsert_value`].
#[derive(Debug, Clone, PartialEq)]
pub enum Upsert {
    Created(Value),
    Updated(Value),
}

impl Upsert {
    pub fn value(&self) -> &Value {
        match self {
            Upsert::Created(v) | Upsert::Updated(v) => v,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Upsert::Created(_))
    }
}

/// Selection for [`list_values`]. Date bounds are inclusive calendar days.
#[derive(Debug, Clone, Default)]
pub struct ValueFilter {
    pub account: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub skip: usize,
    pub limit: Option<usize>,
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("history", sub)) => history(conn, sub)?,
        Some(("rm", sub)) => {
            let id = sub.get_one::<String>("id").unwrap().trim();
            delete_value(conn, id)?;
            println!("Removed value {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let account = sub.get_one::<String>("account").unwrap().trim();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_timestamp(d)?,
        None => chrono::Local::now().naive_local(),
    };
    let outcome = upsert_value(conn, &NewValue::new(account, amount, date))?;
    let verb = if outcome.is_created() { "Recorded" } else { "Updated" };
    println!(
        "{} {} for '{}' on {}",
        verb,
        fmt_amount(&outcome.value().amount),
        account,
        outcome.value().day()
    );
    Ok(())
}

fn range_args(sub: &clap::ArgMatches) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
    let from = sub.get_one::<String>("from").map(|s| parse_date(s)).transpose()?;
    let to = sub.get_one::<String>("to").map(|s| parse_date(s)).transpose()?;
    Ok((from, to))
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (from, to) = range_args(sub)?;
    let limit = match sub.get_one::<usize>("limit") {
        Some(l) => *l,
        None => page_limit(conn)?,
    };
    let filter = ValueFilter {
        account: sub.get_one::<String>("account").map(|s| s.trim().to_string()),
        from,
        to,
        skip: sub.get_one::<usize>("skip").copied().unwrap_or(0),
        limit: Some(limit),
    };
    let data = list_values(conn, &filter)?;
    print_values(sub, &data)
}

fn history(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("account").unwrap().trim();
    let (from, to) = range_args(sub)?;
    let data = values_for_account(conn, name, from, to)?;
    print_values(sub, &data)
}

fn print_values(sub: &clap::ArgMatches, data: &[Value]) -> Result<()> {
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|v| {
                vec![
                    v.date.format("%Y-%m-%d %H:%M").to_string(),
                    v.account_name.clone(),
                    fmt_amount(&v.amount),
                    v.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Account", "Amount", "Id"], rows)
        );
    }
    Ok(())
}

fn conversion_failure<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn value_from_row(r: &Row<'_>) -> rusqlite::Result<Value> {
    let amount: String = r.get(2)?;
    let date: String = r.get(3)?;
    Ok(Value {
        id: r.get(0)?,
        account_name: r.get(1)?,
        amount: amount
            .parse::<Decimal>()
            .map_err(|e| conversion_failure(2, e))?,
        date: NaiveDateTime::parse_from_str(&date, TIMESTAMP_FMT)
            .map_err(|e| conversion_failure(3, e))?,
    })
}

/// Inserts an observation, or overwrites amount and timestamp of the one
/// already recorded for the same account on the same calendar day. The row
/// keeps its id across updates.
pub fn upsert_value(conn: &Connection, value: &NewValue) -> LedgerResult<Upsert> {
    let account_name = value.account_name.trim();
    if account_name.is_empty() {
        return Err(LedgerError::Validation("Account name is required".into()));
    }
    if !account_exists(conn, account_name)? {
        return Err(LedgerError::account_not_found(account_name));
    }
    let new_id = Uuid::new_v4().to_string();
    let stored = conn.query_row(
        "INSERT INTO account_values(id, account_name, amount, date, day)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(account_name, day) DO UPDATE
            SET amount=excluded.amount, date=excluded.date
         RETURNING id, account_name, amount, date",
        params![
            new_id,
            account_name,
            value.amount.to_string(),
            fmt_timestamp(&value.date),
            value.date.format(DAY_FMT).to_string()
        ],
        value_from_row,
    )?;
    if stored.id == new_id {
        Ok(Upsert::Created(stored))
    } else {
        Ok(Upsert::Updated(stored))
    }
}

/// Whether the account already has an observation on `day`.
pub fn value_exists_on(conn: &Connection, account_name: &str, day: NaiveDate) -> LedgerResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM account_values WHERE account_name=?1 AND day=?2",
            params![account_name, day.format(DAY_FMT).to_string()],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn get_value(conn: &Connection, id: &str) -> LedgerResult<Value> {
    conn.query_row(
        "SELECT id, account_name, amount, date FROM account_values WHERE id=?1",
        params![id],
        value_from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::value_not_found(id))
}

/// Values matching `filter`, newest first.
pub fn list_values(conn: &Connection, filter: &ValueFilter) -> LedgerResult<Vec<Value>> {
    let mut sql =
        String::from("SELECT id, account_name, amount, date FROM account_values WHERE 1=1");
    let mut args: Vec<SqlValue> = Vec::new();

    if let Some(account) = &filter.account {
        sql.push_str(" AND account_name=?");
        args.push(SqlValue::Text(account.clone()));
    }
    if let Some(from) = filter.from {
        sql.push_str(" AND day>=?");
        args.push(SqlValue::Text(from.format(DAY_FMT).to_string()));
    }
    if let Some(to) = filter.to {
        sql.push_str(" AND day<=?");
        args.push(SqlValue::Text(to.format(DAY_FMT).to_string()));
    }
    sql.push_str(" ORDER BY date DESC, account_name LIMIT ? OFFSET ?");
    args.push(SqlValue::Integer(filter.limit.map_or(-1, |l| l as i64)));
    args.push(SqlValue::Integer(filter.skip as i64));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), value_from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

/// Full history of one account, newest first. `NotFound` for unknown accounts.
pub fn values_for_account(
    conn: &Connection,
    account_name: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> LedgerResult<Vec<Value>> {
    if !account_exists(conn, account_name)? {
        return Err(LedgerError::account_not_found(account_name));
    }
    list_values(
        conn,
        &ValueFilter {
            account: Some(account_name.to_string()),
            from,
            to,
            ..Default::default()
        },
    )
}

pub fn delete_value(conn: &Connection, id: &str) -> LedgerResult<()> {
    let n = conn.execute("DELETE FROM account_values WHERE id=?1", params![id])?;
    if n == 0 {
        return Err(LedgerError::value_not_found(id));
    }
    Ok(())
}
