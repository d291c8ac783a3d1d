// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::values::{ValueFilter, list_values};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{AccountType, AssetClass, Portfolio, Term};
use crate::utils::{DAY_FMT, accumulate, fmt_amount, maybe_print_json, parse_date, pretty_table};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

const UNCATEGORIZED: &str = "(none)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetWorthPoint {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub accounts: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownRow {
    pub month: String,
    pub group: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Category a breakdown report groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    AssetClass,
    Portfolio,
    Term,
    Type,
}

impl std::str::FromStr for Grouping {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "asset-class" => Ok(Grouping::AssetClass),
            "portfolio" => Ok(Grouping::Portfolio),
            "term" => Ok(Grouping::Term),
            "type" => Ok(Grouping::Type),
            other => Err(LedgerError::Validation(format!(
                "Invalid grouping '{}', expected asset-class, portfolio, term or type",
                other
            ))),
        }
    }
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("networth", sub)) => networth_cmd(conn, sub)?,
        Some(("breakdown", sub)) => breakdown_cmd(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn range_args(sub: &clap::ArgMatches) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
    let from = sub.get_one::<String>("from").map(|s| parse_date(s)).transpose()?;
    let to = sub.get_one::<String>("to").map(|s| parse_date(s)).transpose()?;
    Ok((from, to))
}

fn networth_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (from, to) = range_args(sub)?;
    let accounts: Vec<String> = sub
        .get_many::<String>("account")
        .map(|v| v.map(|s| s.trim().to_string()).collect())
        .unwrap_or_default();
    let data = net_worth(conn, &accounts, from, to)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|p| vec![p.date.to_string(), fmt_amount(&p.total), p.accounts.to_string()])
            .collect();
        println!("{}", pretty_table(&["Date", "Net Worth", "Accounts"], rows));
    }
    Ok(())
}

fn breakdown_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (from, to) = range_args(sub)?;
    let by: Grouping = sub.get_one::<String>("by").unwrap().parse()?;
    let portfolios = sub
        .get_many::<String>("portfolio")
        .map(|v| v.map(|s| s.parse::<Portfolio>()).collect::<LedgerResult<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();
    let data = breakdown(conn, by, &portfolios, from, to)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| vec![r.month.clone(), r.group.clone(), fmt_amount(&r.total)])
            .collect();
        println!("{}", pretty_table(&["Month", "Group", "Total"], rows));
    }
    Ok(())
}

/// Sum of every observation per calendar day, oldest first. An empty
/// `accounts` slice means all accounts.
pub fn net_worth(
    conn: &Connection,
    accounts: &[String],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> LedgerResult<Vec<NetWorthPoint>> {
    let wanted: HashSet<&str> = accounts.iter().map(|s| s.as_str()).collect();
    let values = list_values(
        conn,
        &ValueFilter {
            from,
            to,
            ..Default::default()
        },
    )?;
    let mut by_day: BTreeMap<NaiveDate, (Decimal, usize)> = BTreeMap::new();
    for v in values
        .iter()
        .filter(|v| wanted.is_empty() || wanted.contains(v.account_name.as_str()))
    {
        let day = v.day();
        let entry = by_day.entry(day).or_insert((Decimal::ZERO, 0));
        accumulate(&mut entry.0, v.amount, || day.to_string())?;
        entry.1 += 1;
    }
    Ok(by_day
        .into_iter()
        .map(|(date, (total, accounts))| NetWorthPoint {
            date,
            total,
            accounts,
        })
        .collect())
}

struct Observation {
    day: String,
    account: String,
    amount: Decimal,
    term: Option<Term>,
    r#type: Option<AccountType>,
    portfolio: Option<Portfolio>,
    asset_class: Option<AssetClass>,
}

impl Observation {
    fn group(&self, by: Grouping) -> String {
        let label = match by {
            Grouping::AssetClass => self.asset_class.map(|c| c.as_str()),
            Grouping::Portfolio => self.portfolio.map(|p| p.as_str()),
            Grouping::Term => self.term.map(|t| t.as_str()),
            Grouping::Type => self.r#type.map(|t| t.as_str()),
        };
        label.unwrap_or(UNCATEGORIZED).to_string()
    }
}

/// Monthly totals per category. Each account contributes its latest
/// observation within a month, so several observations in one month are not
/// counted twice.
pub fn breakdown(
    conn: &Connection,
    by: Grouping,
    portfolios: &[Portfolio],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> LedgerResult<Vec<BreakdownRow>> {
    let mut stmt = conn.prepare(
        "SELECT v.day, v.account_name, v.amount, a.term, a.type, a.portfolio, a.asset_class
         FROM account_values v
         JOIN accounts a ON a.name=v.account_name
         WHERE (?1 IS NULL OR v.day>=?1) AND (?2 IS NULL OR v.day<=?2)
         ORDER BY v.date",
    )?;
    let from = from.map(|d| d.format(DAY_FMT).to_string());
    let to = to.map(|d| d.format(DAY_FMT).to_string());
    let rows = stmt.query_map((from, to), |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, Option<Term>>(3)?,
            r.get::<_, Option<AccountType>>(4)?,
            r.get::<_, Option<Portfolio>>(5)?,
            r.get::<_, Option<AssetClass>>(6)?,
        ))
    })?;

    // (month, account) -> latest observation in that month; rows come oldest first
    let mut latest: BTreeMap<(String, String), Observation> = BTreeMap::new();
    for row in rows {
        let (day, account, amount, term, r#type, portfolio, asset_class) = row?;
        if !portfolios.is_empty() && !portfolio.is_some_and(|p| portfolios.contains(&p)) {
            continue;
        }
        let amount = amount.parse::<Decimal>().map_err(|_| {
            LedgerError::Validation(format!("Stored amount '{}' for '{}' is invalid", amount, account))
        })?;
        let obs = Observation {
            day,
            account,
            amount,
            term,
            r#type,
            portfolio,
            asset_class,
        };
        latest.insert((obs.day[..7].to_string(), obs.account.clone()), obs);
    }

    let mut totals: BTreeMap<(String, String), Decimal> = BTreeMap::new();
    for ((month, _), obs) in &latest {
        let group = obs.group(by);
        let total = totals
            .entry((month.clone(), group.clone()))
            .or_insert(Decimal::ZERO);
        accumulate(total, obs.amount, || format!("{} in {}", group, month))?;
    }
    Ok(totals
        .into_iter()
        .map(|((month, group), total)| BreakdownRow { month, group, total })
        .collect())
}
