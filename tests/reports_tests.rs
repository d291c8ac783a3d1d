// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use networth::commands::accounts::create_account;
use networth::commands::reports::{Grouping, breakdown, net_worth};
use networth::commands::values::upsert_value;
use networth::db;
use networth::models::{Account, AssetClass, NewValue, Portfolio};
use networth::utils::parse_timestamp;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = db::open_in_memory().unwrap();
    let mut stocks = Account::new("Stocks");
    stocks.asset_class = Some(AssetClass::Equities);
    stocks.portfolio = Some(Portfolio::Liquid);
    let mut cash = Account::new("Cash");
    cash.asset_class = Some(AssetClass::Cash);
    cash.portfolio = Some(Portfolio::CashReserves);
    let loan = Account::new("Loan");
    for a in [&stocks, &cash, &loan] {
        create_account(&conn, a).unwrap();
    }
    for (acct, d, amt) in [
        ("Stocks", "2024-01-01", 1000),
        ("Cash", "2024-01-01", 500),
        ("Loan", "2024-01-01", -300),
        ("Stocks", "2024-01-20", 1100),
        ("Stocks", "2024-02-01", 1200),
        ("Cash", "2024-02-01", 450),
    ] {
        upsert_value(
            &conn,
            &NewValue::new(acct, Decimal::from(amt), parse_timestamp(d).unwrap()),
        )
        .unwrap();
    }
    conn
}

#[test]
fn net_worth_sums_per_day() {
    let conn = setup();
    let points = net_worth(&conn, &[], None, None).unwrap();
    let totals: Vec<(String, Decimal)> = points
        .iter()
        .map(|p| (p.date.to_string(), p.total))
        .collect();
    assert_eq!(
        totals,
        vec![
            ("2024-01-01".to_string(), Decimal::from(1200)),
            ("2024-01-20".to_string(), Decimal::from(1100)),
            ("2024-02-01".to_string(), Decimal::from(1650)),
        ]
    );
    assert_eq!(points[0].accounts, 3);
}

#[test]
fn net_worth_can_be_restricted_to_accounts() {
    let conn = setup();
    let points = net_worth(&conn, &["Cash".to_string()], None, None).unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[1].total, Decimal::from(450));
}

#[test]
fn breakdown_uses_latest_value_per_month() {
    let conn = setup();
    let rows = breakdown(&conn, Grouping::AssetClass, &[], None, None).unwrap();
    let jan_equities = rows
        .iter()
        .find(|r| r.month == "2024-01" && r.group == "Equities")
        .unwrap();
    assert_eq!(jan_equities.total, Decimal::from(1100));
    let jan_none = rows
        .iter()
        .find(|r| r.month == "2024-01" && r.group == "(none)")
        .unwrap();
    assert_eq!(jan_none.total, Decimal::from(-300));
}

#[test]
fn breakdown_filters_portfolios() {
    let conn = setup();
    let rows = breakdown(
        &conn,
        Grouping::Portfolio,
        &[Portfolio::CashReserves],
        None,
        None,
    )
    .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.group == "Cash Reserves"));
}

#[test]
fn grouping_parses_cli_spelling() {
    assert_eq!("asset-class".parse::<Grouping>().unwrap(), Grouping::AssetClass);
    assert_eq!("asset_class".parse::<Grouping>().unwrap(), Grouping::AssetClass);
    assert!("colour".parse::<Grouping>().is_err());
}

#[test]
fn totals_beyond_decimal_range_fail_cleanly() {
    let conn = db::open_in_memory().unwrap();
    let half: Decimal = "50000000000000000000000000000".parse().unwrap();
    for name in ["A", "B"] {
        let mut account = Account::new(name);
        account.asset_class = Some(AssetClass::Cash);
        create_account(&conn, &account).unwrap();
        let at = parse_timestamp("2024-01-01").unwrap();
        upsert_value(&conn, &NewValue::new(name, half, at)).unwrap();
    }
    let err = net_worth(&conn, &[], None, None).unwrap_err();
    assert!(err.to_string().contains("Total for 2024-01-01 exceeds"));
    let err = breakdown(&conn, Grouping::AssetClass, &[], None, None).unwrap_err();
    assert!(err.to_string().contains("Total for Cash in 2024-01 exceeds"));
}
