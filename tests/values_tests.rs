// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use networth::commands::accounts::create_account;
use networth::commands::values::{
    self, ValueFilter, delete_value, get_value, list_values, upsert_value, values_for_account,
};
use networth::models::{Account, NewValue};
use networth::{LedgerError, cli, db};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn ts(s: &str) -> NaiveDateTime {
    networth::utils::parse_timestamp(s).unwrap()
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn setup() -> Connection {
    let conn = db::open_in_memory().unwrap();
    create_account(&conn, &Account::new("A")).unwrap();
    create_account(&conn, &Account::new("B")).unwrap();
    conn
}

fn count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM account_values", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn upsert_twice_keeps_one_row() {
    let conn = setup();
    let v = NewValue::new("A", Decimal::from(100), ts("2024-01-15"));
    let first = upsert_value(&conn, &v).unwrap();
    let second = upsert_value(&conn, &v).unwrap();
    assert!(first.is_created());
    assert!(!second.is_created());
    assert_eq!(first.value().id, second.value().id);
    assert_eq!(count(&conn), 1);
    assert_eq!(second.value().amount, Decimal::from(100));
}

#[test]
fn time_of_day_is_not_part_of_identity() {
    let conn = setup();
    upsert_value(&conn, &NewValue::new("A", Decimal::from(100), ts("2024-01-15T08:00"))).unwrap();
    let latest =
        upsert_value(&conn, &NewValue::new("A", Decimal::from(150), ts("2024-01-15T20:00")))
            .unwrap();

    assert_eq!(count(&conn), 1);
    let stored = get_value(&conn, &latest.value().id).unwrap();
    assert_eq!(stored.amount, Decimal::from(150));
    assert_eq!(stored.date, ts("2024-01-15T20:00:00"));
}

#[test]
fn same_day_on_other_account_is_separate() {
    let conn = setup();
    upsert_value(&conn, &NewValue::new("A", Decimal::from(1), ts("2024-01-15"))).unwrap();
    upsert_value(&conn, &NewValue::new("B", Decimal::from(2), ts("2024-01-15"))).unwrap();
    assert_eq!(count(&conn), 2);
}

#[test]
fn upsert_for_unknown_account_is_not_found() {
    let conn = setup();
    let err = upsert_value(&conn, &NewValue::new("Z", Decimal::ONE, ts("2024-01-15"))).unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { what: "Account", .. }));
    assert_eq!(count(&conn), 0);
}

#[test]
fn list_filters_and_sorts_newest_first() {
    let conn = setup();
    for (acct, d, amt) in [
        ("A", "2024-01-01", 1),
        ("A", "2024-02-01", 2),
        ("A", "2024-03-01", 3),
        ("B", "2024-02-15", 4),
    ] {
        upsert_value(&conn, &NewValue::new(acct, Decimal::from(amt), ts(d))).unwrap();
    }

    let all = list_values(&conn, &ValueFilter::default()).unwrap();
    let dates: Vec<String> = all.iter().map(|v| v.day().to_string()).collect();
    assert_eq!(dates, vec!["2024-03-01", "2024-02-15", "2024-02-01", "2024-01-01"]);

    let ranged = list_values(
        &conn,
        &ValueFilter {
            account: Some("A".into()),
            from: Some(day("2024-02-01")),
            to: Some(day("2024-03-01")),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(ranged.len(), 2);
    assert!(ranged.iter().all(|v| v.account_name == "A"));

    let paged = list_values(
        &conn,
        &ValueFilter {
            skip: 1,
            limit: Some(2),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(paged.len(), 2);
    assert_eq!(paged[0].day(), day("2024-02-15"));
}

#[test]
fn history_requires_existing_account() {
    let conn = setup();
    upsert_value(&conn, &NewValue::new("A", Decimal::ONE, ts("2024-01-01"))).unwrap();
    assert_eq!(values_for_account(&conn, "A", None, None).unwrap().len(), 1);
    assert!(values_for_account(&conn, "B", None, None).unwrap().is_empty());
    assert!(values_for_account(&conn, "Z", None, None)
        .unwrap_err()
        .is_not_found());
}

#[test]
fn delete_by_id() {
    let conn = setup();
    let v = upsert_value(&conn, &NewValue::new("A", Decimal::ONE, ts("2024-01-01"))).unwrap();
    delete_value(&conn, &v.value().id).unwrap();
    assert_eq!(count(&conn), 0);
    assert!(delete_value(&conn, &v.value().id).unwrap_err().is_not_found());
}

#[test]
fn value_serializes_amount_as_number() {
    let conn = setup();
    let v = upsert_value(&conn, &NewValue::new("A", "1234.5".parse().unwrap(), ts("2024-01-15T08:30")))
        .unwrap();
    let json = serde_json::to_value(v.value()).unwrap();
    assert_eq!(json["amount"], serde_json::json!(1234.5));
    assert_eq!(json["date"], "2024-01-15T08:30:00");
    assert_eq!(json["account_name"], "A");
}

#[test]
fn cli_set_accepts_negative_amounts() {
    let conn = setup();
    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "networth", "value", "set", "--account", " A ", "--amount", "-250.75", "--date",
        "2024-03-31",
    ]);
    if let Some(("value", value_m)) = matches.subcommand() {
        values::handle(&conn, value_m).unwrap();
    } else {
        panic!("no value subcommand");
    }
    let stored = values_for_account(&conn, "A", None, None).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].amount, "-250.75".parse::<Decimal>().unwrap());
}
