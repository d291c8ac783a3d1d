// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use networth::commands::accounts::{
    self, Created, create_account, create_account_if_absent, delete_account, get_account,
    list_accounts,
};
use networth::commands::values::{get_value, upsert_value};
use networth::models::{Account, AccountType, AssetClass, NewValue, Portfolio, Term};
use networth::{LedgerError, cli, db};
use rust_decimal::Decimal;

fn at(y: i32, m: u32, d: u32, h: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

#[test]
fn create_rejects_duplicate_names() {
    let conn = db::open_in_memory().unwrap();
    create_account(&conn, &Account::new("ISA")).unwrap();
    let err = create_account(&conn, &Account::new("ISA")).unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(ref n) if n == "ISA"));
}

#[test]
fn create_validates_name() {
    let conn = db::open_in_memory().unwrap();
    let err = create_account(&conn, &Account::new("  ")).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    let long = "x".repeat(101);
    let err = create_account(&conn, &Account::new(long)).unwrap_err();
    assert!(err.to_string().contains("longer than 100"));
}

#[test]
fn names_are_stored_trimmed() {
    let conn = db::open_in_memory().unwrap();
    let created = create_account(&conn, &Account::new("  ISA ")).unwrap();
    assert_eq!(created.name, "ISA");
    assert_eq!(get_account(&conn, "ISA").unwrap().name, "ISA");
    let err = create_account(&conn, &Account::new("ISA  ")).unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(ref n) if n == "ISA"));
    assert_eq!(
        create_account_if_absent(&conn, &Account::new(" ISA")).unwrap(),
        Created::Existing
    );
    let value = NewValue::new(" ISA ", Decimal::from(5), at(2024, 1, 1, 0));
    let outcome = upsert_value(&conn, &value).unwrap();
    assert_eq!(outcome.value().account_name, "ISA");
}

#[test]
fn create_if_absent_is_idempotent() {
    let conn = db::open_in_memory().unwrap();
    let mut account = Account::new("Pension");
    account.term = Some(Term::LongTerm);
    assert_eq!(create_account_if_absent(&conn, &account).unwrap(), Created::New);

    // attributes of an existing account are not overwritten
    account.term = Some(Term::ShortTerm);
    assert_eq!(
        create_account_if_absent(&conn, &account).unwrap(),
        Created::Existing
    );
    assert_eq!(get_account(&conn, "Pension").unwrap().term, Some(Term::LongTerm));
}

#[test]
fn get_missing_account_is_not_found() {
    let conn = db::open_in_memory().unwrap();
    let err = get_account(&conn, "Nope").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Account 'Nope' not found");
}

#[test]
fn list_pages_with_skip_and_limit() {
    let conn = db::open_in_memory().unwrap();
    for name in ["A", "B", "C", "D"] {
        create_account(&conn, &Account::new(name)).unwrap();
    }
    assert_eq!(list_accounts(&conn, 0, 100).unwrap().len(), 4);
    assert_eq!(list_accounts(&conn, 1, 2).unwrap().len(), 2);
    assert_eq!(list_accounts(&conn, 3, 10).unwrap().len(), 1);
    assert!(list_accounts(&conn, 4, 10).unwrap().is_empty());
}

#[test]
fn delete_cascades_to_values() {
    let conn = db::open_in_memory().unwrap();
    create_account(&conn, &Account::new("Broker")).unwrap();
    let first = upsert_value(
        &conn,
        &NewValue::new("Broker", Decimal::from(10), at(2024, 1, 1, 0)),
    )
    .unwrap();
    let second = upsert_value(
        &conn,
        &NewValue::new("Broker", Decimal::from(20), at(2024, 2, 1, 0)),
    )
    .unwrap();

    delete_account(&conn, "Broker").unwrap();

    assert!(get_value(&conn, &first.value().id).unwrap_err().is_not_found());
    assert!(get_value(&conn, &second.value().id).unwrap_err().is_not_found());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM account_values", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
    assert!(delete_account(&conn, "Broker").unwrap_err().is_not_found());
}

#[test]
fn cli_add_trims_and_parses_category_labels() {
    let conn = db::open_in_memory().unwrap();
    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "networth",
        "account",
        "add",
        "--name",
        "  House  ",
        "--term",
        "long-term",
        "--type",
        "asset",
        "--portfolio",
        "Illiquid",
        "--asset-class",
        "real estate",
    ]);
    if let Some(("account", acct_m)) = matches.subcommand() {
        accounts::handle(&conn, acct_m).unwrap();
    } else {
        panic!("no account subcommand");
    }

    let house = get_account(&conn, "House").unwrap();
    assert_eq!(house.term, Some(Term::LongTerm));
    assert_eq!(house.r#type, Some(AccountType::Asset));
    assert_eq!(house.portfolio, Some(Portfolio::Illiquid));
    assert_eq!(house.asset_class, Some(AssetClass::RealEstate));
}

#[test]
fn cli_add_rejects_unknown_label() {
    let conn = db::open_in_memory().unwrap();
    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "networth",
        "account",
        "add",
        "--name",
        "Gold",
        "--asset-class",
        "Commodities",
    ]);
    if let Some(("account", acct_m)) = matches.subcommand() {
        let err = accounts::handle(&conn, acct_m).unwrap_err();
        assert!(err.to_string().contains("Invalid asset class 'Commodities'"));
    } else {
        panic!("no account subcommand");
    }
    assert!(get_account(&conn, "Gold").is_err());
}

#[test]
fn account_serializes_with_labels() {
    let mut account = Account::new("Emergency Fund");
    account.portfolio = Some(Portfolio::CashReserves);
    account.r#type = Some(AccountType::Asset);
    let v = serde_json::to_value(&account).unwrap();
    assert_eq!(v["portfolio"], "Cash Reserves");
    assert_eq!(v["type"], "Asset");
    assert!(v["term"].is_null());
}
