// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use networth::LedgerError;
use networth::utils::{
    accumulate, normalize_label, parse_amount, parse_date_label, parse_timestamp,
};
use rust_decimal::Decimal;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn amounts_tolerate_sheet_formatting() {
    let amount = |s: &str| parse_amount(s).unwrap();
    assert_eq!(amount("1,234.50"), Some("1234.50".parse().unwrap()));
    assert_eq!(amount(" £2,000 "), Some(Decimal::from(2000)));
    assert_eq!(amount("(300)"), Some(Decimal::from(-300)));
    assert_eq!(amount("-42.1"), Some("-42.1".parse().unwrap()));
    assert_eq!(amount("1e3"), Some(Decimal::from(1000)));
    assert_eq!(amount("\u{FFFD}200"), Some(Decimal::from(200)));
    assert_eq!(amount(""), None);
    assert_eq!(amount("-"), None);
    assert_eq!(amount("#N/A"), None);
    assert_eq!(amount("NaN"), None);
}

#[test]
fn amounts_beyond_decimal_range_are_rejected() {
    let err = parse_amount("1e30").unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert!(err.to_string().contains("'1e30' is outside the supported range"));
    assert!(parse_amount("-99999999999999999999999999999999").is_err());
}

#[test]
fn accumulate_reports_overflow_instead_of_panicking() {
    let half: Decimal = "50000000000000000000000000000".parse().unwrap();
    let mut total = Decimal::ZERO;
    accumulate(&mut total, half, || "X".to_string()).unwrap();
    let err = accumulate(&mut total, half, || "X".to_string()).unwrap_err();
    assert!(err.to_string().contains("Total for X exceeds"));
    assert_eq!(total, half);
}

#[test]
fn date_labels_accept_common_export_spellings() {
    assert_eq!(parse_date_label("2024-01-15"), Some(day(2024, 1, 15)));
    assert_eq!(parse_date_label("2024-01-15 00:00:00"), Some(day(2024, 1, 15)));
    assert_eq!(parse_date_label("01/15/2024"), Some(day(2024, 1, 15)));
    assert_eq!(parse_date_label("15-Jan-2024"), Some(day(2024, 1, 15)));
    assert_eq!(parse_date_label("Jan 2024"), Some(day(2024, 1, 1)));
    assert_eq!(parse_date_label("Total"), None);
    assert_eq!(parse_date_label(""), None);
}

#[test]
fn timestamps_keep_wall_clock_time() {
    let dt = parse_timestamp("2024-01-15T20:00:00+05:00").unwrap();
    assert_eq!(dt, day(2024, 1, 15).and_hms_opt(20, 0, 0).unwrap());
    let bare = parse_timestamp("2024-01-15").unwrap();
    assert_eq!(bare, day(2024, 1, 15).and_hms_opt(0, 0, 0).unwrap());
    assert!(parse_timestamp("15th January").is_err());
}

#[test]
fn none_label_is_absent() {
    assert_eq!(normalize_label("  None "), None);
    assert_eq!(normalize_label("NONE"), None);
    assert_eq!(normalize_label(""), None);
    assert_eq!(normalize_label(" Liquid "), Some("Liquid".to_string()));
}
