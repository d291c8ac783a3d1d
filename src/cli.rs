// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn range_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("from")
            .long("from")
            .help("First calendar day to include (YYYY-MM-DD)"),
    )
    .arg(
        Arg::new("to")
            .long("to")
            .help("Last calendar day to include (YYYY-MM-DD)"),
    )
}

fn page_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("skip")
            .long("skip")
            .value_parser(value_parser!(usize))
            .help("Number of records to skip"),
    )
    .arg(
        Arg::new("limit")
            .long("limit")
            .value_parser(value_parser!(usize))
            .help("Maximum number of records (defaults to the page_limit setting)"),
    )
}

fn path_arg() -> Arg {
    Arg::new("path")
        .long("path")
        .required(true)
        .help("CSV file to read")
}

fn account_cmd() -> Command {
    Command::new("account")
        .about("Manage accounts")
        .subcommand(
            Command::new("add")
                .about("Create an account")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("description").long("description"))
                .arg(
                    Arg::new("term")
                        .long("term")
                        .help("Short Term | Long Term"),
                )
                .arg(Arg::new("type").long("type").help("Asset | Liability"))
                .arg(
                    Arg::new("portfolio")
                        .long("portfolio")
                        .help("Liquid | Illiquid | Cash Reserves"),
                )
                .arg(
                    Arg::new("asset-class")
                        .long("asset-class")
                        .help("Cash | Equities | Crypto | Real Estate"),
                ),
        )
        .subcommand(page_args(json_args(
            Command::new("list").about("List accounts"),
        )))
        .subcommand(
            Command::new("show")
                .about("Show one account")
                .arg(Arg::new("name").required(true))
                .arg(Arg::new("json").long("json").action(ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete an account and all of its values")
                .arg(Arg::new("name").required(true)),
        )
}

fn value_cmd() -> Command {
    Command::new("value")
        .about("Record and inspect account values")
        .subcommand(
            Command::new("set")
                .about("Record a value, replacing any value on the same day")
                .arg(Arg::new("account").long("account").required(true))
                .arg(
                    Arg::new("amount")
                        .long("amount")
                        .required(true)
                        .allow_hyphen_values(true),
                )
                .arg(
                    Arg::new("date")
                        .long("date")
                        .help("YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS (default: now)"),
                ),
        )
        .subcommand(page_args(range_args(json_args(
            Command::new("list")
                .about("List values, newest first")
                .arg(Arg::new("account").long("account")),
        ))))
        .subcommand(range_args(json_args(
            Command::new("history")
                .about("All values of one account, newest first")
                .arg(Arg::new("account").required(true)),
        )))
        .subcommand(
            Command::new("rm")
                .about("Delete a value by id")
                .arg(Arg::new("id").required(true)),
        )
}

fn import_cmd() -> Command {
    let json = || Arg::new("json").long("json").action(ArgAction::SetTrue);
    Command::new("import")
        .about("Import from CSV")
        .subcommand(
            Command::new("sheet")
                .about("Import a net worth sheet export (attribute columns, then one column per date)")
                .arg(path_arg())
                .arg(
                    Arg::new("clear")
                        .long("clear")
                        .action(ArgAction::SetTrue)
                        .help("Delete all accounts and values first"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Validate and report without writing"),
                )
                .arg(json()),
        )
        .subcommand(
            Command::new("values")
                .about("Import Account,Value,Date rows")
                .arg(path_arg())
                .arg(json()),
        )
        .subcommand(
            Command::new("accounts")
                .about("Import account definitions")
                .arg(path_arg())
                .arg(json()),
        )
}

fn export_cmd() -> Command {
    Command::new("export").about("Export data").subcommand(
        Command::new("values")
            .about("Export all values")
            .arg(
                Arg::new("format")
                    .long("format")
                    .default_value("csv")
                    .help("csv | json"),
            )
            .arg(Arg::new("out").long("out").required(true)),
    )
}

fn report_cmd() -> Command {
    Command::new("report")
        .about("Reports")
        .subcommand(range_args(json_args(
            Command::new("networth")
                .about("Total of all values per day")
                .arg(
                    Arg::new("account")
                        .long("account")
                        .action(ArgAction::Append)
                        .help("Restrict to these accounts (repeatable)"),
                ),
        )))
        .subcommand(range_args(json_args(
            Command::new("breakdown")
                .about("Monthly totals by category")
                .arg(
                    Arg::new("by")
                        .long("by")
                        .default_value("asset-class")
                        .value_parser(["asset-class", "portfolio", "term", "type"]),
                )
                .arg(
                    Arg::new("portfolio")
                        .long("portfolio")
                        .action(ArgAction::Append)
                        .help("Restrict to these portfolios (repeatable)"),
                ),
        )))
}

fn config_cmd() -> Command {
    Command::new("config")
        .about("Show or change settings")
        .subcommand(Command::new("show").about("Show effective settings"))
        .subcommand(
            Command::new("set")
                .about("Change a setting")
                .arg(Arg::new("key").long("key").required(true))
                .arg(Arg::new("value").long("value").required(true)),
        )
}

pub fn build_cli() -> Command {
    Command::new("networth")
        .version(clap::crate_version!())
        .about("Track net worth across accounts")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env("NETWORTH_DB")
                .help("SQLite database path (default: platform data dir)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(account_cmd())
        .subcommand(value_cmd())
        .subcommand(import_cmd())
        .subcommand(export_cmd())
        .subcommand(report_cmd())
        .subcommand(config_cmd())
        .subcommand(Command::new("doctor").about("Check data for common problems"))
}
