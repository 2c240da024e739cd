//! Export command behavior: argument parsing and file output.

use super::support::DAILY;
use clap::Parser;
use ecb_forex::cache::CacheKey;
use ecb_forex::cli::export::write_rate_sets;
use ecb_forex::cli::{Cli, Commands, ExportFeed};
use ecb_forex::feed::parser;
use ecb_forex::rates::{self, KeyStyle, RateQuery};
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_cli_parses_export_options() {
    let cli = Cli::parse_from([
        "ecb-forex",
        "export",
        "latest",
        "--base",
        "USD",
        "--symbols",
        "USD,GBP,JPY",
        "--output",
        "/tmp/rates",
        "--pretty",
    ]);

    let Commands::Export(cmd) = cli.command;
    match cmd.feed {
        ExportFeed::Latest(args) => {
            assert_eq!(args.base, "USD");
            assert_eq!(
                args.symbols,
                Some(vec![
                    "USD".to_string(),
                    "GBP".to_string(),
                    "JPY".to_string()
                ])
            );
            assert_eq!(args.output, PathBuf::from("/tmp/rates"));
            assert!(args.pretty);
        }
        other => panic!("expected latest feed, got {other:?}"),
    }
}

#[test]
fn test_cli_defaults() {
    let cli = Cli::parse_from(["ecb-forex", "export", "ninety-days"]);
    let Commands::Export(cmd) = cli.command;
    match cmd.feed {
        ExportFeed::NinetyDays(args) => {
            assert_eq!(args.base, "EUR");
            assert_eq!(args.symbols, None);
            assert_eq!(args.output, PathBuf::from("."));
            assert!(!args.pretty);
        }
        other => panic!("expected ninety-days feed, got {other:?}"),
    }
}

#[test]
fn test_exported_file_carries_rebased_rates() {
    let sets = parser::parse_rates(DAILY.as_bytes()).unwrap();
    let query = RateQuery::default()
        .with_base("USD")
        .with_keys(KeyStyle::String);
    let rebased: Vec<_> = sets
        .into_iter()
        .map(|s| rates::apply(s, &query).unwrap())
        .collect();

    let dir = TempDir::new().unwrap();
    let path = write_rate_sets(rebased, CacheKey::LatestRates, &query, dir.path(), true).unwrap();
    assert!(path.ends_with("latest_rates.json"));

    let contents = std::fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    let first = &parsed.as_array().unwrap()[0];
    assert_eq!(first["base"], "USD");
    assert_eq!(first["date"], "2024-11-08");
    assert_eq!(first["rates"]["USD"], "1.00000");
}

#[test]
fn test_exported_string_format_keeps_requested_digits() {
    let sets = parser::parse_rates(DAILY.as_bytes()).unwrap();
    let query = RateQuery::default()
        .with_round(Some(2))
        .with_keys(KeyStyle::String)
        .with_format(rates::Format::String);
    let rounded: Vec<_> = sets
        .into_iter()
        .map(|s| rates::apply(s, &query).unwrap())
        .collect();

    let dir = TempDir::new().unwrap();
    let path = write_rate_sets(rounded, CacheKey::LatestRates, &query, dir.path(), false).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    let rates = parsed[0]["rates"].as_object().unwrap();
    for (code, value) in rates {
        let rendered = value.as_str().unwrap();
        let fraction = rendered.split('.').nth(1).unwrap_or("");
        assert_eq!(fraction.len(), 2, "{code}: {rendered}");
    }
}
