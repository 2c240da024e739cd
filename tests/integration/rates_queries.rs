//! End-to-end query scenarios against the 2024-11-08 fixture feed.

use super::support::{daily_feed, failing_feed, historic_feed, ninety_days_feed};
use chrono::NaiveDate;
use ecb_forex::rates::{RateQuery, RateValue};
use ecb_forex::support::round_value;
use ecb_forex::{Forex, ForexConfig, ForexError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

async fn fixture_client() -> Forex {
    let config = ForexConfig {
        feed_fn: Some(daily_feed()),
        ..ForexConfig::default()
    };
    Forex::with_config(config).await.unwrap()
}

#[tokio::test]
async fn test_latest_rates_against_eur() {
    let forex = fixture_client().await;
    let rates = forex.latest_rates(&RateQuery::default()).await.unwrap();

    assert_eq!(rates.date, NaiveDate::from_ymd_opt(2024, 11, 8).unwrap());
    assert_eq!(rates.base, "EUR");
    assert_eq!(rates.rates.len(), 31);
    assert_eq!(rates.get("EUR"), Some(Decimal::ONE));
    assert_eq!(rates.get("USD"), Some(dec!(1.0772)));
    assert_eq!(rates.get("GBP"), Some(dec!(0.83188)));
    assert_eq!(rates.get("JPY"), Some(dec!(164.18)));
}

#[tokio::test]
async fn test_latest_rates_rebased_to_usd() {
    let forex = fixture_client().await;
    let query = RateQuery::default().with_base("USD");
    let rates = forex.latest_rates(&query).await.unwrap();

    assert_eq!(rates.base, "USD");
    assert_eq!(rates.get("USD"), Some(Decimal::ONE));
    assert_eq!(
        rates.get("EUR"),
        Some(round_value(dec!(1) / dec!(1.0772), Some(5)))
    );
    assert_eq!(
        rates.get("GBP"),
        Some(round_value(dec!(0.83188) / dec!(1.0772), Some(5)))
    );
    assert_eq!(
        rates.get("JPY"),
        Some(round_value(dec!(164.18) / dec!(1.0772), Some(5)))
    );
}

#[tokio::test]
async fn test_disabled_currencies_never_in_latest() {
    let forex = fixture_client().await;
    let rates = forex.latest_rates(&RateQuery::default()).await.unwrap();
    for code in ["RUB", "HRK", "EEK", "SKK"] {
        assert!(!rates.contains(code), "{code} must not be in latest");
    }
}

#[tokio::test]
async fn test_exchange_one_gbp_to_eur() {
    let forex = fixture_client().await;
    let amount = forex
        .exchange(1, "GBP", "EUR", &RateQuery::default())
        .await
        .unwrap();
    assert_eq!(amount, RateValue::Decimal(dec!(1.20210)));
}

#[tokio::test]
async fn test_historic_rate_for_known_date() {
    let forex = fixture_client().await;
    let query = RateQuery::default().with_feed_fn(historic_feed());
    let rates = forex
        .get_historic_rate(NaiveDate::from_ymd_opt(2024, 10, 25).unwrap(), &query)
        .await
        .unwrap();

    assert_eq!(rates.date, NaiveDate::from_ymd_opt(2024, 10, 25).unwrap());
    let usd = rates.get("USD").unwrap();
    assert!(usd > Decimal::ZERO);
}

#[tokio::test]
async fn test_historic_rate_for_uncovered_date() {
    let forex = fixture_client().await;
    let query = RateQuery::default().with_feed_fn(historic_feed());
    let result = forex
        .get_historic_rate(NaiveDate::from_ymd_opt(1982, 2, 25).unwrap(), &query)
        .await;

    match result {
        Err(ForexError::Date(e)) => {
            assert_eq!(e.to_string(), "Rate not found for date: 1982-02-25");
        }
        other => panic!("expected date error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_historic_rates_between_is_inclusive() {
    let forex = fixture_client().await;
    let query = RateQuery::default().with_feed_fn(historic_feed());
    let from = NaiveDate::from_ymd_opt(2024, 10, 24).unwrap();
    let to = NaiveDate::from_ymd_opt(2024, 11, 8).unwrap();

    let sets = forex
        .get_historic_rates_between(from, to, &query)
        .await
        .unwrap();
    let dates: Vec<_> = sets.iter().map(|s| s.date.to_string()).collect();
    assert_eq!(dates, vec!["2024-11-08", "2024-10-25", "2024-10-24"]);

    // reversed bounds behave the same
    let reversed = forex
        .get_historic_rates_between(to, from, &query)
        .await
        .unwrap();
    assert_eq!(reversed.len(), 3);
}

#[tokio::test]
async fn test_disabled_currency_appears_in_historic() {
    let forex = fixture_client().await;
    let query = RateQuery::default().with_feed_fn(historic_feed());
    let rates = forex
        .get_historic_rate(NaiveDate::from_ymd_opt(2022, 2, 25).unwrap(), &query)
        .await
        .unwrap();
    assert!(rates.contains("RUB"));
}

#[tokio::test]
async fn test_ninety_days_rounding_to_two_digits() {
    let forex = fixture_client().await;
    let query = RateQuery::default()
        .with_round(Some(2))
        .with_feed_fn(ninety_days_feed())
        .without_cache();
    let sets = forex.last_ninety_days_rates(&query).await.unwrap();

    assert_eq!(sets.len(), 3);
    for set in &sets {
        for rate in &set.rates {
            let rendered = rate.value.to_string();
            let fraction = rendered.split('.').nth(1).unwrap_or("");
            assert_eq!(fraction.len(), 2, "{}: {rendered}", rate.currency);
        }
    }
}

#[tokio::test]
async fn test_symbols_restrict_output() {
    let forex = fixture_client().await;
    let query = RateQuery::default()
        .with_base("USD")
        .with_symbols(["USD", "GBP", "JPY"]);
    let rates = forex.latest_rates(&query).await.unwrap();

    assert_eq!(rates.rates.len(), 3);
    assert_eq!(rates.get("USD"), Some(Decimal::ONE));
    assert!(rates.get("EUR").is_none());
}

#[tokio::test]
async fn test_erroring_adapter_surfaces_on_uncached_get() {
    let config = ForexConfig {
        feed_fn: Some(failing_feed()),
        ..ForexConfig::default()
    };
    let forex = Forex::with_config(config).await.unwrap();

    // the failed warm-up must not have taken the fetcher down
    assert!(forex.supervisor().fetcher_running().await);

    let query = RateQuery::default().without_cache();
    let result = forex.latest_rates(&query).await;
    assert!(matches!(result, Err(ForexError::Feed(_))));

    // still alive afterwards
    assert!(forex.supervisor().fetcher_running().await);
}
