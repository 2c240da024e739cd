//! Supervisor lifecycle behavior through the public client.

use super::support::{daily_feed, failing_feed};
use ecb_forex::fetcher::FetcherError;
use ecb_forex::rates::RateQuery;
use ecb_forex::supervisor::FetcherStatus;
use ecb_forex::{Forex, ForexConfig, ForexError};

#[tokio::test]
async fn test_stop_and_restart_cycle() {
    let config = ForexConfig {
        feed_fn: Some(daily_feed()),
        ..ForexConfig::default()
    };
    let forex = Forex::with_config(config).await.unwrap();
    let supervisor = forex.supervisor();

    assert_eq!(supervisor.fetcher_status().await, FetcherStatus::Running);

    supervisor.stop_fetcher().await.unwrap();
    assert_eq!(supervisor.fetcher_status().await, FetcherStatus::Stopped);

    // queries fail fast while stopped
    let result = forex.latest_rates(&RateQuery::default()).await;
    assert!(matches!(
        result,
        Err(ForexError::Fetcher(FetcherError::NotRunning))
    ));

    supervisor.restart_fetcher().await.unwrap();
    assert!(forex.latest_rates(&RateQuery::default()).await.is_ok());
}

#[tokio::test]
async fn test_start_while_running_is_already_started() {
    let config = ForexConfig {
        feed_fn: Some(daily_feed()),
        ..ForexConfig::default()
    };
    let forex = Forex::with_config(config).await.unwrap();

    let result = forex.supervisor().start_fetcher().await;
    assert!(matches!(result, Err(FetcherError::AlreadyStarted)));
}

#[tokio::test]
async fn test_delete_returns_to_not_started() {
    let config = ForexConfig {
        feed_fn: Some(daily_feed()),
        ..ForexConfig::default()
    };
    let forex = Forex::with_config(config).await.unwrap();
    let supervisor = forex.supervisor();

    supervisor.stop_fetcher().await.unwrap();
    supervisor.delete_fetcher().await.unwrap();
    assert_eq!(supervisor.fetcher_status().await, FetcherStatus::NotStarted);
    assert!(!supervisor.fetcher_initiated().await);

    // a deleted fetcher can be started fresh
    supervisor.start_fetcher().await.unwrap();
    assert!(supervisor.fetcher_running().await);
}

#[tokio::test]
async fn test_manual_start_when_auto_start_disabled() {
    let config = ForexConfig {
        auto_start: false,
        feed_fn: Some(daily_feed()),
        ..ForexConfig::default()
    };
    let forex = Forex::with_config(config).await.unwrap();
    let supervisor = forex.supervisor();

    assert_eq!(supervisor.fetcher_status().await, FetcherStatus::NotStarted);
    supervisor.start_fetcher().await.unwrap();
    assert!(forex.latest_rates(&RateQuery::default()).await.is_ok());
}

#[tokio::test]
async fn test_failing_feed_keeps_fetcher_alive_across_queries() {
    let config = ForexConfig {
        feed_fn: Some(failing_feed()),
        ..ForexConfig::default()
    };
    let forex = Forex::with_config(config).await.unwrap();

    for _ in 0..3 {
        let result = forex.latest_rates(&RateQuery::default()).await;
        assert!(result.is_err());
        assert!(forex.supervisor().fetcher_running().await);
    }
}
