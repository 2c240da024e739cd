//! On-disk cache behavior across client restarts.

use super::support::{daily_feed, failing_feed};
use ecb_forex::config::CacheBackend;
use ecb_forex::rates::RateQuery;
use ecb_forex::{Forex, ForexConfig};
use rust_decimal_macros::dec;
use std::path::PathBuf;
use tempfile::TempDir;

fn file_config(path: PathBuf) -> ForexConfig {
    ForexConfig {
        cache_backend: CacheBackend::File,
        cache_path: Some(path),
        ..ForexConfig::default()
    }
}

#[tokio::test]
async fn test_warm_disk_cache_survives_restart_and_skips_feed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".forex_cache");

    // first process: populate the cache from the fixture feed
    {
        let config = ForexConfig {
            feed_fn: Some(daily_feed()),
            ..file_config(path.clone())
        };
        let forex = Forex::with_config(config).await.unwrap();
        let rates = forex.latest_rates(&RateQuery::default()).await.unwrap();
        assert_eq!(rates.get("USD"), Some(dec!(1.0772)));
        forex.stop().await.unwrap();
    }

    assert!(path.exists());

    // second process: the feed is dead, but the warm cache serves reads
    {
        let config = ForexConfig {
            feed_fn: Some(failing_feed()),
            ..file_config(path.clone())
        };
        let forex = Forex::with_config(config).await.unwrap();
        let rates = forex.latest_rates(&RateQuery::default()).await.unwrap();
        assert_eq!(rates.get("USD"), Some(dec!(1.0772)));
        forex.stop().await.unwrap();
    }
}

#[tokio::test]
async fn test_last_updated_reports_scheduled_keys() {
    let dir = TempDir::new().unwrap();
    let config = ForexConfig {
        feed_fn: Some(daily_feed()),
        ..file_config(dir.path().join(".forex_cache"))
    };
    let forex = Forex::with_config(config).await.unwrap();
    forex.latest_rates(&RateQuery::default()).await.unwrap();

    let stamps = forex.last_updated().await.unwrap();
    assert!(!stamps.is_empty());
    for (_, stamp) in &stamps {
        assert_eq!(stamp.timestamp_subsec_nanos() % 1_000_000, 0);
    }
    forex.stop().await.unwrap();
}

#[tokio::test]
async fn test_cache_bypass_never_touches_disk_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bypass").join(".forex_cache");
    let config = ForexConfig {
        feed_fn: Some(daily_feed()),
        use_cache: false,
        ..file_config(path.clone())
    };

    let forex = Forex::with_config(config).await.unwrap();
    let rates = forex.latest_rates(&RateQuery::default()).await.unwrap();
    assert_eq!(rates.get("USD"), Some(dec!(1.0772)));

    // with use_cache off the store is never even initialized
    assert!(!path.exists());
    forex.stop().await.unwrap();
}
