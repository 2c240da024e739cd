//! Shared fixtures and feed producers for integration tests.
//!
//! The fixture feeds mirror the ECB publication of 2024-11-08; injecting
//! them through `feed_fn` keeps every test off the network.

use ecb_forex::feed::{parser, FeedError, FeedFn};

/// Today's feed as published on 2024-11-08 (30 quoted currencies)
pub const DAILY: &str = include_str!("../fixtures/eurofxref-daily.xml");

/// A three-day slice of the ninety-day feed
pub const NINETY_DAYS: &str = include_str!("../fixtures/eurofxref-hist-90d.xml");

/// A five-day slice of the historic feed
pub const HISTORIC: &str = include_str!("../fixtures/eurofxref-hist.xml");

/// Feed producer serving the daily fixture.
pub fn daily_feed() -> FeedFn {
    FeedFn::from_fn(|| Box::pin(async { parser::parse_rates(DAILY.as_bytes()) }))
}

/// Feed producer serving the ninety-day fixture.
pub fn ninety_days_feed() -> FeedFn {
    FeedFn::from_fn(|| Box::pin(async { parser::parse_rates(NINETY_DAYS.as_bytes()) }))
}

/// Feed producer serving the historic fixture.
pub fn historic_feed() -> FeedFn {
    FeedFn::from_fn(|| Box::pin(async { parser::parse_rates(HISTORIC.as_bytes()) }))
}

/// Feed producer that always fails, standing in for a dead adapter.
pub fn failing_feed() -> FeedFn {
    FeedFn::from_fn(|| Box::pin(async { Err(FeedError::Http("adapter down".to_string())) }))
}
