//! # ECB Forex
//!
//! A self-hosted library and background service exposing the euro
//! foreign-exchange reference rates published by the European Central Bank.
//!
//! ## Features
//!
//! - **Three feeds**: today's rates, the last ninety days, and the full
//!   historic series since 1999-01-04
//! - **Supervised fetcher**: periodic background refresh with a parallel
//!   warm-up and a warm-cache short-circuit on restart
//! - **Pluggable cache**: in-memory and on-disk backends sharing one
//!   behavioral contract, including TTL eviction and read-through resolve
//! - **Rebasing**: every rate set is stored EUR-quoted and can be
//!   re-expressed against any supported base currency
//! - **Amount conversion**: exchange an amount between any two supported
//!   currencies using fixed-point decimal arithmetic
//!
//! ## Quick Start
//!
//! ```no_run
//! use ecb_forex::{Forex, rates::RateQuery};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let forex = Forex::new().await?;
//!
//! // Today's rates, rebased to USD
//! let query = RateQuery::default().with_base("USD");
//! let rates = forex.latest_rates(&query).await?;
//! println!("{} rates for {}", rates.rates.len(), rates.date);
//!
//! // Convert 100 GBP to EUR
//! let amount = forex.exchange(100, "GBP", "EUR", &RateQuery::default()).await?;
//! println!("100 GBP = {amount} EUR");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`currency`] - Static registry of supported currencies
//! - [`feed`] - Feed orchestration: HTTP transport and XML parsing
//! - [`cache`] - Cache contract with in-memory and on-disk backends
//! - [`fetcher`] - Supervised periodic refresh worker
//! - [`rates`] - Rebasing, symbol filtering, and amount conversion
//! - [`supervisor`] - Fetcher lifecycle control
//! - [`cli`] - Export utilities for cached rate sets

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Cache contract and backends
pub mod cache;

/// CLI command implementations
pub mod cli;

/// Process configuration
pub mod config;

/// Static currency registry
pub mod currency;

/// Feed orchestration
pub mod feed;

/// Supervised refresh worker
pub mod fetcher;

/// Rebasing and amount conversion
pub mod rates;

/// Fetcher lifecycle control
pub mod supervisor;

/// Date parsing, code normalization, and decimal helpers
pub mod support;

// Re-export commonly used types
pub use cache::CacheKey;
pub use config::ForexConfig;
pub use currency::Currency;
pub use feed::FeedKind;
pub use rates::{Amount, RateQuery, RateValue};
pub use supervisor::Supervisor;

/// A single EUR-quoted rate: one euro buys `value` units of `currency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    /// ISO 4217 alphabetic code (e.g. "USD")
    pub currency: String,
    /// Units of `currency` per one unit of the base
    pub value: Decimal,
}

impl Rate {
    /// Create a rate entry.
    pub fn new(currency: impl Into<String>, value: Decimal) -> Self {
        Self {
            currency: currency.into(),
            value,
        }
    }
}

/// The rates quoted for a single calendar date.
///
/// Rates are stored against `base` (EUR as published; any supported
/// currency after rebasing). The base currency is always present with a
/// value of exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRates {
    /// The ECB publication date
    pub date: NaiveDate,
    /// ISO code of the base currency
    pub base: String,
    /// Per-currency quotes, in feed order
    pub rates: Vec<Rate>,
}

impl DailyRates {
    /// Create a rate set for a date with the given base.
    pub fn new(date: NaiveDate, base: impl Into<String>, rates: Vec<Rate>) -> Self {
        Self {
            date,
            base: base.into(),
            rates,
        }
    }

    /// Look up the quote for a currency code (case-insensitive).
    pub fn get(&self, code: &str) -> Option<Decimal> {
        self.rates
            .iter()
            .find(|r| r.currency.eq_ignore_ascii_case(code))
            .map(|r| r.value)
    }

    /// Whether the set carries a quote for the given code.
    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Render the quotes as a map keyed per the requested style.
    pub fn to_map(&self, keys: rates::KeyStyle) -> BTreeMap<String, Decimal> {
        self.rates
            .iter()
            .map(|r| (keys.apply(&r.currency), r.value))
            .collect()
    }

    /// Render the quotes as a map, keyed and valued per the query's
    /// `keys` and `format` options.
    pub fn render(&self, query: &rates::RateQuery) -> BTreeMap<String, rates::RateValue> {
        self.rates
            .iter()
            .map(|r| {
                (
                    query.keys.apply(&r.currency),
                    rates::format_value(r.value, query.format),
                )
            })
            .collect()
    }

    /// Validate structural integrity: base present with value one, codes unique.
    pub fn validate(&self) -> Result<(), String> {
        let Some(base_value) = self.get(&self.base) else {
            return Err(format!("base currency {} missing from rates", self.base));
        };
        if base_value != Decimal::ONE {
            return Err(format!(
                "base currency {} must quote at 1, got {}",
                self.base, base_value
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for rate in &self.rates {
            if !seen.insert(rate.currency.to_ascii_uppercase()) {
                return Err(format!("duplicate currency {}", rate.currency));
            }
        }
        Ok(())
    }
}

/// Crate-wide error aggregating the per-module error types.
#[derive(Debug, thiserror::Error)]
pub enum ForexError {
    /// Upstream retrieval or parsing failed
    #[error("feed error: {0}")]
    Feed(#[from] feed::FeedError),

    /// Cache backend failure
    #[error("cache error: {0}")]
    Cache(#[from] cache::CacheError),

    /// Date input not parseable or not covered by the historic set
    #[error(transparent)]
    Date(#[from] support::DateError),

    /// Fetcher lifecycle or messaging failure
    #[error("fetcher error: {0}")]
    Fetcher(#[from] fetcher::FetcherError),

    /// Registry failure
    #[error("registry error: {0}")]
    Registry(#[from] currency::RegistryError),

    /// ISO code unknown to the currency registry
    #[error("invalid currency: {0}")]
    InvalidCurrency(String),

    /// Rebase target unknown to the currency registry
    #[error("base currency not found: {0}")]
    BaseCurrencyNotFound(String),

    /// Malformed arguments to the exchange operation
    #[error("invalid exchange: {0}")]
    InvalidExchange(String),
}

/// Result type for library operations
pub type ForexResult<T> = Result<T, ForexError>;

/// Library entry point: owns the supervisor and serves rate queries.
///
/// Construct with [`Forex::new`] for defaults or [`Forex::with_config`]
/// to select the cache backend, file path, and scheduler interval. The
/// fetcher starts automatically unless `auto_start` is disabled.
pub struct Forex {
    supervisor: Arc<Supervisor>,
}

impl Forex {
    /// Create a client with the default configuration.
    pub async fn new() -> ForexResult<Self> {
        Self::with_config(ForexConfig::default()).await
    }

    /// Create a client from an explicit configuration.
    pub async fn with_config(config: ForexConfig) -> ForexResult<Self> {
        let supervisor = Arc::new(Supervisor::new(config).await?);
        Ok(Self { supervisor })
    }

    /// Access the underlying supervisor.
    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Today's reference rates, rebased and formatted per the query.
    pub async fn latest_rates(&self, query: &RateQuery) -> ForexResult<DailyRates> {
        let mut sets = self.fetch(CacheKey::LatestRates, query).await?;
        let set = if sets.is_empty() {
            return Err(feed::FeedError::Parse("empty latest feed".to_string()).into());
        } else {
            sets.swap_remove(0)
        };
        rates::apply(set, query)
    }

    /// Rates for roughly the last ninety calendar days, most recent first.
    pub async fn last_ninety_days_rates(&self, query: &RateQuery) -> ForexResult<Vec<DailyRates>> {
        let sets = self.fetch(CacheKey::LastNinetyDaysRates, query).await?;
        sets.into_iter().map(|s| rates::apply(s, query)).collect()
    }

    /// The full historic series since 1999-01-04, most recent first.
    ///
    /// The historic feed is fetched on demand only; once requested it
    /// enters the cache and participates in TTL eviction like the
    /// scheduled feeds.
    pub async fn historic_rates(&self, query: &RateQuery) -> ForexResult<Vec<DailyRates>> {
        let sets = self.fetch(CacheKey::HistoricRates, query).await?;
        sets.into_iter().map(|s| rates::apply(s, query)).collect()
    }

    /// The rate set for a specific past date.
    ///
    /// # Errors
    /// Returns [`support::DateError::RateNotFound`] when the date is not
    /// present in the historic series (weekends, holidays, pre-1999).
    pub async fn get_historic_rate(
        &self,
        date: NaiveDate,
        query: &RateQuery,
    ) -> ForexResult<DailyRates> {
        let sets = self.fetch(CacheKey::HistoricRates, query).await?;
        let set = sets
            .into_iter()
            .find(|s| s.date == date)
            .ok_or(support::DateError::RateNotFound { date })?;
        rates::apply(set, query)
    }

    /// The rate sets between two dates, inclusive, most recent first.
    pub async fn get_historic_rates_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        query: &RateQuery,
    ) -> ForexResult<Vec<DailyRates>> {
        let (from, to) = if from <= to { (from, to) } else { (to, from) };
        let sets = self.fetch(CacheKey::HistoricRates, query).await?;
        sets.into_iter()
            .filter(|s| s.date >= from && s.date <= to)
            .map(|s| rates::apply(s, query))
            .collect()
    }

    /// Convert `amount` from one currency to another at today's rates.
    ///
    /// The result is rounded per the query's `round` and rendered per
    /// its `format`.
    pub async fn exchange(
        &self,
        amount: impl Into<Amount>,
        from: &str,
        to: &str,
        query: &RateQuery,
    ) -> ForexResult<RateValue> {
        // Conversion math needs the raw EUR quotes; rebasing and rounding
        // happen inside the exchange step.
        let raw = RateQuery {
            base: "EUR".to_string(),
            round: None,
            symbols: None,
            ..query.clone()
        };
        let mut sets = self.fetch(CacheKey::LatestRates, &raw).await?;
        let set = if sets.is_empty() {
            return Err(feed::FeedError::Parse("empty latest feed".to_string()).into());
        } else {
            sets.swap_remove(0)
        };
        rates::exchange(&set, amount, from, to, query)
    }

    /// Per-key cache refresh timestamps.
    pub async fn last_updated(&self) -> ForexResult<Vec<(CacheKey, DateTime<Utc>)>> {
        let handle = self.supervisor.handle().await?;
        Ok(handle.last_updated().await?)
    }

    /// Stop the fetcher and release cache resources.
    pub async fn stop(&self) -> ForexResult<()> {
        self.supervisor.stop().await?;
        Ok(())
    }

    async fn fetch(&self, key: CacheKey, query: &RateQuery) -> ForexResult<Vec<DailyRates>> {
        let handle = self.supervisor.handle().await?;
        handle
            .get(key, query.use_cache, query.feed_fn.clone())
            .await
    }
}
