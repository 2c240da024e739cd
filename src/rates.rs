//! Rebasing, symbol filtering, and amount conversion.
//!
//! Rate sets are stored EUR-quoted; rebasing re-expresses every quote
//! against a requested base by dividing through the base's EUR quote.
//! All arithmetic is fixed-point decimal.

use crate::feed::FeedFn;
use crate::support;
use crate::{currency, DailyRates, ForexError, ForexResult, Rate};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Default number of fractional digits in query results
pub const DEFAULT_ROUND: u32 = 5;

/// Key style for currency-keyed maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyStyle {
    /// Normalized lower-case keys (`"usd"`)
    #[default]
    Symbol,
    /// Upper-case keys (`"USD"`)
    String,
}

impl KeyStyle {
    /// Normalize a currency code per this style.
    pub fn apply(&self, code: &str) -> String {
        match self {
            KeyStyle::Symbol => code.to_ascii_lowercase(),
            KeyStyle::String => code.to_ascii_uppercase(),
        }
    }
}

/// Output representation for rate values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Emit the decimal itself
    #[default]
    Decimal,
    /// Emit the decimal's canonical string
    String,
}

/// A rate value rendered per a [`Format`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RateValue {
    /// Decimal representation
    Decimal(Decimal),
    /// Canonical string representation
    Text(String),
}

impl RateValue {
    /// The numeric value, parsing the string form back when needed.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            RateValue::Decimal(d) => Some(*d),
            RateValue::Text(s) => Decimal::from_str(s).ok(),
        }
    }
}

impl fmt::Display for RateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateValue::Decimal(d) => write!(f, "{d}"),
            RateValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Render a decimal per the requested format.
pub fn format_value(value: Decimal, format: Format) -> RateValue {
    match format {
        Format::Decimal => RateValue::Decimal(value),
        Format::String => RateValue::Text(value.to_string()),
    }
}

/// Options accepted by every rates query.
#[derive(Debug, Clone)]
pub struct RateQuery {
    /// Rebase target (default EUR)
    pub base: String,
    /// Value representation (default decimal)
    pub format: Format,
    /// Fractional digits, 0–15, `None` for no rounding (default 5)
    pub round: Option<u32>,
    /// Restrict the output to these codes (applied before rebasing)
    pub symbols: Option<Vec<String>>,
    /// Map-key style (default lower-case symbols)
    pub keys: KeyStyle,
    /// Bypass the cache when false (default true)
    pub use_cache: bool,
    /// Test-injection hook replacing the feed dispatch
    pub feed_fn: Option<FeedFn>,
}

impl Default for RateQuery {
    fn default() -> Self {
        Self {
            base: "EUR".to_string(),
            format: Format::Decimal,
            round: Some(DEFAULT_ROUND),
            symbols: None,
            keys: KeyStyle::Symbol,
            use_cache: true,
            feed_fn: None,
        }
    }
}

impl RateQuery {
    /// Set the rebase target.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    /// Set the rounding precision (`None` disables rounding).
    pub fn with_round(mut self, round: Option<u32>) -> Self {
        self.round = round;
        self
    }

    /// Restrict the output to a set of currency codes.
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols = Some(symbols.into_iter().map(Into::into).collect());
        self
    }

    /// Set the value representation.
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Set the map-key style.
    pub fn with_keys(mut self, keys: KeyStyle) -> Self {
        self.keys = keys;
        self
    }

    /// Bypass the cache for this query.
    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    /// Inject a feed producer for this query.
    pub fn with_feed_fn(mut self, feed_fn: FeedFn) -> Self {
        self.feed_fn = Some(feed_fn);
        self
    }
}

/// An amount accepted by the exchange operation: a decimal, an integer,
/// a float, or a numeric string.
#[derive(Debug, Clone)]
pub enum Amount {
    /// Fixed-point decimal
    Decimal(Decimal),
    /// Whole number
    Int(i64),
    /// Binary float, converted on use
    Float(f64),
    /// Numeric string, parsed on use
    Text(String),
}

impl Amount {
    /// Convert to a decimal.
    ///
    /// # Errors
    /// Non-finite floats and non-numeric strings are
    /// [`ForexError::InvalidExchange`].
    pub fn to_decimal(&self) -> ForexResult<Decimal> {
        match self {
            Amount::Decimal(d) => Ok(*d),
            Amount::Int(i) => Ok(Decimal::from(*i)),
            Amount::Float(f) => Decimal::from_f64(*f)
                .ok_or_else(|| ForexError::InvalidExchange(format!("invalid amount: {f}"))),
            Amount::Text(s) => Decimal::from_str(s.trim())
                .map_err(|_| ForexError::InvalidExchange(format!("invalid amount: {s:?}"))),
        }
    }
}

impl From<Decimal> for Amount {
    fn from(d: Decimal) -> Self {
        Amount::Decimal(d)
    }
}

impl From<i64> for Amount {
    fn from(i: i64) -> Self {
        Amount::Int(i)
    }
}

impl From<i32> for Amount {
    fn from(i: i32) -> Self {
        Amount::Int(i64::from(i))
    }
}

impl From<f64> for Amount {
    fn from(f: f64) -> Self {
        Amount::Float(f)
    }
}

impl From<&str> for Amount {
    fn from(s: &str) -> Self {
        Amount::Text(s.to_string())
    }
}

impl From<String> for Amount {
    fn from(s: String) -> Self {
        Amount::Text(s)
    }
}

/// Re-express an EUR-quoted rate set against another base.
///
/// Rules, in order:
/// - target equals the set's current base: the set is returned unchanged
/// - target unknown to the registry: [`ForexError::BaseCurrencyNotFound`]
/// - target carries no quote in this set: the set is returned unchanged
/// - otherwise every quote is divided by the target's EUR quote, the
///   target itself becoming exactly one
///
/// Entry order and the original currency-code capitalization are
/// preserved.
pub fn rebase(set: DailyRates, base: &str) -> ForexResult<DailyRates> {
    if base.eq_ignore_ascii_case(&set.base) {
        return Ok(set);
    }

    if !currency::exists(base) {
        return Err(ForexError::BaseCurrencyNotFound(base.to_string()));
    }

    let Some(base_value) = set.get(base) else {
        return Ok(set);
    };

    let mut rates = Vec::with_capacity(set.rates.len());
    for rate in &set.rates {
        let value = if rate.currency.eq_ignore_ascii_case(base) {
            Decimal::ONE
        } else {
            div(rate.value, base_value)?
        };
        rates.push(Rate::new(rate.currency.clone(), value));
    }

    Ok(DailyRates::new(
        set.date,
        base.to_ascii_uppercase(),
        rates,
    ))
}

/// Restrict a rate set to the given currency codes (case-insensitive).
///
/// An empty symbol list leaves the set untouched.
pub fn filter_symbols(mut set: DailyRates, symbols: &[String]) -> DailyRates {
    if symbols.is_empty() {
        return set;
    }
    set.rates.retain(|rate| {
        symbols
            .iter()
            .any(|s| s.eq_ignore_ascii_case(&rate.currency))
    });
    set
}

/// Apply a query to a rate set: filter, rebase, round.
///
/// The symbol filter runs before rebasing so an explicitly included base
/// is still available as the rebase reference.
pub fn apply(set: DailyRates, query: &RateQuery) -> ForexResult<DailyRates> {
    let set = match &query.symbols {
        Some(symbols) => filter_symbols(set, symbols),
        None => set,
    };

    let mut set = rebase(set, &query.base)?;

    if query.round.is_some() {
        for rate in &mut set.rates {
            rate.value = support::round_value(rate.value, query.round);
        }
    }
    Ok(set)
}

/// Convert `amount` between two currencies using the given rate set.
///
/// Both codes must be known to the registry and quoted in the set (EUR
/// is synthesized at one when absent). The result is
/// `amount × rate(to) / rate(from)`, rounded per the query's `round`
/// and rendered per its `format`.
///
/// # Errors
/// - [`ForexError::InvalidCurrency`] for an unknown or unquoted code
/// - [`ForexError::InvalidExchange`] for a malformed amount
pub fn exchange(
    set: &DailyRates,
    amount: impl Into<Amount>,
    from: &str,
    to: &str,
    query: &RateQuery,
) -> ForexResult<RateValue> {
    let amount = amount.into().to_decimal()?;

    let from_value = quote(set, from)?;
    let to_value = quote(set, to)?;

    let result = amount
        .checked_mul(div(to_value, from_value)?)
        .ok_or_else(|| ForexError::InvalidExchange("amount out of range".to_string()))?;

    Ok(format_value(
        support::round_value(result, query.round),
        query.format,
    ))
}

fn quote(set: &DailyRates, code: &str) -> ForexResult<Decimal> {
    if !currency::exists(code) {
        return Err(ForexError::InvalidCurrency(code.to_string()));
    }
    if let Some(value) = set.get(code) {
        return Ok(value);
    }
    if code.eq_ignore_ascii_case("EUR") {
        return Ok(Decimal::ONE);
    }
    Err(ForexError::InvalidCurrency(code.to_string()))
}

fn div(numerator: Decimal, denominator: Decimal) -> ForexResult<Decimal> {
    numerator
        .checked_div(denominator)
        .ok_or_else(|| ForexError::InvalidExchange("division by zero".to_string()))
}
