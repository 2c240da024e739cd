//! Static registry of the currencies the ECB feeds can quote.
//!
//! The registry is embedded at compile time and loaded once. *Enabled*
//! currencies appear in today's feed; disabled entries only ever show up
//! in the historic series (discontinued currencies and suspended quotes).

use crate::rates::KeyStyle;
use crate::support;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Embedded registry data
const CURRENCIES_JSON: &str = include_str!("currencies.json");

/// Global registry instance (loaded once)
static REGISTRY: Lazy<Result<CurrencyRegistry, RegistryError>> =
    Lazy::new(|| CurrencyRegistry::from_json(CURRENCIES_JSON));

/// Descriptor for a single supported currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    name: String,
    iso_code: String,
    iso_numeric: String,
    symbol: String,
    subunit: Decimal,
    subunit_name: String,
    alt_names: Vec<String>,
    alt_symbols: Vec<String>,
    enabled: bool,
}

impl Currency {
    /// Full currency name (e.g. "US Dollar")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// ISO 4217 alphabetic code
    pub fn iso_code(&self) -> &str {
        &self.iso_code
    }

    /// ISO 4217 numeric code
    pub fn iso_numeric(&self) -> &str {
        &self.iso_numeric
    }

    /// Display symbol
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Fractional size of the subunit (e.g. 0.01)
    pub fn subunit(&self) -> Decimal {
        self.subunit
    }

    /// Name of the subunit (e.g. "Cent")
    pub fn subunit_name(&self) -> &str {
        &self.subunit_name
    }

    /// Alternative names
    pub fn alt_names(&self) -> &[String] {
        &self.alt_names
    }

    /// Alternative symbols
    pub fn alt_symbols(&self) -> &[String] {
        &self.alt_symbols
    }

    /// Whether the currency appears in today's feed
    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

/// Registry of supported currencies keyed by ISO code.
#[derive(Debug, Clone)]
pub struct CurrencyRegistry {
    #[allow(dead_code)]
    schema_version: String,
    entries: Vec<Currency>,
}

impl CurrencyRegistry {
    /// Load the embedded registry.
    ///
    /// This is a singleton operation; the registry is parsed once and
    /// cached for the process lifetime.
    pub fn load() -> Result<&'static Self, &'static RegistryError> {
        REGISTRY.as_ref()
    }

    fn from_json(json: &str) -> Result<Self, RegistryError> {
        let raw: RawRegistry = serde_json::from_str(json)
            .map_err(|e| RegistryError::ParseError(format!("failed to parse registry: {e}")))?;
        Ok(Self {
            schema_version: raw.schema_version,
            entries: raw.currencies,
        })
    }

    /// All registry entries, keyed per the requested style.
    pub fn all(&self, keys: KeyStyle) -> HashMap<String, &Currency> {
        self.entries
            .iter()
            .map(|c| (keys.apply(&c.iso_code), c))
            .collect()
    }

    /// Entries present in today's feed.
    pub fn available(&self, keys: KeyStyle) -> HashMap<String, &Currency> {
        self.entries
            .iter()
            .filter(|c| c.enabled)
            .map(|c| (keys.apply(&c.iso_code), c))
            .collect()
    }

    /// Entries that only appear in the historic series.
    pub fn disabled(&self, keys: KeyStyle) -> HashMap<String, &Currency> {
        self.entries
            .iter()
            .filter(|c| !c.enabled)
            .map(|c| (keys.apply(&c.iso_code), c))
            .collect()
    }

    /// Case-insensitive lookup by ISO code.
    ///
    /// Inputs that are not a three-letter code shape return `None`
    /// rather than erroring.
    pub fn get(&self, code: &str) -> Option<&Currency> {
        let code = support::normalize_code(code)?;
        self.entries.iter().find(|c| c.iso_code == code)
    }

    /// Like [`CurrencyRegistry::get`] but failing with a typed error.
    pub fn get_or_fail(&self, code: &str) -> Result<&Currency, RegistryError> {
        self.get(code)
            .ok_or_else(|| RegistryError::NotFound(code.to_string()))
    }

    /// Whether a currency code is known to the registry.
    pub fn exists(&self, code: &str) -> bool {
        self.get(code).is_some()
    }
}

/// All registry entries, keyed per the requested style.
pub fn all(keys: KeyStyle) -> HashMap<String, &'static Currency> {
    CurrencyRegistry::load().map(|r| r.all(keys)).unwrap_or_default()
}

/// Entries present in today's feed.
pub fn available(keys: KeyStyle) -> HashMap<String, &'static Currency> {
    CurrencyRegistry::load()
        .map(|r| r.available(keys))
        .unwrap_or_default()
}

/// Entries that only appear in the historic series.
pub fn disabled(keys: KeyStyle) -> HashMap<String, &'static Currency> {
    CurrencyRegistry::load()
        .map(|r| r.disabled(keys))
        .unwrap_or_default()
}

/// Case-insensitive lookup by ISO code.
pub fn get(code: &str) -> Option<&'static Currency> {
    CurrencyRegistry::load().ok().and_then(|r| r.get(code))
}

/// Lookup by ISO code, failing with a typed error when unknown.
pub fn get_or_fail(code: &str) -> Result<&'static Currency, RegistryError> {
    match CurrencyRegistry::load() {
        Ok(registry) => registry.get_or_fail(code),
        Err(e) => Err(RegistryError::ParseError(e.to_string())),
    }
}

/// Whether a currency code is known to the registry.
pub fn exists(code: &str) -> bool {
    get(code).is_some()
}

/// Raw registry structure for deserialization
#[derive(Debug, Deserialize)]
struct RawRegistry {
    schema_version: String,
    currencies: Vec<Currency>,
}

/// Errors that can occur when working with the registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Failed to parse registry JSON
    #[error("registry parse error: {0}")]
    ParseError(String),

    /// Currency code not found in registry
    #[error("currency not found: {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_loads() {
        let registry = CurrencyRegistry::load().unwrap();
        assert_eq!(registry.all(KeyStyle::Symbol).len(), 41);
    }

    #[test]
    fn test_available_and_disabled_partition_all() {
        let registry = CurrencyRegistry::load().unwrap();
        let all = registry.all(KeyStyle::String);
        let available = registry.available(KeyStyle::String);
        let disabled = registry.disabled(KeyStyle::String);

        assert_eq!(available.len() + disabled.len(), all.len());
        for key in available.keys() {
            assert!(!disabled.contains_key(key));
        }
        assert_eq!(available.len(), 31);
        assert_eq!(disabled.len(), 10);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(get("usd").is_some());
        assert!(get("USD").is_some());
        assert!(get("UsD").is_some());
    }

    #[test]
    fn test_lookup_rejects_invalid_shapes() {
        assert!(get("").is_none());
        assert!(get("US").is_none());
        assert!(get("USDX").is_none());
        assert!(get("123").is_none());
    }

    #[test]
    fn test_get_or_fail_on_unknown_code() {
        assert!(get_or_fail("XXX").is_err());
        assert!(get_or_fail("usd").is_ok());
    }

    #[test]
    fn test_historic_currencies_are_disabled() {
        for code in ["HRK", "EEK", "LTL", "LVL", "SKK", "RUB"] {
            let currency = get(code).unwrap();
            assert!(!currency.enabled(), "{code} should be disabled");
        }
    }

    #[test]
    fn test_key_style_controls_map_keys() {
        let lower = available(KeyStyle::Symbol);
        assert!(lower.contains_key("usd"));
        let upper = available(KeyStyle::String);
        assert!(upper.contains_key("USD"));
    }

    #[test]
    fn test_descriptor_fields() {
        let usd = get("USD").unwrap();
        assert_eq!(usd.name(), "US Dollar");
        assert_eq!(usd.iso_numeric(), "840");
        assert_eq!(usd.symbol(), "$");
        assert_eq!(usd.subunit().to_string(), "0.01");
        assert!(usd.enabled());
    }
}
