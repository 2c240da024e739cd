//! Export command implementation.
//!
//! Each subcommand fetches one feed through a short-lived client backed
//! by the persistent file cache, so repeated exports inside the TTL skip
//! the network entirely, and writes the result to
//! `<output>/<feed>_rates.json`.

use super::CliError;
use crate::cache::CacheKey;
use crate::config::{CacheBackend, ForexConfig};
use crate::rates::{KeyStyle, RateQuery, RateValue};
use crate::{DailyRates, Forex};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Options shared by the three export commands.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Rebase target currency
    #[arg(long, default_value = "EUR")]
    pub base: String,

    /// Restrict the output to these currency codes
    #[arg(long, value_delimiter = ',')]
    pub symbols: Option<Vec<String>>,

    /// Directory the JSON file is written to
    #[arg(long, default_value = ".")]
    pub output: PathBuf,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// One exported rate set as it appears in the JSON file. The rates map
/// is rendered per the query's `keys` and `format` options.
#[derive(Debug, Serialize)]
struct ExportedRates {
    date: NaiveDate,
    base: String,
    rates: BTreeMap<String, RateValue>,
}

impl ExportedRates {
    fn new(set: DailyRates, query: &RateQuery) -> Self {
        let rates = set.render(query);
        Self {
            date: set.date,
            base: set.base,
            rates,
        }
    }
}

impl ExportArgs {
    /// Fetch the feed behind `key` and write it to the output directory.
    ///
    /// Returns the path of the written file.
    pub async fn execute(&self, key: CacheKey) -> Result<PathBuf, CliError> {
        let config = ForexConfig {
            cache_backend: CacheBackend::File,
            json_pretty: self.pretty,
            ..ForexConfig::default()
        };
        let pretty = config.json_pretty;
        let forex = Forex::with_config(config).await?;

        let result = self.export(&forex, key, pretty).await;
        // release the cache regardless of how the export went
        let _ = forex.stop().await;
        result
    }

    async fn export(&self, forex: &Forex, key: CacheKey, pretty: bool) -> Result<PathBuf, CliError> {
        let mut query = RateQuery::default()
            .with_base(self.base.clone())
            .with_keys(KeyStyle::String);
        if let Some(symbols) = &self.symbols {
            query = query.with_symbols(symbols.clone());
        }

        let json = match key {
            CacheKey::LatestRates => {
                let set = forex.latest_rates(&query).await?;
                encode(&ExportedRates::new(set, &query), pretty)?
            }
            CacheKey::LastNinetyDaysRates => {
                let sets = forex.last_ninety_days_rates(&query).await?;
                let exported: Vec<ExportedRates> = sets
                    .into_iter()
                    .map(|s| ExportedRates::new(s, &query))
                    .collect();
                encode(&exported, pretty)?
            }
            CacheKey::HistoricRates => {
                let sets = forex.historic_rates(&query).await?;
                let exported: Vec<ExportedRates> = sets
                    .into_iter()
                    .map(|s| ExportedRates::new(s, &query))
                    .collect();
                encode(&exported, pretty)?
            }
        };

        std::fs::create_dir_all(&self.output).map_err(|e| CliError::Io(e.to_string()))?;
        let path = self.output.join(format!("{}.json", key.as_str()));
        std::fs::write(&path, json).map_err(|e| CliError::Io(e.to_string()))?;
        info!("wrote {key} to {}", path.display());
        Ok(path)
    }
}

fn encode<T: Serialize>(value: &T, pretty: bool) -> Result<String, CliError> {
    let encoded = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    encoded.map_err(|e| CliError::Serialization(e.to_string()))
}

/// File name an export lands in, relative to the output directory.
pub fn export_file_name(key: CacheKey) -> String {
    format!("{}.json", key.as_str())
}

/// Write pre-fetched rate sets to a file the way `execute` would,
/// rendered per the query's `keys` and `format` options.
///
/// Split out so tests can exercise the serialization path without a
/// network-backed client.
pub fn write_rate_sets(
    sets: Vec<DailyRates>,
    key: CacheKey,
    query: &RateQuery,
    output: &Path,
    pretty: bool,
) -> Result<PathBuf, CliError> {
    let exported: Vec<ExportedRates> = sets
        .into_iter()
        .map(|s| ExportedRates::new(s, query))
        .collect();
    let json = encode(&exported, pretty)?;

    std::fs::create_dir_all(output).map_err(|e| CliError::Io(e.to_string()))?;
    let path = output.join(export_file_name(key));
    std::fs::write(&path, json).map_err(|e| CliError::Io(e.to_string()))?;
    Ok(path)
}
