//! Parser for the ECB reference-rate XML envelope.
//!
//! The envelope nests three layers of `Cube` elements: an outer wrapper,
//! one `Cube` per publication day carrying a `time` attribute, and one
//! `Cube` per currency carrying `currency` and `rate` attributes. EUR is
//! never enumerated upstream; it is synthesized at value one.

use super::{FeedError, FeedResult};
use crate::support;
use crate::{DailyRates, Rate};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Cube", default)]
    cube: OuterCube,
}

#[derive(Debug, Deserialize, Default)]
struct OuterCube {
    #[serde(rename = "Cube", default)]
    days: Vec<DayCube>,
}

#[derive(Debug, Deserialize)]
struct DayCube {
    #[serde(rename = "time", default)]
    time: String,
    #[serde(rename = "Cube", default)]
    rates: Vec<RateCube>,
}

#[derive(Debug, Deserialize)]
struct RateCube {
    currency: String,
    rate: String,
}

/// Parse a feed body into daily rate sets, most recent first.
///
/// # Errors
/// Returns [`FeedError::Parse`] when the envelope is malformed, a date
/// or rate attribute does not parse, or the feed carries no days.
pub fn parse_rates(body: &[u8]) -> FeedResult<Vec<DailyRates>> {
    let envelope: Envelope = serde_xml_rs::from_reader(body)
        .map_err(|e| FeedError::Parse(format!("malformed feed envelope: {e}")))?;

    if envelope.cube.days.is_empty() {
        return Err(FeedError::Parse("feed carries no rate days".to_string()));
    }

    let mut sets = Vec::with_capacity(envelope.cube.days.len());
    for day in envelope.cube.days {
        sets.push(parse_day(day)?);
    }

    // The historic files are published most-recent first already; the
    // sort normalizes any upstream deviation.
    sets.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(sets)
}

fn parse_day(day: DayCube) -> FeedResult<DailyRates> {
    let date = support::parse_date(&day.time)
        .map_err(|_| FeedError::Parse(format!("invalid cube date: {:?}", day.time)))?;

    let mut rates = Vec::with_capacity(day.rates.len() + 1);
    let mut has_eur = false;

    for cube in day.rates {
        let value = Decimal::from_str(cube.rate.trim()).map_err(|e| {
            FeedError::Parse(format!(
                "invalid rate {:?} for {}: {e}",
                cube.rate, cube.currency
            ))
        })?;
        if cube.currency.eq_ignore_ascii_case("EUR") {
            has_eur = true;
        }
        rates.push(Rate::new(cube.currency, value));
    }

    if !has_eur {
        rates.insert(0, Rate::new("EUR", Decimal::ONE));
    }

    Ok(DailyRates::new(date, "EUR", rates))
}
