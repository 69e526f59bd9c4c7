//! JSON bar loading.
//!
//! Input is an array of records with `date`, `open`, `high`, `low`, `close`
//! and an optional `volume`. `date` may be a calendar date, an RFC 3339
//! timestamp, a naive `YYYY-MM-DDTHH:MM:SS` timestamp (read as UTC) or epoch
//! milliseconds. Records sharing a date keep the last one.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use ob_core::{datetime_to_ts, Bar, Error, Result, TimestampMs};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::bar_builder::{resample, Timeframe};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDate {
    Text(String),
    Millis(i64),
}

#[derive(Debug, Deserialize)]
struct RawBar {
    date: RawDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

fn parse_date(raw: &RawDate) -> Result<TimestampMs> {
    let text = match raw {
        RawDate::Millis(ms) => return Ok(*ms),
        RawDate::Text(text) => text.trim(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(datetime_to_ts(dt.and_utc()));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| datetime_to_ts(dt.and_utc()))
        .ok_or_else(|| Error::data(format!("unparseable date '{}'", text)))
}

/// Parse bars from a JSON array, deduplicated and sorted by timestamp.
pub fn parse_json_bars(json: &str) -> Result<Vec<Bar>> {
    let records: Vec<RawBar> = serde_json::from_str(json)?;
    let total = records.len();

    let mut by_ts: BTreeMap<TimestampMs, Bar> = BTreeMap::new();
    for record in &records {
        let timestamp = parse_date(&record.date)?;
        let bar = Bar::new(
            timestamp,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume.unwrap_or(0.0),
        );
        by_ts.insert(timestamp, bar);
    }

    let duplicates = total - by_ts.len();
    if duplicates > 0 {
        debug!(duplicates, "dropped duplicate dates");
    }
    Ok(by_ts.into_values().collect())
}

/// Load bars from a JSON file.
pub fn load_json_bars(path: impl AsRef<Path>) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let bars = parse_json_bars(&json)?;
    info!(path = %path.display(), bars = bars.len(), "loaded bars");
    Ok(bars)
}

/// Load bars from a JSON file and resample them to `timeframe`.
pub fn load_bars(path: impl AsRef<Path>, timeframe: Timeframe) -> Result<Vec<Bar>> {
    let bars = load_json_bars(path)?;
    let resampled = resample(&bars, timeframe)?;
    debug!(%timeframe, input = bars.len(), output = resampled.len(), "resampled bars");
    Ok(resampled)
}
