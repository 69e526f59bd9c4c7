//! Timeframe resampling.
//!
//! Aggregates daily bars into weekly (ISO week) or monthly bars. Each output
//! bar is stamped with the timestamp of the last input bar in its period.

use chrono::Datelike;
use ob_core::{ts_to_datetime, Bar, Error, Result, TimestampMs};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Target bar timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Timeframe {
    /// One bar per calendar day.
    #[default]
    Daily,
    /// One bar per ISO week (Monday to Sunday).
    Weekly,
    /// One bar per calendar month.
    Monthly,
}

impl Timeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Daily => "1D",
            Timeframe::Weekly => "1W",
            Timeframe::Monthly => "1M",
        }
    }

    /// Grouping key of the period containing `ts_ms`.
    fn period_key(self, ts_ms: TimestampMs) -> Result<(i32, u32, u32)> {
        let dt = ts_to_datetime(ts_ms)
            .ok_or_else(|| Error::data(format!("timestamp {} out of range", ts_ms)))?;
        Ok(match self {
            Timeframe::Daily => (dt.year(), dt.month(), dt.day()),
            Timeframe::Weekly => {
                let week = dt.iso_week();
                (week.year(), week.week(), 0)
            }
            Timeframe::Monthly => (dt.year(), dt.month(), 0),
        })
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1D" | "D" | "DAILY" => Ok(Timeframe::Daily),
            "1W" | "W" | "WEEKLY" => Ok(Timeframe::Weekly),
            "1M" | "M" | "MONTHLY" => Ok(Timeframe::Monthly),
            other => Err(Error::config(format!(
                "unsupported timeframe '{}', expected 1D, 1W or 1M",
                other
            ))),
        }
    }
}

/// A bar that's currently being built.
#[derive(Debug, Clone)]
struct BarInProgress {
    timestamp: TimestampMs,
    open: Option<f64>,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl BarInProgress {
    fn new() -> Self {
        Self {
            timestamp: TimestampMs::MIN,
            open: None,
            high: f64::NEG_INFINITY,
            low: f64::INFINITY,
            close: 0.0,
            volume: 0.0,
        }
    }

    fn add_bar(&mut self, bar: &Bar) {
        if self.open.is_none() {
            self.open = Some(bar.open);
        }
        self.timestamp = bar.timestamp;
        self.high = self.high.max(bar.high);
        self.low = self.low.min(bar.low);
        self.close = bar.close;
        self.volume += bar.volume;
    }

    fn to_bar(&self) -> Option<Bar> {
        let open = self.open?;
        Some(Bar::new(self.timestamp, open, self.high, self.low, self.close, self.volume))
    }
}

/// Resample chronologically ordered `bars` to `timeframe`.
///
/// Open is the first open of the period, high the max high, low the min low,
/// close the last close and volume the sum. Periods without bars produce no
/// output. Fails if the input is not strictly increasing by timestamp.
pub fn resample(bars: &[Bar], timeframe: Timeframe) -> Result<Vec<Bar>> {
    let mut periods: BTreeMap<(i32, u32, u32), BarInProgress> = BTreeMap::new();
    let mut last_ts: Option<TimestampMs> = None;

    for bar in bars {
        if let Some(prev) = last_ts {
            if bar.timestamp <= prev {
                return Err(Error::precondition(format!(
                    "resample input not in order: {} after {}",
                    bar.timestamp, prev
                )));
            }
        }
        last_ts = Some(bar.timestamp);

        let key = timeframe.period_key(bar.timestamp)?;
        periods.entry(key).or_insert_with(BarInProgress::new).add_bar(bar);
    }

    Ok(periods.values().filter_map(BarInProgress::to_bar).collect())
}
