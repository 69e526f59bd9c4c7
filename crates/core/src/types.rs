//! Core data types for the order-block detector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp in milliseconds since Unix epoch (UTC).
pub type TimestampMs = i64;

/// Convert a millisecond timestamp to a UTC datetime.
#[inline]
pub fn ts_to_datetime(ts_ms: TimestampMs) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts_ms)
}

/// Convert a UTC datetime to a millisecond timestamp.
#[inline]
pub fn datetime_to_ts(dt: DateTime<Utc>) -> TimestampMs {
    dt.timestamp_millis()
}

/// Format a timestamp as `YYYY-MM-DD`, falling back to the raw number.
pub fn format_date(ts_ms: TimestampMs) -> String {
    match ts_to_datetime(ts_ms) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => ts_ms.to_string(),
    }
}

/// One OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar timestamp (ms).
    pub timestamp: TimestampMs,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Total volume.
    pub volume: f64,
}

impl Bar {
    /// Create a new bar.
    pub fn new(timestamp: TimestampMs, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// High-low range.
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// True range against the previous bar's close.
    ///
    /// Without a previous bar this is the plain high-low range.
    #[inline]
    pub fn true_range(&self, prev: Option<&Bar>) -> f64 {
        match prev {
            Some(prev) => self
                .range()
                .max((self.high - prev.close).abs())
                .max((self.low - prev.close).abs()),
            None => self.range(),
        }
    }

    /// Whether all prices are finite and `high >= low`.
    pub fn is_well_formed(&self) -> bool {
        let finite = [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite());
        finite && self.high >= self.low
    }
}

/// Direction of a structure break or order block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Bullish,
    Bearish,
}

impl Bias {
    /// +1 for bullish, -1 for bearish.
    pub fn sign(self) -> i8 {
        match self {
            Bias::Bullish => 1,
            Bias::Bearish => -1,
        }
    }

    /// Short label used in order-block names.
    pub fn short_name(self) -> &'static str {
        match self {
            Bias::Bullish => "bull",
            Bias::Bearish => "bear",
        }
    }
}

/// Which structure a pivot or order block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Faster structure driven by the internal length.
    Internal,
    /// Slower structure driven by the swing length.
    Swing,
}

impl Scope {
    pub fn is_internal(self) -> bool {
        matches!(self, Scope::Internal)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Internal => write!(f, "internal"),
            Scope::Swing => write!(f, "swing"),
        }
    }
}

/// Current structural phase of a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Leg {
    /// Last confirmed extreme was a high.
    #[default]
    Bearish = 0,
    /// Last confirmed extreme was a low.
    Bullish = 1,
}

/// Most recent swing extreme for one side of a structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    /// Level of the live pivot, unset until the first leg flip.
    pub current_level: Option<f64>,
    /// Level that the live pivot replaced.
    pub last_level: Option<f64>,
    /// Whether a close has already broken the live level.
    pub crossed: bool,
    /// Timestamp of the bar that defined the level.
    pub anchor_time: Option<TimestampMs>,
    /// Index of the bar that defined the level.
    pub anchor_index: Option<usize>,
}

impl Pivot {
    /// Replace the live level with a fresh, uncrossed one.
    pub fn set(&mut self, level: f64, anchor_time: TimestampMs, anchor_index: usize) {
        self.last_level = self.current_level;
        self.current_level = Some(level);
        self.crossed = false;
        self.anchor_time = Some(anchor_time);
        self.anchor_index = Some(anchor_index);
    }

    /// Whether a level has been established.
    pub fn is_set(&self) -> bool {
        self.current_level.is_some()
    }
}

/// Last breakout direction of a structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trend {
    /// `None` until the first breakout.
    pub bias: Option<Bias>,
}

/// A detected order block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    /// Upper bound of the zone.
    pub high: f64,
    /// Lower bound of the zone.
    pub low: f64,
    /// Timestamp of the origin bar.
    pub start_time: TimestampMs,
    /// Timestamp of the breakout bar.
    pub created_time: TimestampMs,
    /// Timestamp of the pivot that was broken.
    pub pivot_time: TimestampMs,
    /// Direction of the break.
    pub bias: Bias,
    /// Whether the block comes from the internal structure.
    pub internal: bool,
    /// Set once price breaches the zone.
    pub mitigated: bool,
    /// Index of the origin bar.
    pub origin_index: usize,
    /// Index of the breakout bar.
    pub created_index: usize,
    /// Index of the pivot bar.
    pub pivot_index: usize,
    /// Timestamp of the bar that mitigated the block.
    pub mitigated_time: Option<TimestampMs>,
}

impl OrderBlock {
    /// Label combining scope and bias, e.g. `"internal bull OB"`.
    pub fn label(&self) -> String {
        let prefix = if self.internal { "internal " } else { "" };
        format!("{}{} OB", prefix, self.bias.short_name())
    }

    pub fn scope(&self) -> Scope {
        if self.internal {
            Scope::Internal
        } else {
            Scope::Swing
        }
    }

    /// Whether a bar with the given extremes breaches this block.
    #[inline]
    pub fn is_breached_by(&self, high: f64, low: f64) -> bool {
        match self.bias {
            Bias::Bullish => low < self.low,
            Bias::Bearish => high > self.high,
        }
    }
}

/// A structure break fired on a bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakout {
    /// Structure that broke.
    pub scope: Scope,
    /// Direction of the break.
    pub bias: Bias,
    /// Pivot level that was crossed.
    pub level: f64,
    /// Index of the pivot bar.
    pub pivot_index: usize,
    /// Index of the breakout bar.
    pub bar_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn block(bias: Bias, internal: bool) -> OrderBlock {
        OrderBlock {
            high: 110.0,
            low: 100.0,
            start_time: 0,
            created_time: 10,
            pivot_time: 5,
            bias,
            internal,
            mitigated: false,
            origin_index: 0,
            created_index: 2,
            pivot_index: 1,
            mitigated_time: None,
        }
    }

    #[test]
    fn test_true_range() {
        let prev = Bar::new(0, 100.0, 105.0, 95.0, 100.0, 0.0);
        // Gap up: |high - prev_close| dominates
        let bar = Bar::new(1, 110.0, 115.0, 108.0, 112.0, 0.0);
        assert_relative_eq!(bar.true_range(Some(&prev)), 15.0);
        // First bar: plain range
        assert_relative_eq!(bar.true_range(None), 7.0);

        // Gap down: |low - prev_close| dominates
        let bar = Bar::new(2, 90.0, 92.0, 85.0, 88.0, 0.0);
        assert_relative_eq!(bar.true_range(Some(&prev)), 15.0);
    }

    #[test]
    fn test_well_formed() {
        assert!(Bar::new(0, 1.0, 2.0, 0.5, 1.5, 0.0).is_well_formed());
        assert!(!Bar::new(0, 1.0, 0.5, 2.0, 1.5, 0.0).is_well_formed());
        assert!(!Bar::new(0, f64::NAN, 2.0, 0.5, 1.5, 0.0).is_well_formed());
    }

    #[test]
    fn test_labels() {
        assert_eq!(block(Bias::Bullish, true).label(), "internal bull OB");
        assert_eq!(block(Bias::Bearish, true).label(), "internal bear OB");
        assert_eq!(block(Bias::Bullish, false).label(), "bull OB");
        assert_eq!(block(Bias::Bearish, false).label(), "bear OB");
    }

    #[test]
    fn test_breach() {
        let bull = block(Bias::Bullish, false);
        assert!(bull.is_breached_by(120.0, 99.0));
        assert!(!bull.is_breached_by(120.0, 100.0));

        let bear = block(Bias::Bearish, false);
        assert!(bear.is_breached_by(110.5, 105.0));
        assert!(!bear.is_breached_by(110.0, 50.0));
    }

    #[test]
    fn test_pivot_set() {
        let mut pivot = Pivot::default();
        assert!(!pivot.is_set());

        pivot.set(100.0, 1_000, 3);
        pivot.crossed = true;
        pivot.set(90.0, 2_000, 7);

        assert_eq!(pivot.current_level, Some(90.0));
        assert_eq!(pivot.last_level, Some(100.0));
        assert!(!pivot.crossed);
        assert_eq!(pivot.anchor_index, Some(7));
        assert_eq!(pivot.anchor_time, Some(2_000));
    }

    #[test]
    fn test_format_date() {
        // 2024-01-01T00:00:00Z
        assert_eq!(format_date(1_704_067_200_000), "2024-01-01");
    }

    #[test]
    fn test_bias_sign() {
        assert_eq!(Bias::Bullish.sign(), 1);
        assert_eq!(Bias::Bearish.sign(), -1);
    }
}
