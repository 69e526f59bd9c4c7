//! Rolling volatility filter.
//!
//! Keeps a fixed window of true ranges and uses their simple arithmetic mean
//! as the volatility estimate (ATR). A bar whose high-low range is at least
//! `HIGH_VOLATILITY_MULTIPLIER` times the estimate is a high-volatility bar;
//! its parsed extremes are swapped so that spike bars do not win extremum
//! searches.

use ob_core::Bar;
use serde::Serialize;
use std::collections::VecDeque;

/// Range multiple of the estimate at which a bar counts as high-volatility.
pub const HIGH_VOLATILITY_MULTIPLIER: f64 = 2.0;

/// Volatility-adjusted extremes of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParsedBar {
    /// `low` for high-volatility bars, `high` otherwise.
    pub parsed_high: f64,
    /// `high` for high-volatility bars, `low` otherwise.
    pub parsed_low: f64,
    /// Whether the extremes were swapped.
    pub high_volatility: bool,
}

impl ParsedBar {
    /// Derive parsed extremes for `bar` given the volatility threshold.
    ///
    /// The comparison is inclusive: a range of exactly twice the threshold
    /// is high-volatility.
    pub fn from_bar(bar: &Bar, threshold: f64) -> Self {
        let high_volatility = bar.range() >= HIGH_VOLATILITY_MULTIPLIER * threshold;
        if high_volatility {
            Self {
                parsed_high: bar.low,
                parsed_low: bar.high,
                high_volatility,
            }
        } else {
            Self {
                parsed_high: bar.high,
                parsed_low: bar.low,
                high_volatility,
            }
        }
    }
}

/// Rolling average-true-range filter.
#[derive(Debug, Clone)]
pub struct VolatilityFilter {
    /// Window size in bars.
    window: usize,
    /// Recent true ranges, oldest first.
    ranges: VecDeque<f64>,
    /// Previous bar (for true range).
    prev_bar: Option<Bar>,
}

impl VolatilityFilter {
    /// Create a new filter with the given ATR period.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            ranges: VecDeque::with_capacity(window),
            prev_bar: None,
        }
    }

    /// Add a bar and return its parsed extremes.
    ///
    /// The bar's own true range enters the window before the estimate is
    /// taken. When the estimate is zero the bar's range is the threshold.
    pub fn add_bar(&mut self, bar: &Bar) -> ParsedBar {
        let tr = bar.true_range(self.prev_bar.as_ref());

        // If window is full, remove oldest
        if self.ranges.len() >= self.window {
            self.ranges.pop_front();
        }
        self.ranges.push_back(tr);
        self.prev_bar = Some(*bar);

        let threshold = match self.atr() {
            Some(atr) if atr != 0.0 => atr,
            _ => bar.range(),
        };
        ParsedBar::from_bar(bar, threshold)
    }

    /// Current volatility estimate (mean true range over the window).
    pub fn atr(&self) -> Option<f64> {
        if self.ranges.is_empty() {
            return None;
        }
        // Summed fresh from the window; no running total.
        let sum: f64 = self.ranges.iter().sum();
        Some(sum / self.ranges.len() as f64)
    }

    /// Check if the window is full.
    pub fn is_ready(&self) -> bool {
        self.ranges.len() >= self.window
    }

    /// Get the number of true ranges in the window.
    pub fn count(&self) -> usize {
        self.ranges.len()
    }

    /// Clear all data.
    pub fn clear(&mut self) {
        self.ranges.clear();
        self.prev_bar = None;
    }
}
