//! Leg and pivot tracking for one lookback length.
//!
//! On every bar the tracker looks back `length` bars to an anchor bar and
//! compares it with the bars after it. An anchor high above every later high
//! confirms a swing high (bearish leg); an anchor low below every later low
//! confirms a swing low (bullish leg). Pivots are only rewritten when the
//! leg flips.

use ob_core::{Bar, Bias, Leg, Pivot, Scope, Trend};
use tracing::trace;

/// Index of the anchor bar for a series of `len` bars, if there are enough.
#[inline]
pub fn anchor_index(len: usize, length: usize) -> Option<usize> {
    len.checked_sub(length + 1)
}

/// Leg implied by the latest bar of `bars` for the given lookback.
///
/// The bearish condition is checked first, so an anchor bar that is both
/// above every later high and below every later low yields `Leg::Bearish`.
/// With too few bars the previous leg is returned.
pub fn compute_leg(bars: &[Bar], length: usize, previous: Leg) -> Leg {
    let Some(anchor) = anchor_index(bars.len(), length) else {
        return previous;
    };
    let recent = &bars[anchor + 1..];
    if recent.is_empty() {
        return previous;
    }

    let recent_high = recent.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let recent_low = recent.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let anchor_bar = &bars[anchor];

    if anchor_bar.high > recent_high {
        Leg::Bearish
    } else if anchor_bar.low < recent_low {
        Leg::Bullish
    } else {
        previous
    }
}

/// Structure state for one lookback length.
#[derive(Debug, Clone)]
pub struct StructureTracker {
    scope: Scope,
    length: usize,
    leg: Leg,
    pivot_high: Pivot,
    pivot_low: Pivot,
    trend: Trend,
}

impl StructureTracker {
    pub fn new(scope: Scope, length: usize) -> Self {
        Self {
            scope,
            length,
            leg: Leg::default(),
            pivot_high: Pivot::default(),
            pivot_low: Pivot::default(),
            trend: Trend::default(),
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn leg(&self) -> Leg {
        self.leg
    }

    pub fn pivot_high(&self) -> &Pivot {
        &self.pivot_high
    }

    pub fn pivot_low(&self) -> &Pivot {
        &self.pivot_low
    }

    pub fn trend(&self) -> Trend {
        self.trend
    }

    /// Pivot whose break produces a block of the given bias.
    pub(crate) fn pivot_for_mut(&mut self, bias: Bias) -> &mut Pivot {
        match bias {
            Bias::Bullish => &mut self.pivot_high,
            Bias::Bearish => &mut self.pivot_low,
        }
    }

    pub(crate) fn set_trend(&mut self, bias: Bias) {
        self.trend.bias = Some(bias);
    }

    /// Update leg and pivots after the latest bar was appended to `bars`.
    ///
    /// Returns the new leg when it flipped.
    pub fn update(&mut self, bars: &[Bar]) -> Option<Leg> {
        let anchor = anchor_index(bars.len(), self.length)?;
        let leg = compute_leg(bars, self.length, self.leg);
        if leg == self.leg {
            return None;
        }
        self.leg = leg;

        let anchor_bar = &bars[anchor];
        let (pivot, level) = match leg {
            Leg::Bullish => (&mut self.pivot_low, anchor_bar.low),
            Leg::Bearish => (&mut self.pivot_high, anchor_bar.high),
        };
        pivot.set(level, anchor_bar.timestamp, anchor);

        trace!(
            scope = %self.scope,
            length = self.length,
            ?leg,
            level,
            anchor,
            "pivot updated"
        );
        Some(leg)
    }

    /// Forget all legs, pivots and trend.
    pub fn clear(&mut self) {
        self.leg = Leg::default();
        self.pivot_high = Pivot::default();
        self.pivot_low = Pivot::default();
        self.trend = Trend::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts: i64, high: f64, low: f64) -> Bar {
        let mid = (high + low) / 2.0;
        Bar::new(ts, mid, high, low, mid, 0.0)
    }

    #[test]
    fn test_anchor_index() {
        assert_eq!(anchor_index(0, 3), None);
        assert_eq!(anchor_index(3, 3), None);
        assert_eq!(anchor_index(4, 3), Some(0));
        assert_eq!(anchor_index(10, 3), Some(6));
    }

    #[test]
    fn test_too_few_bars_keeps_leg() {
        let bars = vec![bar(0, 10.0, 9.0), bar(1, 8.0, 7.0)];
        assert_eq!(compute_leg(&bars, 2, Leg::Bullish), Leg::Bullish);
        assert_eq!(compute_leg(&bars, 2, Leg::Bearish), Leg::Bearish);
    }

    #[test]
    fn test_swing_high_gives_bearish_leg() {
        let bars = vec![bar(0, 20.0, 15.0), bar(1, 18.0, 16.0), bar(2, 17.0, 16.0)];
        assert_eq!(compute_leg(&bars, 2, Leg::Bullish), Leg::Bearish);
    }

    #[test]
    fn test_swing_low_gives_bullish_leg() {
        let bars = vec![bar(0, 12.0, 5.0), bar(1, 13.0, 6.0), bar(2, 11.0, 7.0)];
        assert_eq!(compute_leg(&bars, 2, Leg::Bearish), Leg::Bullish);
    }

    #[test]
    fn test_outside_anchor_resolves_bearish() {
        // Anchor high above every later high AND anchor low below every later low.
        let bars = vec![bar(0, 20.0, 0.0), bar(1, 10.0, 5.0), bar(2, 11.0, 6.0)];
        assert_eq!(compute_leg(&bars, 2, Leg::Bullish), Leg::Bearish);
        assert_eq!(compute_leg(&bars, 2, Leg::Bearish), Leg::Bearish);
    }

    #[test]
    fn test_equal_extremes_do_not_flip() {
        // Strict comparisons: equal highs/lows leave the leg alone.
        let bars = vec![bar(0, 10.0, 5.0), bar(1, 10.0, 5.0), bar(2, 9.0, 6.0)];
        assert_eq!(compute_leg(&bars, 2, Leg::Bullish), Leg::Bullish);
        assert_eq!(compute_leg(&bars, 2, Leg::Bearish), Leg::Bearish);
    }

    #[test]
    fn test_tracker_sets_pivots_on_flip() {
        let mut tracker = StructureTracker::new(Scope::Internal, 2);
        let mut bars = Vec::new();

        // Low at index 0, later bars higher -> bullish flip, pivot low at 5.0
        bars.push(bar(100, 12.0, 5.0));
        assert_eq!(tracker.update(&bars), None);
        bars.push(bar(200, 13.0, 6.0));
        assert_eq!(tracker.update(&bars), None);
        bars.push(bar(300, 14.0, 7.0));
        assert_eq!(tracker.update(&bars), Some(Leg::Bullish));

        let low = tracker.pivot_low();
        assert_eq!(low.current_level, Some(5.0));
        assert_eq!(low.last_level, None);
        assert_eq!(low.anchor_index, Some(0));
        assert_eq!(low.anchor_time, Some(100));
        assert!(!low.crossed);
        assert!(!tracker.pivot_high().is_set());

        // No new extreme: no flip, pivots untouched
        bars.push(bar(400, 15.0, 8.0));
        assert_eq!(tracker.update(&bars), None);
        assert_eq!(tracker.leg(), Leg::Bullish);

        // High at index 3 (15.0) above the next two bars -> bearish flip
        bars.push(bar(500, 14.0, 9.0));
        assert_eq!(tracker.update(&bars), None);
        bars.push(bar(600, 13.0, 9.5));
        assert_eq!(tracker.update(&bars), Some(Leg::Bearish));

        let high = tracker.pivot_high();
        assert_eq!(high.current_level, Some(15.0));
        assert_eq!(high.anchor_index, Some(3));
        assert_eq!(high.anchor_time, Some(400));
    }

    #[test]
    fn test_clear() {
        let mut tracker = StructureTracker::new(Scope::Swing, 1);
        let bars = vec![bar(0, 12.0, 5.0), bar(1, 13.0, 6.0)];
        tracker.update(&bars);
        tracker.set_trend(Bias::Bullish);
        assert_eq!(tracker.leg(), Leg::Bullish);

        tracker.clear();
        assert_eq!(tracker.leg(), Leg::Bearish);
        assert!(!tracker.pivot_low().is_set());
        assert_eq!(tracker.trend().bias, None);
    }
}
