//! Structure-break detection.
//!
//! A bullish break is a close moving from at-or-below the live pivot high to
//! strictly above it; a bearish break is a close moving from at-or-above the
//! live pivot low to strictly below it. Each pivot level can be broken once.

use ob_core::{Bias, Breakout};
use tracing::debug;

use crate::structure::StructureTracker;

/// `prev_close <= level < close`
#[inline]
pub fn crosses_above(prev_close: f64, close: f64, level: f64) -> bool {
    prev_close <= level && close > level
}

/// `prev_close >= level > close`
#[inline]
pub fn crosses_below(prev_close: f64, close: f64, level: f64) -> bool {
    prev_close >= level && close < level
}

/// Check both pivots of `tracker` against the move from `prev_close` to
/// `close` on bar `bar_index`.
///
/// Broken pivots are marked crossed and the tracker's trend follows the last
/// break. The bullish check runs first, so when both fire on the same bar the
/// bullish break is listed first.
pub fn detect_breakouts(
    tracker: &mut StructureTracker,
    prev_close: f64,
    close: f64,
    bar_index: usize,
) -> Vec<Breakout> {
    let mut breakouts = Vec::new();

    for bias in [Bias::Bullish, Bias::Bearish] {
        let scope = tracker.scope();
        let pivot = tracker.pivot_for_mut(bias);
        if pivot.crossed {
            continue;
        }
        let (Some(level), Some(pivot_index)) = (pivot.current_level, pivot.anchor_index) else {
            continue;
        };

        let crossed = match bias {
            Bias::Bullish => crosses_above(prev_close, close, level),
            Bias::Bearish => crosses_below(prev_close, close, level),
        };
        if !crossed {
            continue;
        }

        pivot.crossed = true;
        tracker.set_trend(bias);

        debug!(%scope, ?bias, level, pivot_index, bar_index, "structure break");
        breakouts.push(Breakout {
            scope,
            bias,
            level,
            pivot_index,
            bar_index,
        });
    }

    breakouts
}

#[cfg(test)]
mod tests {
    use super::*;
    use ob_core::{Bar, Leg, Scope};

    fn bar(ts: i64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(ts, close, high, low, close, 0.0)
    }

    /// Tracker (length 1) with pivot low 5.0 at index 0 and pivot high 14.0 at index 1.
    fn tracker_with_pivots() -> StructureTracker {
        let mut tracker = StructureTracker::new(Scope::Internal, 1);
        let mut bars = vec![bar(0, 10.0, 5.0, 8.0), bar(1, 14.0, 6.0, 12.0)];
        assert_eq!(tracker.update(&bars), Some(Leg::Bullish));
        bars.push(bar(2, 13.0, 7.0, 11.0));
        assert_eq!(tracker.update(&bars), Some(Leg::Bearish));
        tracker
    }

    #[test]
    fn test_cross_helpers() {
        assert!(crosses_above(10.0, 10.5, 10.0));
        assert!(crosses_above(9.0, 11.0, 10.0));
        assert!(!crosses_above(10.0, 10.0, 10.0));
        assert!(!crosses_above(10.5, 11.0, 10.0));

        assert!(crosses_below(10.0, 9.5, 10.0));
        assert!(!crosses_below(10.0, 10.0, 10.0));
        assert!(!crosses_below(9.5, 9.0, 10.0));
    }

    #[test]
    fn test_no_pivots_no_breakouts() {
        let mut tracker = StructureTracker::new(Scope::Swing, 3);
        assert!(detect_breakouts(&mut tracker, 1.0, 100.0, 1).is_empty());
        assert_eq!(tracker.trend().bias, None);
    }

    #[test]
    fn test_bullish_break_fires_once() {
        let mut tracker = tracker_with_pivots();

        let breakouts = detect_breakouts(&mut tracker, 11.0, 15.0, 3);
        assert_eq!(breakouts.len(), 1);
        assert_eq!(breakouts[0].bias, Bias::Bullish);
        assert_eq!(breakouts[0].level, 14.0);
        assert_eq!(breakouts[0].pivot_index, 1);
        assert_eq!(breakouts[0].bar_index, 3);
        assert!(tracker.pivot_high().crossed);
        assert_eq!(tracker.trend().bias, Some(Bias::Bullish));

        // Dip and re-cross of the same level does not fire again.
        assert!(detect_breakouts(&mut tracker, 13.0, 15.0, 4).is_empty());
    }

    #[test]
    fn test_bearish_break() {
        let mut tracker = tracker_with_pivots();

        let breakouts = detect_breakouts(&mut tracker, 6.0, 4.0, 3);
        assert_eq!(breakouts.len(), 1);
        assert_eq!(breakouts[0].bias, Bias::Bearish);
        assert_eq!(breakouts[0].pivot_index, 0);
        assert!(tracker.pivot_low().crossed);
        assert!(!tracker.pivot_high().crossed);
        assert_eq!(tracker.trend().bias, Some(Bias::Bearish));
    }

    #[test]
    fn test_close_on_level_is_not_a_break() {
        let mut tracker = tracker_with_pivots();
        assert!(detect_breakouts(&mut tracker, 11.0, 14.0, 3).is_empty());
        assert!(!tracker.pivot_high().crossed);
    }

    #[test]
    fn test_gap_from_above_is_not_a_bullish_break() {
        let mut tracker = tracker_with_pivots();
        assert!(detect_breakouts(&mut tracker, 14.5, 15.0, 3).is_empty());
    }
}
