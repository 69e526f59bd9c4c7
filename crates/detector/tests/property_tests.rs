//! Property tests for detector invariants.
//!
//! Uses proptest to verify:
//! 1. Determinism: the same bars always yield the same blocks
//! 2. Block geometry: high >= low and times never run ahead of creation
//! 3. Mitigation monotonicity: mitigated blocks stay mitigated and inactive
//! 4. Short input: fewer bars than the lookback yields nothing
//! 5. Rising markets: no bearish blocks without a pullback

use ob_core::{Bar, Bias, DetectorConfig, Scope};
use ob_detector::{detect, OrderBlockDetector};
use proptest::prelude::*;
use std::collections::HashSet;

const DAY_MS: i64 = 86_400_000;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Random walk of well-formed bars, one day apart.
fn arb_bars(max_len: usize) -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((-3.0..3.0_f64, 0.0..2.0_f64, 0.0..2.0_f64), 0..max_len).prop_map(
        |steps| {
            let mut price = 100.0_f64;
            steps
                .into_iter()
                .enumerate()
                .map(|(i, (delta, up, down))| {
                    let open = price;
                    price = (price + delta).max(1.0);
                    let close = price;
                    let high = open.max(close) + up;
                    let low = (open.min(close) - down).max(0.5);
                    Bar::new(i as i64 * DAY_MS, open, high, low, close, 1_000.0)
                })
                .collect()
        },
    )
}

/// Strictly rising highs, lows and closes.
fn arb_rising_bars() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((0.01..2.0_f64, 0.1..3.0_f64, 0.0..1.0_f64), 0..250).prop_map(|steps| {
        let mut low = 50.0_f64;
        steps
            .into_iter()
            .enumerate()
            .map(|(i, (step, width, frac))| {
                low += step;
                let high = low + width;
                let close = low + frac * width;
                Bar::new(i as i64 * DAY_MS, low, high, low, close, 1_000.0)
            })
            .collect()
    })
}

fn arb_config() -> impl Strategy<Value = DetectorConfig> {
    (1usize..6, 1usize..15, 1usize..50, 1usize..20).prop_map(|(internal, extra, atr, cap)| {
        DetectorConfig {
            swing_length: internal + extra,
            internal_length: internal,
            atr_period: atr,
            max_active_order_blocks: cap,
        }
    })
}

// ── 1. Determinism ───────────────────────────────────────────────────

proptest! {
    /// Two runs over the same bars produce identical histories.
    #[test]
    fn detection_is_deterministic(config in arb_config(), bars in arb_bars(300)) {
        let first = detect(config.clone(), &bars).unwrap();
        let second = detect(config, &bars).unwrap();
        prop_assert_eq!(first, second);
    }
}

// ── 2. Block geometry ────────────────────────────────────────────────

proptest! {
    /// Every block has high >= low and was created no earlier than its
    /// origin and pivot bars.
    #[test]
    fn blocks_are_well_formed(config in arb_config(), bars in arb_bars(300)) {
        let blocks = detect(config, &bars).unwrap();
        for block in &blocks {
            prop_assert!(block.high >= block.low);
            prop_assert!(block.start_time <= block.created_time);
            prop_assert!(block.pivot_time <= block.created_time);
            prop_assert!(block.pivot_index < block.created_index);
            prop_assert!(block.pivot_index <= block.origin_index);
            prop_assert!(block.origin_index <= block.created_index);
        }

        // Detection order follows creation time.
        for pair in blocks.windows(2) {
            prop_assert!(pair[0].created_time <= pair[1].created_time);
        }
    }
}

// ── 3. Mitigation monotonicity ───────────────────────────────────────

proptest! {
    /// Once mitigated, a block stays mitigated and never reappears in an
    /// active container. Containers respect their cap.
    #[test]
    fn mitigation_is_monotonic(config in arb_config(), bars in arb_bars(300)) {
        let cap = config.max_active_order_blocks;
        let mut detector = OrderBlockDetector::new(config).unwrap();
        let mut mitigated: HashSet<usize> = HashSet::new();

        for bar in &bars {
            let update = detector.add_bar(bar).unwrap();
            for &index in &update.mitigated {
                prop_assert!(mitigated.insert(index), "block {} mitigated twice", index);
            }

            let history = detector.order_blocks();
            for &index in &mitigated {
                prop_assert!(history[index].mitigated);
            }
            for scope in [Scope::Internal, Scope::Swing] {
                let active = detector.active_order_blocks(scope);
                prop_assert!(active.len() <= cap);
                prop_assert!(active.iter().all(|b| !b.mitigated));
                prop_assert!(active.iter().all(|b| b.scope() == scope));
            }
        }
    }
}

// ── 4. Short input ───────────────────────────────────────────────────

proptest! {
    /// With no more bars than the internal length, no anchor bar exists.
    #[test]
    fn short_input_yields_nothing(config in arb_config(), bars in arb_bars(300)) {
        let mut bars = bars;
        bars.truncate(config.internal_length);
        let blocks = detect(config, &bars).unwrap();
        prop_assert!(blocks.is_empty());
    }
}

// ── 5. Rising markets ────────────────────────────────────────────────

proptest! {
    /// A strictly rising series never closes below a pivot low.
    #[test]
    fn rising_series_has_no_bearish_blocks(config in arb_config(), bars in arb_rising_bars()) {
        let blocks = detect(config, &bars).unwrap();
        prop_assert!(blocks.iter().all(|b| b.bias == Bias::Bullish));
    }
}
