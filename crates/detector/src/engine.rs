//! Order-block detection engine.
//!
//! Combines the volatility filter, structure trackers, breakout detection
//! and order-block store into a single forward pass over bars.

use ob_core::{Bar, Breakout, DetectorConfig, Error, OrderBlock, Result, Scope};
use serde::Serialize;
use tracing::debug;

use crate::breakout::detect_breakouts;
use crate::order_blocks::OrderBlockStore;
use crate::series::BarSeries;
use crate::structure::StructureTracker;
use crate::volatility::{ParsedBar, VolatilityFilter};

/// What happened on one bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BarUpdate {
    /// Index of the processed bar.
    pub bar_index: usize,
    /// Structure breaks fired on this bar, internal first.
    pub breakouts: Vec<Breakout>,
    /// History indices of blocks created on this bar.
    pub created: Vec<usize>,
    /// History indices of blocks mitigated on this bar.
    pub mitigated: Vec<usize>,
}

/// Incremental order-block detector.
///
/// Feed bars in strictly increasing timestamp order with [`add_bar`] or
/// [`process`]; read results with [`order_blocks`] and
/// [`active_order_blocks`].
///
/// [`add_bar`]: OrderBlockDetector::add_bar
/// [`process`]: OrderBlockDetector::process
/// [`order_blocks`]: OrderBlockDetector::order_blocks
/// [`active_order_blocks`]: OrderBlockDetector::active_order_blocks
pub struct OrderBlockDetector {
    config: DetectorConfig,
    volatility: VolatilityFilter,
    series: BarSeries,
    /// Internal tracker first, then swing.
    structures: Vec<StructureTracker>,
    store: OrderBlockStore,
}

impl OrderBlockDetector {
    /// Create a new detector. Fails on an invalid configuration.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            volatility: VolatilityFilter::new(config.atr_period),
            series: BarSeries::new(),
            structures: vec![
                StructureTracker::new(Scope::Internal, config.internal_length),
                StructureTracker::new(Scope::Swing, config.swing_length),
            ],
            store: OrderBlockStore::new(config.max_active_order_blocks),
            config,
        })
    }

    /// Process one bar.
    ///
    /// Bars must be well formed and strictly later than the previous bar;
    /// otherwise the bar is rejected before any state changes.
    pub fn add_bar(&mut self, bar: &Bar) -> Result<BarUpdate> {
        self.check_bar(bar)?;

        let prev_close = self.series.last().map(|b| b.close);
        let parsed = self.volatility.add_bar(bar);
        self.series.push(*bar, parsed);
        let bar_index = self.series.len() - 1;

        let mut update = BarUpdate {
            bar_index,
            ..BarUpdate::default()
        };

        for tracker in &mut self.structures {
            tracker.update(self.series.bars());
        }

        if let Some(prev_close) = prev_close {
            for tracker in &mut self.structures {
                for breakout in detect_breakouts(tracker, prev_close, bar.close, bar_index) {
                    let index = self.store.create(&breakout, &self.series)?;
                    update.breakouts.push(breakout);
                    update.created.push(index);
                }
            }
        }

        update.mitigated = self.store.mitigate(bar);
        Ok(update)
    }

    /// Process bars in order and return the full order-block history.
    pub fn process(&mut self, bars: &[Bar]) -> Result<&[OrderBlock]> {
        for bar in bars {
            self.add_bar(bar)?;
        }
        debug!(
            bars = self.series.len(),
            order_blocks = self.store.history().len(),
            "processed bars"
        );
        Ok(self.store.history())
    }

    fn check_bar(&self, bar: &Bar) -> Result<()> {
        if !bar.is_well_formed() {
            return Err(Error::data(format!(
                "malformed bar at {}: open={} high={} low={} close={} volume={}",
                bar.timestamp, bar.open, bar.high, bar.low, bar.close, bar.volume
            )));
        }
        if let Some(last) = self.series.last() {
            if bar.timestamp <= last.timestamp {
                return Err(Error::precondition(format!(
                    "bar timestamp {} does not follow previous timestamp {}",
                    bar.timestamp, last.timestamp
                )));
            }
        }
        Ok(())
    }

    /// All order blocks in detection order, mitigated ones included.
    pub fn order_blocks(&self) -> &[OrderBlock] {
        self.store.history()
    }

    /// Active blocks for `scope`, most recent first.
    pub fn active_order_blocks(&self, scope: Scope) -> Vec<&OrderBlock> {
        self.store.active(scope).collect()
    }

    /// Active internal blocks followed by active swing blocks.
    pub fn active_order_blocks_all(&self) -> Vec<&OrderBlock> {
        self.store
            .active(Scope::Internal)
            .chain(self.store.active(Scope::Swing))
            .collect()
    }

    /// Structure tracker for `scope`.
    pub fn structure(&self, scope: Scope) -> Option<&StructureTracker> {
        self.structures.iter().find(|t| t.scope() == scope)
    }

    /// Parsed extremes of every processed bar.
    pub fn parsed_bars(&self) -> &[ParsedBar] {
        self.series.parsed()
    }

    /// Current volatility estimate.
    pub fn atr(&self) -> Option<f64> {
        self.volatility.atr()
    }

    /// Get the number of processed bars.
    pub fn bar_count(&self) -> usize {
        self.series.len()
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Clear all state, keeping the configuration.
    pub fn reset(&mut self) {
        self.volatility.clear();
        self.series.clear();
        for tracker in &mut self.structures {
            tracker.clear();
        }
        self.store.clear();
    }
}

/// Run a fresh detector over `bars` and return every order block.
pub fn detect(config: DetectorConfig, bars: &[Bar]) -> Result<Vec<OrderBlock>> {
    let mut detector = OrderBlockDetector::new(config)?;
    Ok(detector.process(bars)?.to_vec())
}
