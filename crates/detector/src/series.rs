//! Append-only per-bar history.
//!
//! Every ingested bar and its parsed extremes are kept for the lifetime of
//! the detector, addressed by bar index. Pivot anchors can point at any
//! earlier index, so nothing is ever pruned.

use ob_core::Bar;

use crate::volatility::ParsedBar;

/// Index-aligned raw and parsed bars.
#[derive(Debug, Clone, Default)]
pub struct BarSeries {
    bars: Vec<Bar>,
    parsed: Vec<ParsedBar>,
}

impl BarSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bar with its parsed extremes.
    pub fn push(&mut self, bar: Bar, parsed: ParsedBar) {
        self.bars.push(bar);
        self.parsed.push(parsed);
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Raw bars, oldest first.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Parsed extremes, index-aligned with `bars()`.
    pub fn parsed(&self) -> &[ParsedBar] {
        &self.parsed
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn clear(&mut self) {
        self.bars.clear();
        self.parsed.clear();
    }
}
