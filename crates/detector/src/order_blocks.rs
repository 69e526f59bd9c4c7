//! Order-block creation and mitigation.
//!
//! Every block ever created lives in an append-only history. The internal and
//! swing active containers hold indices into that history, most recent first,
//! and are capped. A block leaves its active container for good once price
//! breaches it; the history entry is flagged as mitigated.

use ob_core::{Bar, Bias, Breakout, Error, OrderBlock, Result, Scope};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::VecDeque;
use tracing::debug;

use crate::series::BarSeries;
use crate::volatility::ParsedBar;

/// Position of the origin bar inside `segment`.
///
/// Bullish blocks originate at the lowest parsed low, bearish blocks at the
/// highest parsed high. Ties resolve to the earliest bar. `None` for an empty
/// segment.
pub fn origin_offset(segment: &[ParsedBar], bias: Bias) -> Option<usize> {
    let candidates = segment.iter().enumerate();
    let found = match bias {
        Bias::Bullish => candidates.min_by_key(|(_, p)| OrderedFloat(p.parsed_low)),
        // min_by_key keeps the first minimum; max_by_key would keep the last.
        Bias::Bearish => candidates.min_by_key(|(_, p)| Reverse(OrderedFloat(p.parsed_high))),
    };
    found.map(|(offset, _)| offset)
}

/// Owner of all order blocks.
#[derive(Debug, Clone)]
pub struct OrderBlockStore {
    /// All blocks, in creation order.
    history: Vec<OrderBlock>,
    /// Active internal blocks (history indices), most recent first.
    internal_active: VecDeque<usize>,
    /// Active swing blocks (history indices), most recent first.
    swing_active: VecDeque<usize>,
    /// Cap per active container.
    max_active: usize,
}

impl OrderBlockStore {
    pub fn new(max_active: usize) -> Self {
        Self {
            history: Vec::new(),
            internal_active: VecDeque::with_capacity(max_active),
            swing_active: VecDeque::with_capacity(max_active),
            max_active,
        }
    }

    /// Materialize the block for `breakout` and return its history index.
    ///
    /// The pivot must lie strictly before the breakout bar and both must be
    /// in `series`; anything else means the input contract was broken.
    pub fn create(&mut self, breakout: &Breakout, series: &BarSeries) -> Result<usize> {
        let start = breakout.pivot_index;
        let end = breakout.bar_index;
        if start >= end || end >= series.len() {
            return Err(Error::precondition(format!(
                "pivot index {} must precede breakout index {} within {} bars",
                start,
                end,
                series.len()
            )));
        }

        let parsed = series.parsed();
        let offset = origin_offset(&parsed[start..=end], breakout.bias)
            .ok_or_else(|| Error::precondition("empty pivot-to-breakout segment"))?;
        let origin_index = start + offset;
        let origin = parsed[origin_index];

        let bars = series.bars();
        let block = OrderBlock {
            // High-volatility origin bars carry swapped parsed extremes.
            high: origin.parsed_high.max(origin.parsed_low),
            low: origin.parsed_high.min(origin.parsed_low),
            start_time: bars[origin_index].timestamp,
            created_time: bars[end].timestamp,
            pivot_time: bars[start].timestamp,
            bias: breakout.bias,
            internal: breakout.scope.is_internal(),
            mitigated: false,
            origin_index,
            created_index: end,
            pivot_index: start,
            mitigated_time: None,
        };

        debug!(
            label = %block.label(),
            high = block.high,
            low = block.low,
            origin_index,
            created_index = end,
            "order block created"
        );

        let index = self.history.len();
        self.history.push(block);

        let max_active = self.max_active;
        let active = self.active_mut(breakout.scope);
        active.push_front(index);
        active.truncate(max_active);

        Ok(index)
    }

    /// Evict every active block breached by `bar` and return their history
    /// indices, internal blocks first.
    pub fn mitigate(&mut self, bar: &Bar) -> Vec<usize> {
        let mut mitigated = Vec::new();
        for scope in [Scope::Internal, Scope::Swing] {
            let active = match scope {
                Scope::Internal => &mut self.internal_active,
                Scope::Swing => &mut self.swing_active,
            };
            let history = &mut self.history;
            active.retain(|&index| {
                let block = &mut history[index];
                if !block.is_breached_by(bar.high, bar.low) {
                    return true;
                }
                block.mitigated = true;
                block.mitigated_time = Some(bar.timestamp);
                debug!(label = %block.label(), index, ts = bar.timestamp, "order block mitigated");
                mitigated.push(index);
                false
            });
        }
        mitigated
    }

    /// All blocks in creation order.
    pub fn history(&self) -> &[OrderBlock] {
        &self.history
    }

    /// Active blocks for `scope`, most recent first.
    pub fn active(&self, scope: Scope) -> impl Iterator<Item = &OrderBlock> + '_ {
        self.active_indices(scope).iter().map(move |&i| &self.history[i])
    }

    /// History indices of the active blocks for `scope`, most recent first.
    pub fn active_indices(&self, scope: Scope) -> &VecDeque<usize> {
        match scope {
            Scope::Internal => &self.internal_active,
            Scope::Swing => &self.swing_active,
        }
    }

    fn active_mut(&mut self, scope: Scope) -> &mut VecDeque<usize> {
        match scope {
            Scope::Internal => &mut self.internal_active,
            Scope::Swing => &mut self.swing_active,
        }
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.internal_active.clear();
        self.swing_active.clear();
    }
}
