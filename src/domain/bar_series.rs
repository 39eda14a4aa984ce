//! Per-symbol bar history and the unified simulation timeline.

use crate::domain::ohlcv::{OhlcvBar, sort_dedup_keep_last};
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};

/// Inclusive timestamp bounds. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start.is_none_or(|s| ts >= s) && self.end.is_none_or(|e| ts <= e)
    }
}

#[derive(Debug, Clone)]
pub struct BarSeries {
    pub symbol: String,
    pub bars: Vec<OhlcvBar>,
    pub timestamp_index: HashMap<NaiveDateTime, usize>,
}

impl BarSeries {
    /// Builds the series, ordering bars by timestamp and keeping the last
    /// bar seen for a duplicated timestamp.
    pub fn new(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Self {
        let deduped = sort_dedup_keep_last(bars);
        let timestamp_index = deduped
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.timestamp, i))
            .collect();
        Self {
            symbol: symbol.into(),
            bars: deduped,
            timestamp_index,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn get_bar(&self, ts: NaiveDateTime) -> Option<&OhlcvBar> {
        self.timestamp_index.get(&ts).map(|&i| &self.bars[i])
    }

    pub fn get_bar_index(&self, ts: NaiveDateTime) -> Option<usize> {
        self.timestamp_index.get(&ts).copied()
    }

    /// History up to and including `index`.
    pub fn history_through(&self, index: usize) -> &[OhlcvBar] {
        let end = (index + 1).min(self.bars.len());
        &self.bars[..end]
    }

    /// Latest bar whose timestamp is not after `ts`.
    pub fn last_bar_at_or_before(&self, ts: NaiveDateTime) -> Option<&OhlcvBar> {
        let pos = self.bars.partition_point(|b| b.timestamp <= ts);
        pos.checked_sub(1).map(|i| &self.bars[i])
    }
}

/// Sorted union of every series' timestamps, restricted to `range`.
pub fn build_unified_timeline(series: &[BarSeries], range: &DateRange) -> Vec<NaiveDateTime> {
    let unique: BTreeSet<NaiveDateTime> = series
        .iter()
        .flat_map(|s| s.bars.iter().map(|bar| bar.timestamp))
        .filter(|ts| range.contains(*ts))
        .collect();
    unique.into_iter().collect()
}
