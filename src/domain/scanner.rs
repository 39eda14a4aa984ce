//! Universe scanning: run the detector over many symbols and rank setups.

use crate::domain::bar_series::BarSeries;
use crate::domain::detector::SetupDetector;
use crate::domain::setup::Setup;
use tracing::debug;

/// Highest-scoring setup; the earliest wins a tie.
pub fn best_setup(setups: Vec<Setup>) -> Option<Setup> {
    setups
        .into_iter()
        .reduce(|best, s| if s.score > best.score { s } else { best })
}

/// All setups across `universe`, highest score first. Symbols with fewer
/// than `min_history_bars` bars are skipped. `confirmation` series are
/// matched to the universe by symbol.
pub fn scan_universe(
    detector: &SetupDetector,
    universe: &[BarSeries],
    confirmation: &[BarSeries],
    min_history_bars: usize,
) -> Vec<Setup> {
    let mut found = Vec::new();
    for series in universe {
        if series.bar_count() < min_history_bars {
            debug!(
                symbol = %series.symbol,
                bars = series.bar_count(),
                "skipping symbol with short history"
            );
            continue;
        }
        let confirm = confirmation
            .iter()
            .find(|c| c.symbol == series.symbol)
            .map(|c| c.bars.as_slice());
        found.extend(detector.detect(&series.symbol, &series.bars, confirm));
    }
    // stable: ties keep universe order
    found.sort_by(|a, b| b.score.total_cmp(&a.score));
    found
}
