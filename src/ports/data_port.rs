//! Data access port trait.

use crate::domain::bar_series::DateRange;
use crate::domain::error::TradesimError;
use crate::domain::ohlcv::OhlcvBar;

pub trait DataPort {
    /// Bars for `symbol` within `range`, ordered by timestamp with no
    /// duplicate timestamps.
    fn fetch_bars(&self, symbol: &str, range: &DateRange) -> Result<Vec<OhlcvBar>, TradesimError>;

    fn list_symbols(&self) -> Result<Vec<String>, TradesimError>;
}
