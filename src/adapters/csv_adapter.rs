//! CSV file data adapter.
//!
//! One file per symbol, `<SYMBOL>.csv`, with a header row and columns
//! `timestamp,open,high,low,close,volume`.

use crate::domain::bar_series::DateRange;
use crate::domain::error::TradesimError;
use crate::domain::ohlcv::{OhlcvBar, sort_dedup_keep_last};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn column<T: FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    symbol: &str,
) -> Result<T, TradesimError>
where
    T::Err: std::fmt::Display,
{
    let raw = record.get(index).ok_or_else(|| TradesimError::DataLoad {
        symbol: symbol.to_string(),
        reason: format!("missing {} column", name),
    })?;
    raw.trim().parse().map_err(|e| TradesimError::DataLoad {
        symbol: symbol.to_string(),
        reason: format!("invalid {} value '{}': {}", name, raw, e),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str, range: &DateRange) -> Result<Vec<OhlcvBar>, TradesimError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TradesimError::DataLoad {
            symbol: symbol.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| TradesimError::DataLoad {
                symbol: symbol.to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;

            let raw_ts = record.get(0).ok_or_else(|| TradesimError::DataLoad {
                symbol: symbol.to_string(),
                reason: "missing timestamp column".into(),
            })?;
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| TradesimError::DataLoad {
                symbol: symbol.to_string(),
                reason: format!("invalid timestamp '{}'", raw_ts),
            })?;

            if !range.contains(timestamp) {
                continue;
            }

            bars.push(OhlcvBar {
                symbol: symbol.to_string(),
                timestamp,
                open: column(&record, 1, "open", symbol)?,
                high: column(&record, 2, "high", symbol)?,
                low: column(&record, 3, "low", symbol)?,
                close: column(&record, 4, "close", symbol)?,
                volume: column(&record, 5, "volume", symbol)?,
            });
        }

        Ok(sort_dedup_keep_last(bars))
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradesimError> {
        let entries = fs::read_dir(&self.base_path)?;

        let mut symbols = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
