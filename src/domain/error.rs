//! Domain error types.

use crate::domain::setup::SetupKind;

/// Top-level error type for tradesim.
#[derive(Debug, thiserror::Error)]
pub enum TradesimError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("failed to load data for {symbol}: {reason}")]
    DataLoad { symbol: String, reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradesimError> for std::process::ExitCode {
    fn from(err: &TradesimError) -> Self {
        let code: u8 = match err {
            TradesimError::Io(_) => 1,
            TradesimError::ConfigParse { .. }
            | TradesimError::ConfigMissing { .. }
            | TradesimError::ConfigInvalid { .. } => 2,
            TradesimError::DataLoad { .. } | TradesimError::NoData { .. } => 3,
        };
        std::process::ExitCode::from(code)
    }
}

/// Failure inside a single setup evaluator.
///
/// The detector isolates these: a failing evaluator is logged and skipped,
/// the remaining evaluators still run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluatorError {
    #[error("{kind}: indicator {indicator} is undefined at the latest bar")]
    UndefinedIndicator {
        kind: SetupKind,
        indicator: String,
    },

    #[error("{kind}: indicator {indicator} produced a non-finite value ({value})")]
    NonFinite {
        kind: SetupKind,
        indicator: String,
        value: f64,
    },
}
