//! Setup detection: market filters followed by the evaluator registry.

use crate::domain::config::{ExitConfig, SetupConfig, StrategyConfig};
use crate::domain::error::EvaluatorError;
use crate::domain::evaluators::{EvaluationContext, Evaluator, default_evaluators};
use crate::domain::filters::{MarketFilters, VolatilityCheck};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::setup::{Direction, Setup, SetupKind, TrendState};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    Disabled,
    BelowMinScore { score: f64, min_score: f64 },
    MalformedLevels,
    DirectionNotAllowed { direction: Direction, trend: TrendState },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub kind: SetupKind,
    pub reason: RejectReason,
}

/// Everything one detection pass saw, for diagnostics.
#[derive(Debug, Clone)]
pub struct Detection {
    pub trend: TrendState,
    pub volatility: VolatilityCheck,
    pub setups: Vec<Setup>,
    pub rejections: Vec<Rejection>,
    pub errors: Vec<EvaluatorError>,
}

#[derive(Debug, Clone)]
pub struct SetupDetector {
    setups: SetupConfig,
    exits: ExitConfig,
    filters: MarketFilters,
    evaluators: Vec<Evaluator>,
}

impl SetupDetector {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            setups: config.setups.clone(),
            exits: config.exits.clone(),
            filters: MarketFilters::new(config.trend.clone(), config.volatility.clone()),
            evaluators: default_evaluators(),
        }
    }

    /// Replaces the evaluator registry; evaluation follows the given order.
    pub fn with_evaluators(mut self, evaluators: Vec<Evaluator>) -> Self {
        self.evaluators = evaluators;
        self
    }

    pub fn filters(&self) -> &MarketFilters {
        &self.filters
    }

    /// Setups surviving every filter, in evaluator order.
    pub fn detect(
        &self,
        symbol: &str,
        bars: &[OhlcvBar],
        confirmation: Option<&[OhlcvBar]>,
    ) -> Vec<Setup> {
        self.detect_detailed(symbol, bars, confirmation).setups
    }

    /// Trend is classified on `confirmation` when given, otherwise on `bars`.
    pub fn detect_detailed(
        &self,
        symbol: &str,
        bars: &[OhlcvBar],
        confirmation: Option<&[OhlcvBar]>,
    ) -> Detection {
        let trend = self.filters.classify_trend(confirmation.unwrap_or(bars));
        let volatility = self.filters.check_volatility(bars);
        let mut detection = Detection {
            trend,
            volatility,
            setups: Vec::new(),
            rejections: Vec::new(),
            errors: Vec::new(),
        };

        if !detection.volatility.passed {
            debug!(symbol, reason = %detection.volatility.reason, "volatility gate closed");
            return detection;
        }

        let ctx = EvaluationContext::new(bars, &self.setups, &self.exits);
        for evaluator in &self.evaluators {
            let toggle = self.setups.toggle(evaluator.kind);
            if !toggle.enabled {
                detection.rejections.push(Rejection {
                    kind: evaluator.kind,
                    reason: RejectReason::Disabled,
                });
                continue;
            }

            let candidate = match (evaluator.evaluate)(&ctx) {
                Ok(Some(candidate)) => candidate,
                Ok(None) => continue,
                Err(err) => {
                    warn!(symbol, error = %err, "setup evaluator failed");
                    detection.errors.push(err);
                    continue;
                }
            };

            let setup = Setup {
                symbol: symbol.to_string(),
                kind: evaluator.kind,
                direction: candidate.direction,
                score: toggle.score,
                entry: candidate.entry,
                stop: candidate.stop,
                target: candidate.target,
                reason: candidate.reason,
                trend,
            };

            let rejection = if setup.score < self.setups.min_score {
                Some(RejectReason::BelowMinScore {
                    score: setup.score,
                    min_score: self.setups.min_score,
                })
            } else if !setup.is_well_formed() {
                Some(RejectReason::MalformedLevels)
            } else if !self.filters.direction_allowed(setup.direction, trend) {
                Some(RejectReason::DirectionNotAllowed {
                    direction: setup.direction,
                    trend,
                })
            } else {
                None
            };

            match rejection {
                Some(reason) => {
                    debug!(symbol, setup = setup.type_name(), ?reason, "setup rejected");
                    detection.rejections.push(Rejection {
                        kind: evaluator.kind,
                        reason,
                    });
                }
                None => detection.setups.push(setup),
            }
        }

        detection
    }
}
