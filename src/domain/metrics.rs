//! Simulation report: summary statistics, breakdowns and insights.

use crate::domain::portfolio::EquityPoint;
use crate::domain::position::TradeRecord;
use chrono::Timelike;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub initial_capital: f64,
    pub final_capital: f64,
    /// Fractional return on initial capital.
    pub total_return: f64,
    pub total_pnl: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    /// |sum of winning P&L / sum of losing P&L|; infinite with no losing P&L.
    pub profit_factor: f64,
    pub avg_winner_pct: f64,
    pub avg_loser_pct: f64,
    /// Most negative (capital - running peak) / running peak; zero or below.
    pub max_drawdown: f64,
    pub avg_duration_minutes: f64,
    pub best_trade_pct: f64,
    pub worst_trade_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_pnl_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Breakdowns {
    pub by_setup_type: BTreeMap<String, GroupStats>,
    pub by_symbol: BTreeMap<String, GroupStats>,
    pub by_direction: BTreeMap<String, GroupStats>,
    /// Keyed by the hour of day of the entry.
    pub by_hour: BTreeMap<u32, GroupStats>,
}

/// Hour rankings need trades in at least this many distinct hours.
const MIN_HOURS_FOR_RANKING: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    NoTrades,
    Completed {
        summary: Summary,
        breakdowns: Breakdowns,
    },
}

impl Report {
    pub fn compute(
        trades: &[TradeRecord],
        equity_curve: &[EquityPoint],
        initial_capital: f64,
        final_capital: f64,
    ) -> Self {
        if trades.is_empty() {
            return Report::NoTrades;
        }

        let (winners, losers): (Vec<&TradeRecord>, Vec<&TradeRecord>) =
            trades.iter().partition(|t| t.is_winner());

        let win_sum: f64 = winners.iter().map(|t| t.pnl).sum();
        let lose_sum: f64 = losers.iter().map(|t| t.pnl).sum();
        let profit_factor = if losers.is_empty() || lose_sum == 0.0 {
            f64::INFINITY
        } else {
            (win_sum / lose_sum).abs()
        };

        let mean_pct = |group: &[&TradeRecord]| {
            if group.is_empty() {
                0.0
            } else {
                group.iter().map(|t| t.pnl_pct).sum::<f64>() / group.len() as f64
            }
        };

        let total_trades = trades.len();
        let total_return = if initial_capital != 0.0 {
            (final_capital - initial_capital) / initial_capital
        } else {
            0.0
        };

        let summary = Summary {
            initial_capital,
            final_capital,
            total_return,
            total_pnl: trades.iter().map(|t| t.pnl).sum(),
            total_trades,
            winning_trades: winners.len(),
            losing_trades: losers.len(),
            win_rate: winners.len() as f64 / total_trades as f64,
            profit_factor,
            avg_winner_pct: mean_pct(&winners),
            avg_loser_pct: mean_pct(&losers),
            max_drawdown: max_drawdown(equity_curve),
            avg_duration_minutes: trades.iter().map(|t| t.duration_minutes()).sum::<f64>()
                / total_trades as f64,
            best_trade_pct: trades
                .iter()
                .map(|t| t.pnl_pct)
                .fold(f64::NEG_INFINITY, f64::max),
            worst_trade_pct: trades
                .iter()
                .map(|t| t.pnl_pct)
                .fold(f64::INFINITY, f64::min),
        };

        let breakdowns = Breakdowns {
            by_setup_type: group_by(trades, |t| t.setup_type.clone()),
            by_symbol: group_by(trades, |t| t.symbol.clone()),
            by_direction: group_by(trades, |t| t.direction.to_string()),
            by_hour: group_by(trades, |t| t.entry_time.hour()),
        };

        Report::Completed {
            summary,
            breakdowns,
        }
    }

    pub fn summary(&self) -> Option<&Summary> {
        match self {
            Report::NoTrades => None,
            Report::Completed { summary, .. } => Some(summary),
        }
    }

    pub fn breakdowns(&self) -> Option<&Breakdowns> {
        match self {
            Report::NoTrades => None,
            Report::Completed { breakdowns, .. } => Some(breakdowns),
        }
    }

    /// Rule-based observations about the summary and breakdowns.
    pub fn insights(&self) -> Vec<String> {
        let (Some(s), Some(b)) = (self.summary(), self.breakdowns()) else {
            return vec!["No trades executed".to_string()];
        };
        let mut insights = Vec::new();

        if s.total_return > 0.5 {
            insights.push(format!(
                "Strong performance: {:.1}% return",
                s.total_return * 100.0
            ));
        } else if s.total_return < -0.2 {
            insights.push(format!(
                "Significant losses: {:.1}% return",
                s.total_return * 100.0
            ));
        }

        if s.win_rate > 0.55 {
            insights.push(format!("High win rate: {:.1}%", s.win_rate * 100.0));
        } else if s.win_rate < 0.4 {
            insights.push(format!(
                "Low win rate: {:.1}%, review entry criteria",
                s.win_rate * 100.0
            ));
        }

        if s.profit_factor > 1.5 {
            insights.push(format!("Good profit factor: {:.2}", s.profit_factor));
        } else if s.profit_factor < 1.0 {
            insights.push(format!(
                "Profit factor below 1 ({:.2}): losing strategy",
                s.profit_factor
            ));
        }

        if s.max_drawdown.abs() > 0.3 {
            insights.push(format!(
                "High drawdown: {:.1}%, consider smaller position sizes",
                s.max_drawdown * 100.0
            ));
        }

        if let Some(((best, best_stats), (worst, worst_stats))) = best_and_worst(&b.by_setup_type)
        {
            insights.push(format!(
                "Best setup: {} ({:.2}% avg)",
                best,
                best_stats.avg_pnl_pct * 100.0
            ));
            insights.push(format!(
                "Worst setup: {} ({:.2}% avg), consider removing",
                worst,
                worst_stats.avg_pnl_pct * 100.0
            ));
        }

        let hours =
            best_and_worst(&b.by_hour).filter(|_| b.by_hour.len() >= MIN_HOURS_FOR_RANKING);
        if let Some(((best, _), (worst, _))) = hours {
            insights.push(format!("Best hour: {:02}:00", best));
            insights.push(format!("Worst hour: {:02}:00, avoid trading", worst));
        }

        let losing: Vec<&str> = b
            .by_setup_type
            .iter()
            .filter(|(_, g)| g.avg_pnl_pct < 0.0)
            .map(|(name, _)| name.as_str())
            .collect();
        if !losing.is_empty() {
            insights.push(format!("Disable losing setups: {}", losing.join(", ")));
        }

        insights
    }
}

/// Groups with the highest and lowest average P&L%. The first group in key
/// order wins a tie.
fn best_and_worst<K>(
    groups: &BTreeMap<K, GroupStats>,
) -> Option<((&K, &GroupStats), (&K, &GroupStats))> {
    let mut iter = groups.iter();
    let first = iter.next()?;
    Some(iter.fold((first, first), |(best, worst), group| {
        let best = if group.1.avg_pnl_pct > best.1.avg_pnl_pct {
            group
        } else {
            best
        };
        let worst = if group.1.avg_pnl_pct < worst.1.avg_pnl_pct {
            group
        } else {
            worst
        };
        (best, worst)
    }))
}

fn group_by<K, F>(trades: &[TradeRecord], key: F) -> BTreeMap<K, GroupStats>
where
    K: Ord,
    F: Fn(&TradeRecord) -> K,
{
    let mut groups: BTreeMap<K, Vec<&TradeRecord>> = BTreeMap::new();
    for trade in trades {
        groups.entry(key(trade)).or_default().push(trade);
    }
    groups
        .into_iter()
        .map(|(name, group)| {
            let n = group.len() as f64;
            let stats = GroupStats {
                trades: group.len(),
                win_rate: group.iter().filter(|t| t.is_winner()).count() as f64 / n,
                total_pnl: group.iter().map(|t| t.pnl).sum(),
                avg_pnl_pct: group.iter().map(|t| t.pnl_pct).sum::<f64>() / n,
            };
            (name, stats)
        })
        .collect()
}

/// Most negative drawdown from the running peak, as a fraction (<= 0).
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for point in equity_curve {
        peak = peak.max(point.capital);
        if peak > 0.0 {
            worst = worst.min((point.capital - peak) / peak);
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::ExitReason;
    use crate::domain::setup::Direction;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn trade(symbol: &str, setup_type: &str, direction: Direction, pnl_pct: f64) -> TradeRecord {
        TradeRecord {
            symbol: symbol.into(),
            setup_type: setup_type.into(),
            direction,
            score: 0.5,
            entry_time: t0(),
            entry_step: 0,
            entry_price: 100.0,
            stop: 99.0,
            target: 102.0,
            exit_time: t0() + Duration::minutes(30),
            exit_step: 6,
            exit_price: 100.0 * (1.0 + pnl_pct),
            exit_reason: ExitReason::TakeProfit,
            size_in_currency: 2000.0,
            pnl: 2000.0 * pnl_pct,
            pnl_pct,
        }
    }

    fn trade_at_hour(setup_type: &str, hour: i64, pnl_pct: f64) -> TradeRecord {
        let mut t = trade("BTC", setup_type, Direction::Long, pnl_pct);
        t.entry_time = t0() + Duration::hours(hour);
        t.exit_time = t.entry_time + Duration::minutes(30);
        t
    }

    fn equity(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &capital)| EquityPoint {
                timestamp: t0() + Duration::minutes(5 * i as i64),
                capital,
                open_positions: 0,
            })
            .collect()
    }

    #[test]
    fn no_trades_report() {
        let report = Report::compute(&[], &equity(&[1000.0]), 1000.0, 1000.0);
        assert_eq!(report, Report::NoTrades);
        assert_eq!(report.insights(), vec!["No trades executed".to_string()]);
    }

    #[test]
    fn summary_counts_and_profit_factor() {
        let trades = vec![
            trade("BTC", "BREAKOUT_LONG", Direction::Long, 0.02),
            trade("BTC", "MOMENTUM_SHORT", Direction::Short, -0.01),
            trade("ETH", "BREAKOUT_LONG", Direction::Long, 0.0),
        ];
        let report = Report::compute(&trades, &equity(&[1000.0, 1040.0, 1020.0]), 1000.0, 1020.0);
        let s = report.summary().unwrap();
        assert_eq!(s.total_trades, 3);
        assert_eq!(s.winning_trades, 1);
        // a flat trade counts as losing
        assert_eq!(s.losing_trades, 2);
        assert!((s.profit_factor - 2.0).abs() < 1e-9);
        assert!((s.total_pnl - 20.0).abs() < 1e-9);
        assert!((s.total_return - 0.02).abs() < 1e-12);
        assert!((s.avg_duration_minutes - 30.0).abs() < 1e-9);
        assert!((s.best_trade_pct - 0.02).abs() < 1e-12);
        assert!((s.worst_trade_pct + 0.01).abs() < 1e-12);
    }

    #[test]
    fn profit_factor_infinite_without_losses() {
        let trades = vec![trade("BTC", "BREAKOUT_LONG", Direction::Long, 0.02)];
        let report = Report::compute(&trades, &[], 1000.0, 1040.0);
        assert!(report.summary().unwrap().profit_factor.is_infinite());
    }

    #[test]
    fn profit_factor_infinite_when_losers_sum_to_zero() {
        let trades = vec![
            trade("BTC", "BREAKOUT_LONG", Direction::Long, 0.02),
            trade("BTC", "BREAKOUT_LONG", Direction::Long, 0.0),
        ];
        let report = Report::compute(&trades, &[], 1000.0, 1040.0);
        assert!(report.summary().unwrap().profit_factor.is_infinite());
    }

    #[test]
    fn breakdowns_group_trades() {
        let trades = vec![
            trade("BTC", "BREAKOUT_LONG", Direction::Long, 0.02),
            trade("ETH", "BREAKOUT_LONG", Direction::Long, -0.01),
            trade("ETH", "MOMENTUM_SHORT", Direction::Short, 0.01),
        ];
        let Report::Completed { breakdowns, .. } =
            Report::compute(&trades, &[], 1000.0, 1040.0)
        else {
            panic!("expected completed report");
        };
        let breakout = &breakdowns.by_setup_type["BREAKOUT_LONG"];
        assert_eq!(breakout.trades, 2);
        assert!((breakout.win_rate - 0.5).abs() < 1e-12);
        assert!((breakout.avg_pnl_pct - 0.005).abs() < 1e-12);
        assert_eq!(breakdowns.by_symbol["ETH"].trades, 2);
        assert_eq!(breakdowns.by_direction["SHORT"].trades, 1);
        assert_eq!(breakdowns.by_direction["LONG"].trades, 2);
    }

    #[test]
    fn breakdown_by_entry_hour() {
        let trades = vec![
            trade_at_hour("BREAKOUT_LONG", 9, 0.02),
            trade_at_hour("BREAKOUT_LONG", 9, -0.01),
            trade_at_hour("BREAKOUT_LONG", 14, 0.01),
        ];
        let report = Report::compute(&trades, &[], 1000.0, 1040.0);
        let by_hour = &report.breakdowns().unwrap().by_hour;
        assert_eq!(by_hour.keys().copied().collect::<Vec<u32>>(), vec![9, 14]);
        assert_eq!(by_hour[&9].trades, 2);
        assert!((by_hour[&9].win_rate - 0.5).abs() < 1e-12);
        assert!((by_hour[&14].avg_pnl_pct - 0.01).abs() < 1e-12);
    }

    #[test]
    fn insights_rank_setups_and_flag_losers() {
        let trades = vec![
            trade("BTC", "BREAKOUT_LONG", Direction::Long, 0.02),
            trade("BTC", "MOMENTUM_SHORT", Direction::Short, -0.01),
            trade("BTC", "RSI_OVERSOLD_LONG", Direction::Long, -0.005),
        ];
        let insights = Report::compute(&trades, &[], 1000.0, 1010.0).insights();
        assert!(insights.contains(&"Best setup: BREAKOUT_LONG (2.00% avg)".to_string()));
        assert!(
            insights.contains(&"Worst setup: MOMENTUM_SHORT (-1.00% avg), consider removing".to_string())
        );
        assert!(
            insights
                .contains(&"Disable losing setups: MOMENTUM_SHORT, RSI_OVERSOLD_LONG".to_string())
        );
    }

    #[test]
    fn no_losing_setup_recommendation_when_all_profit() {
        let trades = vec![trade("BTC", "BREAKOUT_LONG", Direction::Long, 0.02)];
        let insights = Report::compute(&trades, &[], 1000.0, 1040.0).insights();
        assert!(insights.iter().all(|i| !i.starts_with("Disable losing setups")));
    }

    #[test]
    fn hour_insights_need_three_hours() {
        let two_hours = vec![
            trade_at_hour("BREAKOUT_LONG", 9, 0.02),
            trade_at_hour("BREAKOUT_LONG", 14, -0.01),
        ];
        let insights = Report::compute(&two_hours, &[], 1000.0, 1010.0).insights();
        assert!(insights.iter().all(|i| !i.contains(" hour: ")));

        let three_hours = vec![
            trade_at_hour("BREAKOUT_LONG", 9, 0.02),
            trade_at_hour("BREAKOUT_LONG", 14, -0.01),
            trade_at_hour("BREAKOUT_LONG", 20, 0.005),
        ];
        let insights = Report::compute(&three_hours, &[], 1000.0, 1015.0).insights();
        assert!(insights.contains(&"Best hour: 09:00".to_string()));
        assert!(insights.contains(&"Worst hour: 14:00, avoid trading".to_string()));
    }

    #[test]
    fn drawdown_tracks_running_peak() {
        let dd = max_drawdown(&equity(&[1000.0, 1200.0, 900.0, 1300.0, 1170.0]));
        assert!((dd - (-0.25)).abs() < 1e-12);
    }

    #[test]
    fn drawdown_zero_for_rising_curve() {
        assert_eq!(max_drawdown(&equity(&[1000.0, 1010.0, 1020.0])), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn insights_flag_strong_and_weak_results() {
        let trades = vec![
            trade("BTC", "BREAKOUT_LONG", Direction::Long, 0.3),
            trade("BTC", "BREAKOUT_LONG", Direction::Long, 0.1),
        ];
        let report = Report::compute(&trades, &equity(&[1000.0, 600.0, 1800.0]), 1000.0, 1800.0);
        let insights = report.insights();
        assert!(insights.iter().any(|i| i.starts_with("Strong performance")));
        assert!(insights.iter().any(|i| i.starts_with("High win rate")));
        assert!(insights.iter().any(|i| i.starts_with("Good profit factor")));
        assert!(insights.iter().any(|i| i.starts_with("High drawdown")));

        let losing = vec![
            trade("BTC", "BREAKOUT_LONG", Direction::Long, -0.02),
            trade("BTC", "BREAKOUT_LONG", Direction::Long, 0.01),
            trade("BTC", "BREAKOUT_LONG", Direction::Long, -0.02),
        ];
        let report = Report::compute(&losing, &[], 1000.0, 700.0);
        let insights = report.insights();
        assert!(insights.iter().any(|i| i.starts_with("Significant losses")));
        assert!(insights.iter().any(|i| i.starts_with("Low win rate")));
        assert!(insights.iter().any(|i| i.starts_with("Profit factor below 1")));
    }
}
