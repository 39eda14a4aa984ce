//! Plain-text report adapter.

use crate::domain::metrics::{GroupStats, Report, Summary};
use crate::domain::position::TradeRecord;
use crate::domain::simulation::SimulationResult;
use crate::ports::report_port::ReportPort;
use std::fmt::Display;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Default)]
pub struct TextReport {
    /// Omit the per-trade list.
    pub summary_only: bool,
}

impl TextReport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportPort for TextReport {
    fn render(&self, result: &SimulationResult) -> String {
        let mut output = String::new();
        output.push_str("=== Simulation Report ===\n\n");

        match &result.report {
            Report::NoTrades => {
                output.push_str(&format!(
                    "Capital:          {} -> {}\n",
                    fmt_currency(result.initial_capital),
                    fmt_currency(result.final_capital)
                ));
                output.push_str("No trades executed\n");
                return output;
            }
            Report::Completed {
                summary,
                breakdowns,
            } => {
                output.push_str(&render_summary(summary));
                output.push_str(&render_groups("By Setup Type", &breakdowns.by_setup_type));
                output.push_str(&render_groups("By Symbol", &breakdowns.by_symbol));
                output.push_str(&render_groups("By Direction", &breakdowns.by_direction));
                output.push_str(&render_groups(
                    "By Hour",
                    breakdowns
                        .by_hour
                        .iter()
                        .map(|(hour, g)| (format!("{:02}:00", hour), g)),
                ));
            }
        }

        output.push_str(&render_insights(&result.report.insights()));
        if !self.summary_only {
            output.push_str(&render_trade_log(&result.trades));
        }
        output
    }
}

fn fmt_currency(value: f64) -> String {
    if value < 0.0 {
        format!("-${:.2}", value.abs())
    } else {
        format!("${:.2}", value)
    }
}

fn fmt_pct(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

fn render_summary(s: &Summary) -> String {
    let profit_factor = if s.profit_factor.is_infinite() {
        "inf".to_string()
    } else {
        format!("{:.2}", s.profit_factor)
    };

    let rows = [
        ("Initial Capital", fmt_currency(s.initial_capital)),
        ("Final Capital", fmt_currency(s.final_capital)),
        ("Total Return", fmt_pct(s.total_return)),
        ("Total P&L", fmt_currency(s.total_pnl)),
        ("Total Trades", s.total_trades.to_string()),
        (
            "Winners / Losers",
            format!("{} / {}", s.winning_trades, s.losing_trades),
        ),
        ("Win Rate", fmt_pct(s.win_rate)),
        ("Profit Factor", profit_factor),
        ("Avg Winner", fmt_pct(s.avg_winner_pct)),
        ("Avg Loser", fmt_pct(s.avg_loser_pct)),
        ("Max Drawdown", fmt_pct(s.max_drawdown)),
        ("Avg Duration", format!("{:.0} min", s.avg_duration_minutes)),
        ("Best Trade", fmt_pct(s.best_trade_pct)),
        ("Worst Trade", fmt_pct(s.worst_trade_pct)),
    ];

    let mut output = String::from("--- Summary ---\n");
    for (label, value) in rows {
        output.push_str(&format!("{:<18}{}\n", format!("{}:", label), value));
    }
    output.push('\n');
    output
}

fn render_groups<'a, K: Display>(
    title: &str,
    groups: impl IntoIterator<Item = (K, &'a GroupStats)>,
) -> String {
    let mut output = format!("--- {} ---\n", title);
    for (name, g) in groups {
        output.push_str(&format!(
            "  {:<24} {:>4} trades  {:>7} win  {:>12}  avg {}\n",
            name,
            g.trades,
            fmt_pct(g.win_rate),
            fmt_currency(g.total_pnl),
            fmt_pct(g.avg_pnl_pct),
        ));
    }
    output.push('\n');
    output
}

fn render_insights(insights: &[String]) -> String {
    if insights.is_empty() {
        return String::new();
    }
    let mut output = String::from("--- Insights ---\n");
    for insight in insights {
        output.push_str(&format!("  - {}\n", insight));
    }
    output.push('\n');
    output
}

fn render_trade_log(trades: &[TradeRecord]) -> String {
    let mut output = String::from("--- Trades ---\n");
    for t in trades {
        output.push_str(&format!(
            "{}  {}  {:<10} {:<5} {:<24} {:>12.4} -> {:>12.4}  {:<4} {:>10}  {}\n",
            t.entry_time.format(TIME_FORMAT),
            t.exit_time.format(TIME_FORMAT),
            t.symbol,
            t.direction.as_str(),
            t.setup_type,
            t.entry_price,
            t.exit_price,
            t.exit_reason.as_str(),
            fmt_currency(t.pnl),
            fmt_pct(t.pnl_pct),
        ));
    }
    output
}
