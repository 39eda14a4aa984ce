//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report::TextReport;
use crate::domain::bar_series::{BarSeries, DateRange};
use crate::domain::config::StrategyConfig;
use crate::domain::config_validation::{read_date_range, validate_config};
use crate::domain::detector::SetupDetector;
use crate::domain::error::TradesimError;
use crate::domain::scanner::scan_universe;
use crate::domain::setup::SetupKind;
use crate::domain::simulation::Simulator;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "TRADESIM_LOG";

#[derive(Parser, Debug)]
#[command(name = "tradesim", about = "Intraday setup detection and trade simulation")]
pub struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation over CSV bar files
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory of <SYMBOL>.csv files (overrides [data] dir)
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Comma-separated symbols (overrides [data] symbols)
        #[arg(long)]
        symbols: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Leave the trade list out of the report
        #[arg(long)]
        summary_only: bool,
    },
    /// Detect setups at the latest bar of each symbol
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Directory of higher-timeframe bars used for trend classification
        #[arg(long)]
        confirmation: Option<PathBuf>,
        #[arg(long)]
        symbols: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Installs the global tracing subscriber. Filter directives come from
/// `TRADESIM_LOG`, defaulting to `info`. Logs go to stderr.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // a second install (tests) is not an error
    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing(cli.log_format);
    match cli.command {
        Command::Backtest {
            config,
            data,
            symbols,
            output,
            summary_only,
        } => run_backtest(
            &config,
            data.as_deref(),
            symbols.as_deref(),
            output.as_deref(),
            summary_only,
        ),
        Command::Scan {
            config,
            data,
            confirmation,
            symbols,
        } => run_scan(
            &config,
            data.as_deref(),
            confirmation.as_deref(),
            symbols.as_deref(),
        ),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: &TradesimError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

/// Splits a comma-separated symbol list. Empty tokens and duplicates are
/// rejected.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, TradesimError> {
    let invalid = |reason: String| TradesimError::ConfigInvalid {
        section: "data".into(),
        key: "symbols".into(),
        reason,
    };

    let mut symbols = Vec::new();
    let mut seen = HashSet::new();
    for token in input.split(',') {
        let symbol = token.trim();
        if symbol.is_empty() {
            return Err(invalid("empty symbol in list".into()));
        }
        if !seen.insert(symbol.to_string()) {
            return Err(invalid(format!("duplicate symbol {}", symbol)));
        }
        symbols.push(symbol.to_string());
    }
    Ok(symbols)
}

/// Data directory from the flag, else `[data] dir`.
pub fn resolve_data_dir(
    flag: Option<&Path>,
    config: &dyn ConfigPort,
) -> Result<PathBuf, TradesimError> {
    if let Some(dir) = flag {
        return Ok(dir.to_path_buf());
    }
    config
        .get_string("data", "dir")
        .map(PathBuf::from)
        .ok_or_else(|| TradesimError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        })
}

/// Symbols from the flag, else `[data] symbols`, else every symbol the data
/// port lists.
pub fn resolve_symbols(
    flag: Option<&str>,
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, TradesimError> {
    match flag
        .map(str::to_string)
        .or_else(|| config.get_string("data", "symbols"))
    {
        Some(list) => parse_symbols(&list),
        None => data_port.list_symbols(),
    }
}

/// A symbol left out of the universe.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct Universe {
    pub series: Vec<BarSeries>,
    pub skipped: Vec<SkippedSymbol>,
}

/// Loads every symbol's full history. Symbols that fail to load or have no
/// bars are skipped, each logged once.
pub fn load_universe(data_port: &dyn DataPort, symbols: &[String]) -> Universe {
    let mut universe = Universe {
        series: Vec::with_capacity(symbols.len()),
        skipped: Vec::new(),
    };
    for symbol in symbols {
        let reason = match data_port.fetch_bars(symbol, &DateRange::default()) {
            Ok(bars) if bars.is_empty() => "no data".to_string(),
            Ok(bars) => {
                universe.series.push(BarSeries::new(symbol.clone(), bars));
                continue;
            }
            Err(e) => e.to_string(),
        };
        warn!(symbol = %symbol, reason = %reason, "skipping symbol");
        universe.skipped.push(SkippedSymbol {
            symbol: symbol.clone(),
            reason,
        });
    }
    universe
}

fn validated(config_path: &Path) -> Result<(FileConfigAdapter, StrategyConfig), ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    let strategy = validate_config(&adapter).map_err(|e| fail(&e))?;
    Ok((adapter, strategy))
}

fn run_backtest(
    config_path: &Path,
    data_dir: Option<&Path>,
    symbols: Option<&str>,
    output_path: Option<&Path>,
    summary_only: bool,
) -> ExitCode {
    // Stage 1: load and validate config
    let (adapter, config) = match validated(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };
    let range = match read_date_range(&adapter) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    // Stage 2: resolve data source and symbols
    let data_dir = match resolve_data_dir(data_dir, &adapter) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };
    let data_port = CsvAdapter::new(data_dir);
    let symbols = match resolve_symbols(symbols, &adapter, &data_port) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let report = TextReport { summary_only };
    run_backtest_pipeline(&data_port, &report, config, &range, &symbols, output_path)
}

/// Stages 3 onward of `backtest`, independent of where bars and reports go.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    config: StrategyConfig,
    range: &DateRange,
    symbols: &[String],
    output_path: Option<&Path>,
) -> ExitCode {
    if symbols.is_empty() {
        return fail(&TradesimError::ConfigMissing {
            section: "data".into(),
            key: "symbols".into(),
        });
    }

    // Stage 3: load bars
    eprintln!("Loading bars for {} symbols...", symbols.len());
    let universe = load_universe(data_port, symbols).series;
    if universe.is_empty() {
        return fail(&TradesimError::NoData {
            symbol: symbols.join(","),
        });
    }

    // Stage 4: simulate
    let bar_total: usize = universe.iter().map(BarSeries::bar_count).sum();
    eprintln!(
        "Running simulation: {} symbols, {} bars",
        universe.len(),
        bar_total
    );
    let result = Simulator::new(config).run(&universe, range);

    // Stage 5: console summary
    eprintln!("\n=== Results ===");
    match result.report.summary() {
        Some(s) => {
            eprintln!("Final Capital:    {:.2}", s.final_capital);
            eprintln!("Total Return:     {:.2}%", s.total_return * 100.0);
            eprintln!("Max Drawdown:     {:.1}%", s.max_drawdown * 100.0);
            eprintln!("Total Trades:     {}", s.total_trades);
            eprintln!("Win Rate:         {:.1}%", s.win_rate * 100.0);
            eprintln!("Profit Factor:    {:.2}", s.profit_factor);
        }
        None => eprintln!("No trades executed"),
    }
    if result.report.summary().is_some() {
        for insight in result.report.insights() {
            eprintln!("  - {}", insight);
        }
    }

    // Stage 6: report
    let output = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("report.txt"));
    match report_port.write(&result, &output) {
        Ok(()) => {
            info!(path = %output.display(), "report written");
            eprintln!("\nReport written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to write report: {e}");
            (&e).into()
        }
    }
}

fn run_scan(
    config_path: &Path,
    data_dir: Option<&Path>,
    confirmation_dir: Option<&Path>,
    symbols: Option<&str>,
) -> ExitCode {
    let (adapter, config) = match validated(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };
    let data_dir = match resolve_data_dir(data_dir, &adapter) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };
    let data_port = CsvAdapter::new(data_dir);
    let symbols = match resolve_symbols(symbols, &adapter, &data_port) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let universe = load_universe(&data_port, &symbols).series;
    let confirmation = confirmation_dir
        .map(|dir| load_universe(&CsvAdapter::new(dir.to_path_buf()), &symbols).series)
        .unwrap_or_default();

    eprintln!("Scanning {} symbols...", universe.len());
    let detector = SetupDetector::new(&config);
    let setups = scan_universe(
        &detector,
        &universe,
        &confirmation,
        config.limits.min_history_bars,
    );

    if setups.is_empty() {
        eprintln!("No setups found");
    }
    for s in &setups {
        println!(
            "{}\t{}\t{:.2}\tentry={:.4}\tstop={:.4}\ttarget={:.4}\t{}\t{}",
            s.symbol,
            s.type_name(),
            s.score,
            s.entry,
            s.stop,
            s.target,
            s.trend,
            s.reason
        );
    }
    eprintln!("{} setups found", setups.len());
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    let (adapter, config) = match validated(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };

    let enabled: Vec<&str> = SetupKind::ALL
        .iter()
        .filter(|k| config.setups.toggle(**k).enabled)
        .map(|k| k.config_key())
        .collect();

    eprintln!("\nCapital:    {:.2} x{}", config.capital.amount, config.capital.leverage);
    eprintln!("Positions:  max {}", config.limits.max_positions);
    eprintln!("Stops:      {:?}", config.exits.stop_mode);
    eprintln!("Setups:     {}", enabled.join(", "));
    eprintln!(
        "Filters:    trend {}, volatility {}",
        on_off(config.trend.enabled),
        on_off(config.volatility.enabled)
    );
    if let Some(dir) = adapter.get_string("data", "dir") {
        eprintln!("Data:       {}", dir);
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}
