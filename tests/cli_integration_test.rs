//! CLI integration tests with real INI and CSV files on disk.

mod common;

use clap::Parser;
use common::*;
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use tempfile::TempDir;
use tradesim::adapters::file_config_adapter::FileConfigAdapter;
use tradesim::cli::{self, Cli};

const VALID_INI: &str = r#"
[capital]
amount = 1000
leverage = 5
position_size_pct = 0.4

[limits]
max_positions = 2
max_daily_trades = 12
min_history_bars = 55

[cooldown]
enabled = true
after_entry = 4
after_exit = 2
after_loss = 8

[exits]
max_hold_minutes = 120
use_atr_stops = false

[setups]
min_score = 0.4
ema_pullback = true
breakout = true
rsi_extreme = true
range_bounce = false
momentum = true
momentum_score = 0.45

[trend]
enabled = true
uptrend = LONG
downtrend = SHORT
ranging = LONG,SHORT

[volatility]
enabled = true
atr_lookback = 50
"#;

fn write_csv(dir: &Path, symbol: &str, closes: &[f64]) {
    let mut content = String::from("timestamp,open,high,low,close,volume\n");
    for bar in make_bars(symbol, closes) {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.timestamp.format("%Y-%m-%d %H:%M:%S"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        ));
    }
    fs::write(dir.join(format!("{}.csv", symbol)), content).unwrap();
}

/// Config file plus a data directory holding a flat and a wavy symbol.
fn workspace(extra_ini: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("bars");
    fs::create_dir(&data).unwrap();
    write_csv(&data, "FLAT", &[100.0; 120]);
    let wavy: Vec<f64> = (0..200)
        .map(|i| 100.0 + 3.0 * ((i as f64) / 7.0).sin() + 0.05 * i as f64)
        .collect();
    write_csv(&data, "WAVY", &wavy);

    let ini = format!(
        "{}\n[data]\ndir = {}\n{}",
        VALID_INI,
        data.display(),
        extra_ini
    );
    let config = dir.path().join("tradesim.ini");
    fs::write(&config, ini).unwrap();
    (dir, config)
}

fn run(args: &[&str]) -> ExitCode {
    let mut argv = vec!["tradesim"];
    argv.extend_from_slice(args);
    cli::run(Cli::try_parse_from(argv).unwrap())
}

mod validate {
    use super::*;

    #[test]
    fn valid_config_passes() {
        let (_dir, config) = workspace("");
        let code = run(&["validate", "-c", config.to_str().unwrap()]);
        assert!(same_exit_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn missing_file_is_config_error() {
        let code = run(&["validate", "-c", "/nonexistent/tradesim.ini"]);
        assert!(same_exit_code(code, ExitCode::from(2)));
    }

    #[test]
    fn unknown_setup_entry_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("bad.ini");
        fs::write(&config, "[setups]\nhead_and_shoulders = true\n").unwrap();
        let code = run(&["validate", "-c", config.to_str().unwrap()]);
        assert!(same_exit_code(code, ExitCode::from(2)));
    }

    #[test]
    fn breakeven_stops_are_rejected() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("bad.ini");
        fs::write(&config, "[exits]\nbreakeven_enabled = true\n").unwrap();
        let code = run(&["validate", "-c", config.to_str().unwrap()]);
        assert!(same_exit_code(code, ExitCode::from(2)));
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("bad.ini");
        fs::write(
            &config,
            "[backtest]\nstart = 2024-02-01\nend = 2024-01-01\n",
        )
        .unwrap();
        let code = run(&["validate", "-c", config.to_str().unwrap()]);
        assert!(same_exit_code(code, ExitCode::from(2)));
    }
}

mod backtest {
    use super::*;

    #[test]
    fn writes_report_file() {
        let (dir, config) = workspace("");
        let output = dir.path().join("report.txt");
        let code = run(&[
            "backtest",
            "-c",
            config.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ]);
        assert!(same_exit_code(code, ExitCode::SUCCESS));

        let report = fs::read_to_string(&output).unwrap();
        assert!(report.starts_with("=== Simulation Report ==="));
    }

    #[test]
    fn symbols_flag_limits_universe() {
        let (dir, config) = workspace("");
        let output = dir.path().join("flat.txt");
        let code = run(&[
            "backtest",
            "-c",
            config.to_str().unwrap(),
            "--symbols",
            "FLAT",
            "-o",
            output.to_str().unwrap(),
        ]);
        assert!(same_exit_code(code, ExitCode::SUCCESS));
        // a flat market never passes the volatility gate
        let report = fs::read_to_string(&output).unwrap();
        assert!(report.contains("No trades executed"));
    }

    #[test]
    fn unknown_symbols_are_a_data_error() {
        let (dir, config) = workspace("");
        let output = dir.path().join("none.txt");
        let code = run(&[
            "backtest",
            "-c",
            config.to_str().unwrap(),
            "--symbols",
            "NOPE",
            "-o",
            output.to_str().unwrap(),
        ]);
        assert!(same_exit_code(code, ExitCode::from(3)));
        assert!(!output.exists());
    }

    #[test]
    fn data_dir_is_required() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("nodata.ini");
        fs::write(&config, VALID_INI).unwrap();
        let code = run(&["backtest", "-c", config.to_str().unwrap()]);
        assert!(same_exit_code(code, ExitCode::from(2)));
    }

    #[test]
    fn data_flag_overrides_config() {
        let (dir, config) = workspace("");
        let other = TempDir::new().unwrap();
        write_csv(other.path(), "ONLY", &[100.0; 80]);
        let output = dir.path().join("only.txt");
        let code = run(&[
            "backtest",
            "-c",
            config.to_str().unwrap(),
            "-d",
            other.path().to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ]);
        assert!(same_exit_code(code, ExitCode::SUCCESS));
    }
}

mod scan {
    use super::*;

    #[test]
    fn scan_succeeds_with_confirmation_dir() {
        let (dir, config) = workspace("");
        let data = dir.path().join("bars");
        let code = run(&[
            "scan",
            "-c",
            config.to_str().unwrap(),
            "--confirmation",
            data.to_str().unwrap(),
        ]);
        assert!(same_exit_code(code, ExitCode::SUCCESS));
    }
}

mod helpers {
    use super::*;

    #[test]
    fn resolve_symbols_falls_back_to_listing() {
        let config = FileConfigAdapter::from_string("[data]\n").unwrap();
        let port = MockDataPort::new()
            .with_bars("BBB", Vec::new())
            .with_bars("AAA", Vec::new());
        assert_eq!(
            cli::resolve_symbols(None, &config, &port).unwrap(),
            vec!["AAA", "BBB"]
        );

        let config = FileConfigAdapter::from_string("[data]\nsymbols = CCC, DDD\n").unwrap();
        assert_eq!(
            cli::resolve_symbols(None, &config, &port).unwrap(),
            vec!["CCC", "DDD"]
        );
        assert_eq!(
            cli::resolve_symbols(Some("EEE"), &config, &port).unwrap(),
            vec!["EEE"]
        );
    }

    #[test]
    fn load_universe_skips_failures() {
        let port = MockDataPort::new()
            .with_bars("GOOD", make_bars("GOOD", &[100.0; 5]))
            .with_bars("EMPTY", Vec::new())
            .with_error("BAD", "corrupt");
        let universe = cli::load_universe(
            &port,
            &["GOOD".to_string(), "EMPTY".to_string(), "BAD".to_string()],
        );
        assert_eq!(universe.series.len(), 1);
        assert_eq!(universe.series[0].symbol, "GOOD");
        assert_eq!(universe.series[0].bar_count(), 5);

        // one entry per skipped symbol
        let skipped: Vec<&str> = universe.skipped.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(skipped, vec!["EMPTY", "BAD"]);
        assert_eq!(universe.skipped[0].reason, "no data");
        assert!(universe.skipped[1].reason.contains("corrupt"));
    }
}
