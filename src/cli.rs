//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::blotter_csv_adapter::BlotterCsvAdapter;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::summary_json_adapter::SummaryJsonAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::candle::Timeframe;
use crate::domain::config_validation::load_backtest_config;
use crate::domain::error::SwingtraderError;
use crate::domain::market_data::load_market_data;
use crate::domain::metrics::Summary;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const BLOTTER_FILE: &str = "blotter.csv";
pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Parser, Debug)]
#[command(name = "swingtrader", about = "Trend-following swing-trading backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and write the blotter and summary
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show candle counts and ranges for the configured tickers
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data_dir,
            output_dir,
        } => run_backtest(&config, data_dir, output_dir),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, data_dir } => run_info(&config, data_dir),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn load_validated(path: &Path) -> Result<(FileConfigAdapter, BacktestConfig), ExitCode> {
    eprintln!("Loading config from {}", path.display());
    let adapter = load_config(path)?;
    match load_backtest_config(&adapter) {
        Ok(config) => Ok((adapter, config)),
        Err(e) => {
            eprintln!("error: {e}");
            Err((&e).into())
        }
    }
}

/// Command-line override, then the `[backtest]` key, then the default.
pub fn resolve_dir(
    override_dir: Option<PathBuf>,
    config: &dyn ConfigPort,
    key: &str,
    default: &str,
) -> PathBuf {
    override_dir
        .or_else(|| config.get_string("backtest", key).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default))
}

fn run_backtest(
    config_path: &Path,
    data_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> ExitCode {
    let (adapter, config) = match load_validated(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let data_dir = resolve_dir(data_dir, &adapter, "data_dir", DEFAULT_DATA_DIR);
    let output_dir = resolve_dir(output_dir, &adapter, "output_dir", DEFAULT_OUTPUT_DIR);
    eprintln!("Loading data from {}", data_dir.display());

    let data_port = CsvAdapter::new(data_dir);
    match run_backtest_pipeline(&data_port, &config, &output_dir) {
        Ok(result) => {
            print_summary(&result.summary);
            eprintln!("\nBlotter written to: {}", output_dir.join(BLOTTER_FILE).display());
            eprintln!("Summary written to: {}", output_dir.join(SUMMARY_FILE).display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load data through `data_port`, run the simulation and write both outputs
/// into `output_dir`.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    config: &BacktestConfig,
    output_dir: &Path,
) -> Result<BacktestResult, SwingtraderError> {
    let market = load_market_data(data_port, &config.tickers());
    let timeline = market.timeline(&config.tickers());
    if timeline.is_empty() {
        log::warn!(
            "no hourly data for {} or {}, the run will be empty",
            config.bull_etf,
            config.bear_etf
        );
    }
    eprintln!("  Processing: {} hourly steps", timeline.len());

    let result = backtest_engine::run_backtest(&market, config);

    BlotterCsvAdapter::new().write(&result, &output_dir.join(BLOTTER_FILE))?;
    SummaryJsonAdapter::new().write(&result, &output_dir.join(SUMMARY_FILE))?;
    Ok(result)
}

pub fn print_summary(s: &Summary) {
    eprintln!("\n=== Backtest Summary ===");
    eprintln!("Total Trades:      {}", s.total_trades);
    eprintln!(
        "Winning Trades:    {} ({:.2}%)",
        s.winning_trades, s.win_rate
    );
    eprintln!("Losing Trades:     {}", s.losing_trades);
    eprintln!("Average Win:       ${:.2}", s.average_win);
    eprintln!("Average Loss:      ${:.2}", s.average_loss);
    eprintln!("Profit Factor:     {:.2}", s.profit_factor);
    eprintln!("Average Days Held: {:.1}", s.average_days_held);
    eprintln!(
        "Total Return:      ${:.2} ({:.2}%)",
        s.total_return, s.total_return_percent
    );
    eprintln!(
        "Max Drawdown:      ${:.2} ({:.2}%)",
        s.max_drawdown, s.max_drawdown_percent
    );
    eprintln!("Sharpe Ratio:      {:.2}", s.sharpe_ratio);
}

fn run_validate(config_path: &Path) -> ExitCode {
    let (_, config) = match load_validated(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    eprintln!("Config validated successfully");
    eprintln!("\nBacktest:");
    eprintln!("  initial_capital:      {:.2}", config.initial_capital);
    eprintln!("  biweekly_deposit:     {:.2}", config.biweekly_deposit);
    eprintln!("  bull_etf:             {}", config.bull_etf);
    eprintln!("  bear_etf:             {}", config.bear_etf);
    eprintln!("  enable_pdt_guard:     {}", config.enable_pdt_guard);
    eprintln!("  cash_settlement:      {}", config.cash_settlement);
    eprintln!("\nRisk:");
    eprintln!("  risk_percent_small:   {}", config.risk_percent_small);
    eprintln!("  risk_percent_large:   {}", config.risk_percent_large);
    eprintln!("  min_risk_dollar:      {}", config.min_risk_dollar);
    eprintln!("  max_position_size:    {}", config.max_position_size);
    eprintln!("  stop_loss_multiplier: {}", config.stop_loss_multiplier);
    eprintln!("  time_stop_days:       {}", config.time_stop_days);
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, data_dir: Option<PathBuf>) -> ExitCode {
    let (adapter, config) = match load_validated(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let data_port = CsvAdapter::new(resolve_dir(data_dir, &adapter, "data_dir", DEFAULT_DATA_DIR));
    for line in describe_data(&data_port, &config) {
        println!("{line}");
    }
    ExitCode::SUCCESS
}

/// One line per ticker and timeframe: candle count and covered range.
pub fn describe_data(data_port: &dyn DataPort, config: &BacktestConfig) -> Vec<String> {
    let mut lines = Vec::new();
    for ticker in config.tickers() {
        for timeframe in [Timeframe::Daily, Timeframe::Hourly] {
            let line = match data_port.fetch_candles(ticker, timeframe) {
                Ok(candles) => match (candles.first(), candles.last()) {
                    (Some(first), Some(last)) => format!(
                        "{ticker} {timeframe}: {} candles, {} to {}",
                        candles.len(),
                        first.timestamp,
                        last.timestamp
                    ),
                    _ => format!("{ticker} {timeframe}: no data found"),
                },
                Err(e) => format!("{ticker} {timeframe}: {e}"),
            };
            lines.push(line);
        }
    }
    lines
}
