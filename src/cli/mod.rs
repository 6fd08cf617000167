//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use spark_backtest::Objective;
use spark_core::types::FillTiming;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spark")]
#[command(author, version, about = "Deterministic bar-by-bar strategy backtesting")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", env = "SPARK_CONFIG")]
    pub config: PathBuf,

    /// Log level (overrides the configuration file)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a backtest over CSV bars
    Backtest(BacktestArgs),
    /// Grid-search strategy parameters on one symbol
    Optimize(OptimizeArgs),
    /// Check parameters on train/validate/test splits of one symbol
    WalkForward(WalkForwardArgs),
    /// List available strategies
    Strategies,
    /// Validate configuration
    ValidateConfig,
}

/// Data selection and simulator settings shared by the run commands.
#[derive(clap::Args)]
pub struct MarketArgs {
    /// CSV file, or directory of <SYMBOL>.csv files
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Timeframe of the bars (defaults to the configured one)
    #[arg(short, long)]
    pub timeframe: Option<String>,

    /// First bar to include (YYYY-MM-DD or Unix time)
    #[arg(long)]
    pub start: Option<String>,

    /// Last bar to include (YYYY-MM-DD or Unix time)
    #[arg(long)]
    pub end: Option<String>,

    /// Initial capital
    #[arg(long)]
    pub capital: Option<f64>,

    /// Fee per fill in basis points
    #[arg(long)]
    pub fee_bps: Option<f64>,

    /// Slippage per fill in basis points
    #[arg(long)]
    pub slippage_bps: Option<f64>,

    /// When orders fill: same_bar_close or next_bar_open
    #[arg(long)]
    pub fill_timing: Option<FillTiming>,
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    /// Strategy to backtest
    #[arg(short, long)]
    pub strategy: String,

    /// Symbols to run (comma-separated); each runs independently
    #[arg(short = 'S', long, value_delimiter = ',', required = true)]
    pub symbols: Vec<String>,

    #[command(flatten)]
    pub market: MarketArgs,

    /// Strategy parameters as JSON, merged over the configured ones
    #[arg(long)]
    pub params: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Save the JSON report to a file
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Write the equity curve as CSV
    #[arg(long)]
    pub equity_csv: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct OptimizeArgs {
    /// Strategy to optimize
    #[arg(short, long)]
    pub strategy: String,

    /// Symbol to optimize on
    #[arg(short = 'S', long)]
    pub symbol: String,

    #[command(flatten)]
    pub market: MarketArgs,

    /// Base strategy parameters as JSON; grid values are laid over them
    #[arg(long)]
    pub params: Option<String>,

    /// Candidate values as a JSON object of arrays, e.g. '{"fast_period":[5,10]}'
    #[arg(short, long)]
    pub grid: String,

    /// Figure to maximize: sharpe, pnl or win_rate
    #[arg(long)]
    pub objective: Option<Objective>,

    /// Leaderboard size
    #[arg(long)]
    pub top: Option<usize>,

    /// Walk-forward the leaders and drop overfit ones
    #[arg(long)]
    pub walk_forward: bool,

    /// How many leaders the walk-forward check covers
    #[arg(long)]
    pub validate_top: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Save the JSON summary to a file
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct WalkForwardArgs {
    /// Strategy to check
    #[arg(short, long)]
    pub strategy: String,

    /// Symbol to check on
    #[arg(short = 'S', long)]
    pub symbol: String,

    #[command(flatten)]
    pub market: MarketArgs,

    /// Strategy parameters as JSON, merged over the configured ones
    #[arg(long)]
    pub params: Option<String>,

    /// Share of bars used for training
    #[arg(long)]
    pub train_ratio: Option<f64>,

    /// Share of bars used for validation (0 disables it)
    #[arg(long)]
    pub validate_ratio: Option<f64>,

    /// Share of bars used for testing
    #[arg(long)]
    pub test_ratio: Option<f64>,

    /// Slide the split across the series instead of splitting once
    #[arg(long)]
    pub rolling: bool,

    /// Rolling step as a share of the series
    #[arg(long)]
    pub step: Option<f64>,

    /// Test/train Sharpe ratio below which the parameters count as overfit
    #[arg(long)]
    pub overfit_threshold: Option<f64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Save the JSON report to a file
    #[arg(long)]
    pub save: Option<PathBuf>,
}
