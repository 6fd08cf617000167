//! Setup shared by the run commands: data, simulator and strategy inputs.

use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use spark_backtest::{CancelHandle, MetricsConfig, Simulator, SimulatorConfig};
use spark_config::AppConfig;
use spark_core::types::{BarSeries, Timeframe};
use spark_data::{load_csv, parse_timestamp};
use spark_strategies::StrategyRegistry;
use std::path::PathBuf;
use tracing::warn;

use crate::cli::MarketArgs;

pub const DAY_MS: i64 = 86_400_000;

/// Bail unless `name` is registered.
pub fn ensure_strategy(registry: &StrategyRegistry, name: &str) -> Result<()> {
    if !registry.exists(name) {
        anyhow::bail!(
            "Unknown strategy '{}'. Available: {}",
            name,
            registry
                .names()
                .iter()
                .map(|n| n.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(())
}

/// Configured parameters for the strategy with `--params` keys laid over them.
pub fn strategy_params(config: &AppConfig, strategy: &str, raw: Option<&str>) -> Result<Value> {
    let mut params = match config.strategies.get(strategy) {
        Some(table) => serde_json::to_value(table).context("Invalid strategy table in config")?,
        None => Value::Null,
    };

    if let Some(raw) = raw {
        let overrides: Value = serde_json::from_str(raw).context("--params must be valid JSON")?;
        params = match (params, overrides) {
            (Value::Object(mut base), Value::Object(extra)) => {
                base.extend(extra);
                Value::Object(base)
            }
            (_, overrides) => overrides,
        };
    }

    Ok(params)
}

/// Where bars come from, the timeframe and the inclusive time range.
pub struct DataSelection {
    pub path: PathBuf,
    pub timeframe: Timeframe,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl DataSelection {
    pub fn resolve(args: &MarketArgs, config: &AppConfig) -> Result<Self> {
        let path = match args
            .data
            .clone()
            .or_else(|| config.backtest.data_dir.clone().map(PathBuf::from))
        {
            Some(path) if path.exists() => path,
            Some(path) => anyhow::bail!(
                "Data path '{}' does not exist. Provide a CSV file or directory containing CSV files (e.g. --data ./data)",
                path.display()
            ),
            None => anyhow::bail!(
                "Please provide a data file or directory with --data (e.g. --data ./data)"
            ),
        };

        let timeframe = match &args.timeframe {
            Some(tf) => tf
                .parse::<Timeframe>()
                .with_context(|| format!("Invalid timeframe '{}'", tf))?,
            None => config.backtest.timeframe,
        };
        let start = args
            .start
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .context("Invalid --start")?;
        let end = args
            .end
            .as_deref()
            .map(parse_end)
            .transpose()
            .context("Invalid --end")?;

        Ok(Self {
            path,
            timeframe,
            start,
            end,
        })
    }

    /// Load and range-filter one symbol's bars.
    pub fn load(&self, symbol: &str) -> Result<BarSeries> {
        let series = load_csv(&self.path, symbol, self.timeframe)
            .with_context(|| format!("Failed to load data for {}", symbol))?
            .between(self.start, self.end)
            .with_context(|| format!("No bars for {} in the requested range", symbol))?;
        Ok(series)
    }
}

/// A date-only end bound covers the whole day.
pub fn parse_end(s: &str) -> Result<i64, spark_core::error::DataError> {
    let ts = parse_timestamp(s)?;
    let date_only = s.trim().len() == 10 && s.trim().chars().filter(|c| *c == '-' || *c == '/').count() == 2;
    Ok(if date_only { ts + DAY_MS - 1 } else { ts })
}

/// Simulator settings from the command line, falling back to the config.
pub fn simulator(args: &MarketArgs, config: &AppConfig) -> Result<Simulator> {
    let sim_config = SimulatorConfig {
        initial_cash: args
            .capital
            .unwrap_or(to_f64(config.backtest.initial_cash, "backtest.initial_cash")?),
        fee_bps: args
            .fee_bps
            .unwrap_or(to_f64(config.backtest.fee_bps, "backtest.fee_bps")?),
        slippage_bps: args
            .slippage_bps
            .unwrap_or(to_f64(config.backtest.slippage_bps, "backtest.slippage_bps")?),
        fill_timing: args.fill_timing.unwrap_or(config.backtest.fill_timing),
    };
    Simulator::new(sim_config).context("Invalid simulator settings")
}

pub fn metrics_config(config: &AppConfig) -> Result<MetricsConfig> {
    Ok(MetricsConfig {
        risk_free_rate: to_f64(config.metrics.risk_free_rate, "metrics.risk_free_rate")?,
        periods_per_year: config
            .metrics
            .periods_per_year
            .map(|p| to_f64(p, "metrics.periods_per_year"))
            .transpose()?,
        sortino_target: to_f64(config.metrics.sortino_target, "metrics.sortino_target")?,
    })
}

fn to_f64(value: Decimal, field: &str) -> Result<f64> {
    value
        .to_f64()
        .with_context(|| format!("{} is out of range: {}", field, value))
}

/// A cancel handle that fires on Ctrl-C. Abort the task once the work is done.
pub fn cancel_on_interrupt() -> (CancelHandle, tokio::task::JoinHandle<()>) {
    let cancel = CancelHandle::new();
    let task = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling");
                cancel.cancel();
            }
        })
    };
    (cancel, task)
}

/// Write `contents` to `path`, naming the file in the error.
pub fn save(path: &std::path::Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
