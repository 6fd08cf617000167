//! Output of a completed simulation.

use serde::{Deserialize, Serialize};
use spark_core::error::TradingResult;
use spark_core::types::{EquityPoint, FillTiming, Position, PositionSample, Timeframe, Trade};

/// Metadata describing how a run was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Registry name of the strategy
    pub strategy: String,
    /// Parameters the strategy was built with
    pub parameters: serde_json::Value,
    /// Timestamp of the first bar
    pub start: i64,
    /// Timestamp of the last bar
    pub end: i64,
    pub initial_cash: f64,
    pub bars_processed: usize,
    pub fee_bps: f64,
    pub slippage_bps: f64,
    #[serde(default)]
    pub fill_timing: FillTiming,
}

/// Full record of a backtest run. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Fills in execution order
    pub trades: Vec<Trade>,
    /// One point per bar, after that bar's fills
    pub equity: Vec<EquityPoint>,
    pub final_cash: f64,
    /// Gross realized PnL (fees are tracked separately in `fees_paid`)
    pub realized_pnl: f64,
    pub fees_paid: f64,
    pub final_position: Position,
    /// Market orders filled on the bar that submitted them (look-ahead exposure)
    #[serde(default)]
    pub same_bar_fills: usize,
    /// Orders carried past the last bar and never filled
    #[serde(default)]
    pub unfilled_orders: usize,
    pub meta: RunMeta,
}

impl BacktestResult {
    /// Equity at the last bar.
    pub fn final_equity(&self) -> f64 {
        self.equity
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.meta.initial_cash)
    }

    /// Net change in equity over the run.
    pub fn net_pnl(&self) -> f64 {
        self.final_equity() - self.meta.initial_cash
    }

    /// Equity values without timestamps.
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity.iter().map(|p| p.equity).collect()
    }

    /// Position after every bar, for exposure calculations.
    pub fn position_history(&self) -> Vec<PositionSample> {
        self.equity.iter().map(PositionSample::from).collect()
    }

    pub fn to_json(&self) -> TradingResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> TradingResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
