//! Aggregate performance summary for a run.

use serde::{Deserialize, Serialize};

use super::{
    average_equity, calculate_annualized_return, calculate_calmar_ratio, calculate_drawdown,
    calculate_exposure_from_positions, calculate_sharpe_ratio, calculate_sortino_ratio,
    calculate_total_return, calculate_turnover_from_fills, calculate_win_rate_from_fills,
    finite_or_zero, round_trips,
};
use crate::BacktestResult;

/// Inputs to the ratio calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Annual risk-free rate, e.g. `0.02`
    pub risk_free_rate: f64,
    /// Annualization factor; derived from the series timeframe when unset
    pub periods_per_year: Option<f64>,
    /// Minimum acceptable per-period return for Sortino
    pub sortino_target: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            periods_per_year: None,
            sortino_target: 0.0,
        }
    }
}

/// Every derived statistic for one [`BacktestResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub initial_cash: f64,
    pub final_equity: f64,
    pub net_pnl: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
    pub drawdown_duration_bars: usize,
    pub drawdown_duration: i64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    /// Number of fills
    pub total_trades: usize,
    /// Number of completed round trips
    pub round_trips: usize,
    pub winning_trips: usize,
    pub losing_trips: usize,
    pub win_rate: f64,
    /// Gross profit over gross loss of completed trips; zero without losses
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub turnover: f64,
    pub exposure: f64,
    pub realized_pnl: f64,
    pub fees_paid: f64,
    pub periods_per_year: f64,
}

impl PerformanceSummary {
    pub fn from_result(result: &BacktestResult, config: &MetricsConfig) -> Self {
        let ppy = config
            .periods_per_year
            .filter(|p| p.is_finite() && *p > 0.0)
            .unwrap_or_else(|| result.meta.timeframe.periods_per_year());
        let values = result.equity_values();

        let drawdown = calculate_drawdown(&result.equity);
        let trips = round_trips(&result.trades);

        let wins: Vec<f64> = trips
            .iter()
            .filter(|t| t.net_pnl > 0.0)
            .map(|t| t.net_pnl)
            .collect();
        let losses: Vec<f64> = trips
            .iter()
            .filter(|t| t.net_pnl < 0.0)
            .map(|t| -t.net_pnl)
            .collect();
        let gross_profit: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().sum();

        let profit_factor = if gross_loss > 0.0 {
            finite_or_zero(gross_profit / gross_loss)
        } else {
            0.0
        };
        let avg_win = if wins.is_empty() {
            0.0
        } else {
            gross_profit / wins.len() as f64
        };
        let avg_loss = if losses.is_empty() {
            0.0
        } else {
            gross_loss / losses.len() as f64
        };

        Self {
            initial_cash: result.meta.initial_cash,
            final_equity: result.final_equity(),
            net_pnl: result.net_pnl(),
            total_return: calculate_total_return(&values),
            annualized_return: calculate_annualized_return(&values, ppy),
            max_drawdown: drawdown.max_drawdown,
            drawdown_duration_bars: drawdown.duration_bars,
            drawdown_duration: drawdown.duration,
            sharpe_ratio: calculate_sharpe_ratio(&values, config.risk_free_rate, ppy),
            sortino_ratio: calculate_sortino_ratio(
                &values,
                config.risk_free_rate,
                ppy,
                config.sortino_target,
            ),
            calmar_ratio: calculate_calmar_ratio(&result.equity, ppy),
            total_trades: result.trades.len(),
            round_trips: trips.len(),
            winning_trips: wins.len(),
            losing_trips: losses.len(),
            win_rate: calculate_win_rate_from_fills(&result.trades),
            profit_factor,
            avg_win,
            avg_loss,
            turnover: calculate_turnover_from_fills(
                &result.trades,
                average_equity(&result.equity),
            ),
            exposure: calculate_exposure_from_positions(&result.position_history()),
            realized_pnl: result.realized_pnl,
            fees_paid: result.fees_paid,
            periods_per_year: ppy,
        }
    }
}
