//! Performance metrics over a completed run.
//!
//! Every function here is total: empty or single-point input, zero variance
//! and zero drawdown all produce `0.0`, and no function returns NaN or an
//! infinity.

mod summary;
mod trades;

pub use summary::{MetricsConfig, PerformanceSummary};
pub use trades::{
    calculate_exposure_from_positions, calculate_turnover_from_fills,
    calculate_win_rate_from_fills, round_trips, RoundTrip,
};

use serde::{Deserialize, Serialize};
use spark_core::types::EquityPoint;

/// Variance below this is treated as zero.
const EPSILON: f64 = 1e-12;

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn valid_periods(periods_per_year: f64) -> bool {
    periods_per_year.is_finite() && periods_per_year > 0.0
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Simple per-period returns `(v[i] - v[i-1]) / v[i-1]`.
///
/// Periods starting from a non-positive value are skipped.
pub fn period_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .filter(|r| r.is_finite())
        .collect()
}

/// Mean equity over the run.
pub fn average_equity(equity: &[EquityPoint]) -> f64 {
    finite_or_zero(mean(
        &equity.iter().map(|p| p.equity).collect::<Vec<_>>(),
    ))
}

/// `(last - first) / first`.
pub fn calculate_total_return(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(&first), Some(&last)) if values.len() >= 2 && first > 0.0 => {
            finite_or_zero((last - first) / first)
        }
        _ => 0.0,
    }
}

/// Compound annual growth rate, treating each step as one period.
///
/// A run that loses everything reports `-1.0`.
pub fn calculate_annualized_return(values: &[f64], periods_per_year: f64) -> f64 {
    if values.len() < 2 || !valid_periods(periods_per_year) {
        return 0.0;
    }
    let first = values[0];
    let last = values[values.len() - 1];
    if first <= 0.0 {
        return 0.0;
    }
    let growth = last / first;
    if growth <= 0.0 {
        return -1.0;
    }
    let years = (values.len() - 1) as f64 / periods_per_year;
    finite_or_zero(growth.powf(1.0 / years) - 1.0)
}

/// Largest peak-to-trough decline of an equity curve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Drawdown {
    /// Fraction of the peak lost, in `[0, 1]` for positive equity
    pub max_drawdown: f64,
    /// Bars from the peak to recovery (or to the last bar if never recovered)
    pub duration_bars: usize,
    /// Same span in timestamp units
    pub duration: i64,
    pub peak_index: usize,
    pub trough_index: usize,
}

/// Maximum drawdown and the length of the episode that contains it.
pub fn calculate_drawdown(equity: &[EquityPoint]) -> Drawdown {
    let Some(first) = equity.first() else {
        return Drawdown::default();
    };

    let mut peak = first.equity;
    let mut peak_index = 0;
    let mut worst = Drawdown::default();

    for (i, point) in equity.iter().enumerate() {
        if point.equity >= peak {
            peak = point.equity;
            peak_index = i;
            continue;
        }
        if peak <= 0.0 {
            continue;
        }
        let drawdown = (peak - point.equity) / peak;
        if drawdown.is_finite() && drawdown > worst.max_drawdown {
            worst.max_drawdown = drawdown;
            worst.peak_index = peak_index;
            worst.trough_index = i;
        }
    }

    if worst.max_drawdown == 0.0 {
        return Drawdown::default();
    }

    let peak_value = equity[worst.peak_index].equity;
    let end = equity[worst.trough_index..]
        .iter()
        .position(|p| p.equity >= peak_value)
        .map(|offset| worst.trough_index + offset)
        .unwrap_or(equity.len() - 1);

    worst.duration_bars = end - worst.peak_index;
    worst.duration = equity[end].timestamp - equity[worst.peak_index].timestamp;
    worst
}

/// Annualized Sharpe ratio from an equity series.
///
/// `mean(r - rf / ppy) / stdev(r) * sqrt(ppy)` with the population standard
/// deviation. Zero when the returns have no variance.
pub fn calculate_sharpe_ratio(values: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    if !valid_periods(periods_per_year) || !risk_free_rate.is_finite() {
        return 0.0;
    }
    let returns = period_returns(values);
    if returns.is_empty() {
        return 0.0;
    }

    let rf = risk_free_rate / periods_per_year;
    let excess = mean(&returns) - rf;
    let sd = std_dev(&returns);
    if sd < EPSILON {
        return 0.0;
    }
    finite_or_zero(excess / sd * periods_per_year.sqrt())
}

/// Annualized Sortino ratio from an equity series.
///
/// Downside deviation is `sqrt(sum(min(r - target, 0)^2) / n)` over all `n`
/// periods. Zero when no period falls below `target`.
pub fn calculate_sortino_ratio(
    values: &[f64],
    risk_free_rate: f64,
    periods_per_year: f64,
    target: f64,
) -> f64 {
    if !valid_periods(periods_per_year) || !risk_free_rate.is_finite() || !target.is_finite() {
        return 0.0;
    }
    let returns = period_returns(values);
    if returns.is_empty() {
        return 0.0;
    }

    let rf = risk_free_rate / periods_per_year;
    let excess = mean(&returns) - rf;
    let downside = (returns
        .iter()
        .map(|r| (r - target).min(0.0).powi(2))
        .sum::<f64>()
        / returns.len() as f64)
        .sqrt();
    if downside < EPSILON {
        return 0.0;
    }
    finite_or_zero(excess / downside * periods_per_year.sqrt())
}

/// Annualized return divided by maximum drawdown. Zero without a drawdown.
pub fn calculate_calmar_ratio(equity: &[EquityPoint], periods_per_year: f64) -> f64 {
    let drawdown = calculate_drawdown(equity).max_drawdown;
    if drawdown <= 0.0 {
        return 0.0;
    }
    let values: Vec<f64> = equity.iter().map(|p| p.equity).collect();
    finite_or_zero(calculate_annualized_return(&values, periods_per_year) / drawdown)
}
