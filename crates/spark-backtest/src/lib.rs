//! Backtest simulator, metrics engine and reports.
//!
//! The [`Simulator`] drives one strategy over one [`BarSeries`] and returns
//! a [`BacktestResult`]. Everything in [`metrics`] is a pure function over
//! that result. [`optimize`] repeats runs across parameter grids and
//! walk-forward folds.
//!
//! [`BarSeries`]: spark_core::types::BarSeries

mod broker;
mod cancel;
pub mod metrics;
pub mod optimize;
mod report;
mod result;
mod simulator;

pub use cancel::CancelHandle;
pub use metrics::{Drawdown, MetricsConfig, PerformanceSummary, RoundTrip};
pub use optimize::{
    GridSearchConfig, Objective, OptimizationSummary, Optimizer, ParameterGrid, WalkForwardConfig,
    WalkForwardReport,
};
pub use report::BacktestReport;
pub use result::{BacktestResult, RunMeta};
pub use simulator::{Simulator, SimulatorConfig};
