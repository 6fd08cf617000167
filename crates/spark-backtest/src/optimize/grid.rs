//! Exhaustive grid search over strategy parameters.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use spark_core::error::{StrategyError, TradingError, TradingResult, ValidationError};
use spark_core::traits::Strategy;
use spark_core::types::BarSeries;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use super::walk_forward::{OverfitCheck, WalkForwardConfig};
use super::{merge_params, Optimizer};
use crate::metrics::PerformanceSummary;

/// Candidate values per parameter name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterGrid {
    parameters: BTreeMap<String, Vec<Value>>,
}

impl ParameterGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the candidate values for one parameter.
    #[must_use]
    pub fn with<V: Into<Value>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.parameters
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Parse `{"name": [v1, v2, ...], ...}`.
    pub fn from_json(value: Value) -> Result<Self, ValidationError> {
        let Value::Object(map) = value else {
            return Err(ValidationError::InvalidParameter(
                "parameter grid must be a JSON object of arrays".to_string(),
            ));
        };

        let mut grid = Self::new();
        for (name, values) in map {
            let Value::Array(values) = values else {
                return Err(ValidationError::InvalidParameter(format!(
                    "grid values for '{}' must be an array",
                    name
                )));
            };
            grid.parameters.insert(name, values);
        }
        Ok(grid)
    }

    /// Size of the Cartesian product; zero for an empty grid.
    pub fn total_combinations(&self) -> usize {
        if self.parameters.is_empty() {
            return 0;
        }
        self.parameters.values().map(Vec::len).product()
    }

    /// Every combination, in parameter-name order with the last name
    /// varying fastest. Any parameter with no values empties the product.
    pub fn combinations(&self) -> Vec<BTreeMap<String, Value>> {
        if self.total_combinations() == 0 {
            return Vec::new();
        }

        let mut result = vec![BTreeMap::new()];
        for (name, values) in &self.parameters {
            let mut next = Vec::with_capacity(result.len() * values.len());
            for combo in &result {
                for value in values {
                    let mut combo = combo.clone();
                    combo.insert(name.clone(), value.clone());
                    next.push(combo);
                }
            }
            result = next;
        }
        result
    }
}

/// Figure a search maximizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    Sharpe,
    Pnl,
    WinRate,
}

impl Objective {
    pub fn score(self, summary: &PerformanceSummary) -> f64 {
        match self {
            Objective::Sharpe => summary.sharpe_ratio,
            Objective::Pnl => summary.net_pnl,
            Objective::WinRate => summary.win_rate,
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Objective::Sharpe => "sharpe",
            Objective::Pnl => "pnl",
            Objective::WinRate => "win_rate",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Objective {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "sharpe" | "sharpe_ratio" => Ok(Objective::Sharpe),
            "pnl" | "net_pnl" => Ok(Objective::Pnl),
            "win_rate" | "winrate" => Ok(Objective::WinRate),
            _ => Err(ValidationError::InvalidParameter(format!(
                "unknown objective '{}' (expected sharpe, pnl or win_rate)",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSearchConfig {
    pub objective: Objective,
    /// Entries kept in the leaderboard
    pub leaderboard_size: usize,
    /// Walk-forward check on the leading entries; overfit ones are dropped
    /// unless every one is overfit
    pub walk_forward: Option<WalkForwardConfig>,
    /// How many leading entries the walk-forward check covers
    pub validate_top: usize,
}

impl Default for GridSearchConfig {
    fn default() -> Self {
        Self {
            objective: Objective::Sharpe,
            leaderboard_size: 10,
            walk_forward: None,
            validate_top: 5,
        }
    }
}

impl GridSearchConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.leaderboard_size == 0 {
            return Err(ValidationError::InvalidParameter(
                "leaderboard_size must be at least 1".to_string(),
            ));
        }
        if let Some(wf) = &self.walk_forward {
            wf.validate()?;
            if self.validate_top == 0 {
                return Err(ValidationError::InvalidParameter(
                    "validate_top must be at least 1".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationEntry {
    /// The grid values of this run (base parameters excluded)
    pub params: BTreeMap<String, Value>,
    pub score: f64,
    pub summary: PerformanceSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walk_forward: Option<OverfitCheck>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSummary {
    pub objective: Objective,
    pub total_combinations: usize,
    /// Runs that produced a result
    pub completed: usize,
    /// Runs skipped because the parameters were rejected or the run failed
    pub failed: usize,
    pub best_params: BTreeMap<String, Value>,
    pub best_score: f64,
    /// Best first; ties keep grid order
    pub leaderboard: Vec<OptimizationEntry>,
}

impl<F> Optimizer<F>
where
    F: Fn(Value) -> Result<Box<dyn Strategy>, StrategyError> + Sync,
{
    /// Run every grid combination laid over `base` and rank the results.
    ///
    /// A combination whose strategy cannot be built or whose run fails is
    /// logged and skipped. Cancellation aborts the whole search.
    pub fn grid_search(
        &self,
        series: &BarSeries,
        base: &Value,
        grid: &ParameterGrid,
        config: &GridSearchConfig,
    ) -> TradingResult<OptimizationSummary> {
        config.validate()?;
        let combinations = grid.combinations();
        if combinations.is_empty() {
            return Err(ValidationError::InvalidParameter(
                "parameter grid produced no combinations".to_string(),
            )
            .into());
        }

        info!(
            symbol = %series.symbol,
            combinations = combinations.len(),
            objective = %config.objective,
            threads = rayon::current_num_threads(),
            "Starting grid search"
        );

        let outcomes: Vec<TradingResult<PerformanceSummary>> = combinations
            .par_iter()
            .map(|combo| self.evaluate(series, merge_params(base, combo)))
            .collect();

        let total_combinations = combinations.len();
        let mut entries = Vec::with_capacity(total_combinations);
        let mut failed = 0;
        for (params, outcome) in combinations.into_iter().zip(outcomes) {
            match outcome {
                Ok(summary) => entries.push(OptimizationEntry {
                    score: config.objective.score(&summary),
                    params,
                    summary,
                    walk_forward: None,
                }),
                Err(err @ TradingError::Cancelled { .. }) => return Err(err),
                Err(err) => {
                    warn!(params = ?params, error = %err, "Parameter set failed, skipping");
                    failed += 1;
                }
            }
        }
        let completed = entries.len();

        entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        entries.truncate(config.leaderboard_size);

        if let Some(wf) = &config.walk_forward {
            entries = self.screen_overfit(series, base, entries, wf, config.validate_top)?;
        }

        let (best_params, best_score) = entries
            .first()
            .map(|e| (e.params.clone(), e.score))
            .unwrap_or_default();

        info!(
            symbol = %series.symbol,
            completed,
            failed,
            best_score,
            "Grid search complete"
        );

        Ok(OptimizationSummary {
            objective: config.objective,
            total_combinations,
            completed,
            failed,
            best_params,
            best_score,
            leaderboard: entries,
        })
    }

    /// Walk-forward the leading entries and drop the overfit ones.
    fn screen_overfit(
        &self,
        series: &BarSeries,
        base: &Value,
        mut entries: Vec<OptimizationEntry>,
        config: &WalkForwardConfig,
        top: usize,
    ) -> TradingResult<Vec<OptimizationEntry>> {
        entries.truncate(top);

        let checks: Vec<_> = entries
            .par_iter()
            .map(|entry| self.walk_forward(series, &merge_params(base, &entry.params), config))
            .collect();

        for (entry, check) in entries.iter_mut().zip(checks) {
            match check {
                Ok(report) => entry.walk_forward = Some(report.overfitting),
                Err(err @ TradingError::Cancelled { .. }) => return Err(err),
                Err(err) => {
                    warn!(params = ?entry.params, error = %err, "Walk-forward failed, keeping entry unchecked");
                }
            }
        }

        let robust: Vec<_> = entries
            .iter()
            .filter(|e| !e.walk_forward.is_some_and(|c| c.detected))
            .cloned()
            .collect();
        if robust.is_empty() {
            warn!("Every candidate looks overfit, keeping all of them");
            Ok(entries)
        } else {
            Ok(robust)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelHandle;
    use crate::metrics::MetricsConfig;
    use crate::simulator::{Simulator, SimulatorConfig};
    use serde_json::json;
    use spark_core::types::{Bar, Timeframe};
    use spark_strategies::StrategyRegistry;

    fn wavy_series(n: usize) -> BarSeries {
        let bars = (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.25).sin() * 8.0 + i as f64 * 0.02;
                Bar::new(i as i64 * 86_400_000, close, close + 1.0, close - 1.0, close, 1_000.0)
                    .unwrap()
            })
            .collect();
        BarSeries::new("WAVE", Timeframe::Daily, bars).unwrap()
    }

    fn optimizer(
        registry: &StrategyRegistry,
    ) -> Optimizer<impl Fn(Value) -> Result<Box<dyn Strategy>, StrategyError> + Sync + '_> {
        Optimizer::new(
            Simulator::new(SimulatorConfig {
                initial_cash: 10_000.0,
                fee_bps: 5.0,
                ..Default::default()
            })
            .unwrap(),
            MetricsConfig::default(),
            move |params| registry.create("sma_cross", params),
        )
    }

    #[test]
    fn test_combinations_in_name_order() {
        let grid = ParameterGrid::new()
            .with("slow_period", [20, 30])
            .with("fast_period", [5, 10]);

        assert_eq!(grid.total_combinations(), 4);
        let combos: Vec<(i64, i64)> = grid
            .combinations()
            .iter()
            .map(|c| (c["fast_period"].as_i64().unwrap(), c["slow_period"].as_i64().unwrap()))
            .collect();
        assert_eq!(combos, vec![(5, 20), (5, 30), (10, 20), (10, 30)]);
    }

    #[test]
    fn test_empty_grids_have_no_combinations() {
        assert!(ParameterGrid::new().combinations().is_empty());

        let grid = ParameterGrid::new()
            .with("fast_period", [5, 10])
            .with("slow_period", Vec::<i64>::new());
        assert_eq!(grid.total_combinations(), 0);
        assert!(grid.combinations().is_empty());
    }

    #[test]
    fn test_grid_from_json() {
        let grid = ParameterGrid::from_json(json!({ "window": [10, 20, 30] })).unwrap();
        assert_eq!(grid.total_combinations(), 3);

        assert!(ParameterGrid::from_json(json!({ "window": 10 })).is_err());
        assert!(ParameterGrid::from_json(json!([10, 20])).is_err());
    }

    #[test]
    fn test_objective_names() {
        assert_eq!("sharpe".parse::<Objective>().unwrap(), Objective::Sharpe);
        assert_eq!("net-pnl".parse::<Objective>().unwrap(), Objective::Pnl);
        assert_eq!("win_rate".parse::<Objective>().unwrap(), Objective::WinRate);
        assert!("sortino".parse::<Objective>().is_err());
        assert_eq!(Objective::WinRate.to_string(), "win_rate");
    }

    #[test]
    fn test_leaderboard_is_ranked() {
        let registry = StrategyRegistry::new();
        let grid = ParameterGrid::new()
            .with("fast_period", [3, 5])
            .with("slow_period", [10, 20]);
        let config = GridSearchConfig {
            objective: Objective::Pnl,
            ..Default::default()
        };

        let summary = optimizer(&registry)
            .grid_search(&wavy_series(300), &Value::Null, &grid, &config)
            .unwrap();

        assert_eq!(summary.total_combinations, 4);
        assert_eq!(summary.completed, 4);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.leaderboard.len(), 4);
        assert!(summary
            .leaderboard
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
        assert_eq!(summary.best_params, summary.leaderboard[0].params);
        assert_eq!(summary.best_score, summary.leaderboard[0].summary.net_pnl);
    }

    #[test]
    fn test_rejected_parameters_are_skipped() {
        let registry = StrategyRegistry::new();
        // fast 30 over slow 20 is rejected by the strategy
        let grid = ParameterGrid::new()
            .with("fast_period", [5, 30])
            .with("slow_period", [20]);

        let summary = optimizer(&registry)
            .grid_search(&wavy_series(200), &Value::Null, &grid, &GridSearchConfig::default())
            .unwrap();

        assert_eq!(summary.total_combinations, 2);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.best_params["fast_period"], 5);
    }

    #[test]
    fn test_grid_search_is_deterministic() {
        let registry = StrategyRegistry::new();
        let series = wavy_series(250);
        let grid = ParameterGrid::new()
            .with("fast_period", [2, 3, 4, 5])
            .with("slow_period", [8, 13, 21]);
        let base = json!({ "sizing": { "mode": "percent_of_cash", "percent": 0.5 } });
        let config = GridSearchConfig {
            leaderboard_size: 5,
            ..Default::default()
        };

        let first = optimizer(&registry)
            .grid_search(&series, &base, &grid, &config)
            .unwrap();
        let second = optimizer(&registry)
            .grid_search(&series, &base, &grid, &config)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.leaderboard.len(), 5);
    }

    #[test]
    fn test_empty_grid_is_an_error() {
        let registry = StrategyRegistry::new();
        let grid = ParameterGrid::new().with("fast_period", Vec::<i64>::new());

        let result = optimizer(&registry).grid_search(
            &wavy_series(50),
            &Value::Null,
            &grid,
            &GridSearchConfig::default(),
        );
        assert!(matches!(
            result,
            Err(TradingError::Validation(ValidationError::InvalidParameter(_)))
        ));
    }

    #[test]
    fn test_cancelled_search_returns_no_summary() {
        let registry = StrategyRegistry::new();
        let cancel = CancelHandle::new();
        cancel.cancel();
        let grid = ParameterGrid::new().with("fast_period", [3, 5]);

        let result = optimizer(&registry).with_cancel(cancel).grid_search(
            &wavy_series(50),
            &Value::Null,
            &grid,
            &GridSearchConfig::default(),
        );
        assert!(matches!(result, Err(TradingError::Cancelled { .. })));
    }

    #[test]
    fn test_walk_forward_screens_leaders() {
        let registry = StrategyRegistry::new();
        let grid = ParameterGrid::new()
            .with("fast_period", [2, 3, 5])
            .with("slow_period", [8, 13]);
        let config = GridSearchConfig {
            walk_forward: Some(WalkForwardConfig::default()),
            validate_top: 3,
            ..Default::default()
        };

        let summary = optimizer(&registry)
            .grid_search(&wavy_series(300), &Value::Null, &grid, &config)
            .unwrap();

        assert_eq!(summary.completed, 6);
        assert!(!summary.leaderboard.is_empty());
        assert!(summary.leaderboard.len() <= 3);
        assert!(summary.leaderboard.iter().all(|e| e.walk_forward.is_some()));

        // Overfit entries are dropped unless all three were overfit
        let overfit = summary
            .leaderboard
            .iter()
            .filter(|e| e.walk_forward.is_some_and(|c| c.detected))
            .count();
        assert!(overfit == 0 || (overfit == 3 && summary.leaderboard.len() == 3));
        assert_eq!(summary.best_params, summary.leaderboard[0].params);
    }
}
