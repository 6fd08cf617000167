//! Parameter search and out-of-sample validation.
//!
//! An [`Optimizer`] runs one strategy family over one series many times,
//! building a fresh strategy for every run through its factory. Grid search
//! fans out across rayon's pool; results are collected in grid order, so a
//! search is as deterministic as a single run.

mod grid;
mod walk_forward;

pub use grid::{GridSearchConfig, Objective, OptimizationEntry, OptimizationSummary, ParameterGrid};
pub use walk_forward::{
    build_folds, Fold, FoldReport, OverfitCheck, Segment, SegmentMetrics, WalkForwardConfig,
    WalkForwardReport,
};

use serde_json::{Map, Value};
use spark_core::error::{StrategyError, TradingResult};
use spark_core::traits::Strategy;
use spark_core::types::BarSeries;
use std::collections::BTreeMap;

use crate::cancel::CancelHandle;
use crate::metrics::{MetricsConfig, PerformanceSummary};
use crate::simulator::Simulator;

/// Runs a strategy family over a series with varying parameters.
///
/// `factory` turns JSON parameters into a new strategy instance, usually by
/// delegating to the strategy registry.
pub struct Optimizer<F> {
    simulator: Simulator,
    metrics: MetricsConfig,
    factory: F,
    cancel: CancelHandle,
}

impl<F> Optimizer<F>
where
    F: Fn(Value) -> Result<Box<dyn Strategy>, StrategyError> + Sync,
{
    pub fn new(simulator: Simulator, metrics: MetricsConfig, factory: F) -> Self {
        Self {
            simulator,
            metrics,
            factory,
            cancel: CancelHandle::new(),
        }
    }

    /// Stop every run started by this optimizer once `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    /// Run one fresh strategy built from `params` and summarize it.
    pub fn evaluate(&self, series: &BarSeries, params: Value) -> TradingResult<PerformanceSummary> {
        let mut strategy = (self.factory)(params)?;
        let result = self
            .simulator
            .run_with_cancel(series, strategy.as_mut(), &self.cancel)?;
        Ok(PerformanceSummary::from_result(&result, &self.metrics))
    }
}

/// Lay `overrides` over the keys of `base`. A non-object base is ignored.
pub(crate) fn merge_params(base: &Value, overrides: &BTreeMap<String, Value>) -> Value {
    let mut merged = match base {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_params() {
        let base = json!({ "fast_period": 10, "sizing": { "mode": "fixed", "quantity": 1.0 } });
        let overrides = BTreeMap::from([("fast_period".to_string(), json!(5))]);

        let merged = merge_params(&base, &overrides);
        assert_eq!(merged["fast_period"], 5);
        assert_eq!(merged["sizing"]["quantity"], 1.0);

        let merged = merge_params(&Value::Null, &overrides);
        assert_eq!(merged, json!({ "fast_period": 5 }));
    }
}
