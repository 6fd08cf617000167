//! Strategy registry for building strategies by name.

use crate::{BreakoutConfig, BreakoutStrategy, SmaCrossConfig, SmaCrossStrategy};
use serde::{Deserialize, Serialize};
use spark_core::{error::StrategyError, traits::Strategy};
use std::collections::BTreeMap;
use tracing::error;

/// Information about a registered strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Registry key
    pub name: String,
    /// Strategy description
    pub description: String,
    /// Default parameters as JSON
    pub default_config: serde_json::Value,
}

/// Registry for available strategies.
///
/// Every call to [`StrategyRegistry::create`] returns a fresh instance, so
/// concurrent runs never share rolling state.
pub struct StrategyRegistry {
    strategies: BTreeMap<String, StrategyInfo>,
}

impl StrategyRegistry {
    /// Create a new strategy registry with all built-in strategies.
    ///
    /// Each entry is described by a default-configured instance, so the
    /// listing always matches what [`StrategyRegistry::create`] builds.
    pub fn new() -> Self {
        let mut strategies = BTreeMap::new();

        for name in BUILT_IN {
            match build(name, serde_json::Value::Null) {
                Ok(strategy) => {
                    strategies.insert(
                        name.to_string(),
                        StrategyInfo {
                            name: name.to_string(),
                            description: strategy.description().to_string(),
                            default_config: strategy.parameters(),
                        },
                    );
                }
                Err(e) => error!(strategy = name, error = %e, "Default configuration rejected"),
            }
        }

        Self { strategies }
    }

    /// List all available strategies, ordered by name.
    pub fn list(&self) -> Vec<&StrategyInfo> {
        self.strategies.values().collect()
    }

    /// Get strategy info by name.
    pub fn get(&self, name: &str) -> Option<&StrategyInfo> {
        self.strategies.get(name)
    }

    /// Check if a strategy exists.
    pub fn exists(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Get all strategy names.
    pub fn names(&self) -> Vec<&String> {
        self.strategies.keys().collect()
    }

    /// Create a strategy instance from JSON parameters.
    ///
    /// Missing fields take their defaults; `null` means "all defaults".
    pub fn create(
        &self,
        name: &str,
        params: serde_json::Value,
    ) -> Result<Box<dyn Strategy>, StrategyError> {
        build(name, params)
    }

    /// Create a strategy with default configuration.
    pub fn create_default(&self, name: &str) -> Result<Box<dyn Strategy>, StrategyError> {
        let info = self
            .get(name)
            .ok_or_else(|| StrategyError::NotFound(name.to_string()))?;
        self.create(name, info.default_config.clone())
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

const BUILT_IN: [&str; 2] = ["sma_cross", "breakout"];

fn build(name: &str, params: serde_json::Value) -> Result<Box<dyn Strategy>, StrategyError> {
    let params = if params.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        params
    };

    match name {
        "sma_cross" => {
            let config: SmaCrossConfig = serde_json::from_value(params)
                .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
            Ok(Box::new(SmaCrossStrategy::new(config)?))
        }
        "breakout" => {
            let config: BreakoutConfig = serde_json::from_value(params)
                .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
            Ok(Box::new(BreakoutStrategy::new(config)?))
        }
        _ => Err(StrategyError::NotFound(name.to_string())),
    }
}
