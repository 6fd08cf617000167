//! Configuration structures.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use spark_backtest::{GridSearchConfig, Objective, WalkForwardConfig};
use spark_core::types::{FillTiming, Timeframe};
use std::collections::BTreeMap;

use crate::SettingsError;

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub backtest: BacktestSettings,
    #[serde(default)]
    pub metrics: MetricsSettings,
    #[serde(default)]
    pub optimize: OptimizeSettings,
    #[serde(default)]
    pub walk_forward: WalkForwardConfig,
    /// Per-strategy parameter overrides, keyed by registry name
    #[serde(default)]
    pub strategies: BTreeMap<String, toml::Table>,
}

impl AppConfig {
    /// Check values the type system cannot.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.logging.validate()?;
        self.backtest.validate()?;
        self.metrics.validate()?;
        self.optimize.validate()?;
        self.walk_forward
            .validate()
            .map_err(|e| SettingsError::Invalid(format!("walk_forward: {}", e)))
    }
}

/// General app settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "spark-backtest".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }

    fn validate(&self) -> Result<(), SettingsError> {
        match self.format.to_ascii_lowercase().as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(SettingsError::Invalid(format!(
                "logging.format must be 'pretty' or 'json', got '{}'",
                other
            ))),
        }
    }
}

/// Simulator defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub initial_cash: Decimal,
    pub fee_bps: Decimal,
    pub slippage_bps: Decimal,
    /// `same_bar_close` or `next_bar_open`
    pub fill_timing: FillTiming,
    pub timeframe: Timeframe,
    /// CSV file or directory of `<SYMBOL>.csv` files
    pub data_dir: Option<String>,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            initial_cash: dec!(100000),
            fee_bps: Decimal::ZERO,
            slippage_bps: Decimal::ZERO,
            fill_timing: FillTiming::SameBarClose,
            timeframe: Timeframe::Daily,
            data_dir: None,
        }
    }
}

impl BacktestSettings {
    fn validate(&self) -> Result<(), SettingsError> {
        if self.initial_cash <= Decimal::ZERO {
            return Err(SettingsError::Invalid(format!(
                "backtest.initial_cash must be positive, got {}",
                self.initial_cash
            )));
        }
        if self.fee_bps < Decimal::ZERO || self.slippage_bps < Decimal::ZERO {
            return Err(SettingsError::Invalid(
                "backtest.fee_bps and backtest.slippage_bps must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Ratio settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    pub risk_free_rate: Decimal,
    /// Derived from the timeframe when unset
    pub periods_per_year: Option<Decimal>,
    pub sortino_target: Decimal,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            risk_free_rate: Decimal::ZERO,
            periods_per_year: None,
            sortino_target: Decimal::ZERO,
        }
    }
}

impl MetricsSettings {
    fn validate(&self) -> Result<(), SettingsError> {
        match self.periods_per_year {
            Some(p) if p <= Decimal::ZERO => Err(SettingsError::Invalid(format!(
                "metrics.periods_per_year must be positive, got {}",
                p
            ))),
            _ => Ok(()),
        }
    }
}

/// Grid search defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeSettings {
    pub objective: Objective,
    pub leaderboard_size: usize,
    /// Leaders re-checked by walk-forward when the search asks for it
    pub validate_top: usize,
}

impl Default for OptimizeSettings {
    fn default() -> Self {
        let defaults = GridSearchConfig::default();
        Self {
            objective: defaults.objective,
            leaderboard_size: defaults.leaderboard_size,
            validate_top: defaults.validate_top,
        }
    }
}

impl OptimizeSettings {
    fn validate(&self) -> Result<(), SettingsError> {
        if self.leaderboard_size == 0 || self.validate_top == 0 {
            return Err(SettingsError::Invalid(
                "optimize.leaderboard_size and optimize.validate_top must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
