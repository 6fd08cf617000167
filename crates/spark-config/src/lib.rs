//! Configuration management.
//!
//! Values come from a TOML file overlaid with `SPARK__SECTION__KEY`
//! environment variables.

mod settings;

pub use settings::{
    AppConfig, AppSettings, BacktestSettings, LoggingConfig, MetricsSettings, OptimizeSettings,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use thiserror::Error;

/// Configuration loading failure.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn build(path: &Path, required: bool) -> Result<AppConfig, SettingsError> {
    let config = Config::builder()
        .add_source(File::from(path).required(required))
        .add_source(
            Environment::with_prefix("SPARK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

/// Load configuration from file and environment. The file must exist.
pub fn load_config(path: &Path) -> Result<AppConfig, SettingsError> {
    build(path, true)
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_config_or_default(path: &Path) -> Result<AppConfig, SettingsError> {
    build(path, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use spark_backtest::Objective;
    use spark_core::types::{FillTiming, Timeframe};
    use std::io::Write;

    fn write_config(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "spark-config-{}-{}.toml",
            name,
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.backtest.initial_cash, dec!(100000));
        assert_eq!(config.backtest.fee_bps, dec!(0));
        assert_eq!(config.backtest.timeframe, Timeframe::Daily);
        assert_eq!(config.backtest.fill_timing, FillTiming::SameBarClose);
        assert!(!config.logging.json());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let path = write_config(
            "full",
            r#"
[app]
name = "research"
environment = "test"

[logging]
level = "debug"
format = "json"

[backtest]
initial_cash = 25000.50
fee_bps = 1.5
fill_timing = "next_bar_open"
timeframe = "1h"

[metrics]
risk_free_rate = 0.02
periods_per_year = 8760

[optimize]
objective = "pnl"

[walk_forward]
rolling = true
step = 0.1

[strategies.sma_cross]
fast_period = 5
slow_period = 30
"#,
        );

        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.app.name, "research");
        assert!(config.logging.json());
        assert_eq!(config.backtest.initial_cash, dec!(25000.50));
        assert_eq!(config.backtest.fee_bps, dec!(1.5));
        assert_eq!(config.backtest.slippage_bps, dec!(0));
        assert_eq!(config.backtest.timeframe, Timeframe::Hour1);
        assert_eq!(config.backtest.fill_timing, FillTiming::NextBarOpen);
        assert_eq!(config.metrics.risk_free_rate, dec!(0.02));
        assert_eq!(config.metrics.periods_per_year, Some(dec!(8760)));

        assert_eq!(config.optimize.objective, Objective::Pnl);
        assert_eq!(config.optimize.leaderboard_size, 10);
        assert!(config.walk_forward.rolling);
        assert_eq!(config.walk_forward.step, 0.1);
        assert_eq!(config.walk_forward.train_ratio, 0.6);

        let sma = &config.strategies["sma_cross"];
        assert_eq!(sma["fast_period"].as_integer(), Some(5));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let path = write_config("invalid", "[backtest]\ninitial_cash = -5\n");
        let result = load_config(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(SettingsError::Invalid(_))));

        let path = write_config("timing", "[backtest]\nfill_timing = \"tomorrow\"\n");
        let result = load_config(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());

        let path = write_config("folds", "[walk_forward]\ntrain_ratio = 0.9\n");
        let result = load_config(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(SettingsError::Invalid(_))));

        let path = write_config("format", "[logging]\nformat = \"xml\"\n");
        let result = load_config(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn test_missing_file() {
        let path = Path::new("/definitely/not/here.toml");
        assert!(matches!(load_config(path), Err(SettingsError::Load(_))));
        assert_eq!(
            load_config_or_default(path).unwrap().backtest.initial_cash,
            dec!(100000)
        );
    }
}
