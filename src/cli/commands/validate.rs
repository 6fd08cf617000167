//! Validate configuration command.

use anyhow::Result;
use spark_config::load_config;
use spark_strategies::StrategyRegistry;
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    // Strategy tables must build with the registry
    let registry = StrategyRegistry::new();
    for (name, table) in &config.strategies {
        let params = serde_json::to_value(table)?;
        if let Err(e) = registry.create(name, params) {
            println!("Configuration error in [strategies.{}]: {}", name, e);
            return Err(e.into());
        }
    }

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {} ({})", config.logging.level, config.logging.format);
    println!("Initial cash: {}", config.backtest.initial_cash);
    println!(
        "Fees: {} bps, slippage: {} bps",
        config.backtest.fee_bps, config.backtest.slippage_bps
    );
    println!("Fill timing: {}", config.backtest.fill_timing);
    println!("Timeframe: {}", config.backtest.timeframe);
    println!("Risk-free rate: {}", config.metrics.risk_free_rate);
    println!(
        "Optimizer objective: {} (top {})",
        config.optimize.objective, config.optimize.leaderboard_size
    );
    println!(
        "Walk-forward split: {}/{}/{}{}",
        config.walk_forward.train_ratio,
        config.walk_forward.validate_ratio,
        config.walk_forward.test_ratio,
        if config.walk_forward.rolling { " (rolling)" } else { "" }
    );
    println!(
        "Strategies configured: {}",
        config
            .strategies
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(())
}
