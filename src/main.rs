//! Spark backtest CLI.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use spark_monitor::{setup_logging, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging settings come from the config file unless overridden on the command line
    let settings = spark_config::load_config_or_default(&cli.config);
    let (config_level, config_json) = match &settings {
        Ok(config) => (config.logging.level.clone(), config.logging.json()),
        Err(_) => ("info".to_string(), false),
    };
    let log_level = cli
        .log_level
        .map(|level| level.as_str().to_string())
        .unwrap_or(config_level);
    setup_logging(
        &log_level,
        LogFormat::from_json_flag(cli.json_logs || config_json),
    )
    .context("Failed to initialise logging")?;

    match cli.command {
        Commands::Backtest(args) => {
            let config = settings.context("Failed to load configuration")?;
            cli::commands::backtest::run(args, config).await
        }
        Commands::Optimize(args) => {
            let config = settings.context("Failed to load configuration")?;
            cli::commands::optimize::run(args, config).await
        }
        Commands::WalkForward(args) => {
            let config = settings.context("Failed to load configuration")?;
            cli::commands::walk_forward::run(args, config).await
        }
        Commands::Strategies => cli::commands::strategies::run().await,
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config).await,
    }
}
