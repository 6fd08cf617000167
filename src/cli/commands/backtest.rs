//! Backtest command implementation.

use anyhow::{Context, Result};
use spark_backtest::BacktestReport;
use spark_config::AppConfig;
use spark_strategies::StrategyRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::setup::{self, DataSelection};
use crate::cli::{BacktestArgs, OutputFormat};

pub async fn run(args: BacktestArgs, config: AppConfig) -> Result<()> {
    info!("Starting backtest for strategy: {}", args.strategy);

    let registry = Arc::new(StrategyRegistry::new());
    setup::ensure_strategy(&registry, &args.strategy)?;
    let params = setup::strategy_params(&config, &args.strategy, args.params.as_deref())?;

    let selection = Arc::new(DataSelection::resolve(&args.market, &config)?);
    if selection.path.is_file() && args.symbols.len() > 1 {
        anyhow::bail!("A single CSV file can only back one symbol; pass a directory instead");
    }

    let simulator = Arc::new(setup::simulator(&args.market, &config)?);
    let metrics = setup::metrics_config(&config)?;
    let (cancel, interrupt) = setup::cancel_on_interrupt();

    // Symbols are independent; each gets its own strategy instance
    let mut handles = Vec::with_capacity(args.symbols.len());
    for symbol in &args.symbols {
        let symbol = symbol.clone();
        let selection = Arc::clone(&selection);
        let registry = Arc::clone(&registry);
        let simulator = Arc::clone(&simulator);
        let strategy_name = args.strategy.clone();
        let params = params.clone();
        let cancel = cancel.clone();

        handles.push(tokio::task::spawn_blocking(move || -> Result<_> {
            let series = selection.load(&symbol)?;
            let mut strategy = registry
                .create(&strategy_name, params)
                .context("Failed to create strategy")?;
            simulator
                .run_with_cancel(&series, strategy.as_mut(), &cancel)
                .with_context(|| format!("Backtest failed for {}", symbol))
        }));
    }

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        let result = handle.await.context("Backtest task panicked")??;
        reports.push(BacktestReport::new(result, &metrics));
    }
    interrupt.abort();

    match args.output {
        OutputFormat::Json => println!("{}", reports_json(&reports)?),
        OutputFormat::Text => {
            for report in &reports {
                println!("{}", report.summary());
            }
        }
    }

    if let Some(save_path) = &args.save {
        setup::save(save_path, &reports_json(&reports)?)?;
        info!("Results saved to {:?}", save_path);
    }

    if let Some(csv_path) = &args.equity_csv {
        for report in &reports {
            let path = if reports.len() > 1 {
                symbol_path(csv_path, &report.result.meta.symbol)
            } else {
                csv_path.clone()
            };
            setup::save(&path, &report.equity_to_csv())?;
            info!("Equity curve saved to {:?}", path);
        }
    }

    Ok(())
}

fn reports_json(reports: &[BacktestReport]) -> Result<String> {
    match reports {
        [single] => Ok(single.to_json()?),
        many => Ok(serde_json::to_string_pretty(many)?),
    }
}

/// `equity.csv` becomes `equity_AAPL.csv`.
fn symbol_path(path: &Path, symbol: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "equity".to_string());
    let file = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, symbol, ext.to_string_lossy()),
        None => format!("{}_{}", stem, symbol),
    };
    path.with_file_name(file)
}
