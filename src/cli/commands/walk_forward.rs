//! Walk-forward command implementation.

use anyhow::{Context, Result};
use spark_backtest::{Optimizer, WalkForwardConfig, WalkForwardReport};
use spark_config::AppConfig;
use spark_strategies::StrategyRegistry;
use tracing::info;

use super::setup::{self, DataSelection};
use crate::cli::{OutputFormat, WalkForwardArgs};

pub async fn run(args: WalkForwardArgs, config: AppConfig) -> Result<()> {
    info!(
        "Starting walk-forward for strategy {} on {}",
        args.strategy, args.symbol
    );

    let registry = StrategyRegistry::new();
    setup::ensure_strategy(&registry, &args.strategy)?;
    let params = setup::strategy_params(&config, &args.strategy, args.params.as_deref())?;

    let defaults = config.walk_forward;
    let folds = WalkForwardConfig {
        train_ratio: args.train_ratio.unwrap_or(defaults.train_ratio),
        validate_ratio: args.validate_ratio.unwrap_or(defaults.validate_ratio),
        test_ratio: args.test_ratio.unwrap_or(defaults.test_ratio),
        rolling: args.rolling || defaults.rolling,
        step: args.step.unwrap_or(defaults.step),
        overfit_threshold: args.overfit_threshold.unwrap_or(defaults.overfit_threshold),
    };
    folds.validate().context("Invalid walk-forward settings")?;

    let selection = DataSelection::resolve(&args.market, &config)?;
    let simulator = setup::simulator(&args.market, &config)?;
    let metrics = setup::metrics_config(&config)?;
    let (cancel, interrupt) = setup::cancel_on_interrupt();

    let strategy = args.strategy.clone();
    let symbol = args.symbol.clone();
    let report = tokio::task::spawn_blocking(move || -> Result<WalkForwardReport> {
        let series = selection.load(&symbol)?;
        Optimizer::new(simulator, metrics, |p| registry.create(&strategy, p))
            .with_cancel(cancel)
            .walk_forward(&series, &params, &folds)
            .with_context(|| format!("Walk-forward failed for {}", symbol))
    })
    .await
    .context("Walk-forward task panicked")??;
    interrupt.abort();

    let json = serde_json::to_string_pretty(&report)?;
    match args.output {
        OutputFormat::Json => println!("{}", json),
        OutputFormat::Text => println!("{}", report_text(&args.strategy, &report)),
    }

    if let Some(save_path) = &args.save {
        setup::save(save_path, &json)?;
        info!("Results saved to {:?}", save_path);
    }

    Ok(())
}

fn report_text(strategy: &str, report: &WalkForwardReport) -> String {
    let row = |label: &str, m: &spark_backtest::optimize::SegmentMetrics| {
        format!(
            "  {:<10} {:>8.3} {:>9.1}% {:>9.2}% {:>12.2} {:>7}\n",
            label,
            m.sharpe,
            m.win_rate * 100.0,
            m.max_drawdown * 100.0,
            m.net_pnl,
            m.trades
        )
    };

    let mut s = String::new();
    s.push_str("═══════════════════════════════════════════════════════════\n");
    s.push_str(&format!("                WALK-FORWARD: {}\n", strategy));
    s.push_str("═══════════════════════════════════════════════════════════\n\n");
    s.push_str(&format!("  Folds:               {}\n\n", report.folds));
    s.push_str("  Segment      Sharpe   Win Rate   Max DD        Net PnL  Trips\n");
    s.push_str("───────────────────────────────────────────────────────────\n");
    s.push_str(&row("Train", &report.train));
    if let Some(validate) = &report.validate {
        s.push_str(&row("Validate", validate));
    }
    s.push_str(&row("Test", &report.test));
    s.push('\n');
    s.push_str(&format!(
        "  Test/Train Sharpe:   {:.3} (threshold {:.2})\n",
        report.overfitting.ratio, report.overfitting.threshold
    ));
    s.push_str(&format!(
        "  Overfitting:         {}\n",
        if report.overfitting.detected {
            "DETECTED"
        } else {
            "not detected"
        }
    ));
    s.push_str("═══════════════════════════════════════════════════════════\n");
    s
}
