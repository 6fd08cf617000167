//! Grid search command implementation.

use anyhow::{Context, Result};
use serde_json::Value;
use spark_backtest::{GridSearchConfig, OptimizationSummary, Optimizer, ParameterGrid};
use spark_config::AppConfig;
use spark_strategies::StrategyRegistry;
use tracing::info;

use super::setup::{self, DataSelection};
use crate::cli::{OptimizeArgs, OutputFormat};

pub async fn run(args: OptimizeArgs, config: AppConfig) -> Result<()> {
    info!(
        "Starting grid search for strategy {} on {}",
        args.strategy, args.symbol
    );

    let registry = StrategyRegistry::new();
    setup::ensure_strategy(&registry, &args.strategy)?;
    let base = setup::strategy_params(&config, &args.strategy, args.params.as_deref())?;
    let grid_json: Value = serde_json::from_str(&args.grid).context("--grid must be valid JSON")?;
    let grid = ParameterGrid::from_json(grid_json).context("Invalid --grid")?;

    let search = GridSearchConfig {
        objective: args.objective.unwrap_or(config.optimize.objective),
        leaderboard_size: args.top.unwrap_or(config.optimize.leaderboard_size),
        walk_forward: args.walk_forward.then_some(config.walk_forward),
        validate_top: args.validate_top.unwrap_or(config.optimize.validate_top),
    };

    let selection = DataSelection::resolve(&args.market, &config)?;
    let simulator = setup::simulator(&args.market, &config)?;
    let metrics = setup::metrics_config(&config)?;
    let (cancel, interrupt) = setup::cancel_on_interrupt();

    let strategy = args.strategy.clone();
    let symbol = args.symbol.clone();
    let summary = tokio::task::spawn_blocking(move || -> Result<OptimizationSummary> {
        let series = selection.load(&symbol)?;
        Optimizer::new(simulator, metrics, |params| registry.create(&strategy, params))
            .with_cancel(cancel)
            .grid_search(&series, &base, &grid, &search)
            .with_context(|| format!("Grid search failed for {}", symbol))
    })
    .await
    .context("Grid search task panicked")??;
    interrupt.abort();

    let json = serde_json::to_string_pretty(&summary)?;
    match args.output {
        OutputFormat::Json => println!("{}", json),
        OutputFormat::Text => println!("{}", summary_text(&args.strategy, &summary)),
    }

    if let Some(save_path) = &args.save {
        setup::save(save_path, &json)?;
        info!("Results saved to {:?}", save_path);
    }

    Ok(())
}

fn params_text(params: &std::collections::BTreeMap<String, Value>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

fn summary_text(strategy: &str, summary: &OptimizationSummary) -> String {
    let mut s = String::new();
    s.push_str("═══════════════════════════════════════════════════════════\n");
    s.push_str(&format!("                  GRID SEARCH: {}\n", strategy));
    s.push_str("═══════════════════════════════════════════════════════════\n\n");
    s.push_str(&format!("  Objective:           {}\n", summary.objective));
    s.push_str(&format!(
        "  Combinations:        {} ({} completed, {} failed)\n",
        summary.total_combinations, summary.completed, summary.failed
    ));
    s.push_str(&format!(
        "  Best:                {} ({:.4})\n\n",
        params_text(&summary.best_params),
        summary.best_score
    ));

    s.push_str("LEADERBOARD\n");
    s.push_str("───────────────────────────────────────────────────────────\n");
    for (rank, entry) in summary.leaderboard.iter().enumerate() {
        let check = match &entry.walk_forward {
            Some(wf) if wf.detected => format!("  overfit (ratio {:.2})", wf.ratio),
            Some(wf) => format!("  ok (ratio {:.2})", wf.ratio),
            None => String::new(),
        };
        s.push_str(&format!(
            "  {:>2}. {:<32} score {:>10.4}  trades {:>4}{}\n",
            rank + 1,
            params_text(&entry.params),
            entry.score,
            entry.summary.round_trips,
            check
        ));
    }
    s.push_str("═══════════════════════════════════════════════════════════\n");
    s
}
