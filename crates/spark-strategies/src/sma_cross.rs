//! Simple Moving Average Crossover Strategy.
//!
//! Opens a long position when the fast SMA crosses above the slow SMA,
//! and exits to flat when the fast SMA crosses back below.

use serde::{Deserialize, Serialize};
use spark_core::{
    error::StrategyError,
    traits::{Strategy, StrategyConfig, StrategyContext, StrategyState, StreamingIndicator},
    types::{Bar, OrderRequest},
};
use spark_indicators::RollingSma;
use tracing::debug;

use crate::sizing::PositionSizing;

/// Configuration for the SMA Crossover strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmaCrossConfig {
    /// Fast moving average period
    pub fast_period: usize,
    /// Slow moving average period
    pub slow_period: usize,
    /// Entry size
    pub sizing: PositionSizing,
}

impl Default for SmaCrossConfig {
    fn default() -> Self {
        Self {
            fast_period: 10,
            slow_period: 20,
            sizing: PositionSizing::default(),
        }
    }
}

impl StrategyConfig for SmaCrossConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.fast_period == 0 {
            return Err(StrategyError::InvalidConfig(
                "Fast period must be greater than 0".into(),
            ));
        }
        if self.fast_period >= self.slow_period {
            return Err(StrategyError::InvalidConfig(
                "Fast period must be less than slow period".into(),
            ));
        }
        self.sizing.validate()
    }
}

/// SMA Crossover Strategy.
pub struct SmaCrossStrategy {
    config: SmaCrossConfig,
    fast: RollingSma,
    slow: RollingSma,
    prev_diff: Option<f64>,
    last_fast: Option<f64>,
    last_slow: Option<f64>,
    bars_processed: usize,
    orders_submitted: usize,
}

impl SmaCrossStrategy {
    /// Create a new SMA Crossover strategy.
    pub fn new(config: SmaCrossConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self {
            fast: RollingSma::new(config.fast_period)?,
            slow: RollingSma::new(config.slow_period)?,
            config,
            prev_diff: None,
            last_fast: None,
            last_slow: None,
            bars_processed: 0,
            orders_submitted: 0,
        })
    }

    pub fn config(&self) -> &SmaCrossConfig {
        &self.config
    }
}

impl Strategy for SmaCrossStrategy {
    fn name(&self) -> &str {
        "sma_cross"
    }

    fn description(&self) -> &str {
        "Goes long on a fast/slow SMA golden cross and exits on the dead cross"
    }

    fn on_bar(&mut self, bar: &Bar, ctx: &mut dyn StrategyContext) -> Result<(), StrategyError> {
        self.bars_processed += 1;

        let fast = self.fast.update(bar.close);
        let slow = self.slow.update(bar.close);

        let (Some(fast), Some(slow)) = (fast, slow) else {
            return Ok(());
        };
        self.last_fast = Some(fast);
        self.last_slow = Some(slow);

        let diff = fast - slow;
        // The first bar with both averages counts as crossing from "equal"
        let prev = self.prev_diff.unwrap_or(0.0);
        self.prev_diff = Some(diff);

        let position = ctx.position_size();

        if prev <= 0.0 && diff > 0.0 && position == 0.0 {
            let quantity = self.config.sizing.quantity(ctx.cash(), bar.close);
            if quantity > 0.0 {
                debug!(
                    timestamp = bar.timestamp,
                    fast, slow, quantity, "Golden cross, entering long"
                );
                ctx.submit(OrderRequest::buy(quantity));
                self.orders_submitted += 1;
            }
        } else if prev >= 0.0 && diff < 0.0 && position > 0.0 {
            debug!(
                timestamp = bar.timestamp,
                fast, slow, quantity = position, "Dead cross, exiting long"
            );
            ctx.submit(OrderRequest::sell(position));
            self.orders_submitted += 1;
        }

        Ok(())
    }

    fn reset(&mut self) {
        self.fast.reset();
        self.slow.reset();
        self.prev_diff = None;
        self.last_fast = None;
        self.last_slow = None;
        self.bars_processed = 0;
        self.orders_submitted = 0;
    }

    fn state(&self) -> StrategyState {
        let mut indicators = std::collections::BTreeMap::new();
        if let Some(fast) = self.last_fast {
            indicators.insert("fast_sma".to_string(), fast);
        }
        if let Some(slow) = self.last_slow {
            indicators.insert("slow_sma".to_string(), slow);
        }
        StrategyState {
            name: self.name().to_string(),
            is_warmed_up: self.is_warmed_up(self.bars_processed),
            bars_processed: self.bars_processed,
            orders_submitted: self.orders_submitted,
            indicators,
        }
    }

    fn warmup_period(&self) -> usize {
        self.config.slow_period
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_core::types::{Position, Side};

    /// Context that fills every order immediately at the given price.
    struct ImmediateFill {
        position: Position,
        price: f64,
        submitted: Vec<OrderRequest>,
    }

    impl ImmediateFill {
        fn new() -> Self {
            Self {
                position: Position::flat(),
                price: 0.0,
                submitted: Vec::new(),
            }
        }
    }

    impl StrategyContext for ImmediateFill {
        fn timestamp(&self) -> i64 {
            0
        }

        fn position(&self) -> &Position {
            &self.position
        }

        fn cash(&self) -> f64 {
            10_000.0
        }

        fn submit(&mut self, order: OrderRequest) {
            self.position
                .apply_fill(order.side, order.quantity, self.price);
            self.submitted.push(order);
        }
    }

    fn run(strategy: &mut SmaCrossStrategy, closes: &[f64]) -> Vec<(usize, OrderRequest)> {
        let mut ctx = ImmediateFill::new();
        let mut orders = Vec::new();
        for (i, &close) in closes.iter().enumerate() {
            let bar = Bar::new(i as i64, close, close, close, close, 0.0).unwrap();
            ctx.price = close;
            let before = ctx.submitted.len();
            strategy.on_bar(&bar, &mut ctx).unwrap();
            orders.extend(ctx.submitted[before..].iter().cloned().map(|o| (i, o)));
        }
        orders
    }

    #[test]
    fn test_config_validation() {
        let mut config = SmaCrossConfig::default();
        assert!(config.validate().is_ok());

        config.fast_period = 30;
        config.slow_period = 20;
        assert!(config.validate().is_err());

        config.fast_period = 0;
        assert!(SmaCrossStrategy::new(config).is_err());
    }

    #[test]
    fn test_uptrend_buys_once_when_averages_exist() {
        let mut strategy = SmaCrossStrategy::new(SmaCrossConfig::default()).unwrap();
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();

        let orders = run(&mut strategy, &closes);

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].0, 19);
        assert_eq!(orders[0].1.side, Side::Buy);
        assert_eq!(orders[0].1.quantity, 1.0);
    }

    #[test]
    fn test_flat_series_never_trades() {
        let mut strategy = SmaCrossStrategy::new(SmaCrossConfig::default()).unwrap();
        let orders = run(&mut strategy, &[100.0; 60]);
        assert!(orders.is_empty());
    }

    #[test]
    fn test_dead_cross_exits_long() {
        let config = SmaCrossConfig {
            fast_period: 2,
            slow_period: 4,
            ..Default::default()
        };
        let mut strategy = SmaCrossStrategy::new(config).unwrap();

        let closes = [10.0, 11.0, 12.0, 13.0, 14.0, 12.0, 9.0, 7.0, 6.0];
        let orders = run(&mut strategy, &closes);

        let sides: Vec<Side> = orders.iter().map(|(_, o)| o.side).collect();
        assert_eq!(sides, vec![Side::Buy, Side::Sell]);
        assert_eq!(orders[0].0, 3);
        assert_eq!(orders[1].1.quantity, 1.0);
    }

    #[test]
    fn test_downtrend_does_not_short() {
        let mut strategy = SmaCrossStrategy::new(SmaCrossConfig::default()).unwrap();
        let closes: Vec<f64> = (0..50).map(|i| 200.0 - i as f64).collect();
        assert!(run(&mut strategy, &closes).is_empty());
    }

    #[test]
    fn test_reset_clears_state() {
        let mut strategy = SmaCrossStrategy::new(SmaCrossConfig::default()).unwrap();
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        run(&mut strategy, &closes);

        let state = strategy.state();
        assert!(state.is_warmed_up);
        assert_eq!(state.orders_submitted, 1);
        assert!(state.indicators.contains_key("fast_sma"));

        strategy.reset();
        let state = strategy.state();
        assert_eq!(state.bars_processed, 0);
        assert!(state.indicators.is_empty());

        // Same input after reset gives the same order at the same bar
        let orders = run(&mut strategy, &closes);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].0, 19);
    }

    #[test]
    fn test_parameters_round_trip() {
        let strategy = SmaCrossStrategy::new(SmaCrossConfig::default()).unwrap();
        let config: SmaCrossConfig = serde_json::from_value(strategy.parameters()).unwrap();
        assert_eq!(&config, strategy.config());
    }
}
