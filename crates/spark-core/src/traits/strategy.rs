//! Strategy trait definitions.

use crate::error::StrategyError;
use crate::types::{Bar, OrderRequest, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration trait for strategies.
pub trait StrategyConfig: Send + Sync + Clone + 'static {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), StrategyError>;
}

/// State of a strategy for monitoring and serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyState {
    /// Strategy name
    pub name: String,
    /// Whether the strategy has processed enough bars to generate orders
    pub is_warmed_up: bool,
    /// Number of bars processed
    pub bars_processed: usize,
    /// Number of orders submitted
    pub orders_submitted: usize,
    /// Current indicator values
    pub indicators: BTreeMap<String, f64>,
}

/// Broker-facing view handed to a strategy for the duration of one bar.
///
/// Everything is read-only except [`StrategyContext::submit`], which
/// enqueues an order for the simulator to fill once `on_bar` returns.
pub trait StrategyContext {
    /// Timestamp of the bar being processed.
    fn timestamp(&self) -> i64;

    /// Current position in the instrument.
    fn position(&self) -> &Position;

    /// Available cash.
    fn cash(&self) -> f64;

    /// Enqueue an order.
    fn submit(&mut self, order: OrderRequest);

    /// Signed position size (positive long, negative short, zero flat).
    fn position_size(&self) -> f64 {
        self.position().quantity
    }
}

/// Core strategy trait.
///
/// A strategy decides once per bar whether to submit orders. It owns its
/// rolling state privately and only affects the run through the context.
pub trait Strategy: Send + Sync {
    /// Get the unique name of this strategy.
    fn name(&self) -> &str;

    /// Process a new bar.
    ///
    /// Returning an error aborts the enclosing run; no partial result is
    /// produced.
    fn on_bar(&mut self, bar: &Bar, ctx: &mut dyn StrategyContext) -> Result<(), StrategyError>;

    /// Reset the strategy state.
    ///
    /// The simulator calls this before every run.
    fn reset(&mut self);

    /// Get the current strategy state for monitoring.
    fn state(&self) -> StrategyState;

    /// Get the warmup period (number of bars needed before generating orders).
    fn warmup_period(&self) -> usize;

    /// Parameters the strategy was built with, recorded in run metadata.
    fn parameters(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Check if the strategy is warmed up (has enough data).
    fn is_warmed_up(&self, bars_available: usize) -> bool {
        bars_available >= self.warmup_period()
    }

    /// Get a description of the strategy.
    fn description(&self) -> &str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestStrategy {
        warmup: usize,
        bars_seen: usize,
    }

    impl Strategy for TestStrategy {
        fn name(&self) -> &str {
            "test"
        }

        fn on_bar(&mut self, _bar: &Bar, ctx: &mut dyn StrategyContext) -> Result<(), StrategyError> {
            self.bars_seen += 1;
            if ctx.position_size() == 0.0 {
                ctx.submit(OrderRequest::buy(1.0));
            }
            Ok(())
        }

        fn reset(&mut self) {
            self.bars_seen = 0;
        }

        fn state(&self) -> StrategyState {
            StrategyState {
                name: self.name().to_string(),
                is_warmed_up: self.bars_seen >= self.warmup,
                bars_processed: self.bars_seen,
                ..Default::default()
            }
        }

        fn warmup_period(&self) -> usize {
            self.warmup
        }
    }

    struct RecordingContext {
        position: Position,
        submitted: Vec<OrderRequest>,
    }

    impl StrategyContext for RecordingContext {
        fn timestamp(&self) -> i64 {
            0
        }

        fn position(&self) -> &Position {
            &self.position
        }

        fn cash(&self) -> f64 {
            1000.0
        }

        fn submit(&mut self, order: OrderRequest) {
            self.submitted.push(order);
        }
    }

    #[test]
    fn test_strategy_warmup() {
        let strategy = TestStrategy {
            warmup: 20,
            bars_seen: 0,
        };

        assert!(!strategy.is_warmed_up(10));
        assert!(!strategy.is_warmed_up(19));
        assert!(strategy.is_warmed_up(20));
        assert!(strategy.is_warmed_up(100));
        assert_eq!(strategy.parameters(), serde_json::Value::Null);
    }

    #[test]
    fn test_strategy_submits_through_context() {
        let mut strategy = TestStrategy {
            warmup: 0,
            bars_seen: 0,
        };
        let mut ctx = RecordingContext {
            position: Position::flat(),
            submitted: Vec::new(),
        };
        let bar = Bar::new(0, 1.0, 1.0, 1.0, 1.0, 0.0).unwrap();

        strategy.on_bar(&bar, &mut ctx).unwrap();
        assert_eq!(ctx.submitted, vec![OrderRequest::buy(1.0)]);
        assert_eq!(strategy.state().bars_processed, 1);

        strategy.reset();
        assert_eq!(strategy.state().bars_processed, 0);
    }
}
