//! Channel Breakout Strategy.
//!
//! Buys when the close breaks above the highest high of the previous
//! `window` bars and exits when it breaks below their lowest low.

use serde::{Deserialize, Serialize};
use spark_core::{
    error::StrategyError,
    traits::{Strategy, StrategyConfig, StrategyContext, StrategyState, StreamingIndicator},
    types::{Bar, OrderRequest},
};
use spark_indicators::{Channel, PriceChannel};
use tracing::debug;

use crate::sizing::PositionSizing;

/// Configuration for the Breakout strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutConfig {
    /// Number of prior bars forming the channel
    pub window: usize,
    /// Entry size
    pub sizing: PositionSizing,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            window: 20,
            sizing: PositionSizing::default(),
        }
    }
}

impl StrategyConfig for BreakoutConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.window == 0 {
            return Err(StrategyError::InvalidConfig(
                "Breakout window must be greater than 0".into(),
            ));
        }
        self.sizing.validate()
    }
}

/// Channel Breakout Strategy.
pub struct BreakoutStrategy {
    config: BreakoutConfig,
    channel: PriceChannel,
    last_channel: Option<Channel>,
    bars_processed: usize,
    orders_submitted: usize,
}

impl BreakoutStrategy {
    /// Create a new Breakout strategy.
    pub fn new(config: BreakoutConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self {
            channel: PriceChannel::new(config.window)?,
            config,
            last_channel: None,
            bars_processed: 0,
            orders_submitted: 0,
        })
    }

    pub fn config(&self) -> &BreakoutConfig {
        &self.config
    }
}

impl Strategy for BreakoutStrategy {
    fn name(&self) -> &str {
        "breakout"
    }

    fn description(&self) -> &str {
        "Goes long when the close clears the prior rolling high and exits below the prior rolling low"
    }

    fn on_bar(&mut self, bar: &Bar, ctx: &mut dyn StrategyContext) -> Result<(), StrategyError> {
        self.bars_processed += 1;

        // Channel of the previous `window` bars; the current bar joins afterwards
        let prior = self.channel.current();
        self.channel.update((bar.high, bar.low));

        let Some(prior) = prior else {
            return Ok(());
        };
        self.last_channel = Some(prior);

        let position = ctx.position_size();

        if position == 0.0 && bar.close > prior.upper {
            let quantity = self.config.sizing.quantity(ctx.cash(), bar.close);
            if quantity > 0.0 {
                debug!(
                    timestamp = bar.timestamp,
                    close = bar.close,
                    upper = prior.upper,
                    quantity,
                    "Upside breakout, entering long"
                );
                ctx.submit(OrderRequest::buy(quantity));
                self.orders_submitted += 1;
            }
        } else if position > 0.0 && bar.close < prior.lower {
            debug!(
                timestamp = bar.timestamp,
                close = bar.close,
                lower = prior.lower,
                quantity = position,
                "Downside breakout, exiting long"
            );
            ctx.submit(OrderRequest::sell(position));
            self.orders_submitted += 1;
        }

        Ok(())
    }

    fn reset(&mut self) {
        self.channel.reset();
        self.last_channel = None;
        self.bars_processed = 0;
        self.orders_submitted = 0;
    }

    fn state(&self) -> StrategyState {
        let mut indicators = std::collections::BTreeMap::new();
        if let Some(channel) = self.last_channel {
            indicators.insert("channel_high".to_string(), channel.upper);
            indicators.insert("channel_low".to_string(), channel.lower);
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
        self.config.window + 1
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}
