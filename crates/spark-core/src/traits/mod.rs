//! Core traits for the backtest core.

mod indicator;
mod strategy;

pub use indicator::{Indicator, StreamingIndicator};
pub use strategy::{Strategy, StrategyConfig, StrategyContext, StrategyState};
