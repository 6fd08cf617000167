//! Strategy plugins for the backtest simulator.
//!
//! This crate provides:
//! - SMA Crossover (long-only golden/dead cross)
//! - Channel Breakout (long-only rolling high/low breakout)
//! - A registry that builds fresh instances from JSON parameters

mod breakout;
mod registry;
mod sizing;
mod sma_cross;

pub use breakout::{BreakoutConfig, BreakoutStrategy};
pub use registry::{StrategyInfo, StrategyRegistry};
pub use sizing::PositionSizing;
pub use sma_cross::{SmaCrossConfig, SmaCrossStrategy};
