//! CLI command implementations.

pub mod backtest;
pub mod optimize;
mod setup;
pub mod strategies;
pub mod validate;
pub mod walk_forward;
