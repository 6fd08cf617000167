//! Core types and traits for the Spark backtest stack.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarSeries) validated at construction
//! - Orders, trades, positions and equity samples
//! - The strategy capability traits and indicator traits
//! - The error taxonomy shared by every crate in the workspace

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    DataError, IndicatorError, StrategyError, TradingError, TradingResult, ValidationError,
};
pub use traits::*;
pub use types::*;
