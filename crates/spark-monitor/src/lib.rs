//! Structured logging for the backtest binary.

mod logging;

pub use logging::{setup_logging, LogFormat};
