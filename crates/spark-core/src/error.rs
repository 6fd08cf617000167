//! Error types for the backtest core.

use thiserror::Error;

/// Top-level error for a backtest run.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    /// A strategy failed while handling a bar. The run is abandoned.
    #[error("Strategy '{strategy}' failed on bar {bar_index} (timestamp {timestamp}): {source}")]
    StrategyExecution {
        strategy: String,
        bar_index: usize,
        timestamp: i64,
        #[source]
        source: StrategyError,
    },

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Run cancelled after {bars_processed} bars")]
    Cancelled { bars_processed: usize },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TradingError {
    fn from(err: serde_json::Error) -> Self {
        TradingError::Serialization(err.to_string())
    }
}

/// Malformed input rejected at construction or ingestion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error(
        "OHLC ordering violated at timestamp {timestamp}: \
         open={open} high={high} low={low} close={close}"
    )]
    OhlcOrdering {
        timestamp: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },

    #[error("Bar {index} has timestamp {timestamp} earlier than previous {previous}")]
    OutOfOrder {
        index: usize,
        previous: i64,
        timestamp: i64,
    },

    #[error("Bar sequence is empty")]
    EmptySeries,

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Strategy-specific errors.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Strategy not found: {0}")]
    NotFound(String),

    #[error("Invalid order submitted: {0}")]
    InvalidOrder(#[from] ValidationError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Strategy execution failed: {0}")]
    Execution(String),
}

/// Data source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("No data available at {0}")]
    NoDataAvailable(String),

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid bar data: {0}")]
    Invalid(#[from] ValidationError),
}

/// Indicator construction errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for backtest operations.
pub type TradingResult<T> = Result<T, TradingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_execution_message() {
        let err = TradingError::StrategyExecution {
            strategy: "SMA Cross".to_string(),
            bar_index: 7,
            timestamp: 1000,
            source: StrategyError::Execution("boom".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("SMA Cross"));
        assert!(msg.contains("bar 7"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_validation_converts_into_trading_error() {
        let err: TradingError = ValidationError::EmptySeries.into();
        assert!(matches!(err, TradingError::Validation(ValidationError::EmptySeries)));
    }
}
