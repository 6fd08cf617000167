//! Core data types for the backtest core.

mod ohlcv;
mod order;
mod position;
mod timeframe;

pub use ohlcv::{Bar, BarSeries};
pub use order::{FillTiming, OrderRequest, Side, Trade};
pub use position::{EquityPoint, Position, PositionSample};
pub use timeframe::Timeframe;
