//! Technical indicators for the strategy plugins.
//!
//! - Moving averages: batch [`Sma`] and streaming [`RollingSma`]
//! - Price channel: streaming rolling high/low over the previous N bars

pub mod channel;
pub mod moving_average;

pub use channel::{Channel, PriceChannel};
pub use moving_average::{RollingSma, Sma};
