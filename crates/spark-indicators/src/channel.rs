//! Rolling high/low price channel.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use spark_core::error::IndicatorError;
use spark_core::traits::StreamingIndicator;

/// Highest high and lowest low over a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub upper: f64,
    pub lower: f64,
}

/// Channel over the last `period` (high, low) pairs.
///
/// Read [`StreamingIndicator::current`] before feeding the current bar to get
/// the channel of the bars strictly before it.
#[derive(Debug, Clone)]
pub struct PriceChannel {
    period: usize,
    window: VecDeque<(f64, f64)>,
}

impl PriceChannel {
    /// Create a channel over `period` bars.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::InvalidParameter(
                "Channel period must be greater than 0".into(),
            ));
        }
        Ok(Self {
            period,
            window: VecDeque::with_capacity(period),
        })
    }
}

impl StreamingIndicator for PriceChannel {
    type Input = (f64, f64);
    type Output = Channel;

    fn update(&mut self, (high, low): (f64, f64)) -> Option<Channel> {
        if self.window.len() == self.period {
            self.window.pop_front();
        }
        self.window.push_back((high, low));
        self.current()
    }

    fn current(&self) -> Option<Channel> {
        if !self.is_ready() {
            return None;
        }
        let upper = self
            .window
            .iter()
            .map(|&(h, _)| h)
            .fold(f64::NEG_INFINITY, f64::max);
        let lower = self
            .window
            .iter()
            .map(|&(_, l)| l)
            .fold(f64::INFINITY, f64::min);
        Some(Channel { upper, lower })
    }

    fn reset(&mut self) {
        self.window.clear();
    }

    fn is_ready(&self) -> bool {
        self.window.len() == self.period
    }

    fn period(&self) -> usize {
        self.period
    }
}
