//! Moving average indicators.

use std::collections::VecDeque;

use spark_core::error::IndicatorError;
use spark_core::traits::{Indicator, StreamingIndicator};

fn check_period(period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(
            "Period must be greater than 0".into(),
        ));
    }
    Ok(())
}

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period(period)?;
        Ok(Self { period })
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }

        let period_f64 = self.period as f64;
        data.windows(self.period)
            .map(|w| w.iter().sum::<f64>() / period_f64)
            .collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Streaming SMA over a trailing window.
///
/// The mean is recomputed from the window on every update, so identical
/// inputs always yield bit-identical outputs regardless of history length.
#[derive(Debug, Clone)]
pub struct RollingSma {
    period: usize,
    window: VecDeque<f64>,
}

impl RollingSma {
    /// Create a new rolling SMA with the specified period.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period(period)?;
        Ok(Self {
            period,
            window: VecDeque::with_capacity(period),
        })
    }
}

impl StreamingIndicator for RollingSma {
    type Input = f64;
    type Output = f64;

    fn update(&mut self, value: f64) -> Option<f64> {
        if self.window.len() == self.period {
            self.window.pop_front();
        }
        self.window.push_back(value);
        self.current()
    }

    fn current(&self) -> Option<f64> {
        if !self.is_ready() {
            return None;
        }
        Some(self.window.iter().sum::<f64>() / self.period as f64)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_calculation() {
        let sma = Sma::new(3).unwrap();
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma.calculate(&data);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 1e-12);
        assert!((result[1] - 3.0).abs() < 1e-12);
        assert!((result[2] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_sma_insufficient_data() {
        let sma = Sma::new(5).unwrap();
        assert!(sma.calculate(&[1.0, 2.0]).is_empty());
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(Sma::new(0).is_err());
        assert!(RollingSma::new(0).is_err());
    }

    #[test]
    fn test_rolling_matches_batch() {
        let data: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let batch = Sma::new(7).unwrap().calculate(&data);

        let mut rolling = RollingSma::new(7).unwrap();
        let streamed: Vec<f64> = data.iter().filter_map(|&v| rolling.update(v)).collect();

        assert_eq!(batch.len(), streamed.len());
        for (a, b) in batch.iter().zip(&streamed) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rolling_warmup_and_reset() {
        let mut sma = RollingSma::new(3).unwrap();
        assert_eq!(sma.update(1.0), None);
        assert_eq!(sma.update(2.0), None);
        assert_eq!(sma.update(3.0), Some(2.0));
        assert!(sma.is_ready());

        sma.reset();
        assert!(!sma.is_ready());
        assert_eq!(sma.current(), None);
    }

    #[test]
    fn test_rolling_constant_input_is_exact() {
        let mut sma = RollingSma::new(10).unwrap();
        let mut last = None;
        for _ in 0..100 {
            last = sma.update(100.0);
        }
        assert_eq!(last, Some(100.0));
    }
}
