//! Indicator trait definitions.

/// Batch indicator over a full input slice.
pub trait Indicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values for the given data.
    ///
    /// Returns one value per complete window; empty when `data` is shorter
    /// than the period.
    fn calculate(&self, data: &[f64]) -> Vec<Self::Output>;

    /// Get the minimum data points required.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;
}

/// Streaming indicator that maintains internal state.
///
/// Unlike batch indicators, streaming indicators can be updated
/// incrementally with new data points.
pub trait StreamingIndicator: Send + Sync {
    /// The value fed on each update.
    type Input;
    /// The output type of the indicator.
    type Output;

    /// Update the indicator with a new value.
    ///
    /// Returns the current indicator value, or None if not yet ready.
    fn update(&mut self, value: Self::Input) -> Option<Self::Output>;

    /// Get the current value without adding new data.
    fn current(&self) -> Option<Self::Output>;

    /// Reset the indicator state.
    fn reset(&mut self);

    /// Check if the indicator has enough data to produce values.
    fn is_ready(&self) -> bool;

    /// Get the minimum data points required.
    fn period(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestIndicator {
        period: usize,
    }

    impl Indicator for TestIndicator {
        type Output = f64;

        fn calculate(&self, data: &[f64]) -> Vec<f64> {
            if data.len() < self.period {
                return vec![];
            }
            // Simple sum indicator for testing
            data.windows(self.period).map(|w| w.iter().sum()).collect()
        }

        fn period(&self) -> usize {
            self.period
        }

        fn name(&self) -> &str {
            "test"
        }
    }

    #[test]
    fn test_indicator_calculate() {
        let indicator = TestIndicator { period: 3 };
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = indicator.calculate(&data);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 6.0).abs() < 0.001); // 1+2+3
        assert!((result[1] - 9.0).abs() < 0.001); // 2+3+4
        assert!((result[2] - 12.0).abs() < 0.001); // 3+4+5
        assert!(indicator.calculate(&[1.0]).is_empty());
    }
}
