//! Entry sizing shared by the strategy plugins.

use serde::{Deserialize, Serialize};
use spark_core::error::StrategyError;

/// How many units a strategy buys when it opens a position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PositionSizing {
    /// Constant number of units.
    Fixed { quantity: f64 },
    /// Fraction of available cash (0 < percent <= 1) at the bar's close.
    PercentOfCash { percent: f64 },
}

impl Default for PositionSizing {
    fn default() -> Self {
        PositionSizing::Fixed { quantity: 1.0 }
    }
}

impl PositionSizing {
    pub fn validate(&self) -> Result<(), StrategyError> {
        match *self {
            PositionSizing::Fixed { quantity } => {
                if !quantity.is_finite() || quantity <= 0.0 {
                    return Err(StrategyError::InvalidConfig(format!(
                        "Fixed quantity must be positive, got {}",
                        quantity
                    )));
                }
            }
            PositionSizing::PercentOfCash { percent } => {
                if !percent.is_finite() || percent <= 0.0 || percent > 1.0 {
                    return Err(StrategyError::InvalidConfig(format!(
                        "Percent of cash must be in (0, 1], got {}",
                        percent
                    )));
                }
            }
        }
        Ok(())
    }

    /// Units to buy at `price` given `cash`. Zero means "skip the entry".
    pub fn quantity(&self, cash: f64, price: f64) -> f64 {
        match *self {
            PositionSizing::Fixed { quantity } => quantity,
            PositionSizing::PercentOfCash { percent } => {
                if price <= 0.0 || cash <= 0.0 {
                    return 0.0;
                }
                let qty = cash * percent / price;
                if qty.is_finite() {
                    qty
                } else {
                    0.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_sizing() {
        let sizing = PositionSizing::default();
        assert_eq!(sizing.quantity(10_000.0, 50.0), 1.0);
        assert!(sizing.validate().is_ok());
        assert!(PositionSizing::Fixed { quantity: 0.0 }.validate().is_err());
    }

    #[test]
    fn test_percent_of_cash_sizing() {
        let sizing = PositionSizing::PercentOfCash { percent: 0.5 };
        assert_eq!(sizing.quantity(10_000.0, 50.0), 100.0);
        assert_eq!(sizing.quantity(0.0, 50.0), 0.0);
        assert!(PositionSizing::PercentOfCash { percent: 1.5 }
            .validate()
            .is_err());
    }

    #[test]
    fn test_sizing_serde_shape() {
        let sizing: PositionSizing =
            serde_json::from_str(r#"{"mode":"percent_of_cash","percent":0.25}"#).unwrap();
        assert_eq!(sizing, PositionSizing::PercentOfCash { percent: 0.25 });
    }
}
