//! Order requests and executed trades.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the sign for position calculations (+1 for buy, -1 for sell).
    pub fn sign(&self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// When the simulator fills a market order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillTiming {
    /// At the close of the bar the order was submitted on
    #[default]
    SameBarClose,
    /// At the open of the following bar
    NextBarOpen,
}

impl std::fmt::Display for FillTiming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillTiming::SameBarClose => write!(f, "same_bar_close"),
            FillTiming::NextBarOpen => write!(f, "next_bar_open"),
        }
    }
}

impl std::str::FromStr for FillTiming {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "same_bar_close" | "close" => Ok(FillTiming::SameBarClose),
            "next_bar_open" | "next_open" | "open" => Ok(FillTiming::NextBarOpen),
            other => Err(ValidationError::InvalidParameter(format!(
                "unknown fill timing '{}'",
                other
            ))),
        }
    }
}

/// Market order submitted by a strategy.

///
/// The simulator fills it at the submitting bar's close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Buy or sell
    pub side: Side,
    /// Quantity to trade, always positive
    pub quantity: f64,
    /// Client-provided order ID
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    /// Create a market order request.
    pub fn market(side: Side, quantity: f64) -> Self {
        Self {
            side,
            quantity,
            client_order_id: None,
        }
    }

    /// Market buy.
    pub fn buy(quantity: f64) -> Self {
        Self::market(Side::Buy, quantity)
    }

    /// Market sell.
    pub fn sell(quantity: f64) -> Self {
        Self::market(Side::Sell, quantity)
    }

    /// Set a client order ID.
    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }

    /// Reject non-finite or non-positive quantities.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(ValidationError::InvalidOrder(format!(
                "{} quantity must be finite and positive, got {}",
                self.side, self.quantity
            )));
        }
        Ok(())
    }
}

/// One executed order leg. Never mutated after the simulator creates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Timestamp of the bar that produced the fill
    pub timestamp: i64,
    /// Buy or sell
    pub side: Side,
    /// Fill price
    pub price: f64,
    /// Filled quantity, always positive
    pub quantity: f64,
    /// Client order ID carried over from the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Commission charged on this fill
    #[serde(default)]
    pub fee: f64,
}

impl Trade {
    /// Absolute traded notional (`|price * quantity|`).
    #[inline]
    pub fn notional(&self) -> f64 {
        (self.price * self.quantity).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_request_market() {
        let request = OrderRequest::buy(100.0).with_client_order_id("abc");
        assert_eq!(request.side, Side::Buy);
        assert_eq!(request.quantity, 100.0);
        assert_eq!(request.client_order_id.as_deref(), Some("abc"));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_order_request_rejects_bad_quantity() {
        assert!(OrderRequest::sell(0.0).validate().is_err());
        assert!(OrderRequest::sell(-1.0).validate().is_err());
        assert!(OrderRequest::buy(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_side_sign() {
        assert_eq!(Side::Buy.sign(), 1.0);
        assert_eq!(Side::Sell.sign(), -1.0);
    }

    #[test]
    fn test_side_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"BUY\"");
        assert_eq!(serde_json::from_str::<Side>("\"SELL\"").unwrap(), Side::Sell);
    }

    #[test]
    fn test_fill_timing_names() {
        assert_eq!(FillTiming::default(), FillTiming::SameBarClose);
        assert_eq!("next-bar-open".parse::<FillTiming>().unwrap(), FillTiming::NextBarOpen);
        assert_eq!("close".parse::<FillTiming>().unwrap(), FillTiming::SameBarClose);
        assert!("tomorrow".parse::<FillTiming>().is_err());
        assert_eq!(
            serde_json::to_string(&FillTiming::NextBarOpen).unwrap(),
            "\"next_bar_open\""
        );
        assert_eq!(FillTiming::NextBarOpen.to_string(), "next_bar_open");
    }

    #[test]
    fn test_trade_notional() {
        let trade = Trade {
            timestamp: 1,
            side: Side::Sell,
            price: 150.0,
            quantity: 2.0,
            order_id: None,
            fee: 0.0,
        };
        assert_eq!(trade.notional(), 300.0);
    }
}
