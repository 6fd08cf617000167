//! Position and equity types.

use serde::{Deserialize, Serialize};

use super::Side;

/// Net exposure in one instrument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Signed quantity (positive for long, negative for short)
    pub quantity: f64,
    /// Average entry price, zero while flat
    pub avg_entry_price: f64,
    /// Last mark price
    pub current_price: f64,
    /// Unrealized profit/loss at `current_price`
    pub unrealized_pnl: f64,
    /// Realized profit/loss from closed portions
    pub realized_pnl: f64,
}

impl Position {
    /// Create a flat position.
    pub fn flat() -> Self {
        Self::default()
    }

    /// Check if this is a long position.
    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }

    /// Check if this is a short position.
    pub fn is_short(&self) -> bool {
        self.quantity < 0.0
    }

    /// Check if the position is flat.
    pub fn is_flat(&self) -> bool {
        self.quantity == 0.0
    }

    /// Mark the position to a new price.
    pub fn mark(&mut self, price: f64) {
        self.current_price = price;
        self.unrealized_pnl = self.quantity * (price - self.avg_entry_price);
    }

    /// Apply a fill to the position.
    ///
    /// Additions move the average entry price to the quantity-weighted
    /// average. Reductions realize PnL on the closed portion. An opposite
    /// fill larger than the position closes it and opens the remainder in
    /// the other direction at the fill price.
    ///
    /// Returns the PnL realized by this fill.
    pub fn apply_fill(&mut self, side: Side, quantity: f64, price: f64) -> f64 {
        let fill_qty = side.sign() * quantity;
        let mut realized = 0.0;

        let same_direction = (self.quantity > 0.0 && fill_qty > 0.0)
            || (self.quantity < 0.0 && fill_qty < 0.0);

        if same_direction || self.is_flat() {
            let total_cost = self.quantity * self.avg_entry_price + fill_qty * price;
            let new_quantity = self.quantity + fill_qty;

            if new_quantity != 0.0 {
                self.avg_entry_price = total_cost / new_quantity;
            }
            self.quantity = new_quantity;
        } else {
            let held = self.quantity.abs();
            let close_qty = fill_qty.abs().min(held);

            realized = if self.quantity > 0.0 {
                close_qty * (price - self.avg_entry_price)
            } else {
                close_qty * (self.avg_entry_price - price)
            };
            self.realized_pnl += realized;

            let remaining = fill_qty.abs() - close_qty;
            if remaining > 0.0 && !is_residue(remaining, held) {
                // Reversed
                self.quantity = fill_qty.signum() * remaining;
                self.avg_entry_price = price;
            } else {
                self.quantity += fill_qty;
            }

            // Fractional scale-ins leave float dust behind on the exit
            if is_residue(self.quantity, held) {
                self.quantity = 0.0;
                self.avg_entry_price = 0.0;
            }
        }

        self.mark(price);
        realized
    }
}

/// Relative tolerance below which a leftover quantity counts as flat.
const QUANTITY_EPSILON: f64 = 1e-9;

fn is_residue(quantity: f64, scale: f64) -> bool {
    quantity.abs() <= QUANTITY_EPSILON * scale.abs().max(1.0)
}

/// Portfolio value sampled once per bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// Bar timestamp
    pub timestamp: i64,
    /// Total value (`cash + position * close`)
    pub equity: f64,
    /// Cash after the bar's fills
    pub cash: f64,
    /// Signed position quantity after the bar's fills
    pub position: f64,
}

/// Signed position quantity at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub timestamp: i64,
    pub quantity: f64,
}

impl From<&EquityPoint> for PositionSample {
    fn from(point: &EquityPoint) -> Self {
        Self {
            timestamp: point.timestamp,
            quantity: point.position,
        }
    }
}
