//! Fill-based metrics: round trips, win rate, turnover and exposure.

use serde::{Deserialize, Serialize};
use spark_core::types::{Position, PositionSample, Side, Trade};

use super::finite_or_zero;

/// One completed excursion from flat back to flat (or through a flip).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTrip {
    /// Direction of the opening fill
    pub side: Side,
    pub entry_timestamp: i64,
    pub exit_timestamp: i64,
    /// Largest absolute position held during the trip
    pub max_quantity: f64,
    /// Realized PnL before fees
    pub gross_pnl: f64,
    pub fees: f64,
    /// `gross_pnl - fees`
    pub net_pnl: f64,
}

struct OpenTrip {
    side: Side,
    entry_timestamp: i64,
    max_quantity: f64,
    gross_pnl: f64,
    fees: f64,
}

impl OpenTrip {
    fn open(side: Side, timestamp: i64) -> Self {
        Self {
            side,
            entry_timestamp: timestamp,
            max_quantity: 0.0,
            gross_pnl: 0.0,
            fees: 0.0,
        }
    }

    fn close(self, timestamp: i64) -> RoundTrip {
        RoundTrip {
            side: self.side,
            entry_timestamp: self.entry_timestamp,
            exit_timestamp: timestamp,
            max_quantity: self.max_quantity,
            gross_pnl: self.gross_pnl,
            fees: self.fees,
            net_pnl: self.gross_pnl - self.fees,
        }
    }
}

/// Replay fills and return every completed round trip in order.
///
/// A trip closes when the position returns to flat or flips. On a flip the
/// fill's fee is split pro rata between the closing and the opening part.
/// A trip still open after the last fill is not reported.
pub fn round_trips(trades: &[Trade]) -> Vec<RoundTrip> {
    let mut position = Position::flat();
    let mut open: Option<OpenTrip> = None;
    let mut completed = Vec::new();

    for trade in trades {
        if !trade.quantity.is_finite() || trade.quantity <= 0.0 || !trade.price.is_finite() {
            continue;
        }
        let fee = if trade.fee.is_finite() { trade.fee } else { 0.0 };

        let before = position.quantity;
        let realized = position.apply_fill(trade.side, trade.quantity, trade.price);
        let after = position.quantity;

        let flipped = before != 0.0 && after != 0.0 && before.signum() != after.signum();
        let closed = before != 0.0 && after == 0.0;

        let mut trip = open
            .take()
            .unwrap_or_else(|| OpenTrip::open(trade.side, trade.timestamp));
        trip.gross_pnl += realized;

        if flipped {
            let closing_share = before.abs() / trade.quantity;
            trip.fees += fee * closing_share;
            completed.push(trip.close(trade.timestamp));

            let mut next = OpenTrip::open(trade.side, trade.timestamp);
            next.fees = fee * (1.0 - closing_share);
            next.max_quantity = after.abs();
            open = Some(next);
        } else {
            trip.fees += fee;
            trip.max_quantity = trip.max_quantity.max(after.abs());
            if closed {
                completed.push(trip.close(trade.timestamp));
            } else {
                open = Some(trip);
            }
        }
    }

    completed
}

/// Fraction of completed round trips with positive net PnL.
pub fn calculate_win_rate_from_fills(trades: &[Trade]) -> f64 {
    let trips = round_trips(trades);
    if trips.is_empty() {
        return 0.0;
    }
    let wins = trips.iter().filter(|t| t.net_pnl > 0.0).count();
    wins as f64 / trips.len() as f64
}

/// Total traded notional divided by average equity.
pub fn calculate_turnover_from_fills(trades: &[Trade], average_equity: f64) -> f64 {
    if !average_equity.is_finite() || average_equity <= 0.0 {
        return 0.0;
    }
    let traded: f64 = trades.iter().map(|t| t.notional().abs()).sum();
    finite_or_zero(traded / average_equity)
}

/// Time-weighted fraction of the run with a non-zero position.
///
/// Each sample's quantity holds until the next sample's timestamp. When all
/// samples share one timestamp the fraction of non-zero samples is used.
pub fn calculate_exposure_from_positions(samples: &[PositionSample]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }

    let span = samples[samples.len() - 1].timestamp - samples[0].timestamp;
    if span <= 0 {
        let exposed = samples.iter().filter(|s| s.quantity != 0.0).count();
        return exposed as f64 / samples.len() as f64;
    }

    let exposed: i64 = samples
        .windows(2)
        .filter(|w| w[0].quantity != 0.0)
        .map(|w| (w[1].timestamp - w[0].timestamp).max(0))
        .sum();
    finite_or_zero((exposed as f64 / span as f64).clamp(0.0, 1.0))
}
