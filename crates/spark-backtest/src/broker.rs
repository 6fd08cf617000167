//! Simulated broker state for a single run.

use spark_core::traits::StrategyContext;
use spark_core::types::{OrderRequest, Position, Trade};
use tracing::debug;

/// Cash, position and fill log owned by one simulation.
///
/// Implements [`StrategyContext`] so a strategy can read the account and
/// queue orders; queued orders are only filled when the simulator calls
/// [`SimBroker::fill`].
#[derive(Debug)]
pub(crate) struct SimBroker {
    cash: f64,
    position: Position,
    timestamp: i64,
    pending: Vec<OrderRequest>,
    trades: Vec<Trade>,
    fees_paid: f64,
    fee_rate: f64,
    slippage_rate: f64,
}

impl SimBroker {
    pub(crate) fn new(initial_cash: f64, fee_bps: f64, slippage_bps: f64) -> Self {
        Self {
            cash: initial_cash,
            position: Position::flat(),
            timestamp: 0,
            pending: Vec::new(),
            trades: Vec::new(),
            fees_paid: 0.0,
            fee_rate: fee_bps / 10_000.0,
            slippage_rate: slippage_bps / 10_000.0,
        }
    }

    /// Advance the clock to the bar being processed.
    pub(crate) fn set_clock(&mut self, timestamp: i64) {
        self.timestamp = timestamp;
    }

    /// Orders queued since the last call, in submission order.
    pub(crate) fn take_orders(&mut self) -> Vec<OrderRequest> {
        std::mem::take(&mut self.pending)
    }

    /// Fill a market order against `close`.
    ///
    /// Buys pay `close * (1 + slippage)`, sells receive `close * (1 - slippage)`.
    /// The fee is charged on the absolute notional.
    pub(crate) fn fill(&mut self, order: &OrderRequest, close: f64) -> &Trade {
        let side = order.side;
        let price = close * (1.0 + side.sign() * self.slippage_rate);
        let notional = price * order.quantity;
        let fee = notional.abs() * self.fee_rate;

        self.cash -= side.sign() * notional + fee;
        self.fees_paid += fee;
        let realized = self.position.apply_fill(side, order.quantity, price);

        debug!(
            timestamp = self.timestamp,
            %side,
            quantity = order.quantity,
            price,
            fee,
            realized,
            position = self.position.quantity,
            cash = self.cash,
            "Order filled"
        );

        let trade = Trade {
            timestamp: self.timestamp,
            side,
            price,
            quantity: order.quantity,
            order_id: order.client_order_id.clone(),
            fee,
        };
        let index = self.trades.len();
        self.trades.push(trade);
        &self.trades[index]
    }

    /// Mark the position at `close` and return total equity.
    pub(crate) fn mark(&mut self, close: f64) -> f64 {
        self.position.mark(close);
        self.cash + self.position.quantity * close
    }

    pub(crate) fn into_parts(self) -> (Vec<Trade>, f64, f64, Position) {
        (self.trades, self.cash, self.fees_paid, self.position)
    }
}

impl StrategyContext for SimBroker {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn position(&self) -> &Position {
        &self.position
    }

    fn cash(&self) -> f64 {
        self.cash
    }

    fn submit(&mut self, order: OrderRequest) {
        self.pending.push(order);
    }
}
