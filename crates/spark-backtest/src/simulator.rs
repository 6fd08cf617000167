//! Bar-by-bar backtest simulator.

use serde::{Deserialize, Serialize};
use spark_core::error::{StrategyError, TradingError, TradingResult, ValidationError};
use spark_core::traits::{Strategy, StrategyContext};
use spark_core::types::{BarSeries, EquityPoint, FillTiming, OrderRequest};
use tracing::{debug, info, warn};

use crate::broker::SimBroker;
use crate::cancel::CancelHandle;
use crate::result::{BacktestResult, RunMeta};

/// Simulator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Starting cash
    pub initial_cash: f64,
    /// Fee on each fill's notional, in basis points
    pub fee_bps: f64,
    /// Price adjustment against the trader, in basis points
    pub slippage_bps: f64,
    /// Same-bar close (default) or next-bar open
    #[serde(default)]
    pub fill_timing: FillTiming,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            initial_cash: 100_000.0,
            fee_bps: 0.0,
            slippage_bps: 0.0,
            fill_timing: FillTiming::SameBarClose,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.initial_cash.is_finite() {
            return Err(ValidationError::NonFinite {
                field: "initial_cash",
                value: self.initial_cash,
            });
        }
        if self.initial_cash <= 0.0 {
            return Err(ValidationError::NonPositive {
                field: "initial_cash",
                value: self.initial_cash,
            });
        }
        for (field, value) in [("fee_bps", self.fee_bps), ("slippage_bps", self.slippage_bps)] {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite { field, value });
            }
            if value < 0.0 {
                return Err(ValidationError::Negative { field, value });
            }
        }
        Ok(())
    }
}

/// Drives one strategy over one bar series.
///
/// Each bar: orders carried from the previous bar fill at this bar's open
/// (next-bar-open timing only), the strategy sees the bar, its new orders
/// fill at this bar's close or are carried, then one equity point is
/// recorded. Orders still carried after the last bar are dropped and counted
/// in [`BacktestResult::unfilled_orders`].
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulatorConfig,
}

impl Simulator {
    /// Create a simulator, rejecting invalid configuration.
    pub fn new(config: SimulatorConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Run to completion.
    pub fn run(
        &self,
        series: &BarSeries,
        strategy: &mut dyn Strategy,
    ) -> TradingResult<BacktestResult> {
        self.run_with_cancel(series, strategy, &CancelHandle::new())
    }

    /// Run, checking `cancel` before every bar.
    ///
    /// A cancelled run returns [`TradingError::Cancelled`] and no partial
    /// result. A strategy error aborts the run the same way.
    pub fn run_with_cancel(
        &self,
        series: &BarSeries,
        strategy: &mut dyn Strategy,
        cancel: &CancelHandle,
    ) -> TradingResult<BacktestResult> {
        let bars = series.bars();
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            return Err(ValidationError::EmptySeries.into());
        };

        info!(
            symbol = %series.symbol,
            timeframe = %series.timeframe,
            strategy = strategy.name(),
            bars = bars.len(),
            initial_cash = self.config.initial_cash,
            fee_bps = self.config.fee_bps,
            slippage_bps = self.config.slippage_bps,
            fill_timing = %self.config.fill_timing,
            "Starting backtest"
        );

        strategy.reset();
        let name = strategy.name().to_string();

        let mut broker = SimBroker::new(
            self.config.initial_cash,
            self.config.fee_bps,
            self.config.slippage_bps,
        );
        let mut equity = Vec::with_capacity(bars.len());
        let mut carried: Vec<OrderRequest> = Vec::new();
        let mut same_bar_fills = 0;

        for (index, bar) in bars.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    symbol = %series.symbol,
                    bars_processed = index,
                    "Backtest cancelled"
                );
                return Err(TradingError::Cancelled {
                    bars_processed: index,
                });
            }

            broker.set_clock(bar.timestamp);

            for order in carried.drain(..) {
                broker.fill(&order, bar.open);
            }

            let execution_error = |source: StrategyError| TradingError::StrategyExecution {
                strategy: name.clone(),
                bar_index: index,
                timestamp: bar.timestamp,
                source,
            };

            if let Err(err) = strategy.on_bar(bar, &mut broker) {
                return Err(execution_error(err));
            }

            for order in broker.take_orders() {
                if let Err(err) = order.validate() {
                    return Err(execution_error(err.into()));
                }
                match self.config.fill_timing {
                    FillTiming::SameBarClose => {
                        broker.fill(&order, bar.close);
                        same_bar_fills += 1;
                    }
                    FillTiming::NextBarOpen => carried.push(order),
                }
            }

            let value = broker.mark(bar.close);
            equity.push(EquityPoint {
                timestamp: bar.timestamp,
                equity: value,
                cash: broker.cash(),
                position: broker.position_size(),
            });
        }

        let unfilled_orders = carried.len();
        if unfilled_orders > 0 {
            debug!(
                symbol = %series.symbol,
                unfilled_orders,
                "Orders submitted on the last bar were not filled"
            );
        }

        let (trades, final_cash, fees_paid, final_position) = broker.into_parts();

        let result = BacktestResult {
            meta: RunMeta {
                symbol: series.symbol.clone(),
                timeframe: series.timeframe,
                strategy: name,
                parameters: strategy.parameters(),
                start: first.timestamp,
                end: last.timestamp,
                initial_cash: self.config.initial_cash,
                bars_processed: bars.len(),
                fee_bps: self.config.fee_bps,
                slippage_bps: self.config.slippage_bps,
                fill_timing: self.config.fill_timing,
            },
            same_bar_fills,
            unfilled_orders,
            realized_pnl: final_position.realized_pnl,
            trades,
            equity,
            final_cash,
            fees_paid,
            final_position,
        };

        info!(
            symbol = %result.meta.symbol,
            strategy = %result.meta.strategy,
            trades = result.trades.len(),
            final_equity = result.final_equity(),
            realized_pnl = result.realized_pnl,
            fees_paid = result.fees_paid,
            "Backtest complete"
        );

        Ok(result)
    }
}
