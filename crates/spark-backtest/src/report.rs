//! Backtest report generation.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::metrics::{MetricsConfig, PerformanceSummary};
use crate::BacktestResult;

/// Complete backtest report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Raw simulator output
    pub result: BacktestResult,
    /// Derived statistics
    pub summary: PerformanceSummary,
}

fn format_timestamp(ts: i64) -> String {
    DateTime::from_timestamp_millis(ts)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

impl BacktestReport {
    /// Compute the summary for `result`.
    pub fn new(result: BacktestResult, config: &MetricsConfig) -> Self {
        let summary = PerformanceSummary::from_result(&result, config);
        Self { result, summary }
    }

    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let meta = &self.result.meta;
        let stats = &self.summary;
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                     BACKTEST REPORT                        \n");
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str("RUN\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Symbol:              {} ({})\n", meta.symbol, meta.timeframe));
        s.push_str(&format!("  Strategy:            {}\n", meta.strategy));
        s.push_str(&format!("  Parameters:          {}\n", meta.parameters));
        s.push_str(&format!(
            "  Period:              {} → {}\n",
            format_timestamp(meta.start),
            format_timestamp(meta.end)
        ));
        s.push_str(&format!(
            "  Costs:               {:.1} bps fee, {:.1} bps slippage\n",
            meta.fee_bps, meta.slippage_bps
        ));
        s.push_str(&format!("  Fill Timing:         {}\n", meta.fill_timing));
        s.push('\n');

        s.push_str("PERFORMANCE\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Initial Capital:     ${:.2}\n", stats.initial_cash));
        s.push_str(&format!("  Final Equity:        ${:.2}\n", stats.final_equity));
        s.push_str(&format!(
            "  Total Return:        {:.2}%\n",
            stats.total_return * 100.0
        ));
        s.push_str(&format!(
            "  Annualized Return:   {:.2}%\n",
            stats.annualized_return * 100.0
        ));
        s.push_str(&format!(
            "  Max Drawdown:        {:.2}% ({} bars)\n",
            stats.max_drawdown * 100.0,
            stats.drawdown_duration_bars
        ));
        s.push('\n');

        s.push_str("RISK METRICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Sharpe Ratio:        {:.2}\n", stats.sharpe_ratio));
        s.push_str(&format!("  Sortino Ratio:       {:.2}\n", stats.sortino_ratio));
        s.push_str(&format!("  Calmar Ratio:        {:.2}\n", stats.calmar_ratio));
        s.push_str(&format!("  Profit Factor:       {:.2}\n", stats.profit_factor));
        s.push_str(&format!(
            "  Exposure:            {:.2}%\n",
            stats.exposure * 100.0
        ));
        s.push_str(&format!("  Turnover:            {:.2}x\n", stats.turnover));
        s.push('\n');

        s.push_str("TRADE STATISTICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Fills:               {}\n", stats.total_trades));
        s.push_str(&format!("  Round Trips:         {}\n", stats.round_trips));
        s.push_str(&format!("  Winning Trips:       {}\n", stats.winning_trips));
        s.push_str(&format!("  Losing Trips:        {}\n", stats.losing_trips));
        s.push_str(&format!(
            "  Win Rate:            {:.2}%\n",
            stats.win_rate * 100.0
        ));
        s.push_str(&format!("  Avg Win:             ${:.2}\n", stats.avg_win));
        s.push_str(&format!("  Avg Loss:            ${:.2}\n", stats.avg_loss));
        s.push_str(&format!("  Realized PnL:        ${:.2}\n", stats.realized_pnl));
        s.push_str(&format!("  Fees Paid:           ${:.2}\n", stats.fees_paid));
        s.push('\n');

        s.push_str("EXECUTION\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Bars Processed:      {}\n", meta.bars_processed));
        s.push_str(&format!(
            "  Same-Bar Fills:      {}\n",
            self.result.same_bar_fills
        ));
        if self.result.unfilled_orders > 0 {
            s.push_str(&format!(
                "  Unfilled Orders:     {}\n",
                self.result.unfilled_orders
            ));
        }
        s.push_str(&format!(
            "  Equity Points:       {}\n",
            self.result.equity.len()
        ));
        s.push_str(&format!(
            "  Final Position:      {}\n",
            self.result.final_position.quantity
        ));
        s.push('\n');

        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV (equity curve only).
    pub fn equity_to_csv(&self) -> String {
        let mut csv = String::from("timestamp,equity,cash,position\n");
        for point in &self.result.equity {
            csv.push_str(&format!(
                "{},{},{},{}\n",
                point.timestamp, point.equity, point.cash, point.position
            ));
        }
        csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RunMeta;
    use spark_core::types::{EquityPoint, FillTiming, Position, Side, Timeframe, Trade};

    fn sample_result() -> BacktestResult {
        let equity = [100_000.0, 100_000.0, 104_000.0, 110_000.0]
            .iter()
            .enumerate()
            .map(|(i, &equity)| EquityPoint {
                timestamp: i as i64 * 86_400_000,
                equity,
                cash: 100_000.0,
                position: 0.0,
            })
            .collect();

        BacktestResult {
            trades: vec![
                Trade {
                    timestamp: 86_400_000,
                    side: Side::Buy,
                    price: 100.0,
                    quantity: 1_000.0,
                    order_id: None,
                    fee: 0.0,
                },
                Trade {
                    timestamp: 3 * 86_400_000,
                    side: Side::Sell,
                    price: 110.0,
                    quantity: 1_000.0,
                    order_id: None,
                    fee: 0.0,
                },
            ],
            equity,
            final_cash: 110_000.0,
            realized_pnl: 10_000.0,
            fees_paid: 0.0,
            final_position: Position::flat(),
            same_bar_fills: 2,
            unfilled_orders: 0,
            meta: RunMeta {
                symbol: "TEST".into(),
                timeframe: Timeframe::Daily,
                strategy: "sma_cross".into(),
                parameters: serde_json::json!({ "fast_period": 10 }),
                start: 0,
                end: 3 * 86_400_000,
                initial_cash: 100_000.0,
                bars_processed: 4,
                fee_bps: 0.0,
                slippage_bps: 0.0,
                fill_timing: FillTiming::SameBarClose,
            },
        }
    }

    #[test]
    fn test_report_summary() {
        let report = BacktestReport::new(sample_result(), &MetricsConfig::default());

        assert_eq!(report.summary.round_trips, 1);
        assert_eq!(report.summary.win_rate, 1.0);
        assert_eq!(report.summary.periods_per_year, 365.0);

        let text = report.summary();
        assert!(text.contains("Total Return"));
        assert!(text.contains("10.00%"));
        assert!(text.contains("1970-01-01 00:00"));
        assert!(text.contains("sma_cross"));
        assert!(text.contains("same_bar_close"));
        assert!(text.contains("Same-Bar Fills:      2"));
        assert!(!text.contains("Unfilled Orders"));
    }

    #[test]
    fn test_equity_csv() {
        let report = BacktestReport::new(sample_result(), &MetricsConfig::default());
        let csv = report.equity_to_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "timestamp,equity,cash,position");
        assert_eq!(lines[3], "172800000,104000,100000,0");
    }

    #[test]
    fn test_report_json_round_trip() {
        let report = BacktestReport::new(sample_result(), &MetricsConfig::default());
        let json = report.to_json().unwrap();
        let back: BacktestReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
