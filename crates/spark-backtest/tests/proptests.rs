use proptest::prelude::*;
use spark_backtest::metrics::{
    calculate_annualized_return, calculate_calmar_ratio, calculate_drawdown,
    calculate_exposure_from_positions, calculate_sharpe_ratio, calculate_sortino_ratio,
    calculate_turnover_from_fills, calculate_win_rate_from_fills, average_equity,
};
use spark_backtest::{Simulator, SimulatorConfig};
use spark_core::types::{Bar, BarSeries, EquityPoint, PositionSample, Side, Timeframe, Trade};
use spark_strategies::StrategyRegistry;

fn curve(values: &[f64]) -> Vec<EquityPoint> {
    values
        .iter()
        .copied()
        .enumerate()
        .map(|(idx, equity)| EquityPoint {
            timestamp: idx as i64,
            equity,
            cash: equity,
            position: 0.0,
        })
        .collect()
}

fn bar(ts: i64, close: f64) -> Bar {
    Bar::new(ts, close, close, close, close, 1.0).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn ratios_are_finite(equity in prop::collection::vec(0.01f64..100_000.0, 0..200)) {
        let points = curve(&equity);
        prop_assert!(calculate_sharpe_ratio(&equity, 0.02, 252.0).is_finite());
        prop_assert!(calculate_sortino_ratio(&equity, 0.02, 252.0, 0.0).is_finite());
        prop_assert!(calculate_calmar_ratio(&points, 252.0).is_finite());
        prop_assert!(calculate_annualized_return(&equity, 252.0).is_finite());
        prop_assert!(average_equity(&points).is_finite());
    }

    #[test]
    fn drawdown_is_bounded_for_positive_equity(equity in prop::collection::vec(0.01f64..100_000.0, 2..200)) {
        let dd = calculate_drawdown(&curve(&equity));
        prop_assert!((0.0..=1.0).contains(&dd.max_drawdown));
        prop_assert!(dd.peak_index <= dd.trough_index);
        prop_assert!(dd.duration_bars < equity.len());
    }

    #[test]
    fn fill_metrics_are_bounded(
        fills in prop::collection::vec((any::<bool>(), 1.0f64..500.0, 0.1f64..20.0, 0.0f64..1.0), 0..60),
        avg_equity in 0.0f64..1_000_000.0,
    ) {
        let trades: Vec<Trade> = fills
            .iter()
            .enumerate()
            .map(|(idx, &(buy, price, quantity, fee))| Trade {
                timestamp: idx as i64,
                side: if buy { Side::Buy } else { Side::Sell },
                price,
                quantity,
                order_id: None,
                fee,
            })
            .collect();

        let win_rate = calculate_win_rate_from_fills(&trades);
        prop_assert!((0.0..=1.0).contains(&win_rate));

        let turnover = calculate_turnover_from_fills(&trades, avg_equity);
        prop_assert!(turnover.is_finite() && turnover >= 0.0);
    }

    #[test]
    fn exposure_is_a_fraction(
        samples in prop::collection::vec((0i64..5, -3.0f64..3.0), 0..100),
    ) {
        let mut ts = 0i64;
        let history: Vec<PositionSample> = samples
            .iter()
            .map(|&(step, quantity)| {
                ts += step;
                PositionSample { timestamp: ts, quantity }
            })
            .collect();
        let exposure = calculate_exposure_from_positions(&history);
        prop_assert!((0.0..=1.0).contains(&exposure));
    }

    #[test]
    fn simulator_conserves_equity(prices in prop::collection::vec(0.01f64..10_000.0, 1..120)) {
        let bars: Vec<Bar> = prices
            .iter()
            .copied()
            .enumerate()
            .map(|(idx, close)| bar(idx as i64, close))
            .collect();
        let series = BarSeries::new("PROP", Timeframe::Hour1, bars).unwrap();

        let mut strategy = StrategyRegistry::new()
            .create("sma_cross", serde_json::json!({ "fast_period": 2, "slow_period": 5 }))
            .unwrap();
        let result = Simulator::new(SimulatorConfig {
            initial_cash: 10_000.0,
            fee_bps: 10.0,
            slippage_bps: 5.0,
            ..Default::default()
        })
        .unwrap()
        .run(&series, strategy.as_mut())
        .unwrap();

        prop_assert_eq!(result.equity.len(), prices.len());
        for (point, close) in result.equity.iter().zip(&prices) {
            let expected = point.cash + point.position * close;
            prop_assert!((point.equity - expected).abs() <= 1e-9 * expected.abs().max(1.0));
        }
    }
}
