//! Walk-forward validation over train/validate/test splits.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use spark_core::error::{StrategyError, TradingResult, ValidationError};
use spark_core::traits::Strategy;
use spark_core::types::BarSeries;
use tracing::{debug, info};

use super::Optimizer;
use crate::metrics::{finite_or_zero, PerformanceSummary};

/// Absorbs float error in `len * ratio` before flooring.
const SPLIT_EPSILON: f64 = 1e-9;

/// How a series is cut into folds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForwardConfig {
    pub train_ratio: f64,
    /// Zero disables the validation segment
    pub validate_ratio: f64,
    pub test_ratio: f64,
    /// Slide a window of `train + validate + test` of the series by `step`
    /// instead of making one split
    pub rolling: bool,
    /// Rolling step as a fraction of the series
    pub step: f64,
    /// Test/train Sharpe ratio below which parameters count as overfit
    pub overfit_threshold: f64,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.6,
            validate_ratio: 0.2,
            test_ratio: 0.2,
            rolling: false,
            step: 0.2,
            overfit_threshold: 0.6,
        }
    }
}

impl WalkForwardConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("train_ratio", self.train_ratio),
            ("validate_ratio", self.validate_ratio),
            ("test_ratio", self.test_ratio),
            ("step", self.step),
            ("overfit_threshold", self.overfit_threshold),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite { field, value });
            }
        }
        for (field, value) in [("train_ratio", self.train_ratio), ("test_ratio", self.test_ratio)] {
            if value <= 0.0 {
                return Err(ValidationError::NonPositive { field, value });
            }
        }
        if self.validate_ratio < 0.0 {
            return Err(ValidationError::Negative {
                field: "validate_ratio",
                value: self.validate_ratio,
            });
        }
        let total = self.train_ratio + self.validate_ratio + self.test_ratio;
        if total > 1.0 + SPLIT_EPSILON {
            return Err(ValidationError::InvalidParameter(format!(
                "train, validate and test ratios sum to {} (more than 1)",
                total
            )));
        }
        if self.rolling && self.step <= 0.0 {
            return Err(ValidationError::NonPositive {
                field: "step",
                value: self.step,
            });
        }
        Ok(())
    }
}

/// Half-open range of bar indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    pub index: usize,
    pub train: Segment,
    pub validate: Option<Segment>,
    pub test: Segment,
}

fn split_point(len: usize, ratio: f64) -> usize {
    (len as f64 * ratio + SPLIT_EPSILON).floor() as usize
}

/// Cut `len` bars into folds.
///
/// A single split takes its ratios of the whole series and runs the test
/// segment to the end. A rolling window spans `train + validate + test` of
/// the series, is divided in proportion to those ratios, and advances by
/// `step` until the next window would overrun the series. Every segment of
/// every fold must hold at least one bar.
pub fn build_folds(len: usize, config: &WalkForwardConfig) -> Result<Vec<Fold>, ValidationError> {
    config.validate()?;

    let total = config.train_ratio + config.validate_ratio + config.test_ratio;
    // Inside a rolling window the ratios are shares of the window
    let scale = if config.rolling { total } else { 1.0 };
    let train_share = config.train_ratio / scale;
    let validate_share = config.validate_ratio / scale;

    let split = |index: usize, start: usize, window: usize, end: usize| {
        let train_end = start + split_point(window, train_share);
        let validate_end = if validate_share > 0.0 {
            start + split_point(window, train_share + validate_share)
        } else {
            train_end
        };
        Fold {
            index,
            train: Segment {
                start,
                end: train_end,
            },
            validate: (validate_share > 0.0).then_some(Segment {
                start: train_end,
                end: validate_end,
            }),
            test: Segment {
                start: validate_end,
                end,
            },
        }
    };

    let folds = if config.rolling {
        let window = split_point(len, total);
        let step = split_point(len, config.step);
        if window == 0 || step == 0 {
            return Err(ValidationError::InvalidParameter(format!(
                "{} bars are too few for a rolling window",
                len
            )));
        }
        (0..)
            .map(|i| i * step)
            .take_while(|start| start + window <= len)
            .enumerate()
            .map(|(index, start)| split(index, start, window, start + window))
            .collect::<Vec<_>>()
    } else {
        vec![split(0, 0, len, len)]
    };

    for fold in &folds {
        let segments = [
            ("train", Some(fold.train)),
            ("validate", fold.validate),
            ("test", Some(fold.test)),
        ];
        for (name, segment) in segments {
            if segment.is_some_and(|s| s.is_empty()) {
                return Err(ValidationError::InvalidParameter(format!(
                    "fold {} has an empty {} segment ({} bars)",
                    fold.index, name, len
                )));
            }
        }
    }

    Ok(folds)
}

/// The figures compared across segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetrics {
    pub sharpe: f64,
    pub win_rate: f64,
    pub max_drawdown: f64,
    pub net_pnl: f64,
    /// Completed round trips
    pub trades: usize,
}

impl From<&PerformanceSummary> for SegmentMetrics {
    fn from(summary: &PerformanceSummary) -> Self {
        Self {
            sharpe: summary.sharpe_ratio,
            win_rate: summary.win_rate,
            max_drawdown: summary.max_drawdown,
            net_pnl: summary.net_pnl,
            trades: summary.round_trips,
        }
    }
}

impl SegmentMetrics {
    /// Mean of every field, with the trade count rounded. Zero when empty.
    pub fn average<'a>(metrics: impl IntoIterator<Item = &'a SegmentMetrics>) -> Self {
        let mut sum = SegmentMetrics::default();
        let mut trades = 0usize;
        let mut count = 0usize;
        for m in metrics {
            sum.sharpe += m.sharpe;
            sum.win_rate += m.win_rate;
            sum.max_drawdown += m.max_drawdown;
            sum.net_pnl += m.net_pnl;
            trades += m.trades;
            count += 1;
        }
        if count == 0 {
            return sum;
        }

        let n = count as f64;
        Self {
            sharpe: sum.sharpe / n,
            win_rate: sum.win_rate / n,
            max_drawdown: sum.max_drawdown / n,
            net_pnl: sum.net_pnl / n,
            trades: (trades as f64 / n).round() as usize,
        }
    }
}

/// Out-of-sample Sharpe relative to in-sample Sharpe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverfitCheck {
    /// `test_sharpe / train_sharpe`; a zero train Sharpe divides by one
    pub ratio: f64,
    pub threshold: f64,
    pub detected: bool,
}

impl OverfitCheck {
    pub fn new(train_sharpe: f64, test_sharpe: f64, threshold: f64) -> Self {
        let denominator = if train_sharpe == 0.0 { 1.0 } else { train_sharpe };
        let ratio = finite_or_zero(test_sharpe / denominator);
        Self {
            ratio,
            threshold,
            detected: ratio < threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldReport {
    pub index: usize,
    pub bounds: Fold,
    pub train: SegmentMetrics,
    pub validate: Option<SegmentMetrics>,
    pub test: SegmentMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardReport {
    pub folds: usize,
    pub overfitting: OverfitCheck,
    /// Averages across folds
    pub train: SegmentMetrics,
    pub validate: Option<SegmentMetrics>,
    pub test: SegmentMetrics,
    pub fold_details: Vec<FoldReport>,
}

impl<F> Optimizer<F>
where
    F: Fn(Value) -> Result<Box<dyn Strategy>, StrategyError> + Sync,
{
    /// Run `params` on every segment of every fold.
    ///
    /// Each segment gets its own strategy instance and starting cash, so
    /// indicators warm up again at the start of every segment.
    pub fn walk_forward(
        &self,
        series: &BarSeries,
        params: &Value,
        config: &WalkForwardConfig,
    ) -> TradingResult<WalkForwardReport> {
        let folds = build_folds(series.len(), config)?;

        let mut fold_details = Vec::with_capacity(folds.len());
        for fold in folds {
            let train = self.run_segment(series, fold.train, params)?;
            let validate = fold
                .validate
                .map(|segment| self.run_segment(series, segment, params))
                .transpose()?;
            let test = self.run_segment(series, fold.test, params)?;
            debug!(
                fold = fold.index,
                train_sharpe = train.sharpe,
                test_sharpe = test.sharpe,
                "Walk-forward fold complete"
            );
            fold_details.push(FoldReport {
                index: fold.index,
                bounds: fold,
                train,
                validate,
                test,
            });
        }

        let train = SegmentMetrics::average(fold_details.iter().map(|f| &f.train));
        let validate = fold_details
            .iter()
            .any(|f| f.validate.is_some())
            .then(|| SegmentMetrics::average(fold_details.iter().filter_map(|f| f.validate.as_ref())));
        let test = SegmentMetrics::average(fold_details.iter().map(|f| &f.test));
        let overfitting = OverfitCheck::new(train.sharpe, test.sharpe, config.overfit_threshold);

        info!(
            symbol = %series.symbol,
            folds = fold_details.len(),
            train_sharpe = train.sharpe,
            test_sharpe = test.sharpe,
            ratio = overfitting.ratio,
            overfit = overfitting.detected,
            "Walk-forward complete"
        );

        Ok(WalkForwardReport {
            folds: fold_details.len(),
            overfitting,
            train,
            validate,
            test,
            fold_details,
        })
    }

    fn run_segment(
        &self,
        series: &BarSeries,
        segment: Segment,
        params: &Value,
    ) -> TradingResult<SegmentMetrics> {
        let bars = series.slice(segment.start..segment.end)?;
        let summary = self.evaluate(&bars, params.clone())?;
        Ok(SegmentMetrics::from(&summary))
    }
}
