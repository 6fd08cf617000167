//! OHLCV (Open, High, Low, Close, Volume) data types.

use serde::{Deserialize, Serialize};

use super::Timeframe;
use crate::error::ValidationError;

/// One OHLCV sample for one instrument.
///
/// Use [`Bar::new`] to build a bar; it enforces
/// `low <= min(open, close) <= max(open, close) <= high`, finite positive
/// prices and a finite non-negative volume. Bars arriving through serde are
/// re-checked with [`Bar::validate`] when a [`BarSeries`] is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Timestamp, Unix milliseconds when produced by the loaders
    pub timestamp: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Traded volume
    pub volume: f64,
}

impl Bar {
    /// Create a validated bar.
    pub fn new(
        timestamp: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, ValidationError> {
        let bar = Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        };
        bar.validate()?;
        Ok(bar)
    }

    /// Check the field invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite { field, value });
            }
        }

        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if value <= 0.0 {
                return Err(ValidationError::NonPositive { field, value });
            }
        }

        if self.volume < 0.0 {
            return Err(ValidationError::Negative {
                field: "volume",
                value: self.volume,
            });
        }

        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);
        if self.low > body_low || body_high > self.high {
            return Err(ValidationError::OhlcOrdering {
                timestamp: self.timestamp,
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }

        Ok(())
    }
}

/// Validated, time-ordered bars for a single instrument.
///
/// Construction is the ingestion boundary for a run: the series is never
/// empty, every bar satisfies [`Bar::validate`] and timestamps are
/// non-decreasing. Nothing is re-sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    /// Symbol identifier
    pub symbol: String,
    /// Timeframe of the bars
    pub timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validate and wrap a bar sequence.
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<Bar>,
    ) -> Result<Self, ValidationError> {
        if bars.is_empty() {
            return Err(ValidationError::EmptySeries);
        }

        for (index, bar) in bars.iter().enumerate() {
            bar.validate()?;
            if index > 0 {
                let previous = bars[index - 1].timestamp;
                if bar.timestamp < previous {
                    return Err(ValidationError::OutOfOrder {
                        index,
                        previous,
                        timestamp: bar.timestamp,
                    });
                }
            }
        }

        Ok(Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        })
    }

    /// Restrict the series to `[start, end]` (inclusive, either bound optional).
    pub fn between(&self, start: Option<i64>, end: Option<i64>) -> Result<Self, ValidationError> {
        let bars: Vec<Bar> = self
            .bars
            .iter()
            .filter(|b| start.map_or(true, |s| b.timestamp >= s))
            .filter(|b| end.map_or(true, |e| b.timestamp <= e))
            .copied()
            .collect();

        if bars.is_empty() {
            return Err(ValidationError::EmptySeries);
        }

        Ok(Self {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            bars,
        })
    }

    /// Sub-series of the bars at `range` (half-open indices).
    pub fn slice(&self, range: std::ops::Range<usize>) -> Result<Self, ValidationError> {
        let bars = self.bars.get(range).unwrap_or_default();
        if bars.is_empty() {
            return Err(ValidationError::EmptySeries);
        }

        Ok(Self {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            bars: bars.to_vec(),
        })
    }

    /// Get the number of bars.
    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series; kept for API symmetry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Get all bars as a slice.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Get the first bar.
    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    /// Get the last bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Extract close prices as a vector.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Get an iterator over the bars.
    pub fn iter(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter()
    }
}
