//! CSV data source.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use spark_core::error::DataError;
use spark_core::types::{Bar, BarSeries, Timeframe};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "timestamp", alias = "Timestamp", alias = "time")]
    date: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    // An "Adj Close" column is ignored
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
}

/// CSV data source for historical bars.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    path: PathBuf,
}

impl CsvDataSource {
    /// Create a new CSV data source.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DataError::NoDataAvailable(path.display().to_string()));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every row into a validated series.
    pub fn load(&self, symbol: &str, timeframe: Timeframe) -> Result<BarSeries, DataError> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| DataError::ParseError(format!("{}: {}", self.path.display(), e)))?;

        let series = Self::read_series(reader, symbol, timeframe)?;
        info!(
            symbol,
            path = %self.path.display(),
            bars = series.len(),
            "Loaded bars from CSV"
        );
        Ok(series)
    }

    /// Parse CSV text from any reader.
    pub fn from_reader<R: Read>(
        reader: R,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<BarSeries, DataError> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self::read_series(reader, symbol, timeframe)
    }

    fn read_series<R: Read>(
        mut reader: csv::Reader<R>,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<BarSeries, DataError> {
        let mut bars = Vec::new();

        for (row, result) in reader.deserialize().enumerate() {
            let record: CsvRecord =
                result.map_err(|e| DataError::ParseError(format!("row {}: {}", row + 1, e)))?;

            let timestamp = parse_timestamp(&record.date)?;
            bars.push(Bar::new(
                timestamp,
                record.open,
                record.high,
                record.low,
                record.close,
                record.volume,
            )?);
        }

        if bars.is_empty() {
            return Err(DataError::NoDataAvailable(symbol.to_string()));
        }

        // Files are often newest-first
        if bars.windows(2).any(|w| w[1].timestamp < w[0].timestamp) {
            warn!(symbol, "Rows are out of timestamp order, sorting");
            bars.sort_by_key(|b| b.timestamp);
        }

        Ok(BarSeries::new(symbol, timeframe, bars)?)
    }
}

/// Parse a date, datetime or Unix timestamp into Unix milliseconds (UTC).
///
/// Integers with more than ten digits are taken as milliseconds, shorter
/// ones as seconds.
pub fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    let date_str = date_str.trim();

    if let Ok(ts) = date_str.parse::<i64>() {
        return Ok(if ts.abs() > 10_000_000_000 { ts } else { ts * 1000 });
    }

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
    for format in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    let date_formats = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    for format in date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(date_str, format) {
            return Ok(d.and_time(NaiveTime::MIN).and_utc().timestamp_millis());
        }
    }

    Err(DataError::ParseError(format!(
        "Could not parse date: {}",
        date_str
    )))
}
