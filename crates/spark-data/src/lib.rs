//! Historical bar loading.

mod csv_source;

pub use csv_source::{parse_timestamp, CsvDataSource};

use std::path::{Path, PathBuf};

use spark_core::error::DataError;
use spark_core::types::{BarSeries, Timeframe};

/// Resolve the CSV file for `symbol`.
///
/// A directory is searched for `<SYMBOL>.csv`, `<symbol>.csv` and
/// `<SYMBOL>_daily.csv` in that order; a file is used as is.
pub fn resolve_path(data: &Path, symbol: &str) -> PathBuf {
    if !data.is_dir() {
        return data.to_path_buf();
    }
    let candidates = [
        data.join(format!("{}.csv", symbol)),
        data.join(format!("{}.csv", symbol.to_lowercase())),
        data.join(format!("{}_daily.csv", symbol)),
    ];
    candidates
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .unwrap_or_else(|| candidates[0].clone())
}

/// Load and validate the bar series for `symbol`.
pub fn load_csv(data: &Path, symbol: &str, timeframe: Timeframe) -> Result<BarSeries, DataError> {
    let source = CsvDataSource::new(resolve_path(data, symbol))?;
    source.load(symbol, timeframe)
}
