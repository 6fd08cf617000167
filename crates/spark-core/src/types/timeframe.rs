//! Bar intervals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DataError;

/// Bar interval of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    #[default]
    Daily,
    #[serde(rename = "1w")]
    Weekly,
}

impl Timeframe {
    /// Get the duration of the timeframe in seconds.
    pub fn as_secs(&self) -> u64 {
        match self {
            Timeframe::Minute1 => 60,
            Timeframe::Minute5 => 300,
            Timeframe::Minute15 => 900,
            Timeframe::Hour1 => 3600,
            Timeframe::Hour4 => 14400,
            Timeframe::Daily => 86400,
            Timeframe::Weekly => 604800,
        }
    }

    /// Get the duration of the timeframe in milliseconds.
    pub fn as_millis(&self) -> u64 {
        self.as_secs() * 1000
    }

    /// Bars per year on a market that trades around the clock.
    ///
    /// Used as the default annualization factor for Sharpe/Sortino/Calmar.
    pub fn periods_per_year(&self) -> f64 {
        const SECS_PER_YEAR: f64 = 365.0 * 86400.0;
        SECS_PER_YEAR / self.as_secs() as f64
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::Minute1 => "1m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute15 => "15m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Daily => "1d",
            Timeframe::Weekly => "1w",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Timeframe {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1m" | "1min" | "minute" => Ok(Timeframe::Minute1),
            "5m" | "5min" => Ok(Timeframe::Minute5),
            "15m" | "15min" => Ok(Timeframe::Minute15),
            "1h" | "1hour" | "hour" => Ok(Timeframe::Hour1),
            "4h" | "4hour" => Ok(Timeframe::Hour4),
            "1d" | "day" | "daily" => Ok(Timeframe::Daily),
            "1w" | "week" | "weekly" => Ok(Timeframe::Weekly),
            _ => Err(DataError::InvalidTimeframe(s.to_string())),
        }
    }
}
