use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Price-bar columns recognised on input frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceColumn {
    Ticker,
    Timestamp,
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl PriceColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ticker => "ticker",
            Self::Timestamp => "timestamp",
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
            Self::Volume => "volume",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Self::Ticker,
            Self::Timestamp,
            Self::Open,
            Self::High,
            Self::Low,
            Self::Close,
            Self::Volume,
        ]
    }

    /// Columns that must be present before labeling starts.
    pub fn required(use_hl: bool) -> Vec<Self> {
        if use_hl {
            vec![Self::Close, Self::High, Self::Low]
        } else {
            vec![Self::Close]
        }
    }

    /// Common alternative column names
    pub fn aliases(&self) -> Vec<&'static str> {
        match self {
            Self::Ticker => vec!["ticker", "Ticker", "TICKER", "symbol", "Symbol"],
            Self::Timestamp => vec!["timestamp", "Timestamp", "date", "Date", "datetime", "DateTime", "time"],
            Self::Open => vec!["open", "Open", "OPEN", "o"],
            Self::High => vec!["high", "High", "HIGH", "h"],
            Self::Low => vec!["low", "Low", "LOW", "l"],
            Self::Close => vec!["close", "Close", "CLOSE", "c"],
            Self::Volume => vec!["volume", "Volume", "VOLUME", "vol", "Vol", "v"],
        }
    }
}

/// Summary of a loaded price file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub file_path: String,
    pub num_rows: usize,
    pub num_columns: usize,
    pub columns: Vec<String>,
    pub num_tickers: usize,
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub price_range: (f64, f64), // (min, max)
}
