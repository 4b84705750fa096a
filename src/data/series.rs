//! Per-ticker partition of a price frame.
//!
//! Labeling and trade simulation never look across tickers: a frame is split
//! into owned [`TickerSeries`] values first, and each one is processed on its
//! own. `row_index` maps every bar back to its row in the source frame.

use crate::data::connectors::{DataValidator, PriceColumn};
use crate::error::{BarrierLabError, Result};
use crate::types::PriceBar;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;
use std::collections::HashMap;

pub const DEFAULT_TICKER: &str = "UNKNOWN";

#[derive(Debug, Clone)]
pub struct TickerSeries {
    pub ticker: String,
    pub row_index: Vec<usize>,
    pub timestamps: Vec<DateTime<Utc>>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Option<Vec<f64>>,
    /// False when high/low were absent and mirror `close`.
    pub has_high_low: bool,
}

impl TickerSeries {
    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// Build a series from bars of one ticker; bars are sorted by timestamp.
    pub fn from_bars(bars: &[PriceBar]) -> Result<Self> {
        let ticker = bars
            .first()
            .map(|b| b.ticker.clone())
            .unwrap_or_else(|| DEFAULT_TICKER.to_string());

        if let Some(other) = bars.iter().find(|b| b.ticker != ticker) {
            return Err(BarrierLabError::Validation(format!(
                "Series for {} contains a bar of {}",
                ticker, other.ticker
            )));
        }

        let mut order: Vec<usize> = (0..bars.len()).collect();
        order.sort_by_key(|&i| bars[i].timestamp);
        ensure_unique_timestamps(&ticker, order.iter().map(|&i| bars[i].timestamp))?;

        let volume = if bars.iter().all(|b| b.volume.is_some()) {
            Some(order.iter().map(|&i| bars[i].volume.unwrap_or(f64::NAN)).collect())
        } else {
            None
        };

        Ok(Self {
            ticker,
            timestamps: order.iter().map(|&i| bars[i].timestamp).collect(),
            open: order.iter().map(|&i| bars[i].open).collect(),
            high: order.iter().map(|&i| bars[i].high).collect(),
            low: order.iter().map(|&i| bars[i].low).collect(),
            close: order.iter().map(|&i| bars[i].close).collect(),
            volume,
            has_high_low: true,
            row_index: order,
        })
    }

    /// Close-only series; open, high and low mirror the close.
    pub fn from_closes(ticker: &str, timestamps: Vec<DateTime<Utc>>, close: Vec<f64>) -> Result<Self> {
        if timestamps.len() != close.len() {
            return Err(BarrierLabError::Validation(format!(
                "{} timestamps for {} closes",
                timestamps.len(),
                close.len()
            )));
        }
        if timestamps.windows(2).any(|w| w[0] >= w[1]) {
            return Err(BarrierLabError::Validation(format!(
                "Timestamps of {} must be strictly increasing",
                ticker
            )));
        }
        Ok(Self {
            ticker: ticker.to_string(),
            row_index: (0..close.len()).collect(),
            timestamps,
            open: close.clone(),
            high: close.clone(),
            low: close.clone(),
            close,
            volume: None,
            has_high_low: false,
        })
    }

    pub fn bar(&self, i: usize) -> Option<PriceBar> {
        if i >= self.len() {
            return None;
        }
        Some(PriceBar {
            ticker: self.ticker.clone(),
            timestamp: self.timestamps[i],
            open: self.open[i],
            high: self.high[i],
            low: self.low[i],
            close: self.close[i],
            volume: self.volume.as_ref().map(|v| v[i]),
        })
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }
}

/// Split a normalized price frame into one series per ticker.
///
/// Tickers keep the order of their first appearance. A frame without a
/// `ticker` column is one series named [`DEFAULT_TICKER`].
pub fn partition_by_ticker(df: &DataFrame) -> Result<Vec<TickerSeries>> {
    let close_name = DataValidator::find_column(df, &PriceColumn::Close).ok_or_else(|| {
        BarrierLabError::DataLoading("Missing required column: close".to_string())
    })?;
    let timestamp_name = DataValidator::find_column(df, &PriceColumn::Timestamp).ok_or_else(|| {
        BarrierLabError::DataLoading("Missing required column: timestamp".to_string())
    })?;

    let close = read_f64(df, close_name)?;
    let timestamps = read_timestamps(df, timestamp_name)?;
    let high = optional_f64(df, PriceColumn::High)?;
    let low = optional_f64(df, PriceColumn::Low)?;
    let open = optional_f64(df, PriceColumn::Open)?;
    let volume = optional_f64(df, PriceColumn::Volume)?;
    let has_high_low = high.is_some() && low.is_some();

    let tickers: Vec<String> = match DataValidator::find_column(df, &PriceColumn::Ticker) {
        Some(name) => {
            let column = df.column(name)?.cast(&DataType::String)?;
            let ca = column.str()?;
            (0..df.height())
                .map(|i| ca.get(i).unwrap_or(DEFAULT_TICKER).to_string())
                .collect()
        }
        None => vec![DEFAULT_TICKER.to_string(); df.height()],
    };

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (row, ticker) in tickers.iter().enumerate() {
        groups
            .entry(ticker.clone())
            .or_insert_with(|| {
                order.push(ticker.clone());
                Vec::new()
            })
            .push(row);
    }

    let mut partition = Vec::with_capacity(order.len());
    for ticker in order {
        let mut rows = groups.remove(&ticker).unwrap_or_default();
        rows.sort_by_key(|&r| timestamps[r]);
        ensure_unique_timestamps(&ticker, rows.iter().map(|&r| timestamps[r]))?;

        let pick = |values: &[f64]| rows.iter().map(|&r| values[r]).collect::<Vec<f64>>();
        let close_values = pick(&close);

        partition.push(TickerSeries {
            timestamps: rows.iter().map(|&r| timestamps[r]).collect(),
            open: open.as_deref().map(pick).unwrap_or_else(|| close_values.clone()),
            high: high.as_deref().map(pick).unwrap_or_else(|| close_values.clone()),
            low: low.as_deref().map(pick).unwrap_or_else(|| close_values.clone()),
            volume: volume.as_deref().map(pick),
            close: close_values,
            has_high_low,
            row_index: rows,
            ticker,
        });
    }

    Ok(partition)
}

fn ensure_unique_timestamps(
    ticker: &str,
    sorted: impl Iterator<Item = DateTime<Utc>>,
) -> Result<()> {
    let mut previous: Option<DateTime<Utc>> = None;
    for ts in sorted {
        if previous == Some(ts) {
            return Err(BarrierLabError::Validation(format!(
                "Duplicate timestamp {} for ticker {}",
                ts, ticker
            )));
        }
        previous = Some(ts);
    }
    Ok(())
}

fn optional_f64(df: &DataFrame, column: PriceColumn) -> Result<Option<Vec<f64>>> {
    match DataValidator::find_column(df, &column) {
        Some(name) => Ok(Some(read_f64(df, name)?)),
        None => Ok(None),
    }
}

/// Numeric column as f64; nulls become NaN.
pub(crate) fn read_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    let values = column.f64()?;
    Ok((0..values.len()).map(|i| values.get(i).unwrap_or(f64::NAN)).collect())
}

/// Timestamp column stored as string, Date, Datetime or epoch milliseconds.
pub(crate) fn read_timestamps(df: &DataFrame, name: &str) -> Result<Vec<DateTime<Utc>>> {
    read_optional_timestamps(df, name)?
        .into_iter()
        .enumerate()
        .map(|(i, ts)| {
            ts.ok_or_else(|| BarrierLabError::DataLoading(format!("Null timestamp in '{}' at row {}", name, i)))
        })
        .collect()
}

/// Like [`read_timestamps`], keeping nulls (e.g. `hit_time` of undecided rows).
pub(crate) fn read_optional_timestamps(df: &DataFrame, name: &str) -> Result<Vec<Option<DateTime<Utc>>>> {
    let column = df.column(name)?;
    match column.dtype() {
        DataType::String => {
            let values = column.str()?;
            (0..values.len())
                .map(|i| match values.get(i) {
                    Some(raw) if !raw.trim().is_empty() => parse_timestamp(raw).map(Some),
                    _ => Ok(None),
                })
                .collect()
        }
        DataType::Date | DataType::Datetime(_, _) => {
            let millis = column
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                .cast(&DataType::Int64)?;
            millis_to_datetimes(millis.i64()?)
        }
        dtype if dtype.is_integer() => {
            let millis = column.cast(&DataType::Int64)?;
            millis_to_datetimes(millis.i64()?)
        }
        DataType::Null => Ok(vec![None; column.len()]),
        other => Err(BarrierLabError::DataLoading(format!(
            "Column '{}' cannot be read as timestamps ({:?})",
            name, other
        ))),
    }
}

fn millis_to_datetimes(values: &Int64Chunked) -> Result<Vec<Option<DateTime<Utc>>>> {
    (0..values.len())
        .map(|i| match values.get(i) {
            Some(ms) => DateTime::<Utc>::from_timestamp_millis(ms)
                .map(Some)
                .ok_or_else(|| BarrierLabError::DataLoading(format!("Invalid timestamp: {}", ms))),
            None => Ok(None),
        })
        .collect()
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(BarrierLabError::DataLoading(format!("Unrecognised timestamp '{}'", raw)))
}

/// Millisecond datetime column from optional timestamps.
pub(crate) fn datetime_column(name: &str, values: &[Option<DateTime<Utc>>]) -> Result<Column> {
    let millis: Vec<Option<i64>> = values.iter().map(|v| v.map(|ts| ts.timestamp_millis())).collect();
    let series = Series::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    Ok(series.into_column())
}
