use super::types::LabelRecord;
use crate::data::series::datetime_column;
use crate::data::TickerSeries;
use crate::error::{BarrierLabError, Result};
use chrono::{DateTime, Utc};
use polars::prelude::*;

/// Columns appended to a price frame by labeling.
pub const LABEL_COLUMNS: [&str; 6] = ["label", "hit_time", "hit_type", "ub", "lb", "vbar_end"];

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRow {
    pub ticker: String,
    pub timestamp: DateTime<Utc>,
    /// Row of the bar in the frame it was partitioned from.
    pub source_row: usize,
    pub record: LabelRecord,
}

impl LabeledRow {
    /// Time the label becomes known; the bar time when undecided.
    pub fn evaluation_time(&self) -> DateTime<Utc> {
        self.record.hit_time.unwrap_or(self.timestamp)
    }
}

/// Labeling output, grouped by ticker in partition order.
#[derive(Debug, Clone, Default)]
pub struct LabeledDataset {
    pub rows: Vec<LabeledRow>,
    pub skipped_tickers: Vec<String>,
}

impl LabeledDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &LabelRecord> + '_ {
        self.rows.iter().map(|r| &r.record)
    }

    pub(crate) fn push_series(&mut self, series: &TickerSeries, records: Vec<LabelRecord>) -> Result<()> {
        if records.len() != series.len() {
            return Err(BarrierLabError::Labeling(format!(
                "{} records for {} bars of {}",
                records.len(),
                series.len(),
                series.ticker
            )));
        }

        self.rows.extend(records.into_iter().enumerate().map(|(i, record)| LabeledRow {
            ticker: series.ticker.clone(),
            timestamp: series.timestamps[i],
            source_row: series.row_index[i],
            record,
        }));
        Ok(())
    }

    /// Rows ordered by bar time across tickers; ties keep ticker order.
    pub fn sorted_by_time(&self) -> Vec<&LabeledRow> {
        let mut rows: Vec<&LabeledRow> = self.rows.iter().collect();
        rows.sort_by_key(|r| r.timestamp);
        rows
    }

    /// One row per labeled bar: ticker, timestamp and the label columns.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let tickers: Vec<&str> = self.rows.iter().map(|r| r.ticker.as_str()).collect();
        let timestamps: Vec<Option<DateTime<Utc>>> = self.rows.iter().map(|r| Some(r.timestamp)).collect();
        let records: Vec<Option<&LabelRecord>> = self.rows.iter().map(|r| Some(&r.record)).collect();

        let mut columns = vec![
            Column::new("ticker".into(), tickers),
            datetime_column("timestamp", &timestamps)?,
        ];
        columns.extend(label_columns(&records)?);
        Ok(DataFrame::new(columns)?)
    }

    /// Append the label columns to `df`, aligned through each row's source
    /// position. Rows that were not labeled stay null.
    pub fn join_onto(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut aligned: Vec<Option<&LabelRecord>> = vec![None; df.height()];
        for row in &self.rows {
            let slot = aligned.get_mut(row.source_row).ok_or_else(|| {
                BarrierLabError::Labeling(format!(
                    "Source row {} is outside a frame of {} rows",
                    row.source_row,
                    df.height()
                ))
            })?;
            *slot = Some(&row.record);
        }

        let mut base = df.clone();
        for name in LABEL_COLUMNS {
            if base.column(name).is_ok() {
                base = base.drop(name)?;
            }
        }
        Ok(base.hstack(&label_columns(&aligned)?)?)
    }
}

fn label_columns(records: &[Option<&LabelRecord>]) -> Result<Vec<Column>> {
    let label: Vec<Option<i64>> = records.iter().map(|r| r.map(|r| r.label.value() as i64)).collect();
    let hit_time: Vec<Option<DateTime<Utc>>> = records.iter().map(|r| r.and_then(|r| r.hit_time)).collect();
    let hit_type: Vec<Option<&str>> = records.iter().map(|r| r.map(|r| r.hit_type.as_str())).collect();
    let ub: Vec<Option<f64>> = records.iter().map(|r| r.and_then(|r| r.upper_barrier)).collect();
    let lb: Vec<Option<f64>> = records.iter().map(|r| r.and_then(|r| r.lower_barrier)).collect();
    let vbar_end: Vec<Option<DateTime<Utc>>> = records
        .iter()
        .map(|r| r.and_then(|r| r.vertical_barrier_time))
        .collect();

    Ok(vec![
        Column::new(LABEL_COLUMNS[0].into(), label),
        datetime_column(LABEL_COLUMNS[1], &hit_time)?,
        Column::new(LABEL_COLUMNS[2].into(), hit_type),
        Column::new(LABEL_COLUMNS[3].into(), ub),
        Column::new(LABEL_COLUMNS[4].into(), lb),
        datetime_column(LABEL_COLUMNS[5], &vbar_end)?,
    ])
}
