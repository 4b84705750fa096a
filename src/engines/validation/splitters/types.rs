use crate::data::series::{read_optional_timestamps, read_timestamps};
use crate::data::{DataValidator, PriceColumn};
use crate::error::{BarrierLabError, Result};
use crate::ml::labeling::LabeledDataset;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-row times a splitter needs, in dataset row order.
///
/// Rows are expected in chronological order: test windows are contiguous
/// position ranges.
#[derive(Debug, Clone, Default)]
pub struct SplitIndex {
    /// When the prediction for a row is made (the bar timestamp).
    pub prediction_times: Vec<DateTime<Utc>>,
    /// When the row's label is known (`hit_time`, else the bar timestamp).
    pub evaluation_times: Vec<DateTime<Utc>>,
}

impl SplitIndex {
    pub fn new(
        prediction_times: Vec<DateTime<Utc>>,
        evaluation_times: Vec<DateTime<Utc>>,
    ) -> Result<Self> {
        if prediction_times.len() != evaluation_times.len() {
            return Err(BarrierLabError::Validation(format!(
                "{} prediction times but {} evaluation times",
                prediction_times.len(),
                evaluation_times.len()
            )));
        }
        Ok(Self {
            prediction_times,
            evaluation_times,
        })
    }

    /// Evaluation time equals prediction time for every row.
    pub fn from_times(times: Vec<DateTime<Utc>>) -> Self {
        Self {
            evaluation_times: times.clone(),
            prediction_times: times,
        }
    }

    /// Rows of `dataset` in [`LabeledDataset::sorted_by_time`] order.
    pub fn from_dataset(dataset: &LabeledDataset) -> Self {
        let rows = dataset.sorted_by_time();
        Self {
            prediction_times: rows.iter().map(|r| r.timestamp).collect(),
            evaluation_times: rows.iter().map(|r| r.evaluation_time()).collect(),
        }
    }

    /// Reads `timestamp` and, when present, `hit_time` from a labeled frame.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let timestamp_name = DataValidator::find_column(df, &PriceColumn::Timestamp).ok_or_else(|| {
            BarrierLabError::DataLoading("Missing required column: timestamp".to_string())
        })?;
        let prediction_times = read_timestamps(df, timestamp_name)?;

        let evaluation_times = if df.column("hit_time").is_ok() {
            read_optional_timestamps(df, "hit_time")?
                .into_iter()
                .zip(&prediction_times)
                .map(|(hit, ts)| hit.unwrap_or(*ts))
                .collect()
        } else {
            prediction_times.clone()
        };

        Self::new(prediction_times, evaluation_times)
    }

    pub fn len(&self) -> usize {
        self.prediction_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prediction_times.is_empty()
    }
}

/// One train/test fold over row positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub fold: usize,
    pub train: Vec<usize>,
    pub test: Vec<usize>,
    pub test_start_time: DateTime<Utc>,
    pub test_end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplitPlan {
    pub splits: Vec<Split>,
    /// Folds computed but not yielded (too little training data).
    pub dropped: Vec<usize>,
}

impl SplitPlan {
    pub fn len(&self) -> usize {
        self.splits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Split> {
        self.splits.iter()
    }
}

/// Chronological train / validation / test frames.
#[derive(Debug, Clone)]
pub struct DatasetPartition {
    pub train: DataFrame,
    pub validation: DataFrame,
    pub test: DataFrame,
}

/// Test window boundaries shared by both cross-validation splitters.
pub(crate) fn test_windows(n_samples: usize, n_splits: usize, test_fraction: f64) -> Result<Vec<(usize, usize)>> {
    let test_size = (n_samples as f64 * test_fraction) as usize;
    if test_size == 0 {
        return Err(BarrierLabError::Validation(format!(
            "{} rows are too few for a test window of {}",
            n_samples, test_fraction
        )));
    }
    if n_splits * test_size > n_samples {
        return Err(BarrierLabError::Validation(format!(
            "{} test windows of {} rows exceed {} rows",
            n_splits, test_size, n_samples
        )));
    }

    Ok((0..n_splits)
        .map(|i| {
            let test_start = n_samples - (n_splits - i) * test_size;
            (test_start, (test_start + test_size).min(n_samples))
        })
        .collect())
}
