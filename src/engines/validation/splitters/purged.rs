use super::base::DataSplitter;
use super::types::{test_windows, Split, SplitIndex, SplitPlan};
use crate::config::CrossValidationConfig;
use crate::error::Result;
use chrono::{DateTime, Utc};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Trailing test windows whose training set excludes every row that could
/// leak label information into the test window.
///
/// A row is dropped from training when its prediction or evaluation time
/// lies inside `[test_start_time, test_end_time]`, when its prediction time
/// is within `embargo_length` whole days of the test start, or when it is one
/// of the `purge_length` rows following the test window. Rows after the test
/// window are otherwise eligible for training.
pub struct PurgedSplitter {
    config: CrossValidationConfig,
}

impl PurgedSplitter {
    pub fn new(config: CrossValidationConfig) -> Self {
        Self { config }
    }

    fn is_excluded(
        &self,
        idx: usize,
        index: &SplitIndex,
        (test_start, test_end): (usize, usize),
        (start_time, end_time): (DateTime<Utc>, DateTime<Utc>),
    ) -> bool {
        if idx >= test_start && idx < test_end + self.config.purge_length {
            return true;
        }

        let pred_time = index.prediction_times[idx];
        let eval_time = index.evaluation_times[idx];
        let within = |t: DateTime<Utc>| t >= start_time && t <= end_time;
        if within(pred_time) || within(eval_time) {
            return true;
        }

        // Whole days, floored
        let days = (pred_time - start_time).num_milliseconds().div_euclid(MILLIS_PER_DAY);
        days.abs() <= self.config.embargo_length
    }
}

impl DataSplitter for PurgedSplitter {
    fn split(&self, index: &SplitIndex) -> Result<SplitPlan> {
        let windows = test_windows(index.len(), self.config.n_splits, self.config.test_size)?;
        let mut plan = SplitPlan::default();

        for (fold, window) in windows.into_iter().enumerate() {
            let (test_start, test_end) = window;
            let bounds = (
                index.prediction_times[test_start],
                index.evaluation_times[test_end - 1],
            );

            let train: Vec<usize> = (0..index.len())
                .filter(|&idx| !self.is_excluded(idx, index, window, bounds))
                .collect();

            if train.is_empty() {
                log::warn!("Split {}: No training samples after purging", fold);
                plan.dropped.push(fold);
                continue;
            }

            log::info!(
                "Purged Split {}: Train size: {}, Test size: {}",
                fold,
                train.len(),
                test_end - test_start
            );

            plan.splits.push(Split {
                fold,
                train,
                test: (test_start..test_end).collect(),
                test_start_time: bounds.0,
                test_end_time: bounds.1,
            });
        }

        Ok(plan)
    }

    fn config(&self) -> &CrossValidationConfig {
        &self.config
    }
}
