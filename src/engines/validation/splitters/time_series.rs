use super::base::DataSplitter;
use super::types::{test_windows, Split, SplitIndex, SplitPlan};
use crate::config::CrossValidationConfig;
use crate::error::Result;

/// Trailing test windows with an expanding or sliding training window.
pub struct TimeSeriesSplitter {
    config: CrossValidationConfig,
}

impl TimeSeriesSplitter {
    pub fn new(config: CrossValidationConfig) -> Self {
        Self { config }
    }
}

impl DataSplitter for TimeSeriesSplitter {
    fn split(&self, index: &SplitIndex) -> Result<SplitPlan> {
        let windows = test_windows(index.len(), self.config.n_splits, self.config.test_size)?;
        let mut plan = SplitPlan::default();

        for (fold, (test_start, test_end)) in windows.into_iter().enumerate() {
            let train_end = test_start.saturating_sub(self.config.gap);
            let train_start = if self.config.expanding_window {
                0
            } else {
                train_end.saturating_sub(self.config.min_train_size)
            };

            if train_end - train_start < self.config.min_train_size {
                log::warn!(
                    "Split {}: Training set too small ({} < {}), skipping",
                    fold,
                    train_end - train_start,
                    self.config.min_train_size
                );
                plan.dropped.push(fold);
                continue;
            }

            log::info!(
                "Split {}: Train [{}:{}] ({} samples), Test [{}:{}] ({} samples)",
                fold,
                train_start,
                train_end,
                train_end - train_start,
                test_start,
                test_end,
                test_end - test_start
            );

            plan.splits.push(Split {
                fold,
                train: (train_start..train_end).collect(),
                test: (test_start..test_end).collect(),
                test_start_time: index.prediction_times[test_start],
                test_end_time: index.evaluation_times[test_end - 1],
            });
        }

        Ok(plan)
    }

    fn config(&self) -> &CrossValidationConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn index(n: usize) -> SplitIndex {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        SplitIndex::from_times((0..n).map(|i| start + Duration::days(i as i64)).collect())
    }

    fn config(expanding_window: bool, min_train_size: usize, gap: usize) -> CrossValidationConfig {
        CrossValidationConfig {
            n_splits: 3,
            test_size: 0.2,
            expanding_window,
            min_train_size,
            gap,
            ..Default::default()
        }
    }

    #[test]
    fn test_expanding_window() {
        let plan = TimeSeriesSplitter::new(config(true, 10, 0)).split(&index(100)).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.splits[0].train, (0..40).collect::<Vec<_>>());
        assert_eq!(plan.splits[0].test, (40..60).collect::<Vec<_>>());
        assert_eq!(plan.splits[2].train.len(), 80);
    }

    #[test]
    fn test_sliding_window_with_gap() {
        let plan = TimeSeriesSplitter::new(config(false, 30, 5)).split(&index(100)).unwrap();
        let first = &plan.splits[0];
        assert_eq!(first.train, (5..35).collect::<Vec<_>>());
        assert_eq!(first.test[0], 40);
        assert!(plan.iter().all(|s| s.train.len() == 30));
    }

    #[test]
    fn test_small_training_window_dropped() {
        let plan = TimeSeriesSplitter::new(config(true, 50, 0)).split(&index(100)).unwrap();
        assert_eq!(plan.dropped, vec![0]);
        assert_eq!(plan.splits.iter().map(|s| s.fold).collect::<Vec<_>>(), vec![1, 2]);
    }
}
