use super::types::DatasetPartition;
use crate::config::DatasetConfig;
use crate::data::{DataValidator, PriceColumn};
use crate::error::{BarrierLabError, Result};
use polars::prelude::*;
use std::ops::Range;

/// Single chronological train / validation / test cut.
pub struct ChronologicalSplitter {
    config: DatasetConfig,
}

impl ChronologicalSplitter {
    pub fn new(config: DatasetConfig) -> Self {
        Self { config }
    }

    /// Row ranges for `n` time-sorted rows.
    pub fn ranges(&self, n: usize) -> (Range<usize>, Range<usize>, Range<usize>) {
        let train_end = (n as f64 * self.config.train_ratio) as usize;
        let val_end = ((n as f64 * (self.config.train_ratio + self.config.validation_ratio)) as usize)
            .clamp(train_end, n);
        (0..train_end, train_end..val_end, val_end..n)
    }

    /// Sort `df` by timestamp and cut it into three frames.
    pub fn split_frame(&self, df: &DataFrame) -> Result<DatasetPartition> {
        let timestamp = DataValidator::find_column(df, &PriceColumn::Timestamp)
            .ok_or_else(|| BarrierLabError::DataLoading("Missing required column: timestamp".to_string()))?
            .to_string();

        let sorted = df.sort(
            [timestamp.as_str()],
            SortMultipleOptions::default().with_maintain_order(true),
        )?;
        let (train, validation, test) = self.ranges(sorted.height());

        let slice = |range: &Range<usize>| sorted.slice(range.start as i64, range.len());
        let partition = DatasetPartition {
            train: slice(&train),
            validation: slice(&validation),
            test: slice(&test),
        };

        log::info!("Dataset split:");
        log::info!("  Train: {} samples (rows {}..{})", train.len(), train.start, train.end);
        log::info!("  Validation: {} samples (rows {}..{})", validation.len(), validation.start, validation.end);
        log::info!("  Test: {} samples (rows {}..{})", test.len(), test.start, test.end);

        Ok(partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_ranges_floor() {
        let splitter = ChronologicalSplitter::new(DatasetConfig::default());
        let (train, validation, test) = splitter.ranges(11);
        assert_eq!(train, 0..6);
        assert_eq!(validation, 6..8);
        assert_eq!(test, 8..11);
    }

    #[test]
    fn test_split_frame_sorts_first() {
        let df = df! {
            "timestamp" => &["2024-01-05", "2024-01-01", "2024-01-03", "2024-01-02", "2024-01-04"],
            "close" => &[5.0, 1.0, 3.0, 2.0, 4.0],
        }
        .unwrap();

        let splitter = ChronologicalSplitter::new(DatasetConfig {
            train_ratio: 0.6,
            validation_ratio: 0.2,
        });
        let partition = splitter.split_frame(&df).unwrap();
        assert_eq!(partition.train.height(), 3);
        assert_eq!(partition.validation.height(), 1);
        assert_eq!(partition.test.height(), 1);

        let test_close = partition.test.column("close").unwrap().f64().unwrap().get(0);
        assert_eq!(test_close, Some(5.0));
    }
}
