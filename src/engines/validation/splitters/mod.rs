pub mod base;
pub mod chronological;
pub mod purged;
pub mod time_series;
pub mod types;

pub use base::DataSplitter;
pub use chronological::ChronologicalSplitter;
pub use purged::PurgedSplitter;
pub use time_series::TimeSeriesSplitter;
pub use types::{DatasetPartition, Split, SplitIndex, SplitPlan};

use crate::config::{CrossValidationConfig, CvMethod};

/// Build the cross-validation splitter selected by `config.method`.
pub fn create_splitter(config: &CrossValidationConfig) -> Box<dyn DataSplitter> {
    match config.method {
        CvMethod::TimeSeries => Box::new(TimeSeriesSplitter::new(config.clone())),
        CvMethod::Purged => Box::new(PurgedSplitter::new(config.clone())),
    }
}
