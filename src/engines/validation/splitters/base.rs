use super::types::{SplitIndex, SplitPlan};
use crate::config::CrossValidationConfig;
use crate::error::Result;

pub trait DataSplitter: Send + Sync {
    /// Split the rows of `index` into ordered train/test folds.
    fn split(&self, index: &SplitIndex) -> Result<SplitPlan>;

    /// Get splitter configuration
    fn config(&self) -> &CrossValidationConfig;
}
