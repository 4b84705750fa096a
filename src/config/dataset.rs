use super::traits::{invalid, ConfigSection};
use crate::error::BarrierLabError;
use serde::{Deserialize, Serialize};

/// Chronological train/validation/test ratios; the test set takes the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub train_ratio: f64,
    pub validation_ratio: f64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.6,
            validation_ratio: 0.2,
        }
    }
}

impl ConfigSection for DatasetConfig {
    fn section_name() -> &'static str {
        "dataset"
    }

    fn validate(&self) -> Result<(), BarrierLabError> {
        let section = Self::section_name();
        if self.train_ratio <= 0.0 || self.train_ratio >= 1.0 {
            return Err(invalid(section, "train_ratio must be between 0 and 1"));
        }
        if self.validation_ratio < 0.0 || self.validation_ratio >= 1.0 {
            return Err(invalid(section, "validation_ratio must be between 0 and 1"));
        }
        if self.train_ratio + self.validation_ratio >= 1.0 {
            return Err(invalid(section, "train and validation ratios leave no test data"));
        }
        Ok(())
    }
}
