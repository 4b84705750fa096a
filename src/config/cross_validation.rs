use super::traits::{invalid, ConfigSection};
use crate::error::BarrierLabError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossValidationConfig {
    pub method: CvMethod,
    pub n_splits: usize,
    /// Fraction of rows in each test window.
    pub test_size: f64,
    pub expanding_window: bool,
    pub min_train_size: usize,
    /// Rows left out between train end and test start.
    pub gap: usize,
    /// Rows after each test window removed from training (purged split only).
    pub purge_length: usize,
    /// Days around the test start excluded from training (purged split only).
    pub embargo_length: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CvMethod {
    TimeSeries,
    Purged,
}

impl Default for CrossValidationConfig {
    fn default() -> Self {
        Self {
            method: CvMethod::TimeSeries,
            n_splits: 5,
            test_size: 0.2,
            expanding_window: true,
            min_train_size: 100,
            gap: 0,
            purge_length: 0,
            embargo_length: 0,
        }
    }
}

impl Default for CvMethod {
    fn default() -> Self {
        CvMethod::TimeSeries
    }
}

impl ConfigSection for CrossValidationConfig {
    fn section_name() -> &'static str {
        "cross_validation"
    }

    fn validate(&self) -> Result<(), BarrierLabError> {
        let section = Self::section_name();
        if self.n_splits == 0 {
            return Err(invalid(section, "n_splits must be at least 1"));
        }
        if self.test_size <= 0.0 || self.test_size >= 1.0 {
            return Err(invalid(section, "test_size must be between 0 and 1"));
        }
        if self.n_splits as f64 * self.test_size > 1.0 + 1e-9 {
            return Err(invalid(
                section,
                format!(
                    "{} test windows of {} do not fit in the dataset",
                    self.n_splits, self.test_size
                ),
            ));
        }
        if self.embargo_length < 0 {
            return Err(invalid(section, "embargo_length must not be negative"));
        }
        Ok(())
    }
}

impl FromStr for CvMethod {
    type Err = BarrierLabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "time_series" => Ok(CvMethod::TimeSeries),
            "purged" => Ok(CvMethod::Purged),
            other => Err(BarrierLabError::Configuration(format!(
                "Unknown CV method: {}",
                other
            ))),
        }
    }
}
