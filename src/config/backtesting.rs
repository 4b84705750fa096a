use super::traits::{invalid, ConfigSection};
use crate::error::BarrierLabError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestingConfig {
    /// Minimum winning-class probability before a signal is acted on.
    pub confidence_threshold: f64,
    /// Maximum bars a position is held.
    pub holding_period: usize,
    /// Charged on entry and on exit, as a fraction of price.
    pub transaction_cost: f64,
}

impl Default for BacktestingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            holding_period: 10,
            transaction_cost: 0.001,
        }
    }
}

impl ConfigSection for BacktestingConfig {
    fn section_name() -> &'static str {
        "backtesting"
    }

    fn validate(&self) -> Result<(), BarrierLabError> {
        let section = Self::section_name();
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(invalid(section, "Confidence threshold must be between 0 and 1"));
        }
        if self.holding_period == 0 {
            return Err(invalid(section, "Holding period must be at least 1 bar"));
        }
        if !(0.0..1.0).contains(&self.transaction_cost) {
            return Err(invalid(section, "Transaction cost must be in [0, 1)"));
        }
        Ok(())
    }
}
