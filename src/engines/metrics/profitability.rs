// src/engines/metrics/profitability.rs
use serde::{Deserialize, Serialize};

/// Trade-outcome statistics over per-trade returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityMetrics {
    pub total_return: f64,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
}

impl ProfitabilityMetrics {
    pub fn calculate(returns: &[f64]) -> Self {
        if returns.is_empty() {
            return Self::default();
        }

        let total_return = returns.iter().map(|r| 1.0 + r).product::<f64>() - 1.0;

        let wins: Vec<f64> = returns.iter().copied().filter(|&r| r > 0.0).collect();
        let losses: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();

        let avg_win = mean(&wins);
        let avg_loss = mean(&losses);

        // Break-even trades count towards neither side.
        let profit_factor = if !losses.is_empty() && avg_loss != 0.0 {
            (wins.len() as f64 * avg_win) / (losses.len() as f64 * avg_loss).abs()
        } else {
            f64::INFINITY
        };

        Self {
            total_return,
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate: wins.len() as f64 / returns.len() as f64,
            avg_win,
            avg_loss,
            profit_factor,
        }
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
