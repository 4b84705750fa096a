// src/engines/metrics/risk.rs
use crate::types::{DrawdownPoint, EquityPoint, Trade};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
}

impl RiskMetrics {
    pub fn calculate(
        total_return: f64,
        returns: &[f64],
        drawdown: &[DrawdownPoint],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        let annualized_return = Self::annualized_return(total_return, start, end);
        let volatility = Self::volatility(returns);
        let sharpe_ratio = if volatility > 0.0 {
            annualized_return / volatility
        } else {
            0.0
        };
        let max_drawdown = drawdown
            .iter()
            .map(|p| p.drawdown)
            .fold(0.0, f64::min);

        Self {
            annualized_return,
            volatility,
            sharpe_ratio,
            max_drawdown,
        }
    }

    /// Compounds `total_return` over whole calendar days between `start` and `end`.
    pub fn annualized_return(total_return: f64, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        let days = (end - start).num_days();
        if days <= 0 {
            return 0.0;
        }
        (1.0 + total_return).powf(DAYS_PER_YEAR / days as f64) - 1.0
    }

    /// Population standard deviation of trade returns, annualized.
    pub fn volatility(returns: &[f64]) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        Self::std_dev(returns) * TRADING_DAYS_PER_YEAR.sqrt()
    }

    /// Compounded equity after each trade, ordered by exit date.
    pub fn equity_curve(trades: &[Trade]) -> Vec<EquityPoint> {
        let mut ordered: Vec<&Trade> = trades.iter().collect();
        ordered.sort_by_key(|t| t.exit_date);

        let mut equity = 1.0;
        ordered
            .into_iter()
            .map(|t| {
                equity *= 1.0 + t.return_pct;
                EquityPoint {
                    date: t.exit_date,
                    equity,
                    trade_return: t.return_pct,
                }
            })
            .collect()
    }

    /// `(equity - running_max) / running_max`; never positive.
    pub fn drawdown_curve(equity: &[EquityPoint]) -> Vec<DrawdownPoint> {
        let mut peak = f64::NEG_INFINITY;
        equity
            .iter()
            .map(|p| {
                if p.equity > peak {
                    peak = p.equity;
                }
                DrawdownPoint {
                    date: p.date,
                    drawdown: (p.equity - peak) / peak,
                }
            })
            .collect()
    }

    fn std_dev(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let variance = values.iter()
            .map(|&v| (v - mean).powi(2))
            .sum::<f64>() / values.len() as f64;

        variance.sqrt()
    }
}
