// src/engines/metrics/benchmark.rs
use super::profitability::mean;
use crate::data::series::read_f64;
use crate::data::{DataValidator, PriceColumn};
use crate::error::{BarrierLabError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Benchmark simple returns, compared with trade returns by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkSeries {
    pub returns: Vec<f64>,
}

impl BenchmarkSeries {
    pub fn new(returns: Vec<f64>) -> Self {
        Self { returns }
    }

    /// Simple returns of consecutive closes; the first bar has none.
    pub fn from_closes(closes: &[f64]) -> Self {
        let returns = closes
            .windows(2)
            .map(|w| w[1] / w[0] - 1.0)
            .filter(|r| r.is_finite())
            .collect();
        Self { returns }
    }

    /// Reads the close column of a benchmark price frame, sorted by timestamp
    /// when one is present.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let close = DataValidator::find_column(df, &PriceColumn::Close).ok_or_else(|| {
            BarrierLabError::DataLoading("Benchmark data has no close column".to_string())
        })?;

        let df = match DataValidator::find_column(df, &PriceColumn::Timestamp) {
            Some(ts) => df.sort([ts], SortMultipleOptions::default().with_maintain_order(true))?,
            None => df.clone(),
        };
        Ok(Self::from_closes(&read_f64(&df, close)?))
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    pub alpha: f64,
    pub beta: f64,
    /// Compounded return of the aligned benchmark returns.
    pub benchmark_return: f64,
}

impl BenchmarkComparison {
    /// Aligns both series by position up to the shorter length.
    pub fn calculate(strategy: &[f64], benchmark: &BenchmarkSeries) -> Self {
        let n = strategy.len().min(benchmark.len());
        let s = &strategy[..n];
        let b = &benchmark.returns[..n];

        let benchmark_return = b.iter().map(|r| 1.0 + r).product::<f64>() - 1.0;

        if n < 2 {
            return Self {
                benchmark_return,
                ..Default::default()
            };
        }

        let mean_s = mean(s);
        let mean_b = mean(b);
        let covariance = s
            .iter()
            .zip(b)
            .map(|(x, y)| (x - mean_s) * (y - mean_b))
            .sum::<f64>()
            / (n - 1) as f64;
        // Sample covariance over population variance.
        let variance = b.iter().map(|y| (y - mean_b).powi(2)).sum::<f64>() / n as f64;

        if variance == 0.0 {
            return Self {
                benchmark_return,
                ..Default::default()
            };
        }

        let beta = covariance / variance;
        Self {
            alpha: mean_s - beta * mean_b,
            beta,
            benchmark_return,
        }
    }
}
