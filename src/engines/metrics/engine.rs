// src/engines/metrics/engine.rs
use crate::engines::metrics::{BenchmarkComparison, BenchmarkSeries, ProfitabilityMetrics, RiskMetrics};
use crate::types::*;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Turns a closed set of trades into a [`BacktestResult`].
pub struct MetricsEngine<'a> {
    benchmark: Option<&'a BenchmarkSeries>,
}

impl<'a> MetricsEngine<'a> {
    pub fn new(benchmark: Option<&'a BenchmarkSeries>) -> Self {
        Self { benchmark }
    }

    /// `start` / `end` bound the evaluated data and set the annualization span.
    pub fn evaluate(&self, trades: Vec<Trade>, start: DateTime<Utc>, end: DateTime<Utc>) -> BacktestResult {
        if trades.is_empty() {
            log::warn!("No trades executed; returning an empty result");
            return BacktestResult::default();
        }

        let returns: Vec<f64> = trades.iter().map(|t| t.return_pct).collect();

        let profit = ProfitabilityMetrics::calculate(&returns);
        let equity_curve = RiskMetrics::equity_curve(&trades);
        let drawdown_curve = RiskMetrics::drawdown_curve(&equity_curve);
        let risk = RiskMetrics::calculate(profit.total_return, &returns, &drawdown_curve, start, end);

        let comparison = self
            .benchmark
            .map(|benchmark| BenchmarkComparison::calculate(&returns, benchmark))
            .unwrap_or_default();
        let excess_return = risk.annualized_return - comparison.benchmark_return;

        let mut trades_per_ticker = BTreeMap::new();
        for trade in &trades {
            *trades_per_ticker.entry(trade.ticker.clone()).or_insert(0) += 1;
        }

        let summary = PerformanceSummary {
            total_trades: trades.len(),
            winning_trades: profit.winning_trades,
            losing_trades: profit.losing_trades,
            total_return: profit.total_return,
            annualized_return: risk.annualized_return,
            volatility: risk.volatility,
            sharpe_ratio: risk.sharpe_ratio,
            max_drawdown: risk.max_drawdown,
            win_rate: profit.win_rate,
            avg_win: profit.avg_win,
            avg_loss: profit.avg_loss,
            profit_factor: profit.profit_factor,
            alpha: comparison.alpha,
            beta: comparison.beta,
            benchmark_return: comparison.benchmark_return,
            excess_return,
            trades_per_ticker,
        };

        log_summary(&summary);

        BacktestResult {
            summary,
            trades,
            equity_curve,
            drawdown_curve,
        }
    }
}

fn log_summary(summary: &PerformanceSummary) {
    log::info!("Backtest results:");
    log::info!("  Total trades: {}", summary.total_trades);
    log::info!("  Total return: {:.2}%", summary.total_return * 100.0);
    log::info!("  Annualized return: {:.2}%", summary.annualized_return * 100.0);
    log::info!("  Sharpe ratio: {:.3}", summary.sharpe_ratio);
    log::info!("  Max drawdown: {:.2}%", summary.max_drawdown * 100.0);
    log::info!("  Win rate: {:.2}%", summary.win_rate * 100.0);
    log::debug!("  Trades per ticker: {:?}", summary.trades_per_ticker);
}
