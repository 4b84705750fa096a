use crate::{
    config::BacktestingConfig,
    data::{partition_by_ticker, TickerSeries},
    engines::evaluation::Portfolio,
    engines::metrics::{BenchmarkSeries, MetricsEngine},
    error::{BarrierLabError, Result},
    ml::labeling::Label,
    ml::signals::Signal,
    types::{BacktestResult, Trade},
};
use polars::prelude::*;
use rayon::prelude::*;

pub struct Backtester {
    config: BacktestingConfig,
}

impl Backtester {
    pub fn new(config: BacktestingConfig) -> Self {
        Self { config }
    }

    /// Simulate `signals` (one per row of `data`, in row order) and evaluate
    /// the resulting trades.
    pub fn run(
        &self,
        data: &DataFrame,
        signals: &[Signal],
        benchmark: Option<&BenchmarkSeries>,
    ) -> Result<BacktestResult> {
        let partition = partition_by_ticker(data)?;
        let trades = self.simulate(&partition, signals)?;

        let start = partition.iter().filter_map(|s| s.first_timestamp()).min();
        let end = partition.iter().filter_map(|s| s.last_timestamp()).max();
        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (start, end),
            _ => return Ok(BacktestResult::default()),
        };

        Ok(MetricsEngine::new(benchmark).evaluate(trades, start, end))
    }

    /// Per-ticker simulation in parallel; trades are concatenated in
    /// partition order.
    pub fn simulate(&self, partition: &[TickerSeries], signals: &[Signal]) -> Result<Vec<Trade>> {
        let rows: usize = partition.iter().map(TickerSeries::len).sum();
        if rows != signals.len() {
            return Err(BarrierLabError::BacktestError(format!(
                "{} signals for {} rows",
                signals.len(),
                rows
            )));
        }

        let per_ticker: Vec<Result<Vec<Trade>>> = partition
            .par_iter()
            .map(|series| {
                let aligned: Vec<&Signal> = series.row_index.iter().map(|&r| &signals[r]).collect();
                self.simulate_series(series, &aligned)
            })
            .collect();

        let mut trades = Vec::new();
        for (series, result) in partition.iter().zip(per_ticker) {
            let ticker_trades = result?;
            log::info!("{}: {} trades", series.ticker, ticker_trades.len());
            trades.extend(ticker_trades);
        }
        log::info!("Total trades: {}", trades.len());

        Ok(trades)
    }

    /// Run the state machine over one ticker; `signals[i]` belongs to bar `i`.
    pub fn simulate_series(&self, series: &TickerSeries, signals: &[&Signal]) -> Result<Vec<Trade>> {
        if signals.len() != series.len() {
            return Err(BarrierLabError::BacktestError(format!(
                "{} signals for {} bars of {}",
                signals.len(),
                series.len(),
                series.ticker
            )));
        }

        let mut portfolio = Portfolio::new(&self.config, series.ticker.clone());
        for (i, signal) in signals.iter().enumerate() {
            if signal.ticker != series.ticker || signal.timestamp != series.timestamps[i] {
                return Err(BarrierLabError::BacktestError(format!(
                    "Signal for {} at {} does not match bar {} of {} at {}",
                    signal.ticker, signal.timestamp, i, series.ticker, series.timestamps[i]
                )));
            }
            portfolio.process_bar(
                i,
                series.timestamps[i],
                series.close[i],
                signal.value,
                signal.confidence,
            );
        }

        match (series.last_timestamp(), series.close.last()) {
            (Some(date), Some(&close)) => Ok(portfolio.finish(series.len(), date, close)),
            _ => Ok(Vec::new()),
        }
    }

    /// Simulate a bare close series with explicit signal values.
    pub fn simulate_values(&self, series: &TickerSeries, values: &[Label], confidence: &[f64]) -> Result<Vec<Trade>> {
        if values.len() != series.len() || confidence.len() != series.len() {
            return Err(BarrierLabError::BacktestError(format!(
                "{} signal values and {} confidences for {} bars of {}",
                values.len(),
                confidence.len(),
                series.len(),
                series.ticker
            )));
        }

        let signals: Vec<Signal> = values
            .iter()
            .zip(confidence)
            .enumerate()
            .map(|(i, (&value, &confidence))| Signal {
                timestamp: series.timestamps[i],
                ticker: series.ticker.clone(),
                value,
                confidence,
                prob_sell: 0.0,
                prob_hold: 0.0,
                prob_buy: 0.0,
            })
            .collect();
        let refs: Vec<&Signal> = signals.iter().collect();
        self.simulate_series(series, &refs)
    }
}
