use super::barriers::BarrierResolver;
use super::dataset::LabeledDataset;
use super::types::{HitType, Label, LabelRecord};
use super::volatility::rolling_volatility;
use crate::config::{ExpectedDistribution, LabelingConfig, TiePolicy};
use crate::data::{partition_by_ticker, CsvConnector, DataValidator, TickerSeries};
use crate::error::{BarrierLabError, Result};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Borrowed columns of one ticker, as seen by the forward scan.
struct BarView<'a> {
    timestamps: &'a [DateTime<Utc>],
    open: &'a [f64],
    high: &'a [f64],
    low: &'a [f64],
    close: &'a [f64],
}

pub struct TripleBarrierLabeler {
    config: LabelingConfig,
}

impl TripleBarrierLabeler {
    pub fn new(config: LabelingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LabelingConfig {
        &self.config
    }

    /// Validate, partition by ticker, label, and join the label columns back
    /// onto the rows of `df`. Rows of skipped tickers get null label columns.
    pub fn label_frame(&self, df: &DataFrame) -> Result<DataFrame> {
        self.label_frame_with_dataset(df).map(|(frame, _)| frame)
    }

    /// [`label_frame`](Self::label_frame), also returning the per-ticker records.
    pub fn label_frame_with_dataset(&self, df: &DataFrame) -> Result<(DataFrame, LabeledDataset)> {
        let df = CsvConnector::normalize_columns(df.clone())?;
        DataValidator::validate_price_columns(&df, self.config.use_hl)?;

        let partition = partition_by_ticker(&df)?;
        log::info!("Applying triple-barrier labeling to {} ticker(s)...", partition.len());

        let dataset = self.label_partition(&partition)?;
        let frame = dataset.join_onto(&df)?;
        Ok((frame, dataset))
    }

    /// Label every ticker series independently, in parallel.
    ///
    /// Series shorter than `horizon + volatility window` are skipped with a
    /// warning and produce no records at all.
    pub fn label_partition(&self, partition: &[TickerSeries]) -> Result<LabeledDataset> {
        let min_len = self.config.min_series_len();

        let results: Vec<Result<Option<Vec<LabelRecord>>>> = partition
            .par_iter()
            .map(|series| {
                if series.len() < min_len {
                    log::warn!(
                        "Insufficient data for ticker {} ({} bars, need {}), skipping labeling",
                        series.ticker,
                        series.len(),
                        min_len
                    );
                    return Ok(None);
                }
                self.label_series(series).map(Some)
            })
            .collect();

        let mut dataset = LabeledDataset::default();
        for (series, result) in partition.iter().zip(results) {
            match result? {
                Some(records) => dataset.push_series(series, records)?,
                None => dataset.skipped_tickers.push(series.ticker.clone()),
            }
        }

        let stats = Self::analyze_distribution(
            dataset.records(),
            self.config.expected_distribution.as_ref(),
        );
        stats.log();

        Ok(dataset)
    }

    /// One record per bar of `series`. No minimum-length guard is applied here.
    pub fn label_series(&self, series: &TickerSeries) -> Result<Vec<LabelRecord>> {
        if self.config.use_hl && !series.has_high_low {
            return Err(BarrierLabError::DataLoading(format!(
                "Ticker {} has no high/low columns but touches are checked against them",
                series.ticker
            )));
        }

        let (high, low) = if self.config.use_hl {
            (series.high.as_slice(), series.low.as_slice())
        } else {
            (series.close.as_slice(), series.close.as_slice())
        };

        let bars = BarView {
            timestamps: &series.timestamps,
            open: &series.open,
            high,
            low,
            close: &series.close,
        };

        let volatility = if self.config.needs_volatility() {
            Some(rolling_volatility(&series.close, self.config.volatility.window))
        } else {
            None
        };

        Ok(self.label_bars(&bars, volatility.as_deref()))
    }

    fn label_bars(&self, bars: &BarView<'_>, volatility: Option<&[Option<f64>]>) -> Vec<LabelRecord> {
        let n = bars.close.len();
        let resolver = BarrierResolver::new(
            &self.config.barriers,
            volatility,
            self.config.volatility.is_percentage,
        );

        let mut records = Vec::with_capacity(n);
        // The last bar has no forward window and is never a decision point.
        for i in 0..n.saturating_sub(1) {
            records.push(self.scan_forward(i, bars, &resolver));
        }
        if n > 0 {
            records.push(LabelRecord::undecided());
        }
        records
    }

    /// First touch in bar order wins; nothing after the winning bar is read.
    fn scan_forward(&self, i: usize, bars: &BarView<'_>, resolver: &BarrierResolver<'_>) -> LabelRecord {
        let n = bars.close.len();
        let (upper, lower) = resolver.resolve(i, bars.close[i]);
        let j_end = (i + self.config.horizon).min(n - 1);
        let unbounded = upper == f64::INFINITY && lower == f64::NEG_INFINITY;

        if !unbounded {
            for j in (i + 1)..=j_end {
                let touch_up = bars.high[j] >= upper;
                let touch_down = bars.low[j] <= lower;

                let decision = match (touch_up, touch_down) {
                    (true, false) => Some((Label::Buy, HitType::Tp)),
                    (false, true) => Some((Label::Sell, HitType::Sl)),
                    (true, true) => Some(self.break_tie(upper, lower, bars.open[j])),
                    (false, false) => None,
                };

                if let Some((label, hit_type)) = decision {
                    return LabelRecord {
                        label,
                        hit_time: Some(bars.timestamps[j]),
                        hit_type,
                        upper_barrier: Some(upper),
                        lower_barrier: Some(lower),
                        vertical_barrier_time: None,
                    };
                }
            }
        }

        // Vertical barrier
        let ret = bars.close[j_end] / bars.close[i] - 1.0;
        let (label, hit_type) = match self.config.min_ret {
            Some(min_ret) if ret.abs() < min_ret => (Label::Hold, HitType::VbarNeutral),
            _ => (Label::from_sign(ret), HitType::VbarSign),
        };

        LabelRecord {
            label,
            hit_time: Some(bars.timestamps[j_end]),
            hit_type,
            upper_barrier: Some(upper),
            lower_barrier: Some(lower),
            vertical_barrier_time: Some(bars.timestamps[j_end]),
        }
    }

    /// Both barriers touched inside the same bar.
    fn break_tie(&self, upper: f64, lower: f64, open: f64) -> (Label, HitType) {
        match self.config.tie_policy {
            TiePolicy::Ambiguous => (Label::Hold, HitType::Both),
            TiePolicy::Tp => (Label::Buy, HitType::Tp),
            TiePolicy::Sl => (Label::Sell, HitType::Sl),
            TiePolicy::Closest => {
                // Distances from the touch bar's open to the entry bar's barriers.
                let du = (upper - open).abs();
                let dl = (open - lower).abs();
                if du < dl {
                    (Label::Buy, HitType::Tp)
                } else if dl < du {
                    (Label::Sell, HitType::Sl)
                } else {
                    (Label::Hold, HitType::Both)
                }
            }
        }
    }

    /// Analyze label distribution
    pub fn analyze_distribution<'a>(
        records: impl IntoIterator<Item = &'a LabelRecord>,
        expected: Option<&ExpectedDistribution>,
    ) -> LabelStats {
        let mut stats = LabelStats::default();

        for record in records {
            match record.label {
                Label::Sell => stats.sell_count += 1,
                Label::Hold => stats.hold_count += 1,
                Label::Buy => stats.buy_count += 1,
            }
            *stats
                .hit_types
                .entry(record.hit_type.as_str().to_string())
                .or_insert(0) += 1;
            stats.total_count += 1;
        }

        if stats.total_count > 0 {
            let total = stats.total_count as f64;
            stats.sell_pct = stats.sell_count as f64 / total * 100.0;
            stats.hold_pct = stats.hold_count as f64 / total * 100.0;
            stats.buy_pct = stats.buy_count as f64 / total * 100.0;

            stats.balance_score = expected.map(|e| {
                ((e.sell - stats.sell_pct / 100.0).abs()
                    + (e.hold - stats.hold_pct / 100.0).abs()
                    + (e.buy - stats.buy_pct / 100.0).abs())
                    / 3.0
            });
        }

        stats
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LabelStats {
    pub total_count: usize,
    pub sell_count: usize,
    pub hold_count: usize,
    pub buy_count: usize,
    pub sell_pct: f64,
    pub hold_pct: f64,
    pub buy_pct: f64,
    pub hit_types: BTreeMap<String, usize>,
    /// Mean absolute gap to the expected class shares.
    pub balance_score: Option<f64>,
}

impl LabelStats {
    pub fn log(&self) {
        log::info!("Label distribution ({} labels):", self.total_count);
        for (label, count, pct) in [
            (Label::Sell, self.sell_count, self.sell_pct),
            (Label::Hold, self.hold_count, self.hold_pct),
            (Label::Buy, self.buy_count, self.buy_pct),
        ] {
            log::info!("  {} ({}): {} ({:.1}%)", label.name(), label.value(), count, pct);
        }
        log::debug!("Hit types: {:?}", self.hit_types);
        if let Some(score) = self.balance_score {
            log::info!("Balance score vs expected distribution: {:.4}", score);
        }
    }
}
