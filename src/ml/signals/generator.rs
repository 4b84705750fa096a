use super::types::{class_to_label, Signal, SignalCounts};
use crate::config::BacktestingConfig;
use crate::data::series::read_timestamps;
use crate::data::series::DEFAULT_TICKER;
use crate::data::{DataValidator, PriceColumn};
use crate::error::{BarrierLabError, Result};
use crate::ml::labeling::Label;
use crate::ml::models::{Classifier, FeatureMatrix, N_CLASSES};
use polars::prelude::*;

pub struct SignalGenerator {
    confidence_threshold: f64,
}

impl SignalGenerator {
    pub fn new(config: &BacktestingConfig) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
        }
    }

    pub fn with_threshold(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold,
        }
    }

    /// One signal per row of `df`, in row order.
    pub fn generate(&self, df: &DataFrame, classifier: &dyn Classifier) -> Result<Vec<Signal>> {
        let features = FeatureMatrix::from_frame(df)?;
        let classes = classifier.predict(&features)?;
        let probabilities = classifier.predict_proba(&features)?;

        if classes.len() != df.height() || probabilities.len() != df.height() {
            return Err(BarrierLabError::Validation(format!(
                "Classifier returned {} classes and {} probability rows for {} rows",
                classes.len(),
                probabilities.len(),
                df.height()
            )));
        }

        let timestamp_name = DataValidator::find_column(df, &PriceColumn::Timestamp).ok_or_else(|| {
            BarrierLabError::DataLoading("Missing required column: timestamp".to_string())
        })?;
        let timestamps = read_timestamps(df, timestamp_name)?;
        let tickers = read_tickers(df)?;

        let mut signals = Vec::with_capacity(df.height());
        for (row, (class, probs)) in classes.into_iter().zip(probabilities).enumerate() {
            let (value, confidence) = self.decide(class, &probs)?;
            signals.push(Signal {
                timestamp: timestamps[row],
                ticker: tickers[row].clone(),
                value,
                confidence,
                prob_sell: probs[0],
                prob_hold: probs[1],
                prob_buy: probs[2],
            });
        }

        let counts = SignalCounts::from_signals(&signals);
        log::info!("Generated {} signals", signals.len());
        log::info!("  Buy signals: {}", counts.buy);
        log::info!("  Sell signals: {}", counts.sell);
        log::info!("  Hold signals: {}", counts.hold);

        Ok(signals)
    }

    /// Predicted class mapped to a signal; forced to hold below the threshold.
    pub fn decide(&self, class: usize, probabilities: &[f64; N_CLASSES]) -> Result<(Label, f64)> {
        let label = class_to_label(class)
            .ok_or_else(|| BarrierLabError::Computation(format!("Unknown class index {}", class)))?;
        let confidence = probabilities.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if confidence < self.confidence_threshold {
            Ok((Label::Hold, confidence))
        } else {
            Ok((label, confidence))
        }
    }
}

fn read_tickers(df: &DataFrame) -> Result<Vec<String>> {
    match DataValidator::find_column(df, &PriceColumn::Ticker) {
        Some(name) => {
            let column = df.column(name)?.cast(&DataType::String)?;
            let ca = column.str()?;
            Ok((0..ca.len())
                .map(|i| ca.get(i).unwrap_or(DEFAULT_TICKER).to_string())
                .collect())
        }
        None => Ok(vec![DEFAULT_TICKER.to_string(); df.height()]),
    }
}
