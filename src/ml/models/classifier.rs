use super::features::FeatureMatrix;
use crate::error::{BarrierLabError, Result};
use polars::prelude::*;

/// Class order of every probability vector: sell, hold, buy.
pub const N_CLASSES: usize = 3;

/// Probability columns read by [`ProbabilityTable::from_frame`].
pub const PROBABILITY_COLUMNS: [&str; N_CLASSES] = ["prob_sell", "prob_hold", "prob_buy"];

/// A trained three-class model.
pub trait Classifier: Send + Sync {
    /// One probability vector per feature row.
    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<[f64; N_CLASSES]>>;

    /// Predicted class per row; the most probable class unless overridden.
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<usize>> {
        Ok(self
            .predict_proba(features)?
            .iter()
            .map(|p| argmax(p))
            .collect())
    }
}

/// First index of the largest probability.
pub fn argmax(probabilities: &[f64; N_CLASSES]) -> usize {
    let mut best = 0;
    for (i, p) in probabilities.iter().enumerate().skip(1) {
        if *p > probabilities[best] {
            best = i;
        }
    }
    best
}

/// Model output computed elsewhere, one row per feature row.
#[derive(Debug, Clone, Default)]
pub struct ProbabilityTable {
    probabilities: Vec<[f64; N_CLASSES]>,
}

impl ProbabilityTable {
    pub fn new(probabilities: Vec<[f64; N_CLASSES]>) -> Self {
        Self { probabilities }
    }

    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let mut columns = Vec::with_capacity(N_CLASSES);
        for name in PROBABILITY_COLUMNS {
            let column = df.column(name).map_err(|_| {
                BarrierLabError::DataLoading(format!("Missing probability column: {}", name))
            })?;
            columns.push(column.cast(&DataType::Float64)?);
        }

        let mut probabilities = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let mut p = [0.0; N_CLASSES];
            for (class, column) in columns.iter().enumerate() {
                p[class] = column.f64()?.get(row).ok_or_else(|| {
                    BarrierLabError::DataLoading(format!(
                        "Null {} at row {}",
                        PROBABILITY_COLUMNS[class], row
                    ))
                })?;
            }
            probabilities.push(p);
        }

        Ok(Self { probabilities })
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

impl Classifier for ProbabilityTable {
    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<[f64; N_CLASSES]>> {
        if features.n_rows() != self.probabilities.len() {
            return Err(BarrierLabError::Validation(format!(
                "{} probability rows for {} feature rows",
                self.probabilities.len(),
                features.n_rows()
            )));
        }
        Ok(self.probabilities.clone())
    }
}
