use crate::data::is_numeric_dtype;
use crate::error::{BarrierLabError, Result};
use crate::ml::labeling::LABEL_COLUMNS;
use polars::prelude::*;

/// Columns that describe a row rather than feed the model.
pub const METADATA_COLUMNS: [&str; 2] = ["ticker", "timestamp"];

/// Row-major numeric feature matrix handed to a [`Classifier`](super::Classifier).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Every numeric column except the metadata and label columns.
    ///
    /// Missing and non-finite values are replaced by the column median over
    /// its finite values, or 0 when the column has none.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let mut columns = Vec::new();
        let mut values: Vec<Vec<f64>> = Vec::new();

        for column in df.get_columns() {
            let name = column.name().as_str();
            if METADATA_COLUMNS.contains(&name) || LABEL_COLUMNS.contains(&name) {
                continue;
            }
            if !is_numeric_dtype(column.dtype()) {
                log::debug!("Skipping non-numeric column '{}' ({:?})", name, column.dtype());
                continue;
            }

            let cast = column.cast(&DataType::Float64)?;
            let ca = cast.f64()?;
            let mut data: Vec<f64> = (0..ca.len()).map(|i| ca.get(i).unwrap_or(f64::NAN)).collect();
            fill_non_finite(&mut data);

            columns.push(name.to_string());
            values.push(data);
        }

        if columns.is_empty() {
            return Err(BarrierLabError::Validation(
                "No numeric feature columns found".to_string(),
            ));
        }

        let rows = (0..df.height())
            .map(|r| values.iter().map(|col| col[r]).collect())
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }
}

fn fill_non_finite(data: &mut [f64]) {
    if data.iter().all(|v| v.is_finite()) {
        return;
    }
    let fill = median(data.iter().copied().filter(|v| v.is_finite()).collect()).unwrap_or(0.0);
    for value in data.iter_mut().filter(|v| !v.is_finite()) {
        *value = fill;
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_from_frame_selects_and_fills() {
        let df = df! {
            "ticker" => &["A", "A", "A", "A"],
            "timestamp" => &["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"],
            "rsi" => &[Some(30.0), None, Some(50.0), Some(f64::INFINITY)],
            "ub" => &[1.0, 1.0, 1.0, 1.0],
            "label" => &[1i64, 0, -1, 0],
            "empty" => &[f64::NAN, f64::NAN, f64::NAN, f64::NAN],
        }
        .unwrap();

        let matrix = FeatureMatrix::from_frame(&df).unwrap();
        assert_eq!(matrix.columns, vec!["rsi".to_string(), "empty".to_string()]);
        assert_eq!(matrix.n_rows(), 4);
        assert_eq!(matrix.rows[1][0], 40.0);
        assert_eq!(matrix.rows[3][0], 40.0);
        assert_eq!(matrix.rows[0][1], 0.0);
    }

    #[test]
    fn test_no_features_is_error() {
        let df = df! { "ticker" => &["A"], "label" => &[1i64] }.unwrap();
        assert!(FeatureMatrix::from_frame(&df).is_err());
    }
}
