use crate::error::{Result, BarrierLabError};
use polars::prelude::*;
use super::types::PriceColumn;
use std::collections::HashMap;

pub struct DataValidator;

impl DataValidator {
    /// Check the price columns labeling depends on: `close` always, `high`/`low`
    /// when touches are checked against the bar range.
    pub fn validate_price_columns(
        df: &DataFrame,
        use_hl: bool,
    ) -> Result<HashMap<PriceColumn, String>> {
        let mut column_map = HashMap::new();

        for required in PriceColumn::required(use_hl) {
            match Self::find_column(df, &required) {
                Some(col_name) => {
                    column_map.insert(required, col_name.to_string());
                }
                None => {
                    return Err(BarrierLabError::DataLoading(format!(
                        "Missing required column: {} (tried aliases: {:?})",
                        required.as_str(),
                        required.aliases()
                    )));
                }
            }
        }

        for optional in [PriceColumn::Open, PriceColumn::Volume] {
            if let Some(col_name) = Self::find_column(df, &optional) {
                column_map.insert(optional, col_name.to_string());
            }
        }

        // Validate column types are numeric
        for (req_col, actual_name) in &column_map {
            let series = df.column(actual_name)?;
            if !is_numeric_dtype(series.dtype()) {
                return Err(BarrierLabError::DataLoading(format!(
                    "Column '{}' ({}) must be numeric, found {:?}",
                    actual_name,
                    req_col.as_str(),
                    series.dtype()
                )));
            }
        }

        Ok(column_map)
    }

    /// Find column by checking aliases
    pub fn find_column<'a>(df: &'a DataFrame, column: &PriceColumn) -> Option<&'a str> {
        let columns = df.get_column_names();
        column
            .aliases()
            .into_iter()
            .find_map(|alias| columns.iter().find(|col| col.as_str() == alias).map(|c| c.as_str()))
    }

    /// Count rows where high < low or the close sits outside [low, high].
    pub fn count_ohlc_violations(df: &DataFrame) -> Result<usize> {
        let (Some(high_col), Some(low_col), Some(close_col)) = (
            Self::find_column(df, &PriceColumn::High),
            Self::find_column(df, &PriceColumn::Low),
            Self::find_column(df, &PriceColumn::Close),
        ) else {
            return Ok(0);
        };

        let high = df.column(high_col)?.cast(&DataType::Float64)?;
        let low = df.column(low_col)?.cast(&DataType::Float64)?;
        let close = df.column(close_col)?.cast(&DataType::Float64)?;

        let high = high.f64()?;
        let low = low.f64()?;
        let close = close.f64()?;

        let mut violations = 0;
        for i in 0..df.height() {
            if let (Some(h), Some(l), Some(c)) = (high.get(i), low.get(i), close.get(i)) {
                if h < l || c > h || c < l {
                    violations += 1;
                }
            }
        }

        Ok(violations)
    }

    /// Check for null values in any column
    pub fn check_nulls(df: &DataFrame) -> Result<Vec<(String, usize)>> {
        let mut null_report = Vec::new();

        for col_name in df.get_column_names() {
            let series = df.column(col_name)?;
            let null_count = series.null_count();
            if null_count > 0 {
                null_report.push((col_name.to_string(), null_count));
            }
        }

        Ok(null_report)
    }
}

pub(crate) fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_missing_high_low_is_fatal_only_with_hl() {
        let df = df! {
            "Close" => &[100.0, 101.0, 102.0],
        }
        .unwrap();

        assert!(matches!(
            DataValidator::validate_price_columns(&df, true),
            Err(BarrierLabError::DataLoading(_))
        ));

        let map = DataValidator::validate_price_columns(&df, false).unwrap();
        assert_eq!(map.get(&PriceColumn::Close).map(String::as_str), Some("Close"));
    }

    #[test]
    fn test_non_numeric_close_rejected() {
        let df = df! {
            "close" => &["a", "b"],
        }
        .unwrap();
        assert!(DataValidator::validate_price_columns(&df, false).is_err());
    }

    #[test]
    fn test_ohlc_violations_counted() {
        let df = df! {
            "high" => &[101.0, 99.0, 103.0],
            "low" => &[99.0, 100.0, 101.0],
            "close" => &[100.0, 99.5, 104.0],
        }
        .unwrap();
        assert_eq!(DataValidator::count_ohlc_violations(&df).unwrap(), 2);
    }
}
