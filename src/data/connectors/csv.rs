use crate::error::{Result, BarrierLabError};
use crate::data::series::read_timestamps;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use super::{
    types::{DatasetMetadata, PriceColumn},
    validator::DataValidator,
};

pub struct CsvConnector;

impl CsvConnector {
    /// Load CSV file into DataFrame, parsing ISO dates where possible
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .map_parse_options(|opts| opts.with_try_parse_dates(true))
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()
            .map_err(|e| BarrierLabError::DataLoading(format!("Failed to read CSV: {}", e)))?;

        Ok(df)
    }

    /// Load a price file, normalize column names and check the price columns
    pub fn load_prices<P: AsRef<Path>>(path: P, use_hl: bool) -> Result<DataFrame> {
        let df = Self::normalize_columns(Self::load(&path)?)?;

        DataValidator::validate_price_columns(&df, use_hl)?;

        // Warn about nulls but don't fail
        let null_report = DataValidator::check_nulls(&df)?;
        if !null_report.is_empty() {
            log::warn!("Null values detected: {:?}", null_report);
        }

        let violations = DataValidator::count_ohlc_violations(&df)?;
        if violations > 0 {
            log::warn!("{} rows have close outside [low, high] or high < low", violations);
        }

        Ok(df)
    }

    pub fn write<P: AsRef<Path>>(df: &mut DataFrame, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path.as_ref())?;
        CsvWriter::new(&mut file).include_header(true).finish(df)?;
        Ok(())
    }

    /// Create metadata for a loaded DataFrame
    pub fn create_metadata<P: AsRef<Path>>(path: P, df: &DataFrame) -> Result<DatasetMetadata> {
        let columns: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();

        let num_tickers = match DataValidator::find_column(df, &PriceColumn::Ticker) {
            Some(name) => df.column(name)?.as_materialized_series().n_unique()?,
            None => 1,
        };

        let date_range = match DataValidator::find_column(df, &PriceColumn::Timestamp) {
            Some(name) => {
                let timestamps = read_timestamps(df, name)?;
                match (timestamps.iter().min(), timestamps.iter().max()) {
                    (Some(first), Some(last)) => Some((*first, *last)),
                    _ => None,
                }
            }
            None => None,
        };

        let price_range = match DataValidator::find_column(df, &PriceColumn::Close) {
            Some(close_name) => {
                let close = df.column(close_name)?.cast(&DataType::Float64)?;
                let close_f64 = close.f64()?;
                (close_f64.min().unwrap_or(0.0), close_f64.max().unwrap_or(0.0))
            }
            None => (0.0, 0.0),
        };

        Ok(DatasetMetadata {
            file_path: path.as_ref().to_string_lossy().to_string(),
            num_rows: df.height(),
            num_columns: df.width(),
            columns,
            num_tickers,
            date_range,
            price_range,
        })
    }

    /// Normalize column names to lowercase standard names
    pub fn normalize_columns(mut df: DataFrame) -> Result<DataFrame> {
        for column in PriceColumn::all() {
            let standard_name = column.as_str();
            let has_standard = df
                .get_column_names()
                .iter()
                .any(|c| c.as_str() == standard_name);
            if has_standard {
                continue;
            }
            let actual_name = DataValidator::find_column(&df, &column).map(str::to_string);
            if let Some(actual_name) = actual_name {
                df.rename(&actual_name, standard_name.into())
                    .map_err(|e| BarrierLabError::DataLoading(format!("Failed to rename column: {}", e)))?;
            }
        }

        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use std::io::Write;

    #[test]
    fn test_normalize_columns() {
        let df = df! {
            "Symbol" => &["AAA", "AAA"],
            "Date" => &["2024-01-02", "2024-01-03"],
            "HIGH" => &[101.0, 103.0],
            "low" => &[99.0, 100.0],
            "Close" => &[100.5, 102.0],
        }
        .unwrap();

        let df = CsvConnector::normalize_columns(df).unwrap();
        let cols = df.get_column_names();
        for expected in ["ticker", "timestamp", "high", "low", "close"] {
            assert!(cols.iter().any(|c| c.as_str() == expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_load_prices_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "ticker,timestamp,open,high,low,close,volume").unwrap();
        writeln!(file, "AAA,2024-01-02,100,101,99,100.5,1000").unwrap();
        writeln!(file, "AAA,2024-01-03,100.5,102,100,101.5,1200").unwrap();
        writeln!(file, "BBB,2024-01-02,50,51,49,50.5,300").unwrap();
        drop(file);

        let df = CsvConnector::load_prices(&path, true).unwrap();
        assert_eq!(df.height(), 3);

        let metadata = CsvConnector::create_metadata(&path, &df).unwrap();
        assert_eq!(metadata.num_tickers, 2);
        assert_eq!(metadata.price_range, (50.5, 101.5));
        let (first, last) = metadata.date_range.unwrap();
        assert!(first < last);
    }
}
