//! Files written at the end of a run.

use crate::data::series::datetime_column;
use crate::data::CsvConnector;
use crate::engines::validation::splitters::SplitPlan;
use crate::error::Result;
use crate::types::{BacktestResult, DrawdownPoint, EquityPoint, PerformanceSummary, Trade};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

pub const LABELED_DATA_FILE: &str = "labeled_data.csv";
pub const TRADES_FILE: &str = "detailed_trades.csv";
pub const EQUITY_CURVE_FILE: &str = "equity_curve.csv";
pub const DRAWDOWN_CURVE_FILE: &str = "drawdown_curve.csv";
pub const METRICS_FILE: &str = "backtest_metrics.json";
pub const SPLIT_PLAN_FILE: &str = "split_plan.json";

pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        fs::create_dir_all(output_dir.as_ref())?;
        Ok(Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Labeled bars under `file_name`, or `labeled_data.csv` when none is given.
    pub fn write_labeled(&self, df: &mut DataFrame, file_name: Option<&str>) -> Result<PathBuf> {
        let path = self.output_dir.join(file_name.unwrap_or(LABELED_DATA_FILE));
        CsvConnector::write(df, &path)?;
        Ok(path)
    }

    /// Trades, equity curve, drawdown curve and summary metrics.
    pub fn write_backtest(&self, result: &BacktestResult) -> Result<Vec<PathBuf>> {
        let paths = vec![
            self.write_trades(&result.trades)?,
            self.write_equity_curve(&result.equity_curve)?,
            self.write_drawdown_curve(&result.drawdown_curve)?,
            self.write_metrics(&result.summary)?,
        ];
        log::info!("Results saved to {}", self.output_dir.display());
        Ok(paths)
    }

    pub fn write_trades(&self, trades: &[Trade]) -> Result<PathBuf> {
        let entry: Vec<_> = trades.iter().map(|t| Some(t.entry_date)).collect();
        let exit: Vec<_> = trades.iter().map(|t| Some(t.exit_date)).collect();

        let mut df = DataFrame::new(vec![
            Column::new("ticker".into(), trades.iter().map(|t| t.ticker.as_str()).collect::<Vec<_>>()),
            datetime_column("entry_date", &entry)?,
            datetime_column("exit_date", &exit)?,
            Column::new("entry_price".into(), trades.iter().map(|t| t.entry_price).collect::<Vec<_>>()),
            Column::new("exit_price".into(), trades.iter().map(|t| t.exit_price).collect::<Vec<_>>()),
            Column::new("return_pct".into(), trades.iter().map(|t| t.return_pct).collect::<Vec<_>>()),
            Column::new(
                "holding_days".into(),
                trades.iter().map(|t| t.holding_days as u64).collect::<Vec<_>>(),
            ),
            Column::new("confidence".into(), trades.iter().map(|t| t.confidence).collect::<Vec<_>>()),
            Column::new(
                "exit_reason".into(),
                trades.iter().map(|t| t.exit_reason.as_str()).collect::<Vec<_>>(),
            ),
        ])?;

        let path = self.output_dir.join(TRADES_FILE);
        CsvConnector::write(&mut df, &path)?;
        Ok(path)
    }

    pub fn write_equity_curve(&self, curve: &[EquityPoint]) -> Result<PathBuf> {
        let dates: Vec<_> = curve.iter().map(|p| Some(p.date)).collect();
        let mut df = DataFrame::new(vec![
            datetime_column("date", &dates)?,
            Column::new("equity".into(), curve.iter().map(|p| p.equity).collect::<Vec<_>>()),
            Column::new(
                "cumulative_return".into(),
                curve.iter().map(EquityPoint::cumulative_return).collect::<Vec<_>>(),
            ),
            Column::new("trade_return".into(), curve.iter().map(|p| p.trade_return).collect::<Vec<_>>()),
        ])?;

        let path = self.output_dir.join(EQUITY_CURVE_FILE);
        CsvConnector::write(&mut df, &path)?;
        Ok(path)
    }

    pub fn write_drawdown_curve(&self, curve: &[DrawdownPoint]) -> Result<PathBuf> {
        let dates: Vec<_> = curve.iter().map(|p| Some(p.date)).collect();
        let mut df = DataFrame::new(vec![
            datetime_column("date", &dates)?,
            Column::new("drawdown".into(), curve.iter().map(|p| p.drawdown).collect::<Vec<_>>()),
        ])?;

        let path = self.output_dir.join(DRAWDOWN_CURVE_FILE);
        CsvConnector::write(&mut df, &path)?;
        Ok(path)
    }

    /// JSON has no infinity; an unbounded profit factor is written as null.
    pub fn write_metrics(&self, summary: &PerformanceSummary) -> Result<PathBuf> {
        let path = self.output_dir.join(METRICS_FILE);
        fs::write(&path, serde_json::to_string_pretty(summary)?)?;
        Ok(path)
    }

    pub fn write_split_plan(&self, plan: &SplitPlan) -> Result<PathBuf> {
        let path = self.output_dir.join(SPLIT_PLAN_FILE);
        fs::write(&path, serde_json::to_string_pretty(plan)?)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExitReason;
    use chrono::{TimeZone, Utc};
    use polars::df;

    #[test]
    fn test_write_labeled_names() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path()).unwrap();
        let mut df = df! {
            "close" => &[100.0, 101.0],
            "label" => &[1i32, 0],
        }
        .unwrap();

        let default_path = writer.write_labeled(&mut df, None).unwrap();
        assert_eq!(default_path, dir.path().join(LABELED_DATA_FILE));

        let named = writer.write_labeled(&mut df, Some("bars_labeled.csv")).unwrap();
        assert_eq!(CsvConnector::load(&named).unwrap().height(), 2);
    }

    #[test]
    fn test_write_backtest_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("results")).unwrap();

        let date = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let result = BacktestResult {
            summary: PerformanceSummary {
                total_trades: 1,
                profit_factor: f64::INFINITY,
                ..Default::default()
            },
            trades: vec![Trade {
                ticker: "AAA".into(),
                entry_date: date,
                exit_date: date,
                entry_price: 100.0,
                exit_price: 101.0,
                return_pct: 0.01,
                holding_days: 0,
                confidence: 0.7,
                exit_reason: ExitReason::EndOfData,
            }],
            equity_curve: vec![EquityPoint { date, equity: 1.01, trade_return: 0.01 }],
            drawdown_curve: vec![DrawdownPoint { date, drawdown: 0.0 }],
        };

        let paths = writer.write_backtest(&result).unwrap();
        assert_eq!(paths.len(), 4);
        assert!(paths.iter().all(|p| p.exists()));

        let trades = CsvConnector::load(dir.path().join("results").join(TRADES_FILE)).unwrap();
        assert_eq!(trades.height(), 1);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("results").join(METRICS_FILE)).unwrap()).unwrap();
        assert_eq!(json["total_trades"], 1);
        assert!(json["profit_factor"].is_null());
    }
}
