//! End-to-end runs behind the command-line subcommands.

use crate::config::AppConfig;
use crate::data::{ArtifactWriter, CsvConnector};
use crate::engines::evaluation::Backtester;
use crate::engines::metrics::BenchmarkSeries;
use crate::engines::validation::splitters::{create_splitter, SplitIndex, SplitPlan};
use crate::error::Result;
use crate::ml::labeling::{LabelStats, TripleBarrierLabeler};
use crate::ml::models::ProbabilityTable;
use crate::ml::signals::SignalGenerator;
use crate::types::BacktestResult;
use polars::prelude::*;
use std::path::Path;

/// Label a price file and write the bars with their label columns.
pub fn run_labeling(config: &AppConfig, input: &Path, output: &Path) -> Result<LabelStats> {
    let bars = CsvConnector::load_prices(input, config.labeling.use_hl)?;
    let metadata = CsvConnector::create_metadata(input, &bars)?;
    log::info!(
        "Loaded {} rows of {} ticker(s) from {}",
        metadata.num_rows,
        metadata.num_tickers,
        metadata.file_path
    );
    if let Some((first, last)) = metadata.date_range {
        log::info!("Date range: {} to {}", first, last);
    }

    let labeler = TripleBarrierLabeler::new(config.labeling.clone());
    let (mut labeled, dataset) = labeler.label_frame_with_dataset(&bars)?;
    if !dataset.skipped_tickers.is_empty() {
        log::warn!("Skipped tickers: {:?}", dataset.skipped_tickers);
    }

    let stats = TripleBarrierLabeler::analyze_distribution(
        dataset.records(),
        config.labeling.expected_distribution.as_ref(),
    );
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let written = ArtifactWriter::new(dir)?
        .write_labeled(&mut labeled, output.file_name().and_then(|n| n.to_str()))?;
    log::info!("Labeled data written to {}", written.display());

    Ok(stats)
}

/// Cross-validation plan over a labeled file; rows are taken in timestamp order.
pub fn run_split(config: &AppConfig, input: &Path, plan_dir: Option<&Path>) -> Result<SplitPlan> {
    let labeled = CsvConnector::normalize_columns(CsvConnector::load(input)?)?;
    let sorted = labeled.sort(
        ["timestamp"],
        SortMultipleOptions::default().with_maintain_order(true),
    )?;

    let index = SplitIndex::from_frame(&sorted)?;
    let splitter = create_splitter(&config.cross_validation);
    let plan = splitter.split(&index)?;
    log::info!(
        "{} split(s) yielded, {} dropped over {} rows",
        plan.len(),
        plan.dropped.len(),
        index.len()
    );

    if let Some(dir) = plan_dir {
        let path = ArtifactWriter::new(dir)?.write_split_plan(&plan)?;
        log::info!("Split plan written to {}", path.display());
    }

    Ok(plan)
}

/// Signals from precomputed class probabilities, simulated over the test rows.
pub fn run_backtest(
    config: &AppConfig,
    test_data: &Path,
    predictions: &Path,
    benchmark: Option<&Path>,
    output_dir: &Path,
) -> Result<BacktestResult> {
    let data = CsvConnector::normalize_columns(CsvConnector::load(test_data)?)?;
    let table = ProbabilityTable::from_frame(&CsvConnector::load(predictions)?)?;

    let signals = SignalGenerator::new(&config.backtesting).generate(&data, &table)?;

    let benchmark = match benchmark {
        Some(path) => Some(BenchmarkSeries::from_frame(&CsvConnector::load(path)?)?),
        None => None,
    };

    let result = Backtester::new(config.backtesting.clone()).run(&data, &signals, benchmark.as_ref())?;
    ArtifactWriter::new(output_dir)?.write_backtest(&result)?;

    Ok(result)
}
