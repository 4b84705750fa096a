use barrierlab::config::{AppConfig, BacktestingConfig};
use barrierlab::data::{CsvConnector, TickerSeries};
use barrierlab::engines::evaluation::Backtester;
use barrierlab::engines::metrics::{BenchmarkSeries, MetricsEngine};
use barrierlab::ml::labeling::Label;
use barrierlab::pipeline::run_backtest;
use barrierlab::types::{ExitReason, Trade};
use chrono::{DateTime, Duration, TimeZone, Utc};
use polars::df;

fn day(i: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::days(i)
}

fn series(closes: &[f64]) -> TickerSeries {
    TickerSeries::from_closes(
        "AAA",
        (0..closes.len() as i64).map(day).collect(),
        closes.to_vec(),
    )
    .unwrap()
}

fn trade(exit: i64, return_pct: f64) -> Trade {
    Trade {
        ticker: "AAA".into(),
        entry_date: day(exit - 1),
        exit_date: day(exit),
        entry_price: 100.0,
        exit_price: 100.0 * (1.0 + return_pct),
        return_pct,
        holding_days: 1,
        confidence: 0.7,
        exit_reason: ExitReason::Signal,
    }
}

#[test]
fn test_metrics_example() {
    let result = MetricsEngine::new(None).evaluate(vec![trade(1, 0.05), trade(2, -0.02)], day(0), day(30));
    let s = &result.summary;
    assert!((s.total_return - 0.029).abs() < 1e-12);
    assert_eq!(s.win_rate, 0.5);
    assert!((s.profit_factor - 2.5).abs() < 1e-12);
    assert_eq!(s.winning_trades, 1);
    assert_eq!(s.losing_trades, 1);
    let expected_annual = 1.029f64.powf(365.25 / 30.0) - 1.0;
    assert!((s.annualized_return - expected_annual).abs() < 1e-9);
    assert!(s.volatility > 0.0);
    assert!((s.sharpe_ratio - s.annualized_return / s.volatility).abs() < 1e-9);
}

#[test]
fn test_end_of_series_flush() {
    let backtester = Backtester::new(BacktestingConfig {
        holding_period: 10,
        transaction_cost: 0.001,
        ..Default::default()
    });
    let values = [Label::Hold, Label::Hold, Label::Sell, Label::Buy, Label::Hold];
    let trades = backtester
        .simulate_values(&series(&[10.0, 11.0, 12.0, 13.0, 14.0]), &values, &[0.8; 5])
        .unwrap();

    assert_eq!(trades.len(), 1);
    let t = &trades[0];
    assert_eq!(t.holding_days, 1);
    assert_eq!(t.entry_date, day(3));
    assert_eq!(t.exit_date, day(4));
    assert!((t.entry_price - 13.0 * 1.001).abs() < 1e-12);
    assert!((t.exit_price - 14.0 * 0.999).abs() < 1e-12);
    assert_eq!(t.exit_reason, ExitReason::EndOfData);
}

#[test]
fn test_positions_never_overlap() {
    let backtester = Backtester::new(BacktestingConfig {
        holding_period: 2,
        transaction_cost: 0.0,
        ..Default::default()
    });
    let values = [Label::Buy; 7];
    let trades = backtester
        .simulate_values(&series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]), &values, &[0.9; 7])
        .unwrap();

    // Opens at 0, capped at 2; reopens at 3, capped at 5; reopens at 6, flushed.
    let entries: Vec<_> = trades.iter().map(|t| t.entry_date).collect();
    assert_eq!(entries, vec![day(0), day(3), day(6)]);
    for pair in trades.windows(2) {
        assert!(pair[0].exit_date < pair[1].entry_date);
    }
    assert_eq!(trades[2].holding_days, 0);
}

#[test]
fn test_zero_trades_result() {
    let backtester = Backtester::new(BacktestingConfig::default());
    let values = [Label::Sell, Label::Hold, Label::Sell];
    let trades = backtester
        .simulate_values(&series(&[1.0, 2.0, 3.0]), &values, &[0.9; 3])
        .unwrap();
    assert!(trades.is_empty());

    let result = MetricsEngine::new(None).evaluate(trades, day(0), day(2));
    assert_eq!(result.summary.total_trades, 0);
    assert_eq!(result.summary.sharpe_ratio, 0.0);
    assert!(result.equity_curve.is_empty());
}

#[test]
fn test_benchmark_alignment_uses_shorter_series() {
    let benchmark = BenchmarkSeries::from_closes(&[100.0, 101.0, 103.02, 100.0, 105.0]);
    let trades = vec![trade(1, 0.02), trade(2, 0.04)];
    let result = MetricsEngine::new(Some(&benchmark)).evaluate(trades, day(0), day(10));

    // Two aligned observations: 1%, 2%. cov = 1e-4 (n - 1), var = 2.5e-5 (n).
    assert!((result.summary.benchmark_return - (1.01 * 1.02 - 1.0)).abs() < 1e-9);
    assert!((result.summary.beta - 4.0).abs() < 1e-6);
    assert!((result.summary.alpha + 0.03).abs() < 1e-6);
}

#[test]
fn test_run_backtest_writes_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let test_path = dir.path().join("test.csv");
    let predictions_path = dir.path().join("predictions.csv");
    let benchmark_path = dir.path().join("benchmark.csv");
    let output_dir = dir.path().join("results");

    let mut test_data = df! {
        "ticker" => &["AAA", "AAA", "AAA", "AAA"],
        "timestamp" => &["2024-03-01", "2024-03-02", "2024-03-03", "2024-03-04"],
        "close" => &[100.0, 104.0, 102.0, 108.0],
        "momentum" => &[0.1, 0.3, -0.2, 0.4],
    }
    .unwrap();
    let mut predictions = df! {
        "prob_sell" => &[0.1, 0.1, 0.8, 0.1],
        "prob_hold" => &[0.2, 0.6, 0.1, 0.2],
        "prob_buy" => &[0.7, 0.3, 0.1, 0.7],
    }
    .unwrap();
    let mut benchmark = df! {
        "timestamp" => &["2024-03-01", "2024-03-02", "2024-03-03"],
        "close" => &[50.0, 51.0, 52.0],
    }
    .unwrap();
    CsvConnector::write(&mut test_data, &test_path).unwrap();
    CsvConnector::write(&mut predictions, &predictions_path).unwrap();
    CsvConnector::write(&mut benchmark, &benchmark_path).unwrap();

    let config = AppConfig {
        backtesting: BacktestingConfig {
            confidence_threshold: 0.6,
            holding_period: 10,
            transaction_cost: 0.0,
        },
        ..Default::default()
    };
    let result = run_backtest(&config, &test_path, &predictions_path, Some(&benchmark_path), &output_dir).unwrap();

    // Buy at 100, sell at 102; buy again at 108 on the last bar, flushed.
    assert_eq!(result.trades.len(), 2);
    assert!((result.trades[0].return_pct - 0.02).abs() < 1e-12);
    assert_eq!(result.trades[1].holding_days, 0);

    for name in [
        "detailed_trades.csv",
        "equity_curve.csv",
        "drawdown_curve.csv",
        "backtest_metrics.json",
    ] {
        assert!(output_dir.join(name).exists(), "missing {}", name);
    }
}
