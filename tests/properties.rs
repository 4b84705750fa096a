use barrierlab::config::{BacktestingConfig, BarrierConfig, CrossValidationConfig, CvMethod, LabelingConfig, TiePolicy};
use barrierlab::data::TickerSeries;
use barrierlab::engines::evaluation::Backtester;
use barrierlab::engines::validation::splitters::{create_splitter, SplitIndex};
use barrierlab::ml::labeling::{HitType, Label, TripleBarrierLabeler};
use barrierlab::types::ExitReason;
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

fn day(i: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap() + Duration::days(i as i64)
}

/// Random walk bars with a high/low range around each close.
fn bars_strategy() -> impl Strategy<Value = TickerSeries> {
    prop::collection::vec((-0.04f64..0.04, 0.0f64..0.03, 0.0f64..0.03), 3..60).prop_map(|steps| {
        let mut close = Vec::with_capacity(steps.len());
        let mut high = Vec::with_capacity(steps.len());
        let mut low = Vec::with_capacity(steps.len());
        let mut open = Vec::with_capacity(steps.len());
        let mut price = 100.0;
        for (ret, up, down) in &steps {
            open.push(price);
            price *= 1.0 + ret;
            close.push(price);
            high.push(price.max(*open.last().unwrap()) * (1.0 + up));
            low.push(price.min(*open.last().unwrap()) * (1.0 - down));
        }
        let timestamps = (0..steps.len()).map(day).collect();
        let mut series = TickerSeries::from_closes("PROP", timestamps, close).unwrap();
        series.open = open;
        series.high = high;
        series.low = low;
        series.has_high_low = true;
        series
    })
}

fn config(horizon: usize, tp: f64, sl: f64, tie_policy: TiePolicy) -> LabelingConfig {
    LabelingConfig {
        horizon,
        barriers: BarrierConfig {
            tp_pct: Some(tp),
            sl_pct: Some(sl),
            tp_k: None,
            sl_k: None,
        },
        tie_policy,
        min_ret: Some(0.002),
        use_hl: true,
        ..Default::default()
    }
}

fn policy_strategy() -> impl Strategy<Value = TiePolicy> {
    prop_oneof![
        Just(TiePolicy::Ambiguous),
        Just(TiePolicy::Tp),
        Just(TiePolicy::Sl),
        Just(TiePolicy::Closest),
    ]
}

proptest! {
    #[test]
    fn single_decision_and_chronology(
        series in bars_strategy(),
        horizon in 1usize..8,
        tp in 0.005f64..0.06,
        sl in 0.005f64..0.06,
        policy in policy_strategy(),
    ) {
        let records = TripleBarrierLabeler::new(config(horizon, tp, sl, policy))
            .label_series(&series)
            .unwrap();
        let n = series.len();
        prop_assert_eq!(records.len(), n);
        prop_assert_eq!(records[n - 1].hit_type, HitType::None);

        for (i, record) in records.iter().enumerate().take(n - 1) {
            let hit = record.hit_time.unwrap();
            prop_assert!(hit > series.timestamps[i]);

            let j = series.timestamps.iter().position(|t| *t == hit).unwrap();
            prop_assert!(j <= (i + horizon).min(n - 1));

            let upper = record.upper_barrier.unwrap();
            let lower = record.lower_barrier.unwrap();
            let touched = |k: usize| series.high[k] >= upper || series.low[k] <= lower;

            // Nothing touched before the deciding bar.
            for k in (i + 1)..j {
                prop_assert!(!touched(k));
            }
            if record.hit_type.is_vertical() {
                prop_assert!(!touched(j));
                prop_assert_eq!(record.vertical_barrier_time, Some(hit));
            } else {
                prop_assert!(touched(j));
                prop_assert_eq!(record.vertical_barrier_time, None);
            }
        }
    }

    #[test]
    fn tie_break_is_deterministic(
        series in bars_strategy(),
        horizon in 1usize..8,
        pct in 0.001f64..0.02,
    ) {
        for (policy, forbidden) in [(TiePolicy::Tp, Label::Sell), (TiePolicy::Sl, Label::Buy)] {
            let records = TripleBarrierLabeler::new(config(horizon, pct, pct, policy))
                .label_series(&series)
                .unwrap();
            let ambiguous = TripleBarrierLabeler::new(config(horizon, pct, pct, TiePolicy::Ambiguous))
                .label_series(&series)
                .unwrap();

            for (forced, reference) in records.iter().zip(&ambiguous) {
                prop_assert!(forced.hit_type != HitType::Both);
                if reference.hit_type == HitType::Both {
                    prop_assert_eq!(reference.label, Label::Hold);
                    prop_assert!(forced.label != forbidden);
                    prop_assert!(forced.label != Label::Hold);
                    prop_assert_eq!(forced.hit_time, reference.hit_time);
                }
            }
        }
    }

    #[test]
    fn purged_split_never_looks_ahead(
        offsets in prop::collection::vec(0i64..15, 40..150),
        n_splits in 1usize..5,
        embargo in 0i64..4,
        purge in 0usize..5,
    ) {
        let pred: Vec<_> = (0..offsets.len()).map(day).collect();
        let eval: Vec<_> = pred.iter().zip(&offsets).map(|(t, o)| *t + Duration::days(*o)).collect();
        let index = SplitIndex::new(pred, eval).unwrap();

        let config = CrossValidationConfig {
            method: CvMethod::Purged,
            n_splits,
            test_size: 0.15,
            embargo_length: embargo,
            purge_length: purge,
            ..Default::default()
        };
        let plan = create_splitter(&config).split(&index).unwrap();

        for split in plan.iter() {
            for &row in &split.train {
                prop_assert!(!split.test.contains(&row));
                for t in [index.prediction_times[row], index.evaluation_times[row]] {
                    prop_assert!(t < split.test_start_time || t > split.test_end_time);
                }
            }
        }
    }

    #[test]
    fn long_only_with_costs(
        closes in prop::collection::vec(1.0f64..200.0, 2..80),
        raw_signals in prop::collection::vec(-1i64..=1, 80),
        holding_period in 1usize..6,
        cost in 0.0f64..0.01,
    ) {
        let n = closes.len();
        let series = TickerSeries::from_closes("PROP", (0..n).map(day).collect(), closes.clone()).unwrap();
        let values: Vec<Label> = raw_signals[..n].iter().map(|&v| Label::from_value(v).unwrap()).collect();

        let backtester = Backtester::new(BacktestingConfig {
            holding_period,
            transaction_cost: cost,
            ..Default::default()
        });
        let trades = backtester.simulate_values(&series, &values, &vec![0.9; n]).unwrap();

        for trade in &trades {
            let entry = series.timestamps.iter().position(|t| *t == trade.entry_date).unwrap();
            let exit = series.timestamps.iter().position(|t| *t == trade.exit_date).unwrap();
            prop_assert_eq!(values[entry], Label::Buy);
            prop_assert!((trade.entry_price - closes[entry] * (1.0 + cost)).abs() < 1e-9);
            prop_assert!((trade.exit_price - closes[exit] * (1.0 - cost)).abs() < 1e-9);
            if trade.exit_reason == ExitReason::EndOfData {
                prop_assert_eq!(trade.holding_days, n - entry - 1);
            } else {
                prop_assert!(trade.holding_days <= holding_period);
                prop_assert!(entry < exit);
            }
        }
        for pair in trades.windows(2) {
            prop_assert!(pair[0].exit_date < pair[1].entry_date);
        }
    }
}
