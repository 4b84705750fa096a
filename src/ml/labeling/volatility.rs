//! Rolling dispersion of simple returns, used to scale barriers.

/// Simple returns `close[i] / close[i-1] - 1`; the first bar has none.
pub fn simple_returns(close: &[f64]) -> Vec<Option<f64>> {
    let mut returns = Vec::with_capacity(close.len());
    if close.is_empty() {
        return returns;
    }
    returns.push(None);
    for w in close.windows(2) {
        let r = w[1] / w[0] - 1.0;
        returns.push(if r.is_finite() { Some(r) } else { None });
    }
    returns
}

/// Rolling sample standard deviation of simple returns over `window` bars.
///
/// A value is produced once at least `window / 2` returns (and never fewer
/// than two) are available inside the window; earlier bars are `None`.
pub fn rolling_volatility(close: &[f64], window: usize) -> Vec<Option<f64>> {
    let returns = simple_returns(close);
    let window = window.max(1);
    let min_periods = (window / 2).max(2);

    (0..returns.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let observed: Vec<f64> = returns[start..=i].iter().flatten().copied().collect();
            if observed.len() < min_periods {
                return None;
            }
            sample_std(&observed)
        })
        .collect()
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}
