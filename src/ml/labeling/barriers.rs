use crate::config::BarrierConfig;

/// Computes the take-profit / stop-loss prices for a bar.
///
/// Per side: a fixed percentage wins over a volatility multiplier; without
/// either (or without a defined volatility) the side is unbounded.
pub struct BarrierResolver<'a> {
    config: &'a BarrierConfig,
    volatility: Option<&'a [Option<f64>]>,
    vol_is_pct: bool,
}

impl<'a> BarrierResolver<'a> {
    pub fn new(
        config: &'a BarrierConfig,
        volatility: Option<&'a [Option<f64>]>,
        vol_is_pct: bool,
    ) -> Self {
        Self {
            config,
            volatility,
            vol_is_pct,
        }
    }

    /// `(upper, lower)` for bar `i` priced at `price`.
    pub fn resolve(&self, i: usize, price: f64) -> (f64, f64) {
        let vol = self
            .volatility
            .and_then(|v| v.get(i).copied().flatten())
            .filter(|v| v.is_finite());

        let upper = match (self.config.tp_pct, self.config.tp_k, vol) {
            (Some(pct), _, _) => price * (1.0 + pct),
            (None, Some(k), Some(vol)) => self.scale(price, k * vol),
            _ => f64::INFINITY,
        };

        let lower = match (self.config.sl_pct, self.config.sl_k, vol) {
            (Some(pct), _, _) => price * (1.0 - pct),
            (None, Some(k), Some(vol)) => self.scale(price, -k * vol),
            _ => f64::NEG_INFINITY,
        };

        (upper, lower)
    }

    fn scale(&self, price: f64, offset: f64) -> f64 {
        if self.vol_is_pct {
            price * (1.0 + offset)
        } else {
            price + offset
        }
    }
}
