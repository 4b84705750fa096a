use super::traits::{invalid, ConfigSection};
use crate::error::BarrierLabError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelingConfig {
    /// Vertical barrier, in bars.
    pub horizon: usize,
    pub barriers: BarrierConfig,
    pub volatility: VolatilityConfig,
    pub tie_policy: TiePolicy,
    /// Neutral zone for vertical-barrier exits only.
    pub min_ret: Option<f64>,
    /// Check touches against high/low instead of close.
    pub use_hl: bool,
    /// Target class shares used to score label balance.
    pub expected_distribution: Option<ExpectedDistribution>,
}

/// Fixed percentages take precedence over volatility multipliers, per side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrierConfig {
    pub tp_pct: Option<f64>,
    pub sl_pct: Option<f64>,
    pub tp_k: Option<f64>,
    pub sl_k: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityConfig {
    pub window: usize,
    /// Volatility is a fraction of price (true) or in price units (false).
    pub is_percentage: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedDistribution {
    pub sell: f64,
    pub hold: f64,
    pub buy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiePolicy {
    Ambiguous,
    Tp,
    Sl,
    Closest,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            horizon: 10,
            barriers: BarrierConfig {
                tp_pct: None,
                sl_pct: None,
                tp_k: Some(2.0),
                sl_k: Some(1.0),
            },
            volatility: VolatilityConfig::default(),
            tie_policy: TiePolicy::Ambiguous,
            min_ret: Some(0.002),
            use_hl: true,
            expected_distribution: None,
        }
    }
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            window: 20,
            is_percentage: true,
        }
    }
}

impl Default for TiePolicy {
    fn default() -> Self {
        TiePolicy::Ambiguous
    }
}

impl LabelingConfig {
    /// Shortest ticker series that gets labeled at all.
    pub fn min_series_len(&self) -> usize {
        self.horizon + self.volatility.window
    }

    /// Whether any side needs a volatility estimate.
    pub fn needs_volatility(&self) -> bool {
        (self.barriers.tp_pct.is_none() && self.barriers.tp_k.is_some())
            || (self.barriers.sl_pct.is_none() && self.barriers.sl_k.is_some())
    }
}

impl ConfigSection for LabelingConfig {
    fn section_name() -> &'static str {
        "labeling"
    }

    fn validate(&self) -> Result<(), BarrierLabError> {
        let section = Self::section_name();
        if self.horizon == 0 {
            return Err(invalid(section, "horizon must be at least 1 bar"));
        }
        if self.volatility.window == 0 {
            return Err(invalid(section, "volatility window must be at least 1 bar"));
        }
        let b = &self.barriers;
        for (name, value) in [
            ("tp_pct", b.tp_pct),
            ("sl_pct", b.sl_pct),
            ("tp_k", b.tp_k),
            ("sl_k", b.sl_k),
            ("min_ret", self.min_ret),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(invalid(
                        section,
                        format!("{} must be a non-negative number, got {}", name, v),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl FromStr for TiePolicy {
    type Err = BarrierLabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ambiguous" => Ok(TiePolicy::Ambiguous),
            "tp" => Ok(TiePolicy::Tp),
            "sl" => Ok(TiePolicy::Sl),
            "closest" => Ok(TiePolicy::Closest),
            other => Err(BarrierLabError::Configuration(format!(
                "Unknown tie policy '{}' (expected ambiguous, tp, sl or closest)",
                other
            ))),
        }
    }
}

impl fmt::Display for TiePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TiePolicy::Ambiguous => "ambiguous",
            TiePolicy::Tp => "tp",
            TiePolicy::Sl => "sl",
            TiePolicy::Closest => "closest",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tie_policy_parsing() {
        assert_eq!("closest".parse::<TiePolicy>().unwrap(), TiePolicy::Closest);
        assert_eq!(" TP ".parse::<TiePolicy>().unwrap(), TiePolicy::Tp);
        assert!(matches!(
            "random".parse::<TiePolicy>(),
            Err(BarrierLabError::Configuration(_))
        ));
    }

    #[test]
    fn test_negative_barrier_rejected() {
        let mut config = LabelingConfig::default();
        config.barriers.tp_pct = Some(-0.01);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_series_len() {
        let config = LabelingConfig::default();
        assert_eq!(config.min_series_len(), 30);
        assert!(config.needs_volatility());
    }
}
