use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Sell = -1,
    Hold = 0,
    Buy = 1,
}

impl Label {
    pub fn value(&self) -> i8 {
        *self as i8
    }

    pub fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            Label::Buy
        } else if value < 0.0 {
            Label::Sell
        } else {
            Label::Hold
        }
    }

    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            -1 => Some(Label::Sell),
            0 => Some(Label::Hold),
            1 => Some(Label::Buy),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Label::Sell => "Sell",
            Label::Hold => "Hold",
            Label::Buy => "Buy",
        }
    }
}

/// Which condition decided a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitType {
    Tp,
    Sl,
    Both,
    VbarSign,
    VbarNeutral,
    None,
}

impl HitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HitType::Tp => "tp",
            HitType::Sl => "sl",
            HitType::Both => "both",
            HitType::VbarSign => "vbar_sign",
            HitType::VbarNeutral => "vbar_neutral",
            HitType::None => "none",
        }
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self, HitType::VbarSign | HitType::VbarNeutral)
    }
}

/// Outcome of the forward scan for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub label: Label,
    pub hit_time: Option<DateTime<Utc>>,
    pub hit_type: HitType,
    /// `+inf` when the take-profit side is disabled.
    pub upper_barrier: Option<f64>,
    /// `-inf` when the stop-loss side is disabled.
    pub lower_barrier: Option<f64>,
    /// Set only when the vertical barrier decided the label.
    pub vertical_barrier_time: Option<DateTime<Utc>>,
}

impl LabelRecord {
    /// Record for a bar without a forward window (the last bar of a series).
    pub fn undecided() -> Self {
        Self {
            label: Label::Hold,
            hit_time: None,
            hit_type: HitType::None,
            upper_barrier: None,
            lower_barrier: None,
            vertical_barrier_time: None,
        }
    }

    pub fn is_decided(&self) -> bool {
        self.hit_type != HitType::None
    }
}
