use crate::ml::labeling::Label;
use crate::ml::models::N_CLASSES;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trading decision for one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: DateTime<Utc>,
    pub ticker: String,
    pub value: Label,
    /// Probability of the predicted class.
    pub confidence: f64,
    pub prob_sell: f64,
    pub prob_hold: f64,
    pub prob_buy: f64,
}

impl Signal {
    pub fn probabilities(&self) -> [f64; N_CLASSES] {
        [self.prob_sell, self.prob_hold, self.prob_buy]
    }
}

/// Model class index to signal: 0 sell, 1 hold, 2 buy.
pub fn class_to_label(class: usize) -> Option<Label> {
    match class {
        0 => Some(Label::Sell),
        1 => Some(Label::Hold),
        2 => Some(Label::Buy),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCounts {
    pub buy: usize,
    pub sell: usize,
    pub hold: usize,
}

impl SignalCounts {
    pub fn from_signals(signals: &[Signal]) -> Self {
        signals.iter().fold(Self::default(), |mut counts, s| {
            match s.value {
                Label::Buy => counts.buy += 1,
                Label::Sell => counts.sell += 1,
                Label::Hold => counts.hold += 1,
            }
            counts
        })
    }
}
