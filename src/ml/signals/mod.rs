pub mod generator;
pub mod types;

pub use generator::SignalGenerator;
pub use types::{class_to_label, Signal, SignalCounts};
