pub mod barriers;
pub mod dataset;
pub mod triple_barrier;
pub mod types;
pub mod volatility;

pub use barriers::BarrierResolver;
pub use dataset::{LabeledDataset, LabeledRow, LABEL_COLUMNS};
pub use triple_barrier::{LabelStats, TripleBarrierLabeler};
pub use types::{HitType, Label, LabelRecord};
pub use volatility::{rolling_volatility, simple_returns};
