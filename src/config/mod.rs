pub mod traits;
pub mod labeling;
pub mod cross_validation;
pub mod dataset;
pub mod backtesting;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use labeling::{BarrierConfig, ExpectedDistribution, LabelingConfig, TiePolicy, VolatilityConfig};
pub use cross_validation::{CrossValidationConfig, CvMethod};
pub use dataset::DatasetConfig;
pub use backtesting::BacktestingConfig;
