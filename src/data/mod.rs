pub mod connectors;
pub mod series;
pub mod export;

pub use connectors::{CsvConnector, DataValidator, DatasetMetadata, PriceColumn};
pub use series::{partition_by_ticker, TickerSeries};
pub use export::ArtifactWriter;
pub(crate) use connectors::is_numeric_dtype;
