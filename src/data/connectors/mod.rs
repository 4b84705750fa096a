mod csv;
mod types;
mod validator;

pub use csv::CsvConnector;
pub use types::{DatasetMetadata, PriceColumn};
pub use validator::DataValidator;
pub(crate) use validator::is_numeric_dtype;
