use thiserror::Error;

#[derive(Error, Debug)]
pub enum BarrierLabError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Data loading error: {0}")]
    DataLoading(String),

    #[error("Labeling error: {0}")]
    Labeling(String),

    #[error("Backtest error: {0}")]
    BacktestError(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config source error: {0}")]
    ConfigSource(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, BarrierLabError>;
