use crate::error::BarrierLabError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), BarrierLabError>;
}

pub(crate) fn invalid(section: &str, message: impl AsRef<str>) -> BarrierLabError {
    BarrierLabError::Configuration(format!("[{}] {}", section, message.as_ref()))
}
