use super::{
    backtesting::BacktestingConfig,
    cross_validation::CrossValidationConfig,
    dataset::DatasetConfig,
    labeling::LabelingConfig,
    traits::ConfigSection,
};
use crate::error::BarrierLabError;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

const ENV_PREFIX: &str = "BARRIERLAB";

/// Immutable run configuration. Built once, then passed by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub labeling: LabelingConfig,
    pub cross_validation: CrossValidationConfig,
    pub dataset: DatasetConfig,
    pub backtesting: BacktestingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), BarrierLabError> {
        self.labeling.validate()?;
        self.cross_validation.validate()?;
        self.dataset.validate()?;
        self.backtesting.validate()?;
        Ok(())
    }
}

pub struct ConfigManager;

impl ConfigManager {
    /// Load a TOML file, apply `BARRIERLAB_<SECTION>__<KEY>` overrides, validate.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<AppConfig, BarrierLabError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BarrierLabError::Configuration(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let settings = Config::builder()
            .add_source(Self::defaults()?)
            .add_source(File::from(path).format(FileFormat::Toml))
            .add_source(Self::environment())
            .build()?;

        let config = Self::deserialize(settings)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Defaults plus environment overrides, for runs without a config file.
    pub fn load_defaults() -> Result<AppConfig, BarrierLabError> {
        let settings = Config::builder()
            .add_source(Self::defaults()?)
            .add_source(Self::environment())
            .build()?;
        Self::deserialize(settings)
    }

    pub fn from_toml_str(contents: &str) -> Result<AppConfig, BarrierLabError> {
        let settings = Config::builder()
            .add_source(Self::defaults()?)
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?;
        Self::deserialize(settings)
    }

    pub fn save_to_file<P: AsRef<Path>>(config: &AppConfig, path: P) -> Result<(), BarrierLabError> {
        let toml_str = toml::to_string_pretty(config)
            .map_err(|e| BarrierLabError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| BarrierLabError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Lowest layer: every key of `AppConfig::default()`, so a partial
    /// nested table only replaces the keys it names.
    fn defaults() -> Result<Config, BarrierLabError> {
        Ok(Config::try_from(&AppConfig::default())?)
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn deserialize(settings: Config) -> Result<AppConfig, BarrierLabError> {
        let config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| BarrierLabError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CvMethod, TiePolicy};

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = ConfigManager::from_toml_str(
            r#"
            [labeling]
            horizon = 5
            tie_policy = "closest"

            [labeling.barriers]
            tp_pct = 0.03
            sl_pct = 0.02

            [cross_validation]
            method = "purged"
            embargo_length = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.labeling.horizon, 5);
        assert_eq!(config.labeling.tie_policy, TiePolicy::Closest);
        assert_eq!(config.labeling.barriers.tp_pct, Some(0.03));
        assert_eq!(config.labeling.volatility.window, 20);
        assert_eq!(config.cross_validation.method, CvMethod::Purged);
        assert_eq!(config.cross_validation.n_splits, 5);
        assert_eq!(config.backtesting.holding_period, 10);
    }

    #[test]
    fn test_partial_barrier_table_keeps_multipliers() {
        let config = ConfigManager::from_toml_str(
            r#"
            [labeling.barriers]
            tp_pct = 0.03
            "#,
        )
        .unwrap();

        let barriers = &config.labeling.barriers;
        assert_eq!(barriers.tp_pct, Some(0.03));
        assert_eq!(barriers.sl_pct, None);
        assert_eq!(barriers.tp_k, Some(2.0));
        assert_eq!(barriers.sl_k, Some(1.0));
        assert_eq!(config.labeling.min_ret, Some(0.002));
    }

    #[test]
    fn test_unknown_tie_policy_is_fatal() {
        let result = ConfigManager::from_toml_str(
            r#"
            [labeling]
            tie_policy = "coin_flip"
            "#,
        );
        assert!(matches!(result, Err(BarrierLabError::Configuration(_))));
    }

    #[test]
    fn test_unknown_cv_method_is_fatal() {
        let result = ConfigManager::from_toml_str(
            r#"
            [cross_validation]
            method = "kfold"
            "#,
        );
        assert!(matches!(result, Err(BarrierLabError::Configuration(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("barrierlab.toml");

        let mut config = AppConfig::default();
        config.backtesting.transaction_cost = 0.002;
        config.cross_validation.method = CvMethod::Purged;
        ConfigManager::save_to_file(&config, &path).unwrap();

        let reloaded = ConfigManager::load_from_file(&path).unwrap();
        assert_eq!(reloaded.backtesting.transaction_cost, 0.002);
        assert_eq!(reloaded.cross_validation.method, CvMethod::Purged);
        assert_eq!(reloaded.labeling.barriers.tp_k, Some(2.0));
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigManager::load_from_file("/nonexistent/barrierlab.toml");
        assert!(matches!(result, Err(BarrierLabError::Configuration(_))));
    }
}
