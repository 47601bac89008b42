use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_INITIAL_CAPACITY: usize = 30;
pub const DEFAULT_LOAD_FACTOR_THRESHOLD: f64 = 0.75;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistrySettings {
    pub initial_capacity: usize,
    pub load_factor_threshold: f64,
}

impl RegistrySettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capacity == 0 {
            return Err(ConfigError::Message(
                "registry.initial_capacity must be positive".to_string(),
            ));
        }
        let threshold = self.load_factor_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::Message(format!(
                "registry.load_factor_threshold must be within (0, 1], got {}",
                threshold
            )));
        }
        Ok(())
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor_threshold: DEFAULT_LOAD_FACTOR_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexSettings {
    /// Per-city queue bound; absent means unbounded.
    pub city_queue_capacity: Option<usize>,
}

impl IndexSettings {
    pub fn queue_capacity(&self) -> usize {
        self.city_queue_capacity.unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub registry: RegistrySettings,
    pub index: IndexSettings,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry: RegistrySettings::default(),
            index: IndexSettings::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Layers defaults, an optional file and `PARCELSORT_*` environment
    /// variables (`__` separates sections), in that order of precedence.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("registry.initial_capacity", DEFAULT_INITIAL_CAPACITY as i64)?
            .set_default("registry.load_factor_threshold", DEFAULT_LOAD_FACTOR_THRESHOLD)?
            .set_default("log_filter", "info")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix("PARCELSORT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.registry.validate()?;
        if self.index.city_queue_capacity == Some(0) {
            return Err(ConfigError::Message(
                "index.city_queue_capacity must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn defaults_match_tracker_constants() {
        let settings = Settings::default();
        assert_eq!(settings.registry.initial_capacity, 30);
        assert_eq!(settings.registry.load_factor_threshold, 0.75);
        assert_eq!(settings.index.queue_capacity(), usize::MAX);
        assert!(settings.validate().is_ok());
    }

    #[test]
    #[serial]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "log_filter = \"debug\"\n[registry]\ninitial_capacity = 8\n[index]\ncity_queue_capacity = 4"
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.registry.initial_capacity, 8);
        assert_eq!(settings.registry.load_factor_threshold, 0.75);
        assert_eq!(settings.index.city_queue_capacity, Some(4));
        assert_eq!(settings.log_filter, "debug");
    }

    #[test]
    #[serial]
    fn environment_overrides_registry_section() {
        std::env::set_var("PARCELSORT_REGISTRY__INITIAL_CAPACITY", "64");
        let loaded = Settings::load(None);
        std::env::remove_var("PARCELSORT_REGISTRY__INITIAL_CAPACITY");

        assert_eq!(loaded.unwrap().registry.initial_capacity, 64);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut settings = Settings::default();
        settings.registry.load_factor_threshold = 1.5;
        assert!(settings.validate().is_err());

        settings.registry.load_factor_threshold = 0.0;
        assert!(settings.validate().is_err());

        settings.registry.load_factor_threshold = f64::NAN;
        assert!(settings.validate().is_err());

        settings.registry.load_factor_threshold = 0.75;
        settings.registry.initial_capacity = 0;
        assert!(settings.validate().is_err());
    }
}
