//! Layered configuration for simulation runs.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Directory under the user's config root holding `config.toml`.
pub const CONFIG_DIR: &str = "railcross";
/// Prefix for environment overrides, e.g. `RAILCROSS__SIMULATION__TICK_MS`.
pub const ENV_PREFIX: &str = "RAILCROSS";
/// Longest accepted tick: one minute of wall clock per simulated tenth.
pub const MAX_TICK_MS: u64 = 60_000;

/// Timing and fairness knobs for the crossing scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Wall-clock length of one tenth of a time unit, in milliseconds.
    pub tick_ms: u64,
    /// Bucket size loading completion times are rounded down to.
    pub stamp_resolution_ms: u64,
    /// Consecutive same-direction crossings allowed while the other side waits.
    pub starvation_limit: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            stamp_resolution_ms: 100,
            starvation_limit: 3,
        }
    }
}

impl SimulationConfig {
    /// Reject settings the scheduler cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::Zero("tick_ms"));
        }
        if self.tick_ms > MAX_TICK_MS {
            return Err(ConfigError::TooLarge {
                field: "tick_ms",
                max: MAX_TICK_MS,
            });
        }
        if self.stamp_resolution_ms == 0 {
            return Err(ConfigError::Zero("stamp_resolution_ms"));
        }
        if self.starvation_limit == 0 {
            return Err(ConfigError::Zero("starvation_limit"));
        }
        Ok(())
    }

    /// Wall-clock length of one simulated tenth.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Rounding bucket for loading completion stamps.
    pub fn stamp_resolution(&self) -> Duration {
        Duration::from_millis(self.stamp_resolution_ms)
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scheduler timing and fairness settings.
    pub simulation: SimulationConfig,
}

impl AppConfig {
    /// Load configuration, layering an explicit file above the user file.
    ///
    /// The explicit file must exist; the user file is optional.
    pub fn load_from(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = user_config_path() {
            builder =
                builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }
        if let Some(path) = explicit {
            builder =
                builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("failed to parse configuration")?;
        config
            .simulation
            .validate()
            .context("invalid simulation configuration")?;
        Ok(config)
    }
}

/// Location of the per-user configuration file, if a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_use_tenth_second_timing() {
        let config = SimulationConfig::default();
        assert_eq!(config.tick(), Duration::from_millis(100));
        assert_eq!(config.stamp_resolution(), Duration::from_millis(100));
        assert_eq!(config.starvation_limit, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn explicit_file_overrides_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("railcross.toml");
        fs::write(
            &path,
            "[simulation]\ntick_ms = 5\nstarvation_limit = 2\n",
        )?;

        let config = AppConfig::load_from(Some(&path))?;
        assert_eq!(config.simulation.tick_ms, 5);
        assert_eq!(config.simulation.starvation_limit, 2);
        assert_eq!(config.simulation.stamp_resolution_ms, 100);
        Ok(())
    }

    #[test]
    fn zero_values_are_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("railcross.toml");
        fs::write(&path, "[simulation]\ntick_ms = 0\n")?;

        assert!(AppConfig::load_from(Some(&path)).is_err());
        let config = SimulationConfig {
            starvation_limit: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Zero("starvation_limit"))
        );
        Ok(())
    }

    #[test]
    fn oversized_tick_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("railcross.toml");
        fs::write(&path, "[simulation]\ntick_ms = 999999999\n")?;

        assert!(AppConfig::load_from(Some(&path)).is_err());
        let config = SimulationConfig {
            tick_ms: MAX_TICK_MS + 1,
            ..SimulationConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooLarge {
                field: "tick_ms",
                max: MAX_TICK_MS,
            })
        );
        Ok(())
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("absent.toml");
        assert!(AppConfig::load_from(Some(&missing)).is_err());
    }
}
