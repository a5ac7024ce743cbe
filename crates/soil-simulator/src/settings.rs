//! Settings loading for the simulator
//!
//! Reads a TOML file when one is given, otherwise the `SOIL_*` environment
//! variables (a `.env` file in the working directory is loaded first, the
//! same file the firmware build bakes its settings from).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use soil_core::{ConfigError, MonitorConfig, Settings};

pub const ENV_BROADCAST_INTERVAL: &str = "SOIL_BROADCAST_INTERVAL";
pub const ENV_SENSOR_PINS: &str = "SOIL_SENSOR_PINS";
pub const ENV_DRY_CALIBRATIONS: &str = "SOIL_DRY_CALIBRATIONS";
pub const ENV_WET_CALIBRATIONS: &str = "SOIL_WET_CALIBRATIONS";
pub const ENV_LOCAL_NAME: &str = "SOIL_LOCAL_NAME";

const DEFAULT_BROADCAST_INTERVAL: &str = "10s";
const DEFAULT_SENSOR_PINS: &str = "26,27";
const DEFAULT_DRY_CALIBRATIONS: &str = "3000,1000";
const DEFAULT_WET_CALIBRATIONS: &str = "1200,2800";

/// Owned copy of the monitor settings, as written in the TOML file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulatorSettings {
    #[serde(default = "default_broadcast_interval")]
    pub broadcast_interval: String,
    pub sensor_pins: String,
    pub dry_calibrations: String,
    pub wet_calibrations: String,
    #[serde(default)]
    pub local_name: Option<String>,
}

fn default_broadcast_interval() -> String {
    DEFAULT_BROADCAST_INTERVAL.to_string()
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            broadcast_interval: DEFAULT_BROADCAST_INTERVAL.to_string(),
            sensor_pins: DEFAULT_SENSOR_PINS.to_string(),
            dry_calibrations: DEFAULT_DRY_CALIBRATIONS.to_string(),
            wet_calibrations: DEFAULT_WET_CALIBRATIONS.to_string(),
            local_name: None,
        }
    }
}

impl SimulatorSettings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::from_env()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("failed to parse settings in {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Loads `.env` if present, then reads the `SOIL_*` variables. Unset
    /// variables fall back to a two-sensor demo configuration.
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded settings from {}", path.display()),
            Err(e) => debug!("No .env file loaded: {}", e),
        }
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            broadcast_interval: lookup(ENV_BROADCAST_INTERVAL)
                .unwrap_or(defaults.broadcast_interval),
            sensor_pins: lookup(ENV_SENSOR_PINS).unwrap_or(defaults.sensor_pins),
            dry_calibrations: lookup(ENV_DRY_CALIBRATIONS)
                .unwrap_or(defaults.dry_calibrations),
            wet_calibrations: lookup(ENV_WET_CALIBRATIONS)
                .unwrap_or(defaults.wet_calibrations),
            local_name: lookup(ENV_LOCAL_NAME),
        }
    }

    pub fn settings(&self) -> Settings<'_> {
        Settings {
            broadcast_interval: &self.broadcast_interval,
            sensor_pins: &self.sensor_pins,
            dry_calibrations: &self.dry_calibrations,
            wet_calibrations: &self.wet_calibrations,
            local_name: self.local_name.as_deref(),
        }
    }

    pub fn monitor_config(&self) -> Result<MonitorConfig, ConfigError> {
        MonitorConfig::parse(&self.settings())
    }
}
