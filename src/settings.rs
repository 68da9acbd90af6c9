//! Layered pipeline configuration.
//!
//! Built-in defaults, then an optional TOML file, then `RAINWATER_*`
//! environment variables, then command-line overrides. When none of those
//! sets `annual_precip_mm`, the cached precipitation file for the configured
//! year is used, and failing that the fallback constant. The cache is only
//! read when a stage asks for precipitation.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

use crate::error::Result;
use crate::models::{PrecipitationRecord, PrecipitationSource};
use crate::readers::PrecipitationReader;
use crate::utils::constants::*;
use crate::utils::paths;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    #[validate(length(min = 1))]
    pub place_name: String,

    #[validate(length(min = 1))]
    pub short_name: String,

    /// Explicitly configured total; `None` defers to the cache file.
    #[validate(range(min = 0.0))]
    pub annual_precip_mm: Option<f64>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    #[validate(range(min = 1940, max = 2100))]
    pub year: i32,

    #[validate(length(min = 1))]
    pub timezone: String,

    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// Values supplied on the command line. `None` leaves the lower layers in effect.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub place_name: Option<String>,
    pub short_name: Option<String>,
    pub annual_precip_mm: Option<f64>,
    pub year: Option<i32>,
    pub data_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let (config_file, required) = match &overrides.config_file {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let config: Self = Config::builder()
            .set_default("place_name", DEFAULT_PLACE_NAME)?
            .set_default("short_name", DEFAULT_SHORT_NAME)?
            .set_default("latitude", DEFAULT_LATITUDE)?
            .set_default("longitude", DEFAULT_LONGITUDE)?
            .set_default("year", DEFAULT_YEAR as i64)?
            .set_default("timezone", DEFAULT_TIMEZONE)?
            .set_default("data_dir", DEFAULT_DATA_DIR)?
            .set_default("output_dir", DEFAULT_OUTPUT_DIR)?
            .add_source(File::from(config_file.as_path()).required(required))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .set_override_option("place_name", overrides.place_name.clone())?
            .set_override_option("short_name", overrides.short_name.clone())?
            .set_override_option("annual_precip_mm", overrides.annual_precip_mm)?
            .set_override_option("year", overrides.year.map(i64::from))?
            .set_override_option("data_dir", overrides.data_dir.as_deref().map(path_string))?
            .set_override_option(
                "output_dir",
                overrides.output_dir.as_deref().map(path_string),
            )?
            .build()?
            .try_deserialize()?;

        config.validate()?;

        debug!(?config, "Loaded configuration");
        Ok(config)
    }

    /// The precipitation total for the configured year, tagged with where it
    /// came from: the configured value, the cache file, or the fallback.
    pub fn precipitation(&self) -> Result<PrecipitationRecord> {
        let (annual_total_mm, source) = match self.annual_precip_mm {
            Some(value) => (value, PrecipitationSource::Configured),
            None => match PrecipitationReader::new().read_cached(&self.precipitation_cache_path())? {
                Some(value) => (value, PrecipitationSource::Cached),
                None => (FALLBACK_PRECIP_MM, PrecipitationSource::Fallback),
            },
        };

        PrecipitationRecord::new(annual_total_mm, self.year, source)
    }

    pub fn buildings_path(&self) -> PathBuf {
        paths::buildings_path(&self.data_dir, &self.short_name)
    }

    pub fn precipitation_cache_path(&self) -> PathBuf {
        paths::precipitation_cache_path(&self.data_dir, self.year)
    }

    pub fn map_path(&self) -> PathBuf {
        paths::map_path(&self.output_dir)
    }

    pub fn chart_path(&self) -> PathBuf {
        paths::chart_path(&self.output_dir)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            place_name: DEFAULT_PLACE_NAME.to_string(),
            short_name: DEFAULT_SHORT_NAME.to_string(),
            annual_precip_mm: None,
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            year: DEFAULT_YEAR,
            timezone: DEFAULT_TIMEZONE.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
