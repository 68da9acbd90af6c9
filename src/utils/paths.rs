use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};
use crate::utils::constants::{CHART_FILE, MAP_FILE};

/// Interim building dataset: `{data_dir}/{short_name}_buildings.geojson`
pub fn buildings_path(data_dir: &Path, short_name: &str) -> PathBuf {
    data_dir.join(format!("{}_buildings.geojson", short_name))
}

/// Precipitation cache: `{data_dir}/precip_mm_{year}.txt`
pub fn precipitation_cache_path(data_dir: &Path, year: i32) -> PathBuf {
    data_dir.join(format!("precip_mm_{}.txt", year))
}

pub fn map_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MAP_FILE)
}

pub fn chart_path(output_dir: &Path) -> PathBuf {
    output_dir.join(CHART_FILE)
}

/// Fails with `MissingInput` when a stage's input file has not been produced yet.
pub fn require_input(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::MissingInput {
            path: path.to_path_buf(),
        })
    }
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
