use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::models::PrecipitationRecord;
use crate::utils::paths::ensure_parent_dir;

/// Writes the precipitation cache: one number, one decimal, no newline.
pub struct PrecipitationWriter;

impl PrecipitationWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_cache(&self, record: &PrecipitationRecord, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        fs::write(path, format!("{:.1}", record.rounded_mm()))?;

        debug!("Cached {} at {}", record, path.display());
        Ok(())
    }
}

impl Default for PrecipitationWriter {
    fn default() -> Self {
        Self::new()
    }
}
