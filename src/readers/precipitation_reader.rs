use crate::error::{PipelineError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Reads the single-scalar precipitation cache written by `fetch-precipitation`.
pub struct PrecipitationReader;

impl PrecipitationReader {
    pub fn new() -> Self {
        Self
    }

    /// `Ok(None)` when the cache file does not exist.
    pub fn read_cached(&self, path: &Path) -> Result<Option<f64>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value = contents.trim().parse::<f64>().map_err(|_| {
            PipelineError::InvalidFormat(format!(
                "Invalid precipitation cache '{}' in {}",
                contents.trim(),
                path.display()
            ))
        })?;

        if !value.is_finite() || value < 0.0 {
            return Err(PipelineError::InvalidPrecipitation(value));
        }

        Ok(Some(value))
    }
}

impl Default for PrecipitationReader {
    fn default() -> Self {
        Self::new()
    }
}
