use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PipelineError, Result};

/// Where the annual precipitation value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecipitationSource {
    Fetched,
    Cached,
    Fallback,
    #[default]
    Configured,
}

impl fmt::Display for PrecipitationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrecipitationSource::Fetched => "fetched from weather archive",
            PrecipitationSource::Cached => "cached value",
            PrecipitationSource::Fallback => "fallback constant",
            PrecipitationSource::Configured => "configured value",
        };
        f.write_str(s)
    }
}

/// Total annual precipitation depth for one location and year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecipitationRecord {
    pub annual_total_mm: f64,
    pub year: i32,
    pub source: PrecipitationSource,
    /// Days summed when fetched; `None` otherwise.
    pub observed_days: Option<usize>,
}

impl PrecipitationRecord {
    pub fn new(annual_total_mm: f64, year: i32, source: PrecipitationSource) -> Result<Self> {
        if !annual_total_mm.is_finite() || annual_total_mm < 0.0 {
            return Err(PipelineError::InvalidPrecipitation(annual_total_mm));
        }

        Ok(Self {
            annual_total_mm,
            year,
            source,
            observed_days: None,
        })
    }

    pub fn with_observed_days(mut self, days: usize) -> Self {
        self.observed_days = Some(days);
        self
    }

    /// Value as written to the cache file.
    pub fn rounded_mm(&self) -> f64 {
        (self.annual_total_mm * 10.0).round() / 10.0
    }
}

impl fmt::Display for PrecipitationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} mm in {} ({})",
            self.annual_total_mm, self.year, self.source
        )
    }
}
