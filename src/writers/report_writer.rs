use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::analyzers::RainwaterReport;
use crate::error::Result;
use crate::utils::paths::ensure_parent_dir;

/// Writes the aggregated report as JSON for downstream tooling.
pub struct ReportWriter;

impl ReportWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_json(&self, report: &RainwaterReport, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, report)?;
        writer.flush()?;
        Ok(())
    }
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::RainwaterAnalyzer;
    use crate::models::{CategoryThresholds, Dataset};
    use tempfile::TempDir;

    #[test]
    fn test_empty_report_serializes_means_as_null() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("report.json");
        let report =
            RainwaterAnalyzer::new().analyze(&Dataset::default(), &CategoryThresholds::default())?;

        ReportWriter::new().write_json(&report, &path)?;

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(json["total_footprints"], 0);
        assert!(json["mean_area_m2"].is_null());
        assert_eq!(json["categories"].as_array().map(Vec::len), Some(4));
        assert_eq!(json["categories"][3]["category"], "very_high");
        Ok(())
    }

    #[test]
    fn test_impact_marked_approximate_in_json() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("report.json");
        let report =
            RainwaterAnalyzer::new().analyze(&Dataset::default(), &CategoryThresholds::default())?;

        ReportWriter::new().write_json(&report, &path)?;

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        let impact = &json["impact"];
        assert_eq!(impact["approximate"], true);
        assert_eq!(impact["assumptions"]["liters_per_person_per_day"], 120.0);
        assert_eq!(impact["assumptions"]["co2_kg_per_m3"], 0.7);
        assert_eq!(impact["assumptions"]["co2_kg_per_car_journey"], 2300.0);
        Ok(())
    }
}
