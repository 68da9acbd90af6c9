use geo::{Geometry, MultiPolygon};
use geojson::{Feature, FeatureCollection, GeoJson};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::models::{Dataset, Footprint, PotentialCategory};
use crate::utils::paths::require_input;

/// Loads the interim building dataset from a GeoJSON `FeatureCollection`.
pub struct FootprintReader {
    skip_non_polygons: bool,
}

impl FootprintReader {
    pub fn new() -> Self {
        Self {
            skip_non_polygons: true,
        }
    }

    /// When disabled, a point or line feature is an error instead of being dropped.
    pub fn with_skip_non_polygons(skip_non_polygons: bool) -> Self {
        Self { skip_non_polygons }
    }

    pub fn read_dataset(&self, path: &Path) -> Result<Dataset> {
        require_input(path)?;

        let contents = fs::read_to_string(path)?;
        let dataset = self.parse_dataset(&contents)?;

        debug!(
            "Loaded {} footprints from {}",
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn parse_dataset(&self, contents: &str) -> Result<Dataset> {
        let geojson: GeoJson = contents.parse()?;
        let collection = FeatureCollection::try_from(geojson)?;

        let mut footprints = Vec::with_capacity(collection.features.len());
        let mut skipped = 0usize;

        for (index, feature) in collection.features.into_iter().enumerate() {
            match self.parse_feature(index, feature)? {
                Some(footprint) => footprints.push(footprint),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!("Skipped {} features without polygon geometry", skipped);
        }

        Ok(Dataset::new(footprints))
    }

    fn parse_feature(&self, index: usize, feature: Feature) -> Result<Option<Footprint>> {
        let Some(geometry) = feature.geometry.as_ref() else {
            return self.non_polygon(index, "feature has no geometry");
        };

        let geometry: Geometry<f64> = Geometry::try_from(geometry.value.clone())?;
        let multi_polygon = match geometry {
            Geometry::Polygon(polygon) => MultiPolygon(vec![polygon]),
            Geometry::MultiPolygon(multi_polygon) => multi_polygon,
            _ => return self.non_polygon(index, "geometry is not a polygon"),
        };

        let area_m2 = number_property(&feature, "area_m2");
        let rain_liter_per_year = number_property(&feature, "rain_liter_per_year");
        let potential_category = string_property(&feature, "potential_category")
            .as_deref()
            .and_then(PotentialCategory::parse);

        Ok(Some(Footprint {
            geometry: multi_polygon,
            area_m2,
            building_tag: string_property(&feature, "building"),
            name: string_property(&feature, "name"),
            osm_id: string_property(&feature, "osm_id"),
            rain_liter_per_year,
            potential_category,
        }))
    }

    fn non_polygon(&self, index: usize, reason: &str) -> Result<Option<Footprint>> {
        if self.skip_non_polygons {
            Ok(None)
        } else {
            Err(PipelineError::data_quality(index, None, reason))
        }
    }
}

impl Default for FootprintReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Numeric property; numeric strings are accepted, anything else reads as absent.
fn number_property(feature: &Feature, key: &str) -> Option<f64> {
    match feature.property(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_property(feature: &Feature, key: &str) -> Option<String> {
    match feature.property(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[9.31, 48.70], [9.3101, 48.70], [9.3101, 48.7001], [9.31, 48.7001], [9.31, 48.70]]]
                },
                "properties": { "area_m2": 82.5, "building": "house", "name": null, "osm_id": "way/1" }
            },
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [9.31, 48.70] },
                "properties": { "building": "yes" }
            },
            {
                "type": "Feature",
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[9.32, 48.71], [9.3202, 48.71], [9.3202, 48.7102], [9.32, 48.7102], [9.32, 48.71]]]]
                },
                "properties": {
                    "area_m2": "310.0",
                    "building": "school",
                    "name": "Grundschule",
                    "rain_liter_per_year": 279000.0,
                    "potential_category": "very_high"
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_dataset_skips_points() -> Result<()> {
        let dataset = FootprintReader::new().parse_dataset(SAMPLE)?;

        assert_eq!(dataset.len(), 2);

        let house = &dataset.footprints[0];
        assert_eq!(house.area_m2, Some(82.5));
        assert_eq!(house.building_tag.as_deref(), Some("house"));
        assert_eq!(house.name, None);
        assert_eq!(house.osm_id.as_deref(), Some("way/1"));
        assert_eq!(house.rain_liter_per_year, None);
        assert_eq!(house.geometry.0.len(), 1);

        let school = &dataset.footprints[1];
        assert_eq!(school.area_m2, Some(310.0));
        assert_eq!(school.name.as_deref(), Some("Grundschule"));
        assert_eq!(school.rain_liter_per_year, Some(279000.0));
        assert_eq!(school.potential_category, Some(PotentialCategory::VeryHigh));

        Ok(())
    }

    #[test]
    fn test_strict_mode_rejects_points() {
        let result = FootprintReader::with_skip_non_polygons(false).parse_dataset(SAMPLE);

        assert!(matches!(
            result,
            Err(PipelineError::DataQuality { row: 1, .. })
        ));
    }

    #[test]
    fn test_read_dataset_file() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        write!(temp_file, "{}", SAMPLE)?;

        let dataset = FootprintReader::new().read_dataset(temp_file.path())?;
        assert_eq!(dataset.len(), 2);

        Ok(())
    }

    #[test]
    fn test_missing_file_is_missing_input() {
        let result = FootprintReader::new().read_dataset(Path::new("does/not/exist.geojson"));

        assert!(matches!(result, Err(PipelineError::MissingInput { .. })));
    }
}
