use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoValue};
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;
use crate::models::{Dataset, Footprint};
use crate::utils::paths::ensure_parent_dir;

/// Persists the building dataset as a GeoJSON `FeatureCollection`.
///
/// The file is written next to the target and renamed into place, so a failed
/// stage never leaves a half-written dataset behind.
pub struct GeoJsonWriter {
    pretty: bool,
}

impl GeoJsonWriter {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn write_dataset(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;

        let collection = Self::to_feature_collection(dataset);
        let tmp_path = temp_path(path);

        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            if self.pretty {
                serde_json::to_writer_pretty(&mut writer, &collection)?;
            } else {
                serde_json::to_writer(&mut writer, &collection)?;
            }
            writer.flush()?;
        }
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!("Wrote {} features to {}", dataset.len(), path.display());
        Ok(())
    }

    pub fn to_feature_collection(dataset: &Dataset) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: dataset.iter().map(Self::to_feature).collect(),
            foreign_members: None,
        }
    }

    pub fn to_feature(footprint: &Footprint) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("area_m2".to_string(), json!(footprint.area_m2));
        properties.insert("building".to_string(), json!(footprint.building_tag));
        properties.insert("name".to_string(), json!(footprint.name));
        properties.insert("osm_id".to_string(), json!(footprint.osm_id));
        properties.insert(
            "rain_liter_per_year".to_string(),
            json!(footprint.rain_liter_per_year),
        );
        properties.insert(
            "potential_category".to_string(),
            footprint
                .potential_category
                .map_or(Value::Null, |c| Value::from(c.key())),
        );

        Feature {
            bbox: None,
            geometry: Some(geometry_of(footprint)),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    pub fn get_file_info(&self, path: &Path) -> Result<DatasetFileInfo> {
        let dataset = crate::readers::FootprintReader::new().read_dataset(path)?;
        let file_size = fs::metadata(path)?.len();

        Ok(DatasetFileInfo {
            path: path.to_path_buf(),
            features: dataset.len(),
            with_volume: dataset
                .iter()
                .filter(|f| f.rain_liter_per_year.is_some())
                .count(),
            with_category: dataset
                .iter()
                .filter(|f| f.potential_category.is_some())
                .count(),
            file_size,
        })
    }
}

impl Default for GeoJsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-polygon footprints are written back as plain `Polygon`s.
fn geometry_of(footprint: &Footprint) -> Geometry {
    let value = match footprint.geometry.0.as_slice() {
        [polygon] => GeoValue::from(polygon),
        _ => GeoValue::from(&footprint.geometry),
    };
    Geometry::new(value)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[derive(Debug)]
pub struct DatasetFileInfo {
    pub path: PathBuf,
    pub features: usize,
    pub with_volume: usize,
    pub with_category: usize,
    pub file_size: u64,
}

impl DatasetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Dataset File Summary:\n\
            - Path: {}\n\
            - Footprints: {}\n\
            - With volume: {}\n\
            - With category: {}\n\
            - File size: {:.2} MB",
            self.path.display(),
            self.features,
            self.with_volume,
            self.with_category,
            self.file_size as f64 / 1_048_576.0
        )
    }
}
