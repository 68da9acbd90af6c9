use geo::{MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use crate::models::PotentialCategory;
use crate::utils::statistics::quantile_sorted;

/// A single building roof outline plus its derived attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub geometry: MultiPolygon<f64>,
    pub area_m2: Option<f64>,
    pub building_tag: Option<String>,
    pub name: Option<String>,
    pub osm_id: Option<String>,
    pub rain_liter_per_year: Option<f64>,
    pub potential_category: Option<PotentialCategory>,
}

impl Footprint {
    pub fn new(geometry: MultiPolygon<f64>, area_m2: f64) -> Self {
        Self {
            geometry,
            area_m2: Some(area_m2),
            building_tag: None,
            name: None,
            osm_id: None,
            rain_liter_per_year: None,
            potential_category: None,
        }
    }

    pub fn from_polygon(polygon: Polygon<f64>, area_m2: f64) -> Self {
        Self::new(MultiPolygon(vec![polygon]), area_m2)
    }

    pub fn with_building_tag(mut self, tag: impl Into<String>) -> Self {
        self.building_tag = Some(tag.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_osm_id(mut self, osm_id: impl Into<String>) -> Self {
        self.osm_id = Some(osm_id.into());
        self
    }

    /// Name used in rankings: the `name` tag when present, otherwise the building type.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!(
                "{} building",
                self.building_tag.as_deref().unwrap_or("unknown")
            ),
        }
    }

    pub fn building_type(&self) -> &str {
        self.building_tag.as_deref().unwrap_or("unknown")
    }
}

/// Every footprint fetched for one place. Rows are identified by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub footprints: Vec<Footprint>,
}

impl Dataset {
    pub fn new(footprints: Vec<Footprint>) -> Self {
        Self { footprints }
    }

    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Footprint> {
        self.footprints.iter()
    }

    pub fn areas(&self) -> Vec<f64> {
        self.footprints.iter().filter_map(|f| f.area_m2).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.footprints
            .iter()
            .filter_map(|f| f.rain_liter_per_year)
            .collect()
    }

    pub fn has_volumes(&self) -> bool {
        self.footprints.iter().all(|f| f.rain_liter_per_year.is_some())
    }

    pub fn is_classified(&self) -> bool {
        self.footprints.iter().all(|f| f.potential_category.is_some())
    }
}

impl FromIterator<Footprint> for Dataset {
    fn from_iter<I: IntoIterator<Item = Footprint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Descriptive statistics of one numeric column, printed after each derivation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnSummary {
    /// Returns `None` for an empty column. `std` is the sample standard deviation.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = if count > 1 {
            let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            var.sqrt()
        } else {
            f64::NAN
        };

        Some(Self {
            count,
            mean,
            std,
            min: sorted[0],
            q25: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            q75: quantile_sorted(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }

    pub fn table_row(&self, label: &str) -> String {
        format!(
            "{:<22} {:>8} {:>14.1} {:>14.1} {:>12.1} {:>12.1} {:>12.1} {:>12.1} {:>14.1}",
            label,
            self.count,
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max
        )
    }

    pub fn table_header() -> String {
        format!(
            "{:<22} {:>8} {:>14} {:>14} {:>12} {:>12} {:>12} {:>12} {:>14}",
            "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )
    }
}
