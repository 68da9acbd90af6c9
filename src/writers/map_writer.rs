//! Interactive Leaflet map of the classified footprints.
//!
//! The page is a single self-contained HTML file: the footprints are embedded
//! as a GeoJSON literal, Leaflet itself is loaded from a CDN.

use geo::{Centroid, MultiPolygon};
use geojson::{Feature, FeatureCollection, JsonObject};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::models::{CategoryThresholds, Dataset, Footprint, PotentialCategory};
use crate::utils::constants::{MAP_FILL_OPACITY, MAP_ZOOM};
use crate::utils::paths::ensure_parent_dir;
use crate::utils::ProgressReporter;
use crate::writers::GeoJsonWriter;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>__TITLE__</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>
html, body, #map { height: 100%; margin: 0; }
.legend { position: fixed; bottom: 50px; left: 50px; width: 240px; z-index: 9999;
  background-color: white; border: 2px solid grey; font-size: 12px; padding: 10px; }
.legend p { margin: 4px 0; }
.legend i { display: inline-block; width: 12px; height: 12px; margin-right: 6px;
  border: 1px solid #555; vertical-align: middle; }
</style>
</head>
<body>
<div id="map"></div>
__LEGEND__
<script>
const footprints = __FOOTPRINTS__;
const map = L.map('map').setView([__LAT__, __LON__], __ZOOM__);
L.tileLayer('https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png', {
  attribution: '&copy; OpenStreetMap contributors &copy; CARTO',
  subdomains: 'abcd',
  maxZoom: 20
}).addTo(map);
L.geoJSON(footprints, {
  style: (feature) => ({
    fillColor: feature.properties.fill_color,
    color: 'black',
    weight: 1,
    fillOpacity: __OPACITY__
  }),
  onEachFeature: (feature, layer) => {
    layer.bindPopup(feature.properties.popup, { maxWidth: 300 });
    layer.bindTooltip(feature.properties.tooltip);
  }
}).addTo(map);
</script>
</body>
</html>
"#;

pub struct MapWriter {
    zoom: u8,
    fill_opacity: f64,
    title: String,
}

impl MapWriter {
    pub fn new() -> Self {
        Self {
            zoom: MAP_ZOOM,
            fill_opacity: MAP_FILL_OPACITY,
            title: "Rainwater potential".to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// `fallback_center` (lat, lon) is used when the dataset has no geometry to center on.
    pub fn write_map(
        &self,
        dataset: &Dataset,
        thresholds: &CategoryThresholds,
        fallback_center: (f64, f64),
        path: &Path,
        progress: &ProgressReporter,
    ) -> Result<()> {
        let html = self.render_html(dataset, thresholds, fallback_center, progress)?;

        ensure_parent_dir(path)?;
        fs::write(path, html)?;

        info!("Map saved to {}", path.display());
        Ok(())
    }

    pub fn render_html(
        &self,
        dataset: &Dataset,
        thresholds: &CategoryThresholds,
        fallback_center: (f64, f64),
        progress: &ProgressReporter,
    ) -> Result<String> {
        let mut features = Vec::with_capacity(dataset.len());
        for (row, footprint) in dataset.iter().enumerate() {
            features.push(self.styled_feature(row, footprint, thresholds)?);
            progress.increment(1);
        }
        progress.finish_and_clear();

        let collection = FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        };
        // A literal "</" inside the embedded JSON would close the script tag
        let footprints_json = serde_json::to_string(&collection)?.replace("</", "<\\/");

        let (lat, lon) = map_center(dataset).unwrap_or(fallback_center);
        debug!("Map centered at {:.5}, {:.5}", lat, lon);

        Ok(TEMPLATE
            .replace("__TITLE__", &escape_html(&self.title))
            .replace("__LEGEND__", &legend_html(thresholds))
            .replace("__LAT__", &lat.to_string())
            .replace("__LON__", &lon.to_string())
            .replace("__ZOOM__", &self.zoom.to_string())
            .replace("__OPACITY__", &self.fill_opacity.to_string())
            .replace("__FOOTPRINTS__", &footprints_json))
    }

    fn styled_feature(
        &self,
        row: usize,
        footprint: &Footprint,
        thresholds: &CategoryThresholds,
    ) -> Result<Feature> {
        let (Some(volume), Some(category)) =
            (footprint.rain_liter_per_year, footprint.potential_category)
        else {
            return Err(PipelineError::data_quality(
                row,
                footprint.osm_id.as_deref(),
                "footprint must be classified before it can be mapped",
            ));
        };

        let mut feature = GeoJsonWriter::to_feature(footprint);
        let properties = feature.properties.get_or_insert_with(JsonObject::new);
        properties.insert("fill_color".to_string(), Value::from(category.color()));
        properties.insert(
            "popup".to_string(),
            Value::from(popup_html(footprint, volume, category, thresholds)),
        );
        properties.insert(
            "tooltip".to_string(),
            Value::from(format!("{:.0} L/year", volume)),
        );
        Ok(feature)
    }
}

impl Default for MapWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Centroid of all footprints as (lat, lon).
pub fn map_center(dataset: &Dataset) -> Option<(f64, f64)> {
    let all = MultiPolygon(
        dataset
            .iter()
            .flat_map(|f| f.geometry.0.iter().cloned())
            .collect(),
    );
    all.centroid().map(|p| (p.y(), p.x()))
}

fn popup_html(
    footprint: &Footprint,
    volume: f64,
    category: PotentialCategory,
    thresholds: &CategoryThresholds,
) -> String {
    let name = footprint
        .name
        .as_deref()
        .map(|n| format!("Name: {}<br>", escape_html(n)))
        .unwrap_or_default();

    format!(
        "<b>Building info:</b><br>{}Type: {}<br>Roof area: {:.0} m²<br>\
         Rainwater potential: {:.0} L/year<br>Category: {}<br>",
        name,
        escape_html(footprint.building_type()),
        footprint.area_m2.unwrap_or_default(),
        volume,
        escape_html(&thresholds.label(category))
    )
}

fn legend_html(thresholds: &CategoryThresholds) -> String {
    let entries: String = PotentialCategory::ALL
        .iter()
        .map(|&c| {
            format!(
                "<p><i style=\"background:{}\"></i>{}</p>\n",
                c.color(),
                escape_html(&thresholds.label(c))
            )
        })
        .collect();

    format!(
        "<div class=\"legend\">\n<p><b>Rainwater potential</b></p>\n{}</div>",
        entries
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
