//! Building footprints from OpenStreetMap.
//!
//! The place name is resolved to an OSM boundary with Nominatim, then every
//! `building=*` way and multipolygon relation inside that boundary is fetched
//! from the Overpass API with inline geometry. Roof area is the geodesic area
//! on the WGS84 ellipsoid, in square metres.

use geo::orient::{Direction, Orient};
use geo::{Contains, GeodesicArea, LineString, MultiPolygon, Polygon};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::models::{Dataset, Footprint};
use crate::utils::constants::{
    NOMINATIM_URL, OVERPASS_RELATION_AREA_OFFSET, OVERPASS_TIMEOUT_SECS, OVERPASS_URL,
    OVERPASS_WAY_AREA_OFFSET,
};

#[derive(Clone)]
pub struct OverpassClient {
    client: Client,
    nominatim_url: String,
    overpass_url: String,
}

/// An OSM boundary resolved from a place name.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceArea {
    pub display_name: String,
    pub osm_type: String,
    pub osm_id: i64,
}

impl PlaceArea {
    /// Overpass derives area ids from the element id.
    pub fn overpass_area_id(&self) -> Result<i64> {
        match self.osm_type.as_str() {
            "relation" => Ok(OVERPASS_RELATION_AREA_OFFSET + self.osm_id),
            "way" => Ok(OVERPASS_WAY_AREA_OFFSET + self.osm_id),
            other => Err(PipelineError::Upstream(format!(
                "'{}' resolved to an OSM {} which has no area",
                self.display_name, other
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    osm_type: String,
    osm_id: i64,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    geometry: Vec<LatLon>,
    #[serde(default)]
    members: Vec<RelationMember>,
}

#[derive(Debug, Deserialize)]
struct RelationMember {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    geometry: Vec<LatLon>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

impl OverpassClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            nominatim_url: NOMINATIM_URL.to_string(),
            overpass_url: OVERPASS_URL.to_string(),
        }
    }

    pub fn with_endpoints(
        mut self,
        nominatim_url: impl Into<String>,
        overpass_url: impl Into<String>,
    ) -> Self {
        self.nominatim_url = nominatim_url.into();
        self.overpass_url = overpass_url.into();
        self
    }

    pub async fn fetch_buildings(&self, place_name: &str) -> Result<Dataset> {
        let place = self.resolve_place(place_name).await?;
        info!(
            "Resolved '{}' to {} {} ({})",
            place_name, place.osm_type, place.osm_id, place.display_name
        );

        let query = building_query(place.overpass_area_id()?);
        debug!("Overpass query:\n{}", query);

        let resp = self
            .client
            .post(&self.overpass_url)
            .form(&[("data", query)])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(PipelineError::Upstream(format!(
                "Overpass request failed with status {}",
                resp.status()
            )));
        }
        let body = resp.text().await?;

        let dataset = parse_overpass_response(&body)?;
        info!("Fetched {} building footprints", dataset.len());
        Ok(dataset)
    }

    pub async fn resolve_place(&self, place_name: &str) -> Result<PlaceArea> {
        let resp = self
            .client
            .get(&self.nominatim_url)
            .query(&[("q", place_name), ("format", "json"), ("limit", "1")])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(PipelineError::Upstream(format!(
                "Nominatim request failed with status {}",
                resp.status()
            )));
        }
        let body = resp.text().await?;

        parse_nominatim_response(&body, place_name)
    }
}

fn building_query(area_id: i64) -> String {
    format!(
        "[out:json][timeout:{}];\n\
        area(id:{})->.searchArea;\n\
        (\n  way[\"building\"](area.searchArea);\n  relation[\"building\"](area.searchArea);\n);\n\
        out geom;",
        OVERPASS_TIMEOUT_SECS, area_id
    )
}

fn parse_nominatim_response(body: &str, place_name: &str) -> Result<PlaceArea> {
    let places: Vec<NominatimPlace> = serde_json::from_str(body).map_err(|e| {
        PipelineError::Upstream(format!("Failed to parse Nominatim response: {}", e))
    })?;

    let place = places.into_iter().next().ok_or_else(|| {
        PipelineError::Upstream(format!("No OSM place found for '{}'", place_name))
    })?;

    Ok(PlaceArea {
        display_name: place.display_name,
        osm_type: place.osm_type,
        osm_id: place.osm_id,
    })
}

/// Converts Overpass elements into footprints. Open ways, non-multipolygon
/// relations and nodes are dropped.
pub fn parse_overpass_response(body: &str) -> Result<Dataset> {
    let response: OverpassResponse = serde_json::from_str(body).map_err(|e| {
        PipelineError::Upstream(format!("Failed to parse Overpass response: {}", e))
    })?;

    let mut footprints = Vec::with_capacity(response.elements.len());
    let mut skipped = 0usize;

    for element in response.elements {
        let geometry = match element.kind.as_str() {
            "way" => closed_ring(&element.geometry)
                .map(|ring| MultiPolygon(vec![Polygon::new(ring, vec![])])),
            "relation" if element.tags.get("type").map(String::as_str) == Some("multipolygon") => {
                relation_polygons(&element.members)
            }
            _ => None,
        };

        let Some(geometry) = geometry else {
            skipped += 1;
            continue;
        };
        // OSM ways carry no winding guarantee; geodesic area needs CCW shells and CW holes
        let geometry = geometry.orient(Direction::Default);

        let area_m2 = geometry.geodesic_area_unsigned();
        let mut footprint = Footprint::new(geometry, area_m2)
            .with_osm_id(format!("{}/{}", element.kind, element.id));
        footprint.building_tag = element.tags.get("building").cloned();
        footprint.name = element.tags.get("name").cloned();

        footprints.push(footprint);
    }

    if skipped > 0 {
        debug!("Skipped {} elements without polygon geometry", skipped);
    }

    Ok(Dataset::new(footprints))
}

/// A ring needs at least four points with the first repeated at the end.
fn closed_ring(points: &[LatLon]) -> Option<LineString<f64>> {
    let (first, last) = (points.first()?, points.last()?);
    if points.len() < 4 || first.lat != last.lat || first.lon != last.lon {
        return None;
    }
    Some(points.iter().map(|p| (p.lon, p.lat)).collect())
}

/// Builds polygons from closed outer members and attaches each closed inner
/// member to the outer ring that contains it.
fn relation_polygons(members: &[RelationMember]) -> Option<MultiPolygon<f64>> {
    let ways = members.iter().filter(|m| m.kind == "way");

    let mut outers: Vec<(Polygon<f64>, Vec<LineString<f64>>)> = Vec::new();
    let mut inners: Vec<LineString<f64>> = Vec::new();
    for member in ways {
        let Some(ring) = closed_ring(&member.geometry) else {
            warn!("Skipping unclosed {} member of building relation", member.role);
            continue;
        };
        match member.role.as_str() {
            "inner" => inners.push(ring),
            _ => outers.push((Polygon::new(ring, vec![]), Vec::new())),
        }
    }

    for inner in inners {
        let Some(probe) = inner.points().next() else {
            continue;
        };
        if let Some((_, holes)) = outers
            .iter_mut()
            .find(|(outer, _)| outer.contains(&probe))
        {
            holes.push(inner);
        }
    }

    if outers.is_empty() {
        return None;
    }

    Some(MultiPolygon(
        outers
            .into_iter()
            .map(|(outer, holes)| Polygon::new(outer.exterior().clone(), holes))
            .collect(),
    ))
}
