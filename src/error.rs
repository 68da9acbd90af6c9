use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Required input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("Data quality error in footprint #{row}{source_label}: {message}")]
    DataQuality {
        row: usize,
        source_label: String,
        message: String,
    },

    #[error("Invalid precipitation value: {0}")]
    InvalidPrecipitation(f64),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Rendering error: {0}")]
    Render(String),
}

impl PipelineError {
    pub fn data_quality(row: usize, osm_id: Option<&str>, message: impl Into<String>) -> Self {
        Self::DataQuality {
            row,
            source_label: osm_id.map(|id| format!(" ({id})")).unwrap_or_default(),
            message: message.into(),
        }
    }
}
