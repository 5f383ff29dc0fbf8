use thiserror::Error;

/// Failure to turn raw bytes into a `FeatureCollection`. Fatal to one load call.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a FeatureCollection, found type '{found}'")]
    NotAFeatureCollection { found: String },

    #[error("Missing field '{field}' at {location}")]
    MissingField { field: &'static str, location: String },

    #[error("Unknown geometry type '{geometry_type}' at {location}")]
    UnknownGeometryType {
        geometry_type: String,
        location: String,
    },

    #[error("Coordinates of {geometry_type} at {location} do not match its rank: {detail}")]
    RankMismatch {
        geometry_type: String,
        location: String,
        detail: String,
    },
}

/// A ring could not be decimated under the vertex limit.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to simplify polygon: {original} vertices down to {simplified} (step: {step}, limit: {limit})")]
pub struct SimplificationError {
    pub original: usize,
    pub simplified: usize,
    pub step: usize,
    pub limit: usize,
}

/// Per-unit geometry failures. The pipeline logs these and moves on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Too few vertices: {usable} usable, at least 3 required")]
    Degenerate { usable: usize },

    #[error(transparent)]
    Simplification(#[from] SimplificationError),
}

/// Failure to fetch or decode one configured data file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("GeoJSON file not found: {id}")]
    NotFound { id: String },

    #[error("Failed to read {id}: {source}")]
    Io {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
