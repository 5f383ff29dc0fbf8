// This is the models module containing shared data structures
use serde::{Deserialize, Serialize};

use crate::palette::PaletteKind;
use crate::projection::ProjectedVertex;

/// Process-wide defaults of the atlas: where the map is centered, how large
/// it is drawn, and which bundled data sets are loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Constants {
    /// (longitude, latitude) shifted to the scene origin, near Ankara
    pub center: [f32; 2],
    /// Roughly 1.5 m across for the whole country at tabletop size
    pub scale_factor: f32,
    pub map_data_files: Vec<String>,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            center: [35.0, 39.0],
            scale_factor: 0.05,
            map_data_files: vec!["Turkey".to_string()],
        }
    }
}

impl Constants {
    /// Pipeline configuration using these constants for center and scale.
    pub fn config(&self) -> PipelineConfig {
        PipelineConfig {
            center_longitude: self.center[0],
            center_latitude: self.center[1],
            scale_factor: self.scale_factor,
            ..PipelineConfig::default()
        }
    }
}

/// Immutable settings for one pipeline run. Every field has a default, so a
/// partial JSON object (or `{}`) deserializes to a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub center_longitude: f32,
    pub center_latitude: f32,
    pub scale_factor: f32,
    pub vertex_limit: u32,
    pub subdivision_target: u32,
    pub min_retained_parts: u32,
    pub retain_fraction: f32,
    pub palette: PaletteKind,
    // Re-center the projection on each loaded document's bounds
    pub auto_center: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            center_longitude: 35.0,
            center_latitude: 39.0,
            scale_factor: 0.05,
            vertex_limit: 255,
            subdivision_target: 200,
            min_retained_parts: 5,
            retain_fraction: 0.5,
            palette: PaletteKind::Provinces,
            auto_center: false,
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// What a record draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    /// A single point marker
    Marker,
    /// One segment between two consecutive line vertices
    Segment,
    /// A closed ring drawn as one polygon primitive
    Polygon,
}

/// One unit of pipeline output, handed to the renderer as is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonRecord {
    pub kind: RecordKind,
    pub vertices: Vec<ProjectedVertex>,
    pub color_index: usize,
    pub feature_name: String,
    pub feature_index: usize,
    /// Position of the part inside its MultiPolygon; `None` for single geometries.
    pub part_index: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingSummary {
    pub processed_count: usize,
    pub skipped_count: usize,
    pub record_count: usize,
    /// Rings or parts dropped because they were degenerate or could not be simplified
    pub failed_units: usize,
    pub elapsed_seconds: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub records: Vec<PolygonRecord>,
    pub summary: ProcessingSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        assert_eq!(PipelineConfig::from_json("{}").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn partial_json_overrides_named_fields() {
        let config =
            PipelineConfig::from_json(r#"{"centerLongitude": 29.0, "vertexLimit": 128, "palette": "named"}"#)
                .unwrap();
        assert_eq!(config.center_longitude, 29.0);
        assert_eq!(config.vertex_limit, 128);
        assert_eq!(config.palette, PaletteKind::Named);
        assert_eq!(config.subdivision_target, 200);
    }

    #[test]
    fn constants_feed_config() {
        let constants = Constants::default();
        assert_eq!(constants.map_data_files, vec!["Turkey".to_string()]);
        assert_eq!(constants.config(), PipelineConfig::default());
    }
}
