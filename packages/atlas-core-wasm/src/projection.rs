use nalgebra::Point3;

use crate::models::PipelineConfig;

/// A vertex in the local map frame: x east, z north, y a small lift.
pub type ProjectedVertex = Point3<f32>;

/// Lift of the first feature above the map plane.
pub const BASE_OFFSET: f32 = 0.001;
/// Extra lift per feature ordinal, keeps neighbouring provinces off each other's plane.
pub const OFFSET_STEP: f32 = 0.0001;
/// Height of point markers.
pub const MARKER_HEIGHT: f32 = 0.01;
/// Height of line segments, slightly above polygon fills.
pub const SEGMENT_HEIGHT: f32 = 0.002;

/// Flat linear projection of (lon, lat) onto the local (x, z) plane.
///
/// Computed in single precision the way the renderer consumes it.
/// Non-finite inputs propagate unchanged.
pub fn project(lon: f64, lat: f64, center_lon: f32, center_lat: f32, scale: f32) -> (f32, f32) {
    let x = (lon as f32 - center_lon) * scale;
    let z = (lat as f32 - center_lat) * scale;
    (x, z)
}

/// Vertical offset for the feature at `index`.
pub fn vertical_offset(index: usize) -> f32 {
    BASE_OFFSET + index as f32 * OFFSET_STEP
}

/// Center and scale for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    pub center_lon: f32,
    pub center_lat: f32,
    pub scale: f32,
}

impl Projector {
    pub fn new(center_lon: f32, center_lat: f32, scale: f32) -> Self {
        Self {
            center_lon,
            center_lat,
            scale,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.center_longitude, config.center_latitude, config.scale_factor)
    }

    pub fn project(&self, lon: f64, lat: f64) -> (f32, f32) {
        project(lon, lat, self.center_lon, self.center_lat, self.scale)
    }

    /// Project a GeoJSON position. Positions with fewer than two components yield `None`.
    pub fn vertex(&self, position: &[f64], y: f32) -> Option<ProjectedVertex> {
        match position {
            [lon, lat, ..] => {
                let (x, z) = self.project(*lon, *lat);
                Some(ProjectedVertex::new(x, y, z))
            }
            _ => None,
        }
    }
}
