use geo::{BoundingRect, Coord, LineString, Rect};
use serde::Serialize;

use crate::geojson_features::FeatureCollection;
use crate::models::PipelineConfig;

/// Bounding box of every usable coordinate in the collection, holes and
/// unrendered geometry types included. `None` when there is no coordinate.
pub fn collection_bounds(collection: &FeatureCollection) -> Option<Rect<f64>> {
    let mut coords = Vec::new();
    for feature in &collection.features {
        feature
            .geometry
            .for_each_lon_lat(&mut |x, y| coords.push(Coord { x, y }));
    }
    LineString::new(coords).bounding_rect()
}

// Host-facing shape of a bounds rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionBounds {
    pub min_longitude: f64,
    pub min_latitude: f64,
    pub max_longitude: f64,
    pub max_latitude: f64,
    pub center_longitude: f64,
    pub center_latitude: f64,
}

impl From<Rect<f64>> for CollectionBounds {
    fn from(rect: Rect<f64>) -> Self {
        let center = rect.center();
        Self {
            min_longitude: rect.min().x,
            min_latitude: rect.min().y,
            max_longitude: rect.max().x,
            max_latitude: rect.max().y,
            center_longitude: center.x,
            center_latitude: center.y,
        }
    }
}

impl PipelineConfig {
    /// Same settings, with the projection center moved to the middle of `bounds`.
    pub fn centered_on(&self, bounds: Rect<f64>) -> Self {
        let center = bounds.center();
        Self {
            center_longitude: center.x as f32,
            center_latitude: center.y as f32,
            ..self.clone()
        }
    }
}
