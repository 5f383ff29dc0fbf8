use serde::Serialize;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

// Create a console module for logging
pub mod console;
// Error types shared across the pipeline
pub mod error;
// Import our models
pub mod models;
// GeoJSON decoding into typed coordinates
pub mod geojson_features;
// Geographic to local-space projection
pub mod projection;
// Ring normalization, part selection and buffer output
pub mod polygon_geometry;
// Vertex-budget decimation
#[path = "../geometry_functions/subdivide.rs"]
pub mod subdivide;
// Feature colors
pub mod palette;
// Bounds of decoded collections
pub mod bbox_filter;
// Feature dispatch and statistics
pub mod pipeline;
// Data set loading for the configured files
pub mod loader;


pub use bbox_filter::{collection_bounds, CollectionBounds};
pub use error::{DecodeError, GeometryError, LoadError, SimplificationError};
pub use geojson_features::{decode_feature_collection, Feature, FeatureCollection, GeometryCoordinates, Properties};
pub use models::{Constants, PipelineConfig, PipelineOutput, PolygonRecord, ProcessingSummary, RecordKind};
pub use palette::{Palette, PaletteKind};
pub use pipeline::{load_geojson, FeaturePipeline};
pub use polygon_geometry::{records_to_buffer_geometry, BufferGeometry};
pub use projection::{project, ProjectedVertex, Projector};

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

// Use the macros from our console module
#[macro_export]
macro_rules! console_log {
    (target: $cat:ident, $($t:tt)*) => ($crate::console::log_to($crate::console::Category::$cat, &format!($($t)*)));
    ($($t:tt)*) => ($crate::console::log(&format!($($t)*)))
}

#[macro_export]
macro_rules! console_warn {
    (target: $cat:ident, $($t:tt)*) => ($crate::console::warn_to($crate::console::Category::$cat, &format!($($t)*)));
    ($($t:tt)*) => ($crate::console::warn(&format!($($t)*)))
}

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("WASM module initialized successfully");
    });
}

fn parse_config(config_json: &str) -> Result<PipelineConfig, JsValue> {
    if config_json.trim().is_empty() {
        return Ok(PipelineConfig::default());
    }
    PipelineConfig::from_json(config_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid pipeline config: {}", e)))
}

/// Decode a GeoJSON document and return `{ records, summary }`.
#[wasm_bindgen]
pub fn process_geojson(data: &[u8], config_json: &str) -> Result<JsValue, JsValue> {
    let config = parse_config(config_json)?;
    let output = load_geojson(data, config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(to_value(&output)?)
}

#[derive(Serialize)]
struct BufferGeometryResponse {
    geometry: BufferGeometry,
    summary: ProcessingSummary,
}

/// Decode a GeoJSON document and return its polygons merged into one buffer geometry.
#[wasm_bindgen]
pub fn geojson_to_buffer_geometry(data: &[u8], config_json: &str) -> Result<JsValue, JsValue> {
    let config = parse_config(config_json)?;
    let pipeline = FeaturePipeline::new(config);
    let output = pipeline.load(data).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let geometry = records_to_buffer_geometry(&output.records, pipeline.palette());
    console_log!(
        "Merged geometry created with {} vertices",
        geometry.vertices.len() / 3
    );

    let response = BufferGeometryResponse {
        geometry,
        summary: output.summary,
    };
    Ok(to_value(&response)?)
}

/// Bounds of every coordinate in a GeoJSON document, with its center, or
/// `null` when the document has no coordinates.
#[wasm_bindgen]
pub fn geojson_bounds(data: &[u8]) -> Result<JsValue, JsValue> {
    let collection = decode_feature_collection(data).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let bounds = collection_bounds(&collection).map(CollectionBounds::from);
    Ok(to_value(&bounds)?)
}
