use rayon::prelude::*;

use crate::bbox_filter::collection_bounds;
use crate::error::{DecodeError, GeometryError};
use crate::geojson_features::{decode_feature_collection, Feature, FeatureCollection, GeometryCoordinates};
use crate::models::{PipelineConfig, PipelineOutput, PolygonRecord, ProcessingSummary, RecordKind};
use crate::palette::Palette;
use crate::polygon_geometry::{normalize_ring, outer_ring, select_parts};
use crate::projection::{vertical_offset, ProjectedVertex, Projector, MARKER_HEIGHT, SEGMENT_HEIGHT};
use crate::subdivide::budget;
use crate::{console_log, console_warn};

// Color and vertical offset derive from the feature ordinal
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    config: PipelineConfig,
    projector: Projector,
    palette: Palette,
}

#[derive(Debug, Default)]
struct FeatureOutcome {
    skipped: bool,
    records: Vec<PolygonRecord>,
    failed_units: usize,
}

impl FeaturePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let projector = Projector::from_config(&config);
        let palette = Palette::for_kind(config.palette);
        Self {
            config,
            projector,
            palette,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Decode raw GeoJSON bytes and process them. A decode failure aborts the
    /// whole load.
    pub fn load(&self, bytes: &[u8]) -> Result<PipelineOutput, DecodeError> {
        let collection = decode_feature_collection(bytes)?;
        if self.config.auto_center {
            if let Some(bounds) = collection_bounds(&collection) {
                let centered = Self::new(self.config.centered_on(bounds));
                return Ok(centered.process(&collection));
            }
        }
        Ok(self.process(&collection))
    }

    pub fn process(&self, collection: &FeatureCollection) -> PipelineOutput {
        let stopwatch = Stopwatch::start();
        console_log!("Processing {} features...", collection.features.len());

        let outcomes: Vec<FeatureOutcome> = collection
            .features
            .iter()
            .enumerate()
            .map(|(index, feature)| self.process_feature(index, feature))
            .collect();

        self.finish(outcomes, stopwatch)
    }

    // Output matches `process`
    pub fn process_parallel(&self, collection: &FeatureCollection) -> PipelineOutput {
        let stopwatch = Stopwatch::start();
        console_log!("Processing {} features in parallel...", collection.features.len());

        // Indexed before fan-out; collect keeps input order
        let outcomes: Vec<FeatureOutcome> = collection
            .features
            .par_iter()
            .enumerate()
            .map(|(index, feature)| self.process_feature(index, feature))
            .collect();

        self.finish(outcomes, stopwatch)
    }

    fn finish(&self, outcomes: Vec<FeatureOutcome>, stopwatch: Stopwatch) -> PipelineOutput {
        let mut summary = ProcessingSummary::default();
        let mut records = Vec::new();

        for outcome in outcomes {
            if outcome.skipped {
                summary.skipped_count += 1;
            } else {
                summary.processed_count += 1;
            }
            summary.failed_units += outcome.failed_units;
            records.extend(outcome.records);
        }
        summary.record_count = records.len();
        summary.elapsed_seconds = stopwatch.elapsed_seconds();

        console_log!("Processing complete!");
        console_log!("   Processed: {} features", summary.processed_count);
        console_log!("   Skipped: {} features", summary.skipped_count);
        console_log!("   Total records: {}", summary.record_count);
        console_log!(target: Performance, "   Processing time: {:.2} seconds", summary.elapsed_seconds);

        PipelineOutput { records, summary }
    }

    fn process_feature(&self, index: usize, feature: &Feature) -> FeatureOutcome {
        match &feature.geometry {
            GeometryCoordinates::Point(coordinates) => self.create_point_marker(index, feature, coordinates),
            GeometryCoordinates::LineString(coordinates) => self.create_line_string(index, feature, coordinates),
            GeometryCoordinates::Polygon(rings) => self.create_polygon(index, feature, rings),
            GeometryCoordinates::MultiPolygon(parts) => self.create_multi_polygon(index, feature, parts),
            other => {
                console_log!("Skipping unsupported geometry type: {}", other.kind());
                FeatureOutcome {
                    skipped: true,
                    ..FeatureOutcome::default()
                }
            }
        }
    }

    fn record(
        &self,
        kind: RecordKind,
        vertices: Vec<ProjectedVertex>,
        index: usize,
        feature: &Feature,
        part_index: Option<usize>,
    ) -> PolygonRecord {
        PolygonRecord {
            kind,
            vertices,
            color_index: self.palette.color_index(index),
            feature_name: feature.name().to_string(),
            feature_index: index,
            part_index,
        }
    }

    fn create_point_marker(&self, index: usize, feature: &Feature, coordinates: &[f64]) -> FeatureOutcome {
        let mut outcome = FeatureOutcome::default();
        match self.projector.vertex(coordinates, MARKER_HEIGHT) {
            Some(vertex) => outcome
                .records
                .push(self.record(RecordKind::Marker, vec![vertex], index, feature, None)),
            None => {
                console_warn!("Skipping point {}: {}", feature.name(), GeometryError::Degenerate { usable: 0 });
                outcome.failed_units += 1;
            }
        }
        outcome
    }

    fn create_line_string(&self, index: usize, feature: &Feature, coordinates: &[Vec<f64>]) -> FeatureOutcome {
        let mut outcome = FeatureOutcome::default();
        let vertices: Vec<ProjectedVertex> = coordinates
            .iter()
            .filter_map(|position| self.projector.vertex(position, SEGMENT_HEIGHT))
            .collect();

        if vertices.len() < 2 {
            console_warn!("Skipping line {}: only {} usable vertices", feature.name(), vertices.len());
            outcome.failed_units += 1;
            return outcome;
        }

        outcome.records = vertices
            .windows(2)
            .map(|pair| self.record(RecordKind::Segment, pair.to_vec(), index, feature, None))
            .collect();
        outcome
    }

    fn create_polygon(&self, index: usize, feature: &Feature, rings: &[Vec<Vec<f64>>]) -> FeatureOutcome {
        let mut outcome = FeatureOutcome::default();
        let name = feature.name();
        console_log!("Creating Polygon for {}", name);

        // Take only the outer boundary, skip inner holes
        let vertices = outer_ring(rings)
            .map(|ring| normalize_ring(ring, &self.projector, vertical_offset(index)))
            .unwrap_or_default();

        match self.budget_ring(vertices) {
            Ok(ring) => outcome
                .records
                .push(self.record(RecordKind::Polygon, ring, index, feature, None)),
            Err(e) => {
                console_warn!("Skipping {}: {}", name, e);
                outcome.failed_units += 1;
            }
        }
        outcome
    }

    // Multiple polygons for island/fragmented provinces
    fn create_multi_polygon(
        &self,
        index: usize,
        feature: &Feature,
        parts: &[Vec<Vec<Vec<f64>>>],
    ) -> FeatureOutcome {
        let mut outcome = FeatureOutcome::default();
        let name = feature.name();
        console_log!("Creating MultiPolygon for {} with {} polygons", name, parts.len());

        let significant = select_parts(
            parts,
            &self.projector,
            vertical_offset(index),
            self.config.min_retained_parts as usize,
            self.config.retain_fraction,
        );

        for part in significant {
            match self.budget_ring(part.vertices) {
                Ok(ring) => outcome.records.push(self.record(
                    RecordKind::Polygon,
                    ring,
                    index,
                    feature,
                    Some(part.source_index),
                )),
                Err(e) => {
                    console_warn!("Error creating polygon part {} of {}: {}", part.source_index, name, e);
                    outcome.failed_units += 1;
                }
            }
        }

        console_log!(
            "Created {} with {}/{} significant polygons",
            name,
            outcome.records.len(),
            parts.len()
        );
        outcome
    }

    fn budget_ring(&self, vertices: Vec<ProjectedVertex>) -> Result<Vec<ProjectedVertex>, GeometryError> {
        if vertices.len() < 3 {
            return Err(GeometryError::Degenerate {
                usable: vertices.len(),
            });
        }
        let limit = self.config.vertex_limit as usize;
        if vertices.len() > limit {
            console_log!("Subdividing polygon with {} vertices", vertices.len());
        }
        Ok(budget(vertices, limit, self.config.subdivision_target as usize)?)
    }
}

pub fn load_geojson(bytes: &[u8], config: PipelineConfig) -> Result<PipelineOutput, DecodeError> {
    FeaturePipeline::new(config).load(bytes)
}

// std::time::Instant is unavailable on wasm32-unknown-unknown
struct Stopwatch {
    #[cfg(target_arch = "wasm32")]
    started_ms: f64,
    #[cfg(not(target_arch = "wasm32"))]
    started: std::time::Instant,
}

impl Stopwatch {
    fn start() -> Self {
        Self {
            #[cfg(target_arch = "wasm32")]
            started_ms: js_sys::Date::now(),
            #[cfg(not(target_arch = "wasm32"))]
            started: std::time::Instant::now(),
        }
    }

    fn elapsed_seconds(&self) -> f64 {
        #[cfg(target_arch = "wasm32")]
        {
            (js_sys::Date::now() - self.started_ms) / 1000.0
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.started.elapsed().as_secs_f64()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geojson_features::Properties;

    fn feature(name: Option<&str>, geometry: GeometryCoordinates) -> Feature {
        Feature {
            geometry,
            properties: name.map(|n| Properties {
                name: Some(n.to_string()),
                number: None,
            }),
        }
    }

    fn pipeline() -> FeaturePipeline {
        FeaturePipeline::new(PipelineConfig::default())
    }

    fn big_ring(n: usize) -> Vec<Vec<f64>> {
        (0..n)
            .map(|i| {
                let t = i as f64 / n as f64 * std::f64::consts::TAU;
                vec![35.0 + t.cos(), 39.0 + t.sin()]
            })
            .collect()
    }

    #[test]
    fn point_becomes_single_marker() {
        let fc = FeatureCollection {
            features: vec![feature(Some("Epicenter"), GeometryCoordinates::Point(vec![36.0, 40.0]))],
        };
        let out = pipeline().process(&fc);
        assert_eq!(out.records.len(), 1);
        let marker = &out.records[0];
        assert_eq!(marker.kind, RecordKind::Marker);
        assert_eq!(marker.vertices.len(), 1);
        assert_eq!(marker.vertices[0].y, MARKER_HEIGHT);
        assert_eq!(out.summary.processed_count, 1);
    }

    #[test]
    fn short_point_and_line_emit_nothing_but_count_processed() {
        let fc = FeatureCollection {
            features: vec![
                feature(Some("Half"), GeometryCoordinates::Point(vec![1.0])),
                feature(Some("Stub"), GeometryCoordinates::LineString(vec![vec![1.0, 2.0]])),
            ],
        };
        let out = pipeline().process(&fc);
        assert!(out.records.is_empty());
        assert_eq!(out.summary.record_count, 0);
        assert_eq!(out.summary.processed_count, 2);
        assert_eq!(out.summary.skipped_count, 0);
        assert_eq!(out.summary.failed_units, 2);
    }

    #[test]
    fn line_string_becomes_consecutive_segments() {
        let line = vec![vec![32.0, 39.0], vec![33.0, 39.5], vec![1.0], vec![34.0, 40.0]];
        let fc = FeatureCollection {
            features: vec![feature(None, GeometryCoordinates::LineString(line))],
        };
        let out = pipeline().process(&fc);
        assert_eq!(out.records.len(), 2);
        assert!(out.records.iter().all(|r| r.kind == RecordKind::Segment && r.vertices.len() == 2));
        assert_eq!(out.records[0].vertices[1], out.records[1].vertices[0]);
        assert_eq!(out.records[0].feature_name, "Unknown");
    }

    #[test]
    fn large_polygon_is_budgeted() {
        let fc = FeatureCollection {
            features: vec![feature(Some("Mugla"), GeometryCoordinates::Polygon(vec![big_ring(1000)]))],
        };
        let out = pipeline().process(&fc);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].vertices.len(), 201);
        assert_eq!(out.summary.failed_units, 0);
    }

    #[test]
    fn degenerate_polygon_is_skipped_but_counted_processed() {
        let fc = FeatureCollection {
            features: vec![
                feature(Some("Tiny"), GeometryCoordinates::Polygon(vec![vec![vec![32.0, 39.0], vec![33.0, 39.0]]])),
                feature(Some("Empty"), GeometryCoordinates::Polygon(vec![])),
                feature(Some("Ankara"), GeometryCoordinates::Polygon(vec![big_ring(4)])),
            ],
        };
        let out = pipeline().process(&fc);
        assert_eq!(out.summary.processed_count, 3);
        assert_eq!(out.summary.failed_units, 2);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].feature_index, 2);
        assert_eq!(out.records[0].color_index, 2);
    }

    #[test]
    fn budget_failure_skips_only_that_unit() {
        let config = PipelineConfig {
            vertex_limit: 10,
            subdivision_target: 200,
            ..PipelineConfig::default()
        };
        let fc = FeatureCollection {
            features: vec![
                feature(Some("Fails"), GeometryCoordinates::Polygon(vec![big_ring(50)])),
                feature(Some("Fits"), GeometryCoordinates::Polygon(vec![big_ring(8)])),
            ],
        };
        let out = FeaturePipeline::new(config).process(&fc);
        assert_eq!(out.summary.failed_units, 1);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].feature_name, "Fits");
    }

    #[test]
    fn multi_polygon_parts_share_feature_and_color() {
        let parts = vec![vec![big_ring(6)], vec![big_ring(300)], vec![big_ring(2)]];
        let fc = FeatureCollection {
            features: vec![
                feature(Some("Ankara"), GeometryCoordinates::Polygon(vec![big_ring(4)])),
                feature(Some("Istanbul"), GeometryCoordinates::MultiPolygon(parts)),
            ],
        };
        let out = pipeline().process(&fc);
        let parts: Vec<_> = out.records.iter().filter(|r| r.feature_index == 1).collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].part_index, Some(1));
        assert_eq!(parts[0].vertices.len(), 151);
        assert_eq!(parts[1].part_index, Some(0));
        assert!(parts.iter().all(|r| r.color_index == 1 && r.feature_name == "Istanbul"));
        let y = vertical_offset(1);
        assert!(parts.iter().flat_map(|r| r.vertices.iter()).all(|v| v.y == y));
    }

    #[test]
    fn unsupported_types_are_skipped() {
        let fc = FeatureCollection {
            features: vec![
                feature(None, GeometryCoordinates::GeometryCollection(vec![])),
                feature(None, GeometryCoordinates::MultiPoint(vec![vec![1.0, 2.0]])),
                feature(None, GeometryCoordinates::MultiLineString(vec![])),
                feature(None, GeometryCoordinates::Point(vec![1.0, 2.0])),
            ],
        };
        let out = pipeline().process(&fc);
        assert_eq!(out.summary.skipped_count, 3);
        assert_eq!(out.summary.processed_count, 1);
        assert_eq!(out.summary.processed_count + out.summary.skipped_count, fc.features.len());
        assert_eq!(out.summary.record_count, 1);
    }

    #[test]
    fn parallel_matches_sequential() {
        let features = (0..120)
            .map(|i| match i % 4 {
                0 => feature(Some("p"), GeometryCoordinates::Polygon(vec![big_ring(3 + i * 7)])),
                1 => feature(
                    Some("mp"),
                    GeometryCoordinates::MultiPolygon((0..i % 13).map(|k| vec![big_ring(3 + k * 40)]).collect()),
                ),
                2 => feature(None, GeometryCoordinates::LineString(big_ring(5))),
                _ => feature(None, GeometryCoordinates::GeometryCollection(vec![])),
            })
            .collect();
        let fc = FeatureCollection { features };
        let p = pipeline();
        let seq = p.process(&fc);
        let par = p.process_parallel(&fc);
        assert_eq!(seq.records, par.records);
        assert_eq!(seq.summary.processed_count, par.summary.processed_count);
        assert_eq!(seq.summary.skipped_count, par.summary.skipped_count);
        assert_eq!(seq.summary.record_count, par.summary.record_count);
    }

    #[test]
    fn auto_center_projects_document_center_to_origin() {
        let bytes = br#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[10,20],[12,20],[12,22],[10,22]]]}}]}"#;
        let config = PipelineConfig {
            auto_center: true,
            ..PipelineConfig::default()
        };
        let out = load_geojson(bytes, config).unwrap();
        let xs: Vec<f32> = out.records[0].vertices.iter().map(|v| v.x).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 0.05);
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), -0.05);
    }

    #[test]
    fn load_propagates_decode_errors() {
        let bytes = br#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":{"type":"Polygon","coordinates":[1,2]}}]}"#;
        assert!(matches!(
            load_geojson(bytes, PipelineConfig::default()),
            Err(DecodeError::RankMismatch { .. })
        ));
    }
}
