use serde::Serialize;

use crate::models::{PolygonRecord, RecordKind};
use crate::palette::Palette;
use crate::projection::{ProjectedVertex, Projector};

// Source rings wind opposite to the renderer's front face, so the order is
// always reversed. The result may hold fewer than three vertices.
pub fn normalize_ring(ring: &[Vec<f64>], projector: &Projector, y: f32) -> Vec<ProjectedVertex> {
    let mut vertices: Vec<ProjectedVertex> = ring
        .iter()
        .filter_map(|position| projector.vertex(position, y))
        .collect();
    vertices.reverse();
    vertices
}

pub fn outer_ring(rings: &[Vec<Vec<f64>>]) -> Option<&[Vec<f64>]> {
    rings.first().map(Vec::as_slice)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedPart {
    // Index in the source MultiPolygon
    pub source_index: usize,
    pub vertices: Vec<ProjectedVertex>,
}

impl SelectedPart {
    // Ranked by vertex count, not area
    pub fn size_proxy(&self) -> usize {
        self.vertices.len()
    }
}

pub fn retained_count(candidates: usize, min_retained: usize, retain_fraction: f32) -> usize {
    let fraction = (candidates as f32 * retain_fraction).floor() as usize;
    min_retained.max(fraction)
}

/// Keep the dominant parts of a fragmented region and drop small islands.
///
/// Parts with fewer than three usable vertices are discarded. The rest are
/// ranked by vertex count, ties keeping source order, and the top
/// `max(min_retained, floor(count * retain_fraction))` are returned.
pub fn select_parts(
    parts: &[Vec<Vec<Vec<f64>>>],
    projector: &Projector,
    y: f32,
    min_retained: usize,
    retain_fraction: f32,
) -> Vec<SelectedPart> {
    let mut candidates: Vec<SelectedPart> = parts
        .iter()
        .enumerate()
        .filter_map(|(source_index, rings)| {
            let ring = outer_ring(rings)?;
            let vertices = normalize_ring(ring, projector, y);
            (vertices.len() >= 3).then_some(SelectedPart {
                source_index,
                vertices,
            })
        })
        .collect();

    // Sort from largest to smallest; sort_by is stable
    candidates.sort_by(|a, b| b.size_proxy().cmp(&a.size_proxy()));

    let keep = retained_count(candidates.len(), min_retained, retain_fraction);
    candidates.truncate(keep);
    candidates
}

// Output struct for the polygon geometry, laid out like a polygon-primitive
// mesh descriptor: one entry in `counts` per polygon, indices per vertex.
#[derive(Serialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BufferGeometry {
    pub vertices: Vec<f32>,
    pub counts: Vec<u8>,
    pub indices: Vec<u32>,
    pub colors: Vec<f32>,
    pub has_data: bool,
}

impl PolygonRecord {
    // Markers and segments produce an empty geometry
    pub fn to_buffer_geometry(&self, palette: &Palette) -> BufferGeometry {
        let mut geometry = BufferGeometry::default();
        append_record(&mut geometry, self, palette);
        geometry
    }
}

// Merge polygon records into one geometry
pub fn records_to_buffer_geometry(records: &[PolygonRecord], palette: &Palette) -> BufferGeometry {
    let mut geometry = BufferGeometry::default();
    for record in records {
        append_record(&mut geometry, record, palette);
    }
    geometry
}

fn append_record(geometry: &mut BufferGeometry, record: &PolygonRecord, palette: &Palette) {
    if record.kind != RecordKind::Polygon {
        return;
    }
    // Budgeted rings never exceed 255 vertices, the u8 count cannot overflow
    let Ok(count) = u8::try_from(record.vertices.len()) else {
        return;
    };

    let vertex_offset = (geometry.vertices.len() / 3) as u32;
    let color = palette.color(record.color_index);

    for (i, v) in record.vertices.iter().enumerate() {
        geometry.vertices.extend_from_slice(&[v.x, v.y, v.z]);
        geometry.colors.extend_from_slice(&[color.r, color.g, color.b]);
        geometry.indices.push(vertex_offset + i as u32);
    }
    geometry.counts.push(count);
    geometry.has_data = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn projector() -> Projector {
        Projector::new(35.0, 39.0, 0.05)
    }

    fn square() -> Vec<Vec<f64>> {
        vec![vec![32.0, 39.0], vec![33.0, 39.0], vec![33.0, 40.0], vec![32.0, 40.0]]
    }

    fn part(n: usize) -> Vec<Vec<Vec<f64>>> {
        vec![(0..n).map(|i| vec![30.0 + i as f64 * 0.01, 38.0]).collect()]
    }

    #[test]
    fn normalize_reverses_projected_order() {
        let out = normalize_ring(&square(), &projector(), 0.001);
        assert_eq!(out.len(), 4);
        assert_relative_eq!(out[0].x, -0.15, epsilon = 1e-6);
        assert_relative_eq!(out[0].z, 0.05, epsilon = 1e-6);
        assert_relative_eq!(out[3].x, -0.15, epsilon = 1e-6);
        assert_relative_eq!(out[3].z, 0.0);
    }

    #[test]
    fn reversing_twice_restores_order() {
        let p = projector();
        let forward: Vec<ProjectedVertex> =
            square().iter().filter_map(|c| p.vertex(c, 0.0)).collect();
        let mut twice = normalize_ring(&square(), &p, 0.0);
        twice.reverse();
        assert_eq!(twice, forward);
    }

    #[test]
    fn short_positions_are_dropped_individually() {
        let mut ring = square();
        ring.insert(2, vec![33.0]);
        ring.push(vec![]);
        assert_eq!(normalize_ring(&ring, &projector(), 0.0).len(), 4);

        let short = vec![vec![32.0, 39.0], vec![33.0]];
        assert_eq!(normalize_ring(&short, &projector(), 0.0).len(), 1);
    }

    #[test]
    fn retained_count_has_a_floor_of_five() {
        assert_eq!(retained_count(1, 5, 0.5), 5);
        assert_eq!(retained_count(10, 5, 0.5), 5);
        assert_eq!(retained_count(11, 5, 0.5), 5);
        assert_eq!(retained_count(12, 5, 0.5), 6);
        assert_eq!(retained_count(40, 5, 0.5), 20);
    }

    #[test]
    fn selects_largest_parts_with_stable_ties() {
        let sizes = [3, 50, 3, 200, 3, 3, 400, 3, 3, 3];
        let parts: Vec<_> = sizes.iter().map(|&n| part(n)).collect();
        let selected = select_parts(&parts, &projector(), 0.001, 5, 0.5);

        let proxies: Vec<usize> = selected.iter().map(SelectedPart::size_proxy).collect();
        assert_eq!(proxies, vec![400, 200, 50, 3, 3]);
        let sources: Vec<usize> = selected.iter().map(|p| p.source_index).collect();
        assert_eq!(sources, vec![6, 3, 1, 0, 2]);
    }

    #[test]
    fn degenerate_and_empty_parts_are_discarded() {
        let parts = vec![part(2), vec![], part(4), part(1)];
        let selected = select_parts(&parts, &projector(), 0.0, 5, 0.5);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].source_index, 2);
    }

    #[test]
    fn holes_are_ignored_when_selecting() {
        let mut with_hole = part(4);
        with_hole.push((0..100).map(|i| vec![31.0, 38.0 + i as f64 * 0.001]).collect());
        let selected = select_parts(&[with_hole], &projector(), 0.0, 5, 0.5);
        assert_eq!(selected[0].size_proxy(), 4);
    }

    #[test]
    fn buffer_geometry_offsets_indices_per_record() {
        let p = projector();
        let ring = normalize_ring(&square(), &p, 0.001);
        let record = |index: usize| PolygonRecord {
            kind: RecordKind::Polygon,
            vertices: ring.clone(),
            color_index: index,
            feature_name: "Ankara".to_string(),
            feature_index: index,
            part_index: None,
        };
        let marker = PolygonRecord {
            kind: RecordKind::Marker,
            vertices: vec![ProjectedVertex::new(0.0, 0.01, 0.0)],
            ..record(2)
        };
        let palette = Palette::provinces();
        let geometry = records_to_buffer_geometry(&[record(0), marker, record(1)], &palette);

        assert!(geometry.has_data);
        assert_eq!(geometry.counts, vec![4, 4]);
        assert_eq!(geometry.indices, (0..8).collect::<Vec<u32>>());
        assert_eq!(geometry.vertices.len(), 24);
        assert_eq!(geometry.colors.len(), 24);
        assert_relative_eq!(geometry.colors[0], palette.color(0).r);
        assert_relative_eq!(geometry.colors[12], palette.color(1).r);
    }

    #[test]
    fn markers_alone_produce_no_data() {
        let marker = PolygonRecord {
            kind: RecordKind::Marker,
            vertices: vec![ProjectedVertex::new(0.0, 0.01, 0.0)],
            color_index: 0,
            feature_name: "Unknown".to_string(),
            feature_index: 0,
            part_index: None,
        };
        assert_eq!(marker.to_buffer_geometry(&Palette::named()), BufferGeometry::default());
    }
}
