use crate::error::SimplificationError;
use crate::projection::ProjectedVertex;
use crate::console_log;

/// Most vertices a single polygon primitive may hold in the target renderer.
pub const VERTEX_LIMIT: usize = 255;
/// Vertex count aimed for when a ring has to be decimated.
pub const SUBDIVISION_TARGET: usize = 200;

/// Bring a normalized ring under `limit` vertices.
///
/// Rings within the limit come back untouched. Larger rings keep every
/// `step`-th vertex starting at index 0, with `step = ceil(n / target)`,
/// and are closed with the original first vertex when the last kept vertex
/// differs from it. This is plain decimation, not shape-preserving
/// simplification, so the selected indices are stable across runs.
pub fn budget(
    vertices: Vec<ProjectedVertex>,
    limit: usize,
    target: usize,
) -> Result<Vec<ProjectedVertex>, SimplificationError> {
    let original = vertices.len();
    if original <= limit {
        return Ok(vertices);
    }

    let target = target.max(1);
    let step = original.div_ceil(target);

    let mut simplified: Vec<ProjectedVertex> = vertices.iter().step_by(step).copied().collect();

    // Close the ring
    if let (Some(last), Some(first)) = (simplified.last(), vertices.first()) {
        if last != first {
            simplified.push(*first);
        }
    }

    if simplified.len() < 3 || simplified.len() > limit {
        return Err(SimplificationError {
            original,
            simplified: simplified.len(),
            step,
            limit,
        });
    }

    console_log!(
        "  Simplified from {} to {} vertices (step: {})",
        original,
        simplified.len(),
        step
    );
    Ok(simplified)
}
