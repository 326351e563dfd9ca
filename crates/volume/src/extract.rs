use ndarray::Array3;
use tracing::debug;

use crate::grid::LabelGrid;

/// A full-shape indicator grid for one region: 1.0 where the source grid
/// carries `label`, 0.0 everywhere else.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMask {
    pub label: u32,
    pub voxels: Array3<f32>,
}

/// Split a label volume into one indicator grid per distinct non-zero label,
/// ascending. The grid is masked against each label and divided by it, so a
/// surviving voxel is exactly 1 — original intensities are discarded, and the
/// shape is never cropped. An all-background grid yields an empty `Vec`.
pub fn extract_regions(grid: &LabelGrid) -> Vec<RegionMask> {
    let labels = grid.distinct_labels();
    debug!(regions = labels.len(), "extracting region masks");
    labels
        .into_iter()
        .map(|label| {
            let voxels = grid
                .view()
                .mapv(|value| if value == label { value as f32 / label as f32 } else { 0.0 });
            RegionMask { label, voxels }
        })
        .collect()
}
