use ndarray::Array2;
use volume::LabelGrid;

use crate::error::Result;
use crate::palette;

/// Per-region metadata as five parallel arrays: position `i` always
/// describes the region whose id is `ids[i]`. A freshly authored table has
/// consecutive ids `1..=N`, zero smoothing levels and a flat hierarchy
/// (parent id 0); the external tool fills both in when it groups regions.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionTable {
    pub ids: Vec<i32>,
    pub colors: Vec<[f64; 4]>,
    pub smoothing_levels: Vec<f32>,
    pub parent_ids: Vec<i32>,
    pub ref_points: Vec<[f32; 3]>,
}

impl RegionTable {
    /// Build the table for a grid whose labels are consecutive `1..=N`
    /// (N = largest label present). Each region's reference point is the
    /// first voxel carrying its label in outer-axis-first scan order; a
    /// label with no voxel at all fails with
    /// [`volume::VolumeError::LabelGap`] instead of fabricating one.
    pub fn build(grid: &LabelGrid) -> Result<Self> {
        let count = grid.max_label() as usize;
        let points = grid.first_occurrences()?;
        Ok(Self {
            ids: (1..=count as i32).collect(),
            colors: palette::region_colors(count),
            smoothing_levels: vec![0.0; count],
            parent_ids: vec![0; count],
            ref_points: points
                .into_iter()
                .map(|[i, j, k]| [i as f32, j as f32, k as f32])
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub(crate) fn colors_array(&self) -> Array2<f64> {
        let mut out = Array2::zeros((self.len(), 4));
        for (row, color) in self.colors.iter().enumerate() {
            for (col, &channel) in color.iter().enumerate() {
                out[[row, col]] = channel;
            }
        }
        out
    }

    pub(crate) fn ref_points_array(&self) -> Array2<f32> {
        let mut out = Array2::zeros((self.len(), 3));
        for (row, point) in self.ref_points.iter().enumerate() {
            for (col, &coord) in point.iter().enumerate() {
                out[[row, col]] = coord;
            }
        }
        out
    }
}
