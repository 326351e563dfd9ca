use std::collections::BTreeSet;

use ndarray::{Array3, ArrayD, ArrayView3, Axis, Ix3};

use crate::error::{Result, VolumeError};

/// A 3-D grid of region labels. 0 is background; every other value names the
/// region its voxel belongs to. Labels fit in `u32` and carry no ordering
/// requirement, though freshly authored masks use consecutive `1..=N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelGrid {
    voxels: Array3<u32>,
}

impl LabelGrid {
    pub fn from_array(voxels: Array3<u32>) -> Self {
        Self { voxels }
    }

    /// Build a grid from raw codec output. Singleton axes are dropped until
    /// exactly three remain; every voxel must hold a finite, non-negative
    /// integer value.
    pub fn from_dyn(raw: ArrayD<f32>) -> Result<Self> {
        let mut raw = raw;
        while raw.ndim() > 3 {
            let axis = raw
                .shape()
                .iter()
                .position(|&len| len == 1)
                .ok_or(VolumeError::NotThreeDimensional { ndim: raw.ndim() })?;
            raw = raw.index_axis_move(Axis(axis), 0);
        }
        if raw.ndim() != 3 {
            return Err(VolumeError::NotThreeDimensional { ndim: raw.ndim() });
        }
        let raw = raw.into_dimensionality::<Ix3>()?;

        let mut voxels = Array3::zeros(raw.raw_dim());
        for (out, &value) in voxels.iter_mut().zip(raw.iter()) {
            if !value.is_finite()
                || value < 0.0
                || value.fract() != 0.0
                || value > u32::MAX as f32
            {
                return Err(VolumeError::InvalidLabel { value });
            }
            *out = value as u32;
        }
        Ok(Self { voxels })
    }

    pub fn shape(&self) -> [usize; 3] {
        let (d0, d1, d2) = self.voxels.dim();
        [d0, d1, d2]
    }

    pub fn view(&self) -> ArrayView3<'_, u32> {
        self.voxels.view()
    }

    /// Largest label present; 0 for an all-background grid.
    pub fn max_label(&self) -> u32 {
        self.voxels.iter().copied().max().unwrap_or(0)
    }

    /// Distinct non-zero labels in ascending order.
    pub fn distinct_labels(&self) -> Vec<u32> {
        let mut labels: BTreeSet<u32> = self.voxels.iter().copied().collect();
        labels.remove(&0);
        labels.into_iter().collect()
    }

    /// First voxel coordinate carrying each label in `1..=max_label()`, in
    /// the grid's natural iteration order (outer axis first). A label with
    /// no voxel fails with [`VolumeError::LabelGap`].
    pub fn first_occurrences(&self) -> Result<Vec<[usize; 3]>> {
        let count = self.max_label() as usize;
        let mut seen: Vec<Option<[usize; 3]>> = vec![None; count];
        for ((i, j, k), &value) in self.voxels.indexed_iter() {
            if value == 0 {
                continue;
            }
            let slot = &mut seen[value as usize - 1];
            if slot.is_none() {
                *slot = Some([i, j, k]);
            }
        }
        seen.into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or(VolumeError::LabelGap {
                    label: index as u32 + 1,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array4, ArrayD, IxDyn};

    fn grid_from(values: Vec<f32>, shape: &[usize]) -> ArrayD<f32> {
        ArrayD::from_shape_vec(IxDyn(shape), values).unwrap()
    }

    #[test]
    fn squeezes_singleton_axes() {
        let raw = Array4::<f32>::zeros((1, 2, 3, 4)).into_dyn();
        let grid = LabelGrid::from_dyn(raw).expect("should squeeze to 3-D");
        assert_eq!(grid.shape(), [2, 3, 4]);
    }

    #[test]
    fn rejects_non_squeezable_axes() {
        let raw = Array4::<f32>::zeros((2, 2, 2, 2)).into_dyn();
        let err = LabelGrid::from_dyn(raw).unwrap_err();
        assert!(matches!(err, VolumeError::NotThreeDimensional { ndim: 4 }));
    }

    #[test]
    fn rejects_negative_values() {
        let raw = grid_from(vec![0.0, -1.0, 2.0, 0.0], &[1, 2, 2, 1]);
        let err = LabelGrid::from_dyn(raw).unwrap_err();
        assert!(matches!(err, VolumeError::InvalidLabel { .. }));
    }

    #[test]
    fn rejects_fractional_values() {
        let raw = grid_from(vec![0.0, 1.5, 2.0, 0.0], &[2, 2, 1]);
        let err = LabelGrid::from_dyn(raw).unwrap_err();
        assert!(matches!(err, VolumeError::InvalidLabel { .. }));
    }

    #[test]
    fn distinct_labels_sorted_without_background() {
        let raw = grid_from(vec![0.0, 5.0, 2.0, 5.0, 0.0, 2.0, 0.0, 0.0], &[2, 2, 2]);
        let grid = LabelGrid::from_dyn(raw).unwrap();
        assert_eq!(grid.distinct_labels(), vec![2, 5]);
        assert_eq!(grid.max_label(), 5);
    }

    #[test]
    fn first_occurrence_uses_outer_axis_first_order() {
        // label 1 appears at (0,1,0) and (1,0,0); the scan must pick (0,1,0)
        let raw = grid_from(vec![0.0, 0.0, 1.0, 2.0, 1.0, 0.0, 0.0, 0.0], &[2, 2, 2]);
        let grid = LabelGrid::from_dyn(raw).unwrap();
        let points = grid.first_occurrences().unwrap();
        assert_eq!(points, vec![[0, 1, 0], [0, 1, 1]]);
    }

    #[test]
    fn gap_in_label_sequence_is_an_error() {
        // labels {1, 3}: nothing carries 2
        let raw = grid_from(vec![1.0, 0.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0], &[2, 2, 2]);
        let grid = LabelGrid::from_dyn(raw).unwrap();
        let err = grid.first_occurrences().unwrap_err();
        assert!(matches!(err, VolumeError::LabelGap { label: 2 }));
    }
}
