use std::path::Path;

use ndarray::{ArrayD, ArrayView3};
use tracing::debug;

use crate::error::Result;

/// Seam for scientific-volume storage. The segmentation tool chain reads and
/// writes voxel grids through this trait so the conversion logic never binds
/// to a concrete file format.
pub trait VolumeCodec {
    fn read(&self, path: &Path) -> Result<ArrayD<f32>>;
    fn write(&self, path: &Path, voxels: ArrayView3<'_, f32>) -> Result<()>;
}

/// Dataset name used by [`Hdf5VolumeCodec`].
pub const VOXEL_DATASET: &str = "voxels";

/// Stores a voxel grid as a single `voxels` dataset in an HDF5 file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hdf5VolumeCodec;

impl VolumeCodec for Hdf5VolumeCodec {
    fn read(&self, path: &Path) -> Result<ArrayD<f32>> {
        debug!(path = %path.display(), "reading voxel grid");
        let file = hdf5::File::open(path)?;
        let voxels = file.dataset(VOXEL_DATASET)?.read_dyn::<f32>()?;
        Ok(voxels)
    }

    fn write(&self, path: &Path, voxels: ArrayView3<'_, f32>) -> Result<()> {
        debug!(path = %path.display(), "writing voxel grid");
        let file = hdf5::File::create(path)?;
        file.new_dataset_builder()
            .with_data(voxels)
            .create(VOXEL_DATASET)?;
        Ok(())
    }
}
