use std::fs;
use std::path::{Path, PathBuf};

use hdf5::types::VarLenUnicode;
use ndarray::{Array3, ArrayD, Ix3, arr1, arr2};
use serde::Serialize;
use tracing::{debug, info};
use volume::LabelGrid;

use crate::error::{ContainerError, Result};
use crate::format::{
    DEFAULT_MAP_LEVEL, DEFLATE_LEVEL, FORMAT_TAG, FORMAT_VERSION, IDENTITY_TRANSFORM,
    MASK_FILE_NAME, attrs, datasets,
};
use crate::regions::RegionTable;

/// Handle to the volume a container is authored from: where the voxels came
/// from on disk, plus the raw grid as the codec delivered it.
#[derive(Debug, Clone)]
pub struct VolumeSource {
    pub path: PathBuf,
    pub voxels: ArrayD<f32>,
}

impl VolumeSource {
    pub fn new(path: impl Into<PathBuf>, voxels: ArrayD<f32>) -> Self {
        Self {
            path: path.into(),
            voxels,
        }
    }

    /// Display name recorded in the container: the source file's base name.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Authors `mask.seg` containers from label volumes.
#[derive(Debug, Clone, Copy)]
pub struct MaskWriter {
    deflate_level: u8,
}

impl Default for MaskWriter {
    fn default() -> Self {
        Self {
            deflate_level: DEFLATE_LEVEL,
        }
    }
}

impl MaskWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert `source` into a mask container named [`MASK_FILE_NAME`]
    /// inside `dir`, overwriting any previous one. The container is written
    /// to a temporary path and renamed into place, so a concurrent reader
    /// never observes a partial file; on failure nothing is left behind and
    /// no path is returned.
    pub fn write(&self, dir: &Path, source: &VolumeSource) -> Result<PathBuf> {
        let grid = LabelGrid::from_dyn(source.voxels.clone())?;
        let regions = RegionTable::build(&grid)?;

        let out_path = dir.join(MASK_FILE_NAME);
        let tmp_path = dir.join(format!(".{MASK_FILE_NAME}.partial"));
        if let Err(err) = self.write_container(&tmp_path, source, &grid, &regions) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err);
        }
        fs::rename(&tmp_path, &out_path)?;

        info!(
            path = %out_path.display(),
            regions = regions.len(),
            "wrote mask container"
        );
        Ok(out_path)
    }

    fn write_container(
        &self,
        path: &Path,
        source: &VolumeSource,
        grid: &LabelGrid,
        regions: &RegionTable,
    ) -> Result<()> {
        let file = hdf5::File::create(path)?;

        write_str_attr(&file, attrs::FORMAT, FORMAT_TAG)?;
        file.new_attr::<i32>()
            .create(attrs::FORMAT_VERSION)?
            .write_scalar(&FORMAT_VERSION)?;
        write_str_attr(&file, attrs::NAME, &source.name())?;

        let shape = grid.shape();
        let map_size = arr1(&[shape[0] as i32, shape[1] as i32, shape[2] as i32]);
        file.new_attr::<i32>()
            .shape([3])
            .create(attrs::MAP_SIZE)?
            .write(&map_size)?;
        write_str_attr(&file, attrs::MAP_PATH, &source.path.to_string_lossy())?;
        file.new_attr::<f64>()
            .create(attrs::MAP_LEVEL)?
            .write_scalar(&DEFAULT_MAP_LEVEL)?;
        file.new_attr::<f32>()
            .shape([3, 4])
            .create(attrs::IJK_TO_XYZ_TRANSFORM)?
            .write(&arr2(&IDENTITY_TRANSFORM))?;

        file.new_dataset_builder()
            .deflate(self.deflate_level)
            .chunk(shape)
            .with_data(grid.view())
            .create(datasets::MASK)?;
        file.new_dataset_builder()
            .with_data(&arr1(&regions.ids))
            .create(datasets::REGION_IDS)?;
        file.new_dataset_builder()
            .with_data(&regions.colors_array())
            .create(datasets::REGION_COLORS)?;
        file.new_dataset_builder()
            .with_data(&arr1(&regions.smoothing_levels))
            .create(datasets::SMOOTHING_LEVELS)?;
        file.new_dataset_builder()
            .with_data(&arr1(&regions.parent_ids))
            .create(datasets::PARENT_IDS)?;
        file.new_dataset_builder()
            .with_data(&regions.ref_points_array())
            .create(datasets::REF_POINTS)?;

        Ok(())
    }
}

/// A mask container read back from disk.
#[derive(Debug, Clone)]
pub struct MaskContainer {
    pub name: String,
    pub map_path: PathBuf,
    pub map_level: f64,
    pub map_size: [usize; 3],
    pub transform: [[f32; 4]; 3],
    pub mask: Array3<u32>,
    pub regions: RegionTable,
}

impl MaskContainer {
    pub fn open(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "opening mask container");
        let file = hdf5::File::open(path)?;

        let tag = read_str_attr(&file, attrs::FORMAT)?;
        if tag != FORMAT_TAG {
            return Err(ContainerError::SchemaMismatch(format!(
                "unexpected format tag {tag:?}"
            )));
        }
        let version = file.attr(attrs::FORMAT_VERSION)?.read_scalar::<i32>()?;
        if version != FORMAT_VERSION {
            return Err(ContainerError::UnsupportedVersion(version));
        }

        let name = read_str_attr(&file, attrs::NAME)?;
        let map_path = PathBuf::from(read_str_attr(&file, attrs::MAP_PATH)?);
        let map_level = file.attr(attrs::MAP_LEVEL)?.read_scalar::<f64>()?;

        let size = file.attr(attrs::MAP_SIZE)?.read_1d::<i32>()?;
        if size.len() != 3 {
            return Err(ContainerError::SchemaMismatch(format!(
                "map_size has {} entries",
                size.len()
            )));
        }
        let map_size = [size[0] as usize, size[1] as usize, size[2] as usize];

        let transform_raw = file.attr(attrs::IJK_TO_XYZ_TRANSFORM)?.read_2d::<f32>()?;
        if transform_raw.dim() != (3, 4) {
            return Err(ContainerError::SchemaMismatch(format!(
                "transform has shape {:?}",
                transform_raw.dim()
            )));
        }
        let mut transform = [[0.0f32; 4]; 3];
        for (row, out) in transform.iter_mut().enumerate() {
            for (col, slot) in out.iter_mut().enumerate() {
                *slot = transform_raw[[row, col]];
            }
        }

        let mask = file
            .dataset(datasets::MASK)?
            .read_dyn::<u32>()?
            .into_dimensionality::<Ix3>()
            .map_err(|_| {
                ContainerError::SchemaMismatch("mask dataset is not 3-dimensional".into())
            })?;
        if mask.dim() != (map_size[0], map_size[1], map_size[2]) {
            return Err(ContainerError::SchemaMismatch(
                "mask shape disagrees with map_size".into(),
            ));
        }

        let regions = read_region_table(&file)?;
        Ok(Self {
            name,
            map_path,
            map_level,
            map_size,
            transform,
            mask,
            regions,
        })
    }

    pub fn info(&self) -> ContainerInfo {
        ContainerInfo {
            name: self.name.clone(),
            format_version: FORMAT_VERSION,
            map_size: self.map_size,
            map_path: self.map_path.clone(),
            map_level: self.map_level,
            region_count: self.regions.len(),
            region_ids: self.regions.ids.clone(),
        }
    }
}

/// Serializable container summary for tooling output.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerInfo {
    pub name: String,
    pub format_version: i32,
    pub map_size: [usize; 3],
    pub map_path: PathBuf,
    pub map_level: f64,
    pub region_count: usize,
    pub region_ids: Vec<i32>,
}

fn read_region_table(file: &hdf5::File) -> Result<RegionTable> {
    let ids = file.dataset(datasets::REGION_IDS)?.read_1d::<i32>()?.to_vec();

    let colors_raw = file.dataset(datasets::REGION_COLORS)?.read_2d::<f64>()?;
    if colors_raw.dim().1 != 4 && colors_raw.dim().0 != 0 {
        return Err(ContainerError::SchemaMismatch(format!(
            "region_colors has shape {:?}",
            colors_raw.dim()
        )));
    }
    let colors = colors_raw
        .rows()
        .into_iter()
        .map(|row| [row[0], row[1], row[2], row[3]])
        .collect();

    let smoothing_levels = file
        .dataset(datasets::SMOOTHING_LEVELS)?
        .read_1d::<f32>()?
        .to_vec();
    let parent_ids = file.dataset(datasets::PARENT_IDS)?.read_1d::<i32>()?.to_vec();

    let points_raw = file.dataset(datasets::REF_POINTS)?.read_2d::<f32>()?;
    if points_raw.dim().1 != 3 && points_raw.dim().0 != 0 {
        return Err(ContainerError::SchemaMismatch(format!(
            "ref_points has shape {:?}",
            points_raw.dim()
        )));
    }
    let ref_points: Vec<[f32; 3]> = points_raw
        .rows()
        .into_iter()
        .map(|row| [row[0], row[1], row[2]])
        .collect();

    let table = RegionTable {
        ids,
        colors,
        smoothing_levels,
        parent_ids,
        ref_points,
    };
    let n = table.len();
    if table.colors.len() != n
        || table.smoothing_levels.len() != n
        || table.parent_ids.len() != n
        || table.ref_points.len() != n
    {
        return Err(ContainerError::SchemaMismatch(
            "region arrays have unequal lengths".into(),
        ));
    }
    Ok(table)
}

fn write_str_attr(file: &hdf5::File, name: &str, value: &str) -> Result<()> {
    let stored: VarLenUnicode = value
        .parse()
        .map_err(|_| ContainerError::InvalidString(value.to_owned()))?;
    file.new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&stored)?;
    Ok(())
}

fn read_str_attr(file: &hdf5::File, name: &str) -> Result<String> {
    Ok(file.attr(name)?.read_scalar::<VarLenUnicode>()?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;
    use volume::VolumeError;

    fn source_with_labels() -> VolumeSource {
        let mut voxels = ArrayD::<f32>::zeros(ndarray::IxDyn(&[4, 5, 6]));
        voxels[[0, 1, 0]] = 1.0;
        voxels[[1, 0, 0]] = 1.0;
        voxels[[2, 3, 4]] = 2.0;
        voxels[[3, 3, 3]] = 3.0;
        VolumeSource::new("/maps/emd_1234.mrc", voxels)
    }

    #[test]
    fn write_then_open_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_with_labels();

        let path = MaskWriter::new().write(dir.path(), &source).unwrap();
        assert_eq!(path.file_name().unwrap(), MASK_FILE_NAME);

        let container = MaskContainer::open(&path).unwrap();
        assert_eq!(container.name, "emd_1234.mrc");
        assert_eq!(container.map_size, [4, 5, 6]);
        assert_eq!(container.map_level, DEFAULT_MAP_LEVEL);
        assert_eq!(container.transform, IDENTITY_TRANSFORM);
        assert_eq!(container.regions.ids, vec![1, 2, 3]);
        assert_eq!(container.regions.ref_points.len(), 3);
        assert_eq!(container.regions.smoothing_levels, vec![0.0; 3]);
        assert_eq!(container.regions.parent_ids, vec![0; 3]);

        // lossless round trip of the compressed grid
        let expected = source
            .voxels
            .clone()
            .into_dimensionality::<Ix3>()
            .unwrap()
            .mapv(|v| v as u32);
        assert_eq!(container.mask, expected);
    }

    #[test]
    fn reference_points_use_scan_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = MaskWriter::new()
            .write(dir.path(), &source_with_labels())
            .unwrap();
        let container = MaskContainer::open(&path).unwrap();
        // label 1 sits at (0,1,0) and (1,0,0); the outer-axis-first scan
        // reaches (0,1,0) first
        assert_eq!(container.regions.ref_points[0], [0.0, 1.0, 0.0]);
        assert_eq!(container.regions.ref_points[1], [2.0, 3.0, 4.0]);
    }

    #[test]
    fn gapped_labels_fail_and_leave_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut voxels = ArrayD::<f32>::zeros(ndarray::IxDyn(&[3, 3, 3]));
        voxels[[0, 0, 0]] = 1.0;
        voxels[[2, 2, 2]] = 3.0;
        let source = VolumeSource::new("gapped.mrc", voxels);

        let err = MaskWriter::new().write(dir.path(), &source).unwrap_err();
        assert!(matches!(
            err,
            ContainerError::Volume(VolumeError::LabelGap { label: 2 })
        ));
        assert!(!dir.path().join(MASK_FILE_NAME).exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn invalid_voxel_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut voxels = ArrayD::<f32>::zeros(ndarray::IxDyn(&[2, 2, 2]));
        voxels[[0, 0, 0]] = -4.0;
        let source = VolumeSource::new("bad.mrc", voxels);
        let err = MaskWriter::new().write(dir.path(), &source).unwrap_err();
        assert!(matches!(
            err,
            ContainerError::Volume(VolumeError::InvalidLabel { .. })
        ));
    }

    #[test]
    fn rewriting_overwrites_the_previous_container() {
        let dir = tempfile::tempdir().unwrap();
        let writer = MaskWriter::new();
        writer.write(dir.path(), &source_with_labels()).unwrap();

        let mut voxels = ArrayD::<f32>::zeros(ndarray::IxDyn(&[2, 2, 2]));
        voxels[[0, 0, 0]] = 1.0;
        let path = writer
            .write(dir.path(), &VolumeSource::new("second.mrc", voxels))
            .unwrap();

        let container = MaskContainer::open(&path).unwrap();
        assert_eq!(container.name, "second.mrc");
        assert_eq!(container.regions.ids, vec![1]);
    }

    #[test]
    fn squeezes_singleton_axes_before_authoring() {
        let dir = tempfile::tempdir().unwrap();
        let mut voxels = ArrayD::<f32>::zeros(ndarray::IxDyn(&[1, 3, 3, 3]));
        voxels[[0, 1, 1, 1]] = 1.0;
        let path = MaskWriter::new()
            .write(dir.path(), &VolumeSource::new("squeezed.mrc", voxels))
            .unwrap();
        let container = MaskContainer::open(&path).unwrap();
        assert_eq!(container.map_size, [3, 3, 3]);
    }

    #[test]
    fn opening_a_non_container_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.h5");
        let file = hdf5::File::create(&path).unwrap();
        drop(file);
        assert!(MaskContainer::open(&path).is_err());
    }
}
