use thiserror::Error;

#[derive(Error, Debug)]
pub enum VolumeError {
    #[error("grid is not 3-dimensional after squeezing singleton axes (got {ndim} axes)")]
    NotThreeDimensional { ndim: usize },

    #[error("voxel value {value} cannot be used as a region label")]
    InvalidLabel { value: f32 },

    #[error("no voxel carries label {label}; labels must be consecutive starting at 1")]
    LabelGap { label: u32 },

    #[error("volume storage error: {0}")]
    Storage(#[from] hdf5::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, VolumeError>;
