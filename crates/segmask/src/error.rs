use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error(transparent)]
    Volume(#[from] volume::VolumeError),

    #[error("container storage error: {0}")]
    Hdf5(#[from] hdf5::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("string {0:?} cannot be stored as an hdf5 attribute")]
    InvalidString(String),

    #[error("not a usable mask container: {0}")]
    SchemaMismatch(String),

    #[error("unsupported container format version {0}")]
    UnsupportedVersion(i32),
}

pub type Result<T> = std::result::Result<T, ContainerError>;
