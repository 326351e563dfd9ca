//! Voxel-grid data model for segmentation label volumes.
//!
//! A label volume is a 3-D grid of `u32` region identifiers where 0 marks
//! background. This crate owns the typed grid ([`LabelGrid`]), the per-region
//! indicator extraction ([`extract_regions`]) and the [`VolumeCodec`] seam
//! used to move voxel grids to and from disk.

pub mod codec;
pub mod error;
pub mod extract;
pub mod grid;

pub use codec::{Hdf5VolumeCodec, VolumeCodec};
pub use error::{Result, VolumeError};
pub use extract::{RegionMask, extract_regions};
pub use grid::LabelGrid;
