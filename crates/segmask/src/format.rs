//! Wire names and defaults of the container schema. The external
//! segmentation tool reads these names verbatim, so they never change
//! independently of it.

pub const FORMAT_TAG: &str = "segger";
pub const FORMAT_VERSION: i32 = 2;

/// File name a freshly authored container is given inside its directory.
pub const MASK_FILE_NAME: &str = "mask.seg";

/// Iso-level threshold recorded when the writer has not computed one.
pub const DEFAULT_MAP_LEVEL: f64 = 0.01;

/// zlib level for the mask dataset; picked for size over speed.
pub const DEFLATE_LEVEL: u8 = 5;

/// Grid-index to physical-coordinate transform recorded when none is known:
/// identity rotation and scale, zero translation.
pub const IDENTITY_TRANSFORM: [[f32; 4]; 3] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
];

pub mod attrs {
    pub const FORMAT: &str = "format";
    pub const FORMAT_VERSION: &str = "format_version";
    pub const NAME: &str = "name";
    pub const MAP_SIZE: &str = "map_size";
    pub const MAP_PATH: &str = "map_path";
    pub const MAP_LEVEL: &str = "map_level";
    pub const IJK_TO_XYZ_TRANSFORM: &str = "ijk_to_xyz_transform";
}

pub mod datasets {
    pub const MASK: &str = "mask";
    pub const REGION_IDS: &str = "region_ids";
    pub const REGION_COLORS: &str = "region_colors";
    pub const SMOOTHING_LEVELS: &str = "smoothing_levels";
    pub const PARENT_IDS: &str = "parent_ids";
    pub const REF_POINTS: &str = "ref_points";
}
