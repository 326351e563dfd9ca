use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

/// How the tool merges watershed regions after the initial flood.
#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GroupingMode {
    /// Group by smoothing the map; tends to work better at lower
    /// resolutions (4 Å and lower)
    Smoothing { steps: u32, step_size: u32 },
    /// Group by region connectivity; tends to work better at higher
    /// resolutions (4 Å and better)
    Connectivity { steps: u32 },
}

impl Default for GroupingMode {
    fn default() -> Self {
        Self::Smoothing {
            steps: 4,
            step_size: 3,
        }
    }
}

/// Intensity cutoff for the watershed flood.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MapThreshold {
    /// Let the tool pick mean + 3·stddev of the map
    Auto,
    Fixed(f32),
}

impl MapThreshold {
    /// Value embedded in the control script; the script treats negatives as
    /// "compute automatically".
    pub(crate) fn script_value(&self) -> f32 {
        match self {
            Self::Auto => -1.0,
            Self::Fixed(value) => *value,
        }
    }
}

impl Default for MapThreshold {
    fn default() -> Self {
        Self::Auto
    }
}

/// One segmentation job's parameters, as handed to the external tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct SegmentationConfig {
    pub grouping: GroupingMode,
    /// Minimum region size in voxels after the first segmentation step;
    /// 1 keeps every region.
    pub min_region_size: u32,
    /// Regions touching fewer contact voxels than this are dropped; 0 keeps
    /// every region.
    pub min_contact_voxels: u32,
    /// Stop grouping once this many regions remain.
    pub stop_at_region_count: u32,
    pub threshold: MapThreshold,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            grouping: GroupingMode::default(),
            min_region_size: 1,
            min_contact_voxels: 0,
            stop_at_region_count: 1,
            threshold: MapThreshold::default(),
        }
    }
}

/// Which outputs a job materializes from the tool's label volume.
#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq, Default
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutputKind {
    /// One volume holding an identifier per region
    #[default]
    Mask,
    /// One indicator volume per region
    Pieces,
    /// Mask and pieces
    Both,
}

impl OutputKind {
    pub fn wants_mask(self) -> bool {
        matches!(self, Self::Mask | Self::Both)
    }

    pub fn wants_pieces(self) -> bool {
        matches!(self, Self::Pieces | Self::Both)
    }
}
