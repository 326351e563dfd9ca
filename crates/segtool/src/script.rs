//! Control-script generation.
//!
//! The hand-off to the external tool is one-directional: a short generated
//! script tells it what to open, how to threshold and group, and where to
//! leave its outputs. The text below is the contract the tool's scripting
//! interface expects; nothing in it is parsed back.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::config::{GroupingMode, SegmentationConfig};

pub const SEGMENT_SCRIPT_NAME: &str = "segment_map.py";
pub const UPDATE_SCRIPT_NAME: &str = "update_segmentation.cxc";

/// Python script executed inside the tool: open the map, run the watershed
/// segmentation with the configured threshold/pruning/grouping, then export
/// `segmask_<name>.mrc` and `seg_<name>.seg` into `out_dir`.
pub fn segment_script(volume: &Path, out_dir: &Path, config: &SegmentationConfig) -> String {
    // every knob is always emitted; the grouping mode decides which ones the
    // script actually reads
    let (smooth_steps, smooth_step_size, connect_steps) = match config.grouping {
        GroupingMode::Smoothing { steps, step_size } => (steps, step_size, 10),
        GroupingMode::Connectivity { steps } => (4, 3, steps),
    };
    let mode: &'static str = (&config.grouping).into();

    format!(
        r#"from chimerax.core.commands import run
run(session, 'open {volume}')
path = "{out_dir}"
groupingMode = "{mode}"
minRegionSize = {min_region_size}
minContactVoxels = {min_contact_voxels}
stopAtNumberOfRegions = {stop_at}
mapThreshold = {threshold}
if mapThreshold < 0:
    mapThreshold = None
numSmoothingSteps = {smooth_steps}
smoothingStepSize = {smooth_step_size}
numConnectivitySteps = {connect_steps}
from chimerax.map.volume import Volume
from chimerax.segger import regions
from chimerax.segger.segcmd import export_mask
from chimerax.segger.segfile import write_segmentation
import numpy
import os
for dmap in session.models.list(type=Volume):
    if mapThreshold is None:
        M = dmap.data.full_matrix()
        mapThreshold = numpy.average(M) + numpy.std(M) * 3.0
    smod = regions.Segmentation(dmap.name, session, dmap)
    smod.calculate_watershed_regions(dmap, mapThreshold)
    if minRegionSize > 1:
        smod.remove_small_regions(minRegionSize)
    if minContactVoxels > 0:
        smod.remove_contact_regions(minContactVoxels)
    if groupingMode == "smoothing":
        smod.smooth_and_group(numSmoothingSteps, smoothingStepSize, stopAtNumberOfRegions)
    elif groupingMode == "connectivity":
        smod.group_connected_n(numConnectivitySteps, stopAtNumberOfRegions)
    fileName = os.path.splitext(dmap.name)[0]
    outMask = os.path.join(path, "segmask_" + fileName + ".mrc")
    outSeg = os.path.join(path, "seg_" + fileName + ".seg")
    export_mask(smod, savePath=outMask)
    write_segmentation(smod, path=outSeg)
"#,
        volume = volume.display(),
        out_dir = out_dir.display(),
        mode = mode,
        min_region_size = config.min_region_size,
        min_contact_voxels = config.min_contact_voxels,
        stop_at = config.stop_at_region_count,
        threshold = config.threshold.script_value(),
        smooth_steps = smooth_steps,
        smooth_step_size = smooth_step_size,
        connect_steps = connect_steps,
    )
}

/// Session script for refining an authored container: open it and hide the
/// raw volume renderings.
pub fn update_script(container: &Path) -> String {
    format!("open {}\nvol all hide\n", container.display())
}

pub fn write_script(path: &Path, contents: &str) -> io::Result<()> {
    debug!(path = %path.display(), bytes = contents.len(), "writing control script");
    fs::write(path, contents)
}
