use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::SegToolError;

/// Files the external tool leaves in the output directory after a run: the
/// updated label volume, and usually an updated mask container next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationOutputs {
    pub label_volume: PathBuf,
    pub container: Option<PathBuf>,
}

/// Locate the tool's outputs by filename pattern. A missing label volume is
/// [`SegToolError::OutputNotFound`] — a different condition from a label
/// volume that is present but all background, which is for the caller to
/// interpret.
pub fn discover_outputs(dir: &Path) -> Result<SegmentationOutputs, SegToolError> {
    let label_volume =
        find_match(dir, "segmask_", ".mrc")?.ok_or_else(|| SegToolError::OutputNotFound {
            dir: dir.to_path_buf(),
            pattern: "segmask_*.mrc".into(),
        })?;
    let container = find_match(dir, "seg_", ".seg")?;
    Ok(SegmentationOutputs {
        label_volume,
        container,
    })
}

fn find_match(dir: &Path, prefix: &str, suffix: &str) -> Result<Option<PathBuf>, SegToolError> {
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(prefix) && name.ends_with(suffix))
        })
        .collect();
    matches.sort();
    if matches.len() > 1 {
        warn!(
            dir = %dir.display(),
            pattern = format!("{prefix}*{suffix}"),
            count = matches.len(),
            "multiple segmentation outputs; using the first"
        );
    }
    Ok(matches.into_iter().next())
}
