//! Port/adapter for the external segmentation tool (ChimeraX + Segger).
//!
//! The tool is a black box: it accepts a generated control script, runs the
//! watershed segmentation, and leaves a label volume (and a mask container)
//! in a known output directory. This crate owns the configuration types for
//! a segmentation job, the control-script generation, the [`Driver`] trait a
//! backend implements to execute a script, and the filesystem discovery of
//! the tool's outputs. It never parses the tool's volume files itself.

pub mod config;
pub mod driver;
pub mod outputs;
pub mod script;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

pub use config::{GroupingMode, MapThreshold, OutputKind, SegmentationConfig};
pub use driver::{ChimeraXDriver, Driver, DriverError};
pub use outputs::{SegmentationOutputs, discover_outputs};

#[derive(Error, Debug)]
pub enum SegToolError {
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("no segmentation output matching {pattern:?} in {}", dir.display())]
    OutputNotFound { dir: PathBuf, pattern: String },
}

/// Runs segmentation jobs against a driver: writes the control script into
/// the working directory, hands it to the tool, then locates the files the
/// tool left behind.
pub struct Segmenter<D: Driver> {
    driver: D,
    workdir: PathBuf,
}

impl<D: Driver> Segmenter<D> {
    pub fn new(driver: D, workdir: impl Into<PathBuf>) -> Self {
        Self {
            driver,
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Segment a density map from scratch.
    pub fn segment(
        &self,
        volume: &Path,
        config: &SegmentationConfig,
    ) -> Result<SegmentationOutputs, SegToolError> {
        let script_path = self.workdir.join(script::SEGMENT_SCRIPT_NAME);
        script::write_script(
            &script_path,
            &script::segment_script(volume, &self.workdir, config),
        )?;
        info!(volume = %volume.display(), "running segmentation");
        self.driver.run(&script_path, &self.workdir)?;
        discover_outputs(&self.workdir)
    }

    /// Re-open an authored mask container in the tool so an existing
    /// segmentation can be refined, then collect the updated outputs.
    pub fn update(&self, container: &Path) -> Result<SegmentationOutputs, SegToolError> {
        let script_path = self.workdir.join(script::UPDATE_SCRIPT_NAME);
        script::write_script(&script_path, &script::update_script(container))?;
        info!(container = %container.display(), "updating segmentation");
        self.driver.run(&script_path, &self.workdir)?;
        discover_outputs(&self.workdir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Stand-in for the external tool: checks the script landed on disk and
    /// drops the files the real tool would produce.
    struct FakeTool;

    impl Driver for FakeTool {
        fn run(&self, script: &Path, cwd: &Path) -> Result<(), DriverError> {
            assert!(script.exists(), "script must be written before the run");
            fs::write(cwd.join("segmask_map.mrc"), b"").unwrap();
            fs::write(cwd.join("seg_map.seg"), b"").unwrap();
            Ok(())
        }
    }

    #[test]
    fn segment_writes_script_and_collects_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let segmenter = Segmenter::new(FakeTool, dir.path());

        let outputs = segmenter
            .segment(Path::new("/maps/map.mrc"), &SegmentationConfig::default())
            .unwrap();

        assert!(dir.path().join(script::SEGMENT_SCRIPT_NAME).exists());
        assert_eq!(outputs.label_volume, dir.path().join("segmask_map.mrc"));
        assert_eq!(outputs.container, Some(dir.path().join("seg_map.seg")));
    }

    #[test]
    fn update_uses_the_session_script() {
        let dir = tempfile::tempdir().unwrap();
        let segmenter = Segmenter::new(FakeTool, dir.path());

        segmenter.update(&dir.path().join("mask.seg")).unwrap();
        let script = fs::read_to_string(dir.path().join(script::UPDATE_SCRIPT_NAME)).unwrap();
        assert!(script.contains("mask.seg"));
    }

    struct SilentTool;

    impl Driver for SilentTool {
        fn run(&self, _script: &Path, _cwd: &Path) -> Result<(), DriverError> {
            Ok(())
        }
    }

    #[test]
    fn missing_outputs_surface_as_output_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let segmenter = Segmenter::new(SilentTool, dir.path());

        let err = segmenter
            .segment(Path::new("/maps/map.mrc"), &SegmentationConfig::default())
            .unwrap_err();
        assert!(matches!(err, SegToolError::OutputNotFound { .. }));
    }
}
