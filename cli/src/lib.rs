use std::fs;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use segtool::{OutputKind, SegmentationConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// One segmentation job as described by a config file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct JobConfig {
    /// Density map (or label volume) to segment
    pub volume: PathBuf,
    /// Directory the control script and every output land in
    pub output_dir: PathBuf,
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    /// Whether to keep the single id mask, per-region pieces, or both
    #[serde(default)]
    pub output: OutputKind,
}

impl JobConfig {
    pub fn from_file(path: &Path) -> Result<Self, JobError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_file(path),
            Some("toml") => Self::from_toml_file(path),
            _ => Err(JobError::UnsupportedFileFormat),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, JobError> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, JobError> {
        Ok(toml::from_str(&fs::read_to_string(path)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segtool::GroupingMode;

    #[test]
    fn loads_a_toml_job() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.toml");
        fs::write(
            &path,
            r#"
volume = "/maps/emd_1234.mrc"
output_dir = "/tmp/segjob"
output = "both"

[segmentation.grouping]
type = "connectivity"
params = { steps = 8 }
"#,
        )
        .unwrap();

        let job = JobConfig::from_file(&path).unwrap();
        assert_eq!(job.volume, PathBuf::from("/maps/emd_1234.mrc"));
        assert_eq!(job.output, OutputKind::Both);
        assert_eq!(
            job.segmentation.grouping,
            GroupingMode::Connectivity { steps: 8 }
        );
        // untouched knobs keep their defaults
        assert_eq!(job.segmentation.min_region_size, 1);
    }

    #[test]
    fn loads_a_json_job_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.json");
        fs::write(&path, r#"{"volume": "m.mrc", "output_dir": "out"}"#).unwrap();

        let job = JobConfig::from_file(&path).unwrap();
        assert_eq!(job.output, OutputKind::Mask);
        assert_eq!(job.segmentation, SegmentationConfig::default());
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        let err = JobConfig::from_file(Path::new("job.yaml")).unwrap_err();
        assert!(matches!(err, JobError::UnsupportedFileFormat));
    }
}
