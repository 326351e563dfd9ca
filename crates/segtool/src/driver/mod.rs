pub mod chimerax;

use std::path::Path;

pub use chimerax::ChimeraXDriver;

#[derive(thiserror::Error, Debug)]
pub enum DriverError {
    #[error("failed to initialize driver: {0}")]
    Initialization(String),
    #[error("external tool execution failed: {0}")]
    Execution(String),
}

/// A backend that can hand a generated control script to the external
/// segmentation tool. The run is synchronous and fire-and-collect: the
/// driver blocks until the tool exits, and output files are discovered
/// afterwards by the caller.
pub trait Driver {
    fn run(&self, script: &Path, cwd: &Path) -> Result<(), DriverError>;
}
