use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::driver::{Driver, DriverError};

/// Environment override for the tool's executable path.
pub const CHIMERAX_EXE_ENV: &str = "CHIMERAX_EXE";

/// Runs control scripts through a headless ChimeraX process.
#[derive(Debug)]
pub struct ChimeraXDriver {
    program: PathBuf,
}

impl ChimeraXDriver {
    pub fn new() -> Result<Self, DriverError> {
        let program = Self::find_executable()?;
        Ok(Self { program })
    }

    pub fn with_path(program: impl Into<PathBuf>) -> Result<Self, DriverError> {
        let program = program.into();
        if !program.exists() {
            return Err(DriverError::Initialization(format!(
                "ChimeraX executable not found at: {}",
                program.display()
            )));
        }
        Ok(Self { program })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn find_executable() -> Result<PathBuf, DriverError> {
        if let Ok(path) = std::env::var(CHIMERAX_EXE_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(path);
            }
            return Err(DriverError::Initialization(format!(
                "{CHIMERAX_EXE_ENV} points at a missing executable: {}",
                path.display()
            )));
        }

        if let Ok(output) = Command::new("which").arg("chimerax").output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Ok(PathBuf::from(path));
                }
            }
        }

        let common_paths = [
            "/usr/bin/chimerax",
            "/usr/local/bin/chimerax",
            "/opt/UCSF/ChimeraX/bin/ChimeraX",
            "/Applications/ChimeraX.app/Contents/bin/ChimeraX",
        ];
        for path in &common_paths {
            if Path::new(path).exists() {
                return Ok(PathBuf::from(path));
            }
        }

        Err(DriverError::Initialization(
            "ChimeraX executable not found; install ChimeraX or set CHIMERAX_EXE".to_string(),
        ))
    }

    fn build_command(&self, script: &Path, cwd: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        // .cxc session scripts run through the command interpreter; python
        // control scripts need the headless script runner
        if script.extension().is_some_and(|ext| ext == "cxc") {
            cmd.arg(script);
        } else {
            cmd.args(["--nogui", "--silent", "--nostatus", "--script"])
                .arg(script);
        }
        cmd.current_dir(cwd);
        cmd
    }
}

impl Driver for ChimeraXDriver {
    fn run(&self, script: &Path, cwd: &Path) -> Result<(), DriverError> {
        let mut cmd = self.build_command(script, cwd);
        info!(
            program = %self.program.display(),
            script = %script.display(),
            "launching segmentation tool"
        );

        let output = cmd.output().map_err(|e| {
            DriverError::Execution(format!(
                "failed to launch {}: {e}",
                self.program.display()
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DriverError::Execution(format!(
                "tool exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        debug!("segmentation tool finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_path_rejects_missing_executables() {
        let err = ChimeraXDriver::with_path("/definitely/not/here").unwrap_err();
        assert!(matches!(err, DriverError::Initialization(_)));
    }

    #[test]
    fn python_scripts_run_headless() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("chimerax");
        std::fs::write(&exe, b"").unwrap();
        let driver = ChimeraXDriver::with_path(&exe).unwrap();

        let cmd = driver.build_command(Path::new("job/segment_map.py"), dir.path());
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["--nogui", "--silent", "--nostatus", "--script", "job/segment_map.py"]
        );
    }

    #[test]
    fn session_scripts_run_directly() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("chimerax");
        std::fs::write(&exe, b"").unwrap();
        let driver = ChimeraXDriver::with_path(&exe).unwrap();

        let cmd = driver.build_command(Path::new("job/update_segmentation.cxc"), dir.path());
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["job/update_segmentation.cxc"]);
    }
}
