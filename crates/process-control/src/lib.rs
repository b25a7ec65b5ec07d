//! Restarting the process that owns the control strip so it rereads its preferences.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use app_core::ProcessControl;
use tracing::{info, warn};

const KILLALL: &str = "/usr/bin/killall";

/// Restarts a process by killing it with `killall` and letting the system
/// relaunch it.
#[derive(Debug, Clone)]
pub struct KillallProcessControl {
    program: PathBuf,
}

impl KillallProcessControl {
    pub fn new() -> Self {
        Self::with_program(KILLALL)
    }

    /// Use a different `killall`-compatible executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for KillallProcessControl {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessControl for KillallProcessControl {
    fn request_restart(&self, process_name: &str) {
        match signal(&self.program, process_name) {
            Ok(()) => info!(process = process_name, "restart requested"),
            Err(err) => warn!(process = process_name, error = %err, "restart request failed"),
        }
    }
}

/// Leaves the running process alone; saved preferences apply on its next launch.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRestart;

impl ProcessControl for NoRestart {
    fn request_restart(&self, process_name: &str) {
        info!(process = process_name, "restart skipped");
    }
}

fn signal(program: &Path, process_name: &str) -> anyhow::Result<()> {
    let out = Command::new(program)
        .arg(process_name)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()?;

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        warn!(code = ?out.status.code(), stderr = %stderr.trim(), "killall exited with failure");
        anyhow::bail!("{} {process_name} failed: {}", program.display(), out.status);
    }

    Ok(())
}
