//! Background-mission lifecycle.
//!
//! Each CLI invocation is a separate process, so the active mission is
//! tracked through a PID file under the project state directory. These
//! helpers own that file and the signal plumbing around it.

use anyhow::{Context, Result};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::infrastructure::config::PROJECT_DIR;

const PID_FILE: &str = "active.pid";

/// How many 100ms polls to wait after SIGTERM before escalating.
const TERM_POLLS: u32 = 10;

/// Paths and PID bookkeeping for one project workspace.
pub struct MissionLifecycle {
    root: PathBuf,
}

impl MissionLifecycle {
    pub fn in_current_dir() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to resolve current directory")?;
        Ok(Self::at(cwd.join(PROJECT_DIR)))
    }

    pub fn at(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join("state")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn report_dir(&self) -> PathBuf {
        self.root.join("reports")
    }

    pub fn mission_dir(&self) -> PathBuf {
        self.root.join("missions")
    }

    /// Create every workspace directory that is missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.state_dir(), self.log_dir(), self.report_dir(), self.mission_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    fn pid_file(&self) -> PathBuf {
        self.state_dir().join(PID_FILE)
    }

    /// The recorded PID, if the file exists and holds a parseable
    /// positive integer. Garbage content reads as no PID.
    pub fn read_active_pid(&self) -> Option<i32> {
        let raw = fs::read_to_string(self.pid_file()).ok()?;
        let pid: i32 = raw.trim().parse().ok()?;
        (pid > 0).then_some(pid)
    }

    pub fn record_pid(&self, pid: u32) -> Result<()> {
        fs::write(self.pid_file(), pid.to_string())
            .with_context(|| format!("failed to write {}", self.pid_file().display()))
    }

    pub fn clear_pid(&self) -> Result<()> {
        match fs::remove_file(self.pid_file()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove {}", self.pid_file().display()))
            }
        }
    }

    /// Signal-0 liveness probe.
    pub fn is_process_alive(pid: i32) -> bool {
        kill(Pid::from_raw(pid), None).is_ok()
    }

    /// Graceful stop: SIGTERM, poll for exit, then SIGKILL if the
    /// process is still there. Returns true once the process is gone.
    pub async fn terminate(pid: i32) -> bool {
        let target = Pid::from_raw(pid);
        let _ = kill(target, Signal::SIGTERM);

        for _ in 0..TERM_POLLS {
            if !Self::is_process_alive(pid) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        if Self::is_process_alive(pid) {
            let _ = kill(target, Signal::SIGKILL);
        }
        true
    }
}
