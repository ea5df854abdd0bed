//! Service lifecycle types: pid handle, signals, timings, and health rules.
//!
//! Pure data and functions only. Process control itself lives behind the
//! `ProcessControl` port.

use std::path::{Path, PathBuf};
use std::time::Duration;

// ── Constants ────────────────────────────────────────────────────────────────

/// Log files larger than this are rotated to `<log>.old` before a launch.
pub const LOG_ROTATE_BYTES: u64 = 100 * 1024 * 1024;

/// Entry point of the Agent Zero web UI, relative to the checkout.
pub const SERVICE_ENTRYPOINT: &str = "run_ui.py";

// ── ServiceHandle ────────────────────────────────────────────────────────────

/// A recorded service process, persisted as a single integer in the pid file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceHandle {
    pub pid: u32,
}

impl ServiceHandle {
    /// Parse pid-file contents. Anything but a positive integer is `None`,
    /// which callers treat as a stale handle.
    #[must_use]
    pub fn parse(contents: &str) -> Option<Self> {
        contents
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|pid| *pid > 0)
            .map(|pid| Self { pid })
    }

    /// Pid-file contents for this handle.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}\n", self.pid)
    }
}

/// Supervisor view of the managed service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// No pid file, or a stale one.
    Absent,
    /// Pid file references a live process.
    Running(ServiceHandle),
}

/// How a previous instance was shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing was recorded.
    NotRunning,
    /// A pid file existed but its process was already gone.
    StaleHandle,
    /// Exited within the grace period after `SIGTERM`.
    Terminated,
    /// Needed `SIGKILL`.
    Killed,
}

// ── Signals and process state ────────────────────────────────────────────────

/// Signals the supervisor sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Terminate,
    Kill,
}

impl Signal {
    /// Argument form understood by `kill(1)`.
    #[must_use]
    pub fn as_kill_arg(self) -> &'static str {
        match self {
            Self::Terminate => "-TERM",
            Self::Kill => "-KILL",
        }
    }
}

/// Interpret `ps -o stat= -p <pid>` output.
///
/// Empty output means no such process. A zombie (`Z`) has exited and is only
/// waiting to be reaped, so it is not alive either.
#[must_use]
pub fn is_live_ps_state(stat: &str) -> bool {
    let stat = stat.trim();
    !stat.is_empty() && !stat.starts_with('Z')
}

/// Whether `ps -o args=` output belongs to an Agent Zero web UI process.
///
/// Matches on the entrypoint script so a pid recycled by an unrelated
/// program is not mistaken for the service.
#[must_use]
pub fn is_service_command_line(args: &str) -> bool {
    args.split_whitespace()
        .any(|arg| Path::new(arg).file_name().is_some_and(|name| name == SERVICE_ENTRYPOINT))
}

// ── Launch ───────────────────────────────────────────────────────────────────

/// Everything needed to start the service detached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    /// Interpreter to execute.
    pub program: PathBuf,
    /// Arguments after the program.
    pub args: Vec<String>,
    /// Working directory.
    pub cwd: PathBuf,
    /// File that receives appended stdout and stderr.
    pub log_file: PathBuf,
}

/// Returns `true` when a log of `size` bytes must be rotated before launch.
#[must_use]
pub fn should_rotate_log(size: u64) -> bool {
    size > LOG_ROTATE_BYTES
}

/// `<log>.old` next to the current log.
#[must_use]
pub fn rotated_log_path(log: &Path) -> PathBuf {
    let mut name = log.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".old");
    log.with_file_name(name)
}

// ── Timings and probe policy ─────────────────────────────────────────────────

/// Waits used by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorTimings {
    /// Time between `SIGTERM` and `SIGKILL`.
    pub stop_grace: Duration,
    /// Time between launch and the first liveness check.
    pub start_settle: Duration,
}

impl Default for SupervisorTimings {
    fn default() -> Self {
        Self {
            stop_grace: Duration::from_secs(2),
            start_settle: Duration::from_secs(2),
        }
    }
}

/// Bounded retry policy for the HTTP health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePolicy {
    pub attempts: u32,
    pub interval: Duration,
    pub request_timeout: Duration,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            attempts: 30,
            interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(3),
        }
    }
}

/// An HTTP status counts as healthy when it is not a client or server error.
#[must_use]
pub fn is_healthy_status(status: u16) -> bool {
    (100..400).contains(&status)
}
