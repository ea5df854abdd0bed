//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::{LaunchCommand, Signal};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Timeout for steps that download or build (apt, clone, venv, pip).
pub const LONG_RUNNING_TIMEOUT: Duration = Duration::from_secs(30 * 60);

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Provisioning Ports ────────────────────────────────────────────────────────

/// OS package manager: "ensure packages present".
#[allow(async_fn_in_trait)]
pub trait PackageManager {
    /// Whether `package` is installed.
    async fn is_installed(&self, package: &str) -> Result<bool>;
    /// Refresh the package index.
    async fn refresh_index(&self) -> Result<()>;
    /// Install `packages` in one batch.
    async fn install(&self, packages: &[&str]) -> Result<()>;
}

/// Version-control client: "ensure repository checked out/updated".
#[allow(async_fn_in_trait)]
pub trait RepositoryClient {
    /// Shallow (depth 1) clone of `url` into `dest`.
    async fn clone_shallow(&self, url: &str, dest: &Path) -> Result<()>;
    /// Fast-forward-only update of an existing checkout.
    ///
    /// # Errors
    ///
    /// Must fail with `ProvisionError::NotFastForward` when the local branch
    /// has diverged.
    async fn fast_forward(&self, checkout: &Path) -> Result<()>;
}

// ── Process Control Port ──────────────────────────────────────────────────────

/// Liveness checks, signals and detached launches for the managed service.
#[allow(async_fn_in_trait)]
pub trait ProcessControl {
    /// Whether `pid` refers to a running (non-zombie) process.
    async fn is_alive(&self, pid: u32) -> Result<bool>;
    /// Command line of `pid`, `None` if there is no such process.
    async fn command_line(&self, pid: u32) -> Result<Option<String>>;
    /// Send `signal` to `pid`. A process that is already gone is not an error.
    async fn signal(&self, pid: u32, signal: Signal) -> Result<()>;
    /// Start `launch` detached from the installer and return its pid.
    fn spawn_detached(&self, launch: &LaunchCommand) -> Result<u32>;
}

// ── Network Ports ─────────────────────────────────────────────────────────────

/// Abstracts local port checks so the validator can be tested without sockets.
#[allow(async_fn_in_trait)]
pub trait PortProbe {
    /// `true` when nothing is listening on `host:port`.
    async fn is_port_free(&self, host: &str, port: u16) -> Result<bool>;
}

/// Abstracts the HTTP GET used by the health prober.
#[allow(async_fn_in_trait)]
pub trait HttpProbe {
    /// GET `url` and return the status code. Connection failures are errors.
    async fn get_status(&self, url: &str, timeout: Duration) -> Result<u16>;
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Filesystem operations used by the provisioning services.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    /// `true` if `path` is missing or an empty directory.
    fn is_empty_dir(&self, path: &Path) -> Result<bool>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    /// File size in bytes, `None` if the file does not exist.
    fn file_size(&self, path: &Path) -> Result<Option<u64>>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Append `content` to `path`, creating it if needed.
    fn append(&self, path: &Path, content: &str) -> Result<()>;
    /// Replace `path` atomically with `content`, readable and writable by the
    /// owner only from the moment the file first exists.
    fn write_private_atomic(&self, path: &Path, content: &str) -> Result<()>;
}
