//! Application service — Agent Zero service supervision.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! The service is tracked through a pid file; every process interaction goes
//! through the `ProcessControl` port.

use anyhow::{Context, Result};
use chrono::Utc;

use crate::application::ports::{LocalFs, ProcessControl, ProgressReporter};
use crate::domain::service::{
    SERVICE_ENTRYPOINT, is_service_command_line, rotated_log_path, should_rotate_log,
};
use crate::domain::{
    LaunchCommand, RuntimeConfig, ServiceError, ServiceHandle, ServiceState, Signal, StopOutcome,
    SupervisorTimings,
};

/// Result of `start_service`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartReport {
    /// Handle of the freshly launched process.
    pub handle: ServiceHandle,
    /// What happened to the instance that was running before.
    pub previous: StopOutcome,
    /// Whether the log was rotated before launch.
    pub log_rotated: bool,
}

/// Resolve the pid file into a [`ServiceState`].
///
/// Missing, unparseable and dead handles map to [`ServiceState::Absent`], as
/// does a live pid that no longer runs the web UI.
///
/// # Errors
///
/// Returns an error if the liveness check itself fails.
pub async fn current_state(
    fs: &impl LocalFs,
    processes: &impl ProcessControl,
    config: &RuntimeConfig,
) -> Result<ServiceState> {
    let Some(handle) = read_handle(fs, config) else {
        return Ok(ServiceState::Absent);
    };
    if is_managed_service(processes, handle.pid).await? {
        Ok(ServiceState::Running(handle))
    } else {
        Ok(ServiceState::Absent)
    }
}

/// Stop the recorded instance, if any.
///
/// Sends `SIGTERM`, waits `timings.stop_grace`, then `SIGKILL` if the process
/// is still alive. The pid file is removed whatever the outcome.
///
/// # Errors
///
/// Returns an error if signalling fails or the pid file cannot be removed.
pub async fn stop_service(
    fs: &impl LocalFs,
    processes: &impl ProcessControl,
    reporter: &impl ProgressReporter,
    config: &RuntimeConfig,
    timings: SupervisorTimings,
) -> Result<StopOutcome> {
    if !fs.exists(&config.pid_file) {
        return Ok(StopOutcome::NotRunning);
    }

    let outcome = match read_handle(fs, config) {
        None => Ok(StopOutcome::StaleHandle),
        Some(handle) => terminate(processes, reporter, handle, timings).await,
    };

    fs.remove_file(&config.pid_file).context("removing service pid file")?;

    let outcome = outcome?;
    if outcome == StopOutcome::StaleHandle {
        tracing::debug!(pid_file = %config.pid_file.display(), "removed stale pid file");
    }
    Ok(outcome)
}

/// Stop any previous instance, then launch Agent Zero detached.
///
/// # Errors
///
/// Returns [`ServiceError::ExitedOnStart`] if the process is gone after
/// `timings.start_settle`, or an error if any filesystem or spawn step fails.
pub async fn start_service(
    fs: &impl LocalFs,
    processes: &impl ProcessControl,
    reporter: &impl ProgressReporter,
    config: &RuntimeConfig,
    timings: SupervisorTimings,
) -> Result<StartReport> {
    let previous = stop_service(fs, processes, reporter, config, timings).await?;

    let log_rotated = rotate_log_if_needed(fs, config)?;
    fs.append(
        &config.log_file,
        &format!(
            "\n=== agent-zero-install: starting Agent Zero at {} ===\n",
            Utc::now().to_rfc3339()
        ),
    )?;

    reporter.step("starting Agent Zero...");
    let launch = launch_command(config);
    let pid = processes
        .spawn_detached(&launch)
        .context("launching Agent Zero")?;
    let handle = ServiceHandle { pid };
    fs.write_private_atomic(&config.pid_file, &handle.render())
        .context("recording service pid")?;
    tracing::debug!(pid, "service launched");

    tokio::time::sleep(timings.start_settle).await;

    if !processes.is_alive(pid).await? {
        fs.remove_file(&config.pid_file)?;
        return Err(ServiceError::ExitedOnStart {
            log: config.log_file.clone(),
        }
        .into());
    }

    reporter.success(&format!("Agent Zero started (pid {pid})"));
    Ok(StartReport {
        handle,
        previous,
        log_rotated,
    })
}

/// Command line that runs the web UI from the virtual environment.
#[must_use]
pub fn launch_command(config: &RuntimeConfig) -> LaunchCommand {
    LaunchCommand {
        program: config.venv_python(),
        args: vec![
            SERVICE_ENTRYPOINT.to_string(),
            "--host".to_string(),
            config.bind_addr.clone(),
            "--port".to_string(),
            config.gui_port.to_string(),
        ],
        cwd: config.install_dir.clone(),
        log_file: config.log_file.clone(),
    }
}

// ── Internals ─────────────────────────────────────────────────────────────────

/// Unreadable and unparseable pid files both count as stale.
fn read_handle(fs: &impl LocalFs, config: &RuntimeConfig) -> Option<ServiceHandle> {
    if !fs.exists(&config.pid_file) {
        return None;
    }
    match fs.read_to_string(&config.pid_file) {
        Ok(contents) => ServiceHandle::parse(&contents),
        Err(e) => {
            tracing::debug!(error = %e, "unreadable pid file, treating as stale");
            None
        }
    }
}

/// Live and still running the web UI entrypoint. A recycled pid fails the
/// second check and is never signalled.
async fn is_managed_service(processes: &impl ProcessControl, pid: u32) -> Result<bool> {
    if !processes.is_alive(pid).await? {
        return Ok(false);
    }
    let Some(args) = processes.command_line(pid).await? else {
        return Ok(false);
    };
    let managed = is_service_command_line(&args);
    if !managed {
        tracing::debug!(pid, %args, "pid file names an unrelated process");
    }
    Ok(managed)
}

async fn terminate(
    processes: &impl ProcessControl,
    reporter: &impl ProgressReporter,
    handle: ServiceHandle,
    timings: SupervisorTimings,
) -> Result<StopOutcome> {
    let pid = handle.pid;
    if !is_managed_service(processes, pid).await? {
        return Ok(StopOutcome::StaleHandle);
    }

    reporter.step(&format!("stopping previous Agent Zero (pid {pid})..."));
    processes.signal(pid, Signal::Terminate).await?;
    tokio::time::sleep(timings.stop_grace).await;

    if processes.is_alive(pid).await? {
        processes.signal(pid, Signal::Kill).await?;
        reporter.warn(&format!("pid {pid} ignored SIGTERM, killed"));
        Ok(StopOutcome::Killed)
    } else {
        reporter.success("previous instance stopped");
        Ok(StopOutcome::Terminated)
    }
}

fn rotate_log_if_needed(fs: &impl LocalFs, config: &RuntimeConfig) -> Result<bool> {
    let Some(size) = fs.file_size(&config.log_file)? else {
        return Ok(false);
    };
    if !should_rotate_log(size) {
        return Ok(false);
    }
    fs.rename(&config.log_file, &rotated_log_path(&config.log_file))
        .context("rotating service log")?;
    Ok(true)
}
