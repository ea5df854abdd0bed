//! Application service — host environment validation.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Every probe is read-only; the first hard violation aborts the run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use semver::Version;

use crate::application::ports::{
    CommandRunner, LocalFs, PortProbe, ProcessControl, ProgressReporter,
};
use crate::application::services::supervisor;
use crate::domain::config::{ENV_API_PORT, ENV_GUI_PORT};
use crate::domain::prerequisites::{
    MIN_FREE_DISK_BYTES, MIN_PYTHON, bytes_to_mib, classify_os_release, parse_df_available_bytes,
    parse_python_version, python_version_ok,
};
use crate::domain::{EnvironmentError, OsFamily, RuntimeConfig, ServiceState};

/// Standard location of the distribution identification file.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// What the validator found on a host that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentReport {
    /// Version of `python3` on PATH.
    pub python: Version,
    /// Detected OS family.
    pub os: OsFamily,
    /// Free bytes on the install volume.
    pub free_disk_bytes: u64,
    /// Ports currently held by the previously launched Agent Zero.
    pub ports_held_by_service: Vec<u16>,
}

/// Run the four host checks in order: Python, OS family, ports, disk.
///
/// An unrecognized OS family is reported as a warning; everything else is
/// fatal. A port held by the installer's own running service is accepted
/// because the supervisor restarts that instance later in the run.
///
/// # Errors
///
/// Returns an [`EnvironmentError`] for the first failed check, or an error
/// if a probe cannot be executed at all.
pub async fn validate_environment(
    cmd_runner: &impl CommandRunner,
    fs: &impl LocalFs,
    ports: &impl PortProbe,
    processes: &impl ProcessControl,
    reporter: &impl ProgressReporter,
    config: &RuntimeConfig,
    os_release: &Path,
) -> Result<EnvironmentReport> {
    reporter.step("checking python...");
    let python = probe_python(cmd_runner).await?;

    let os = probe_os(fs, os_release);
    if !os.is_recognized() {
        reporter.warn(&format!(
            "unrecognized OS '{}', continuing (only Debian/Ubuntu are tested)",
            os.name()
        ));
    }

    reporter.step("checking ports...");
    let ports_held_by_service = probe_ports(ports, fs, processes, config).await?;

    reporter.step("checking disk space...");
    let free_disk_bytes = probe_disk(cmd_runner, fs, &config.install_dir).await?;

    reporter.success(&format!("host ready (Python {python}, {})", os.name()));
    Ok(EnvironmentReport {
        python,
        os,
        free_disk_bytes,
        ports_held_by_service,
    })
}

// ── Internal probes ───────────────────────────────────────────────────────────

async fn probe_python(cmd_runner: &impl CommandRunner) -> Result<Version> {
    let missing = || EnvironmentError::PythonMissing {
        required: MIN_PYTHON.to_string(),
    };

    let Ok(output) = cmd_runner.run("python3", &["--version"]).await else {
        return Err(missing().into());
    };
    if !output.status.success() {
        return Err(missing().into());
    }

    // Python < 3.4 printed the version on stderr.
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    let Some(version) = parse_python_version(&text) else {
        return Err(EnvironmentError::PythonTooOld {
            found: text.trim().to_string(),
            required: MIN_PYTHON.to_string(),
        }
        .into());
    };

    if !python_version_ok(&version) {
        return Err(EnvironmentError::PythonTooOld {
            found: version.to_string(),
            required: MIN_PYTHON.to_string(),
        }
        .into());
    }
    Ok(version)
}

fn probe_os(fs: &impl LocalFs, os_release: &Path) -> OsFamily {
    let contents = fs.read_to_string(os_release).unwrap_or_default();
    classify_os_release(&contents)
}

async fn probe_ports(
    ports: &impl PortProbe,
    fs: &impl LocalFs,
    processes: &impl ProcessControl,
    config: &RuntimeConfig,
) -> Result<Vec<u16>> {
    let mut held = Vec::new();
    let mut service_state = None;

    for (var, port) in [(ENV_GUI_PORT, config.gui_port), (ENV_API_PORT, config.api_port)] {
        let free = ports
            .is_port_free(&config.bind_addr, port)
            .await
            .with_context(|| format!("checking port {port}"))?;
        if free {
            continue;
        }

        if service_state.is_none() {
            service_state = Some(supervisor::current_state(fs, processes, config).await?);
        }
        if let Some(ServiceState::Running(handle)) = service_state {
            tracing::debug!(port, pid = handle.pid, "port held by managed service");
            held.push(port);
            continue;
        }
        return Err(EnvironmentError::PortInUse { port, var }.into());
    }
    Ok(held)
}

async fn probe_disk(
    cmd_runner: &impl CommandRunner,
    fs: &impl LocalFs,
    install_dir: &Path,
) -> Result<u64> {
    let target = nearest_existing(fs, install_dir);
    let target_str = target.to_string_lossy();
    let out = cmd_runner
        .run("df", &["-Pk", &target_str])
        .await
        .context("running df")?;
    let available = parse_df_available_bytes(&String::from_utf8_lossy(&out.stdout))
        .ok_or_else(|| anyhow::anyhow!("cannot parse df output for {target_str}"))?;

    if available < MIN_FREE_DISK_BYTES {
        return Err(EnvironmentError::InsufficientDisk {
            path: target,
            available_mib: bytes_to_mib(available),
            required_mib: bytes_to_mib(MIN_FREE_DISK_BYTES),
        }
        .into());
    }
    Ok(available)
}

/// Closest ancestor of `path` (inclusive) that exists, falling back to `/`.
fn nearest_existing(fs: &impl LocalFs, path: &Path) -> PathBuf {
    path.ancestors()
        .find(|p| !p.as_os_str().is_empty() && fs.exists(p))
        .map_or_else(|| PathBuf::from("/"), Path::to_path_buf)
}
