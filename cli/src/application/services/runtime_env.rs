//! Application service — Python virtual environment.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::Result;

use crate::application::ports::{CommandRunner, LONG_RUNNING_TIMEOUT, LocalFs, ProgressReporter};
use crate::domain::error::output_tail;
use crate::domain::{ProvisionError, RuntimeConfig};

/// Outcome of `ensure_venv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenvOutcome {
    /// Existing environment kept as is.
    Reused,
    /// No environment existed; a new one was built.
    Created,
    /// An existing environment was discarded and rebuilt.
    Recreated,
}

/// Create the virtual environment, or reuse it unless `force_recreate` is set.
///
/// Recreation deletes the whole directory first, including any packages added
/// by hand.
///
/// # Errors
///
/// Returns [`ProvisionError::Venv`] if `python3 -m venv` fails, or a
/// filesystem error if the old environment cannot be removed.
pub async fn ensure_venv(
    cmd_runner: &impl CommandRunner,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    config: &RuntimeConfig,
) -> Result<VenvOutcome> {
    let venv = &config.venv_dir;

    if fs.exists(&config.venv_python()) && !config.force_recreate {
        reporter.success("virtual environment reused");
        return Ok(VenvOutcome::Reused);
    }

    let existed = fs.exists(venv);
    if existed {
        reporter.step("removing old virtual environment...");
        fs.remove_dir_all(venv)?;
    }

    reporter.step("creating virtual environment...");
    let venv_str = venv.to_string_lossy();
    let output = cmd_runner
        .run_with_timeout("python3", &["-m", "venv", &venv_str], LONG_RUNNING_TIMEOUT)
        .await?;
    if !output.status.success() {
        return Err(ProvisionError::Venv {
            path: venv.clone(),
            detail: output_tail(&output.stderr, 20),
        }
        .into());
    }

    reporter.success("virtual environment ready");
    Ok(if existed {
        VenvOutcome::Recreated
    } else {
        VenvOutcome::Created
    })
}
