//! Application service — OS package installation.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::Result;

use crate::application::ports::{PackageManager, ProgressReporter};

/// Outcome of `ensure_packages`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyOutcome {
    /// Every package was already installed; the package manager was not invoked.
    AlreadyPresent,
    /// These packages were missing and have been installed.
    Installed(Vec<String>),
}

/// Install whichever of `packages` are missing, in a single batch.
///
/// # Errors
///
/// Returns an error if querying, refreshing, or installing fails. Failures are
/// not retried.
pub async fn ensure_packages(
    package_manager: &impl PackageManager,
    reporter: &impl ProgressReporter,
    packages: &[&str],
) -> Result<DependencyOutcome> {
    reporter.step("checking system packages...");

    let mut missing = Vec::new();
    for &package in packages {
        if !package_manager.is_installed(package).await? {
            missing.push(package);
        }
    }

    if missing.is_empty() {
        reporter.success("system packages present");
        return Ok(DependencyOutcome::AlreadyPresent);
    }

    reporter.step(&format!("installing {}...", missing.join(" ")));
    package_manager.refresh_index().await?;
    package_manager.install(&missing).await?;
    reporter.success(&format!("installed {}", missing.join(" ")));

    Ok(DependencyOutcome::Installed(
        missing.into_iter().map(str::to_owned).collect(),
    ))
}
