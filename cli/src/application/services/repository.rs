//! Application service — Agent Zero checkout.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::Result;

use crate::application::ports::{LocalFs, ProgressReporter, RepositoryClient};
use crate::domain::{ProvisionError, RuntimeConfig};

/// Upstream repository cloned into the install directory.
pub const REPOSITORY_URL: &str = "https://github.com/agent0ai/agent-zero.git";

/// Outcome of `ensure_checkout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Fresh shallow clone.
    Cloned,
    /// Existing checkout fast-forwarded.
    Updated,
}

/// Clone Agent Zero on first run, fast-forward it afterwards.
///
/// The presence of `<install>/.git` marks an existing install. A non-empty
/// install directory without it is never overwritten.
///
/// # Errors
///
/// Returns [`ProvisionError::InstallDirOccupied`], the client's clone/update
/// error (including [`ProvisionError::NotFastForward`]), or a filesystem error.
pub async fn ensure_checkout(
    repo: &impl RepositoryClient,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    config: &RuntimeConfig,
) -> Result<CheckoutOutcome> {
    let install_dir = &config.install_dir;

    if fs.exists(&install_dir.join(".git")) {
        reporter.step("updating Agent Zero...");
        repo.fast_forward(install_dir).await?;
        reporter.success("Agent Zero up to date");
        return Ok(CheckoutOutcome::Updated);
    }

    if !fs.is_empty_dir(install_dir)? {
        return Err(ProvisionError::InstallDirOccupied {
            path: install_dir.clone(),
        }
        .into());
    }

    reporter.step(&format!("cloning Agent Zero into {}...", install_dir.display()));
    fs.create_dir_all(install_dir)?;
    repo.clone_shallow(REPOSITORY_URL, install_dir).await?;
    reporter.success("Agent Zero cloned");
    Ok(CheckoutOutcome::Cloned)
}
