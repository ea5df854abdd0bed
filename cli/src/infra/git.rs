//! Infrastructure implementation of the `RepositoryClient` port using `git`.

use std::path::Path;

use anyhow::Result;

use crate::application::ports::{CommandRunner, LONG_RUNNING_TIMEOUT, RepositoryClient};
use crate::domain::ProvisionError;
use crate::domain::error::output_tail;

/// `RepositoryClient` that shells out to the `git` CLI.
pub struct GitClient<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> GitClient<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> RepositoryClient for GitClient<R> {
    async fn clone_shallow(&self, url: &str, dest: &Path) -> Result<()> {
        let dest_str = dest.to_string_lossy();
        let output = self
            .runner
            .run_with_timeout(
                "git",
                &["clone", "--depth", "1", "--quiet", url, &dest_str],
                LONG_RUNNING_TIMEOUT,
            )
            .await?;
        if output.status.success() {
            return Ok(());
        }
        Err(ProvisionError::Clone {
            url: url.to_string(),
            detail: output_tail(&output.stderr, 10),
        }
        .into())
    }

    async fn fast_forward(&self, checkout: &Path) -> Result<()> {
        let dir = checkout.to_string_lossy();
        let output = self
            .runner
            .run_with_timeout(
                "git",
                &["-C", &dir, "pull", "--ff-only", "--quiet"],
                LONG_RUNNING_TIMEOUT,
            )
            .await?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_not_fast_forward(&stderr) {
            return Err(ProvisionError::NotFastForward {
                path: checkout.to_path_buf(),
            }
            .into());
        }
        Err(ProvisionError::Update {
            path: checkout.to_path_buf(),
            detail: output_tail(&output.stderr, 10),
        }
        .into())
    }
}

/// Recognize git's refusal to fast-forward a diverged branch.
#[must_use]
pub fn is_not_fast_forward(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    lower.contains("not possible to fast-forward")
        || lower.contains("diverging branches")
        || lower.contains("have diverged")
}
