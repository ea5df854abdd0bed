//! Infrastructure implementation of the `PackageManager` port for apt/dpkg.
//!
//! All calls go through a `CommandRunner` so tests can inject a recording
//! runner instead of touching the host's package database.

use std::sync::OnceLock;

use anyhow::Result;

use crate::application::ports::{CommandRunner, LONG_RUNNING_TIMEOUT, PackageManager};
use crate::domain::ProvisionError;
use crate::domain::error::output_tail;

/// `PackageManager` backed by `dpkg -s`, `apt-get update` and `apt-get install`.
///
/// Privileged calls are prefixed with `sudo` unless the installer already runs
/// as root (`id -u` is `0`).
pub struct AptPackageManager<R: CommandRunner> {
    runner: R,
    is_root: OnceLock<bool>,
}

impl<R: CommandRunner> AptPackageManager<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            is_root: OnceLock::new(),
        }
    }

    async fn running_as_root(&self) -> bool {
        if let Some(root) = self.is_root.get() {
            return *root;
        }
        let root = self
            .runner
            .run("id", &["-u"])
            .await
            .is_ok_and(|o| String::from_utf8_lossy(&o.stdout).trim() == "0");
        *self.is_root.get_or_init(|| root)
    }

    async fn privileged(&self, args: &[&str], packages: &str) -> Result<()> {
        let mut full = vec!["env", "DEBIAN_FRONTEND=noninteractive"];
        full.extend_from_slice(args);
        let output = if self.running_as_root().await {
            self.runner
                .run_with_timeout(full[0], &full[1..], LONG_RUNNING_TIMEOUT)
                .await?
        } else {
            self.runner
                .run_with_timeout("sudo", &full, LONG_RUNNING_TIMEOUT)
                .await?
        };
        if output.status.success() {
            return Ok(());
        }
        Err(ProvisionError::PackageInstall {
            packages: packages.to_string(),
            detail: output_tail(&output.stderr, 20),
        }
        .into())
    }
}

impl<R: CommandRunner> PackageManager for AptPackageManager<R> {
    async fn is_installed(&self, package: &str) -> Result<bool> {
        let output = self.runner.run("dpkg", &["-s", package]).await?;
        if !output.status.success() {
            return Ok(false);
        }
        // Removed-but-not-purged packages still have a dpkg record.
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .any(|l| l.starts_with("Status:") && l.contains("install ok installed")))
    }

    async fn refresh_index(&self) -> Result<()> {
        self.privileged(&["apt-get", "update", "-qq"], "(package index)")
            .await
    }

    async fn install(&self, packages: &[&str]) -> Result<()> {
        let mut args = vec!["apt-get", "install", "-y", "-qq", "--no-install-recommends"];
        args.extend_from_slice(packages);
        self.privileged(&args, &packages.join(" ")).await
    }
}
