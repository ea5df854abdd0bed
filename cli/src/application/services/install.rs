//! Application service — the full install-or-update-and-start sequence.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Each step gates the next; the first error aborts the run.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::application::ports::{
    CommandRunner, HttpProbe, LocalFs, PackageManager, PortProbe, ProcessControl,
    ProgressReporter, RepositoryClient,
};
use crate::application::services::config_writer::write_config;
use crate::application::services::dependencies::{DependencyOutcome, ensure_packages};
use crate::application::services::environment_check::{EnvironmentReport, validate_environment};
use crate::application::services::health_probe::wait_until_healthy;
use crate::application::services::packages::{PackagesReport, install_packages};
use crate::application::services::repository::{CheckoutOutcome, ensure_checkout};
use crate::application::services::runtime_env::{VenvOutcome, ensure_venv};
use crate::application::services::supervisor::{StartReport, start_service};
use crate::domain::prerequisites::REQUIRED_PACKAGES;
use crate::domain::{ProbePolicy, RuntimeConfig, SecretBundle, SupervisorTimings};

/// Collaborators of the install use-case.
///
/// Grouped so callers (and tests) can swap any of them independently.
pub struct Installer<'a, C, P, G, X, N, H, F, R> {
    pub commands: &'a C,
    pub packages: &'a P,
    pub repository: &'a G,
    pub processes: &'a X,
    pub ports: &'a N,
    pub http: &'a H,
    pub fs: &'a F,
    pub reporter: &'a R,
    pub os_release: &'a Path,
    pub timings: SupervisorTimings,
    pub probe: ProbePolicy,
}

/// Everything a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallSummary {
    pub environment: EnvironmentReport,
    pub dependencies: DependencyOutcome,
    pub checkout: CheckoutOutcome,
    pub venv: VenvOutcome,
    pub packages: PackagesReport,
    pub config_file: PathBuf,
    pub service: StartReport,
    pub url: String,
    pub log_file: PathBuf,
}

impl<C, P, G, X, N, H, F, R> Installer<'_, C, P, G, X, N, H, F, R>
where
    C: CommandRunner,
    P: PackageManager,
    G: RepositoryClient,
    X: ProcessControl,
    N: PortProbe,
    H: HttpProbe,
    F: LocalFs,
    R: ProgressReporter,
{
    /// Run every step in order.
    ///
    /// Taking an already validated [`SecretBundle`] means a run with missing
    /// secrets cannot get this far.
    ///
    /// # Errors
    ///
    /// Returns the first step's error unchanged.
    pub async fn run(
        &self,
        config: &RuntimeConfig,
        secrets: &SecretBundle,
    ) -> Result<InstallSummary> {
        let environment = validate_environment(
            self.commands,
            self.fs,
            self.ports,
            self.processes,
            self.reporter,
            config,
            self.os_release,
        )
        .await?;

        let dependencies = ensure_packages(self.packages, self.reporter, REQUIRED_PACKAGES).await?;
        let checkout = ensure_checkout(self.repository, self.fs, self.reporter, config).await?;
        let venv = ensure_venv(self.commands, self.fs, self.reporter, config).await?;
        let packages = install_packages(self.commands, self.fs, self.reporter, config).await?;
        let config_file = write_config(self.fs, self.reporter, config, secrets)?;

        let service =
            start_service(self.fs, self.processes, self.reporter, config, self.timings).await?;
        wait_until_healthy(
            self.processes,
            self.http,
            self.reporter,
            config,
            service.handle,
            self.probe,
        )
        .await?;

        Ok(InstallSummary {
            environment,
            dependencies,
            checkout,
            venv,
            packages,
            config_file,
            service,
            url: config.gui_url(),
            log_file: config.log_file.clone(),
        })
    }
}
