//! End-to-end tests of the install sequence against fake ports and a
//! temporary install directory.

#![allow(clippy::expect_used)]

use std::path::PathBuf;

use agent_zero_installer::app::AppContext;
use agent_zero_installer::application::services::dependencies::DependencyOutcome;
use agent_zero_installer::application::services::install::{InstallSummary, Installer};
use agent_zero_installer::application::services::repository::CheckoutOutcome;
use agent_zero_installer::application::services::runtime_env::VenvOutcome;
use agent_zero_installer::commands;
use agent_zero_installer::domain::prerequisites::REQUIRED_PACKAGES;
use agent_zero_installer::domain::{
    EnvironmentError, SecretProblem, SecretsError, ServiceHandle, StopOutcome,
};
use agent_zero_installer::infra::fs::LocalFs;

use crate::helpers::{
    FakeHost, FakeHttp, FakePackages, FakePorts, FakeProcesses, FakeRepo, RecordingReporter,
    UBUNTU_OS_RELEASE, fast_probe, fast_timings, os_release, test_config, test_env, test_secrets,
};

/// Fake host shared across runs so state (clone, venv, process table)
/// carries over like it would on a real machine.
struct Host {
    root: tempfile::TempDir,
    commands: FakeHost,
    packages: FakePackages,
    repo: FakeRepo,
    processes: FakeProcesses,
    http: FakeHttp,
    os_release: PathBuf,
}

impl Host {
    fn fresh() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let os_release = os_release(root.path(), UBUNTU_OS_RELEASE);
        Self {
            root,
            commands: FakeHost::healthy(),
            packages: FakePackages::with_installed(&[]),
            repo: FakeRepo::default(),
            processes: FakeProcesses::new(),
            http: FakeHttp::ready_after(2),
            os_release,
        }
    }

    async fn install(&self, ports: &FakePorts) -> anyhow::Result<InstallSummary> {
        let reporter = RecordingReporter::default();
        let installer = Installer {
            commands: &self.commands,
            packages: &self.packages,
            repository: &self.repo,
            processes: &self.processes,
            ports,
            http: &self.http,
            fs: &LocalFs,
            reporter: &reporter,
            os_release: &self.os_release,
            timings: fast_timings(),
            probe: fast_probe(10),
        };
        installer
            .run(&test_config(self.root.path()), &test_secrets(self.root.path()))
            .await
    }
}

#[tokio::test]
async fn test_fresh_install_ends_with_healthy_service() {
    let host = Host::fresh();
    let config = test_config(host.root.path());

    let summary = host.install(&FakePorts::default()).await.expect("install");

    assert_eq!(
        summary.dependencies,
        DependencyOutcome::Installed(REQUIRED_PACKAGES.iter().map(|p| (*p).to_string()).collect())
    );
    assert_eq!(summary.checkout, CheckoutOutcome::Cloned);
    assert_eq!(summary.venv, VenvOutcome::Created);
    assert!(summary.packages.requirements_installed);
    assert_eq!(summary.url, "http://127.0.0.1:7860");
    assert_eq!(summary.config_file, config.config_file);
    assert_eq!(summary.log_file, config.log_file);

    #[cfg(unix)]
    assert_eq!(crate::helpers::file_mode(&config.config_file), 0o600);
    let recorded = std::fs::read_to_string(&config.pid_file).expect("pid file");
    assert_eq!(ServiceHandle::parse(&recorded), Some(summary.service.handle));
    assert_eq!(host.processes.alive(), vec![summary.service.handle.pid]);
    assert_eq!(host.http.calls().len(), 3);
}

#[tokio::test]
async fn test_rerun_updates_in_place_and_replaces_service() {
    let host = Host::fresh();
    let first = host.install(&FakePorts::default()).await.expect("first run");

    // The first run's service now holds both ports.
    let second = host
        .install(&FakePorts::busy(&[7860, 5005]))
        .await
        .expect("second run");

    assert_eq!(second.checkout, CheckoutOutcome::Updated);
    assert_eq!(second.venv, VenvOutcome::Reused);
    assert_eq!(second.environment.ports_held_by_service, vec![7860, 5005]);
    assert_eq!(second.service.previous, StopOutcome::Terminated);
    assert_ne!(second.service.handle, first.service.handle);

    assert_eq!(host.repo.clones().len(), 1, "must not re-clone");
    assert_eq!(host.commands.count("-m venv"), 1, "must not rebuild the venv");
    assert_eq!(host.packages.installs().len(), 1);
    assert_eq!(
        host.processes.alive(),
        vec![second.service.handle.pid],
        "exactly one live service"
    );
}

#[tokio::test]
async fn test_bound_port_stops_run_before_any_change() {
    let host = Host::fresh();
    let config = test_config(host.root.path());

    let err = host
        .install(&FakePorts::busy(&[7860]))
        .await
        .expect_err("port in use");

    assert!(matches!(
        err.downcast_ref::<EnvironmentError>(),
        Some(EnvironmentError::PortInUse { port: 7860, .. })
    ));
    assert_eq!(host.packages.refreshes(), 0);
    assert!(host.packages.installs().is_empty());
    assert!(host.repo.clones().is_empty());
    assert_eq!(host.commands.count("-m venv"), 0);
    assert!(!config.install_dir.exists());
    assert!(host.processes.spawned().is_empty());
}

#[tokio::test]
async fn test_missing_secrets_fail_before_anything_is_touched() {
    let root = tempfile::tempdir().expect("tempdir");
    let mut env = test_env(root.path());
    env.remove("API_KEY_ANTHROPIC");
    env.insert("RFC_PASSWORD".into(), "changeme".into());
    let install_dir = test_config(root.path()).install_dir;

    let err = commands::install::run(&AppContext::new(env))
        .await
        .expect_err("secrets missing");

    let secrets = err.downcast_ref::<SecretsError>().expect("SecretsError");
    assert_eq!(
        secrets.names(SecretProblem::Missing),
        vec!["API_KEY_ANTHROPIC"]
    );
    assert_eq!(
        secrets.names(SecretProblem::Placeholder),
        vec!["RFC_PASSWORD"]
    );
    assert!(!install_dir.exists(), "nothing may be created");
}
