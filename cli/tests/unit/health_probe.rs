//! Tests for the bounded HTTP readiness poll.

#![allow(clippy::expect_used)]

use agent_zero_installer::application::services::health_probe::wait_until_healthy;
use agent_zero_installer::domain::{ServiceError, ServiceHandle};

use crate::helpers::{FakeHttp, FakeProcesses, NoopReporter, fast_probe, test_config};

const PID: u32 = 4242;

#[tokio::test]
async fn test_probe_succeeds_once_service_answers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    let http = FakeHttp::ready_after(3);

    let attempts = wait_until_healthy(
        &FakeProcesses::with_running(PID),
        &http,
        &NoopReporter,
        &config,
        ServiceHandle { pid: PID },
        fast_probe(30),
    )
    .await
    .expect("healthy");

    assert_eq!(attempts, 4);
    assert!(
        http.calls().iter().all(|u| u == "http://127.0.0.1:7860"),
        "unexpected urls: {:?}",
        http.calls()
    );
}

#[tokio::test]
async fn test_probe_accepts_redirect_status() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());

    let attempts = wait_until_healthy(
        &FakeProcesses::with_running(PID),
        &FakeHttp::always(302),
        &NoopReporter,
        &config,
        ServiceHandle { pid: PID },
        fast_probe(3),
    )
    .await
    .expect("3xx counts as healthy");

    assert_eq!(attempts, 1);
}

#[tokio::test]
async fn test_probe_fails_fast_when_process_dies_mid_poll() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    let http = FakeHttp::never_ready();

    let err = wait_until_healthy(
        &FakeProcesses::with_running(PID).dying_after_checks(3),
        &http,
        &NoopReporter,
        &config,
        ServiceHandle { pid: PID },
        fast_probe(30),
    )
    .await
    .expect_err("crash must be reported");

    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::Crashed { pid: PID, .. })
    ));
    assert_eq!(http.calls().len(), 3, "must stop polling once the process is gone");
}

#[tokio::test]
async fn test_probe_times_out_after_attempt_budget() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    let http = FakeHttp::never_ready();

    let err = wait_until_healthy(
        &FakeProcesses::with_running(PID),
        &http,
        &NoopReporter,
        &config,
        ServiceHandle { pid: PID },
        fast_probe(5),
    )
    .await
    .expect_err("never ready");

    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::HealthTimeout { attempts: 5, .. })
    ));
    assert_eq!(http.calls().len(), 5);
}

#[tokio::test]
async fn test_probe_treats_server_errors_as_not_ready() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());

    let err = wait_until_healthy(
        &FakeProcesses::with_running(PID),
        &FakeHttp::always(502),
        &NoopReporter,
        &config,
        ServiceHandle { pid: PID },
        fast_probe(2),
    )
    .await
    .expect_err("502 is not healthy");

    let msg = err.to_string();
    assert!(msg.contains("http://127.0.0.1:7860"), "{msg}");
    assert!(msg.contains("agent-zero.log"), "{msg}");
}
