//! Tests for the `supervisor` application service: pid-file handling,
//! graceful stop with escalation, and launch bookkeeping.

#![allow(clippy::expect_used)]

use agent_zero_installer::application::services::supervisor::{
    current_state, launch_command, start_service, stop_service,
};
use agent_zero_installer::domain::service::LOG_ROTATE_BYTES;
use agent_zero_installer::domain::{
    ServiceError, ServiceHandle, ServiceState, Signal, StopOutcome,
};
use agent_zero_installer::infra::fs::LocalFs;

use crate::helpers::{
    FakeProcesses, NoopReporter, RecordingReporter, fast_timings, test_config, write_pid_file,
};

// ── stop ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_stop_without_pid_file_is_not_running() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    let processes = FakeProcesses::new();

    let outcome = stop_service(&LocalFs, &processes, &NoopReporter, &config, fast_timings())
        .await
        .expect("stop");

    assert_eq!(outcome, StopOutcome::NotRunning);
    assert!(processes.signals().is_empty());
}

#[tokio::test]
async fn test_stop_with_stale_pid_file_removes_it_without_signalling() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    write_pid_file(&config, "999\n");
    let processes = FakeProcesses::new();

    let outcome = stop_service(&LocalFs, &processes, &NoopReporter, &config, fast_timings())
        .await
        .expect("stale pid file is not an error");

    assert_eq!(outcome, StopOutcome::StaleHandle);
    assert!(!config.pid_file.exists(), "stale pid file must be removed");
    assert!(processes.signals().is_empty());
}

#[tokio::test]
async fn test_stop_with_garbage_pid_file_removes_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    write_pid_file(&config, "not a pid");

    let outcome = stop_service(
        &LocalFs,
        &FakeProcesses::new(),
        &NoopReporter,
        &config,
        fast_timings(),
    )
    .await
    .expect("stop");

    assert_eq!(outcome, StopOutcome::StaleHandle);
    assert!(!config.pid_file.exists());
}

#[tokio::test]
async fn test_stop_with_non_utf8_pid_file_removes_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    write_pid_file(&config, "");
    std::fs::write(&config.pid_file, [0xff, 0xfe, b'1']).expect("binary pid file");
    let processes = FakeProcesses::new();

    let outcome = stop_service(&LocalFs, &processes, &NoopReporter, &config, fast_timings())
        .await
        .expect("unreadable pid file is stale, not an error");

    assert_eq!(outcome, StopOutcome::StaleHandle);
    assert!(!config.pid_file.exists(), "pid file must always be removed");
    assert!(processes.signals().is_empty());
}

#[tokio::test]
async fn test_start_recovers_from_non_utf8_pid_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    write_pid_file(&config, "");
    std::fs::write(&config.pid_file, [0xff, 0xfe, b'1']).expect("binary pid file");
    let processes = FakeProcesses::new();

    let report = start_service(&LocalFs, &processes, &NoopReporter, &config, fast_timings())
        .await
        .expect("start");

    assert_eq!(report.previous, StopOutcome::StaleHandle);
    let recorded = std::fs::read_to_string(&config.pid_file).expect("pid file");
    assert_eq!(ServiceHandle::parse(&recorded), Some(report.handle));
}

#[tokio::test]
async fn test_stop_terminates_live_service_with_sigterm() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    write_pid_file(&config, "777\n");
    let processes = FakeProcesses::with_running(777);

    let outcome = stop_service(&LocalFs, &processes, &NoopReporter, &config, fast_timings())
        .await
        .expect("stop");

    assert_eq!(outcome, StopOutcome::Terminated);
    assert_eq!(processes.signals(), vec![(777, Signal::Terminate)]);
    assert!(processes.alive().is_empty());
    assert!(!config.pid_file.exists());
}

#[tokio::test]
async fn test_stop_leaves_recycled_pid_alone() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    write_pid_file(&config, "777\n");
    let processes = FakeProcesses::with_process(777, "/usr/sbin/sshd -D");

    let outcome = stop_service(&LocalFs, &processes, &NoopReporter, &config, fast_timings())
        .await
        .expect("stop");

    assert_eq!(outcome, StopOutcome::StaleHandle);
    assert!(processes.signals().is_empty(), "unrelated process must not be signalled");
    assert_eq!(processes.alive(), vec![777]);
    assert!(!config.pid_file.exists());
}

#[tokio::test]
async fn test_stop_escalates_to_sigkill_after_grace() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    write_pid_file(&config, "777\n");
    let processes = FakeProcesses::with_running(777).ignoring_term();
    let reporter = RecordingReporter::default();

    let outcome = stop_service(&LocalFs, &processes, &reporter, &config, fast_timings())
        .await
        .expect("stop");

    assert_eq!(outcome, StopOutcome::Killed);
    assert_eq!(
        processes.signals(),
        vec![(777, Signal::Terminate), (777, Signal::Kill)]
    );
    assert!(processes.alive().is_empty());
    assert_eq!(reporter.warnings().len(), 1);
}

// ── state ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_current_state_reports_running_only_for_live_pid() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());

    let state = current_state(&LocalFs, &FakeProcesses::new(), &config)
        .await
        .expect("state");
    assert_eq!(state, ServiceState::Absent);

    write_pid_file(&config, "31337\n");
    let state = current_state(&LocalFs, &FakeProcesses::new(), &config)
        .await
        .expect("state");
    assert_eq!(state, ServiceState::Absent);

    let state = current_state(&LocalFs, &FakeProcesses::with_running(31337), &config)
        .await
        .expect("state");
    assert_eq!(state, ServiceState::Running(ServiceHandle { pid: 31337 }));

    let state = current_state(
        &LocalFs,
        &FakeProcesses::with_process(31337, "/bin/bash"),
        &config,
    )
    .await
    .expect("state");
    assert_eq!(state, ServiceState::Absent, "live pid running something else");
}

// ── start ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_start_records_pid_and_launches_venv_python() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.install_dir).expect("install dir");
    let processes = FakeProcesses::new();

    let report = start_service(&LocalFs, &processes, &NoopReporter, &config, fast_timings())
        .await
        .expect("start");

    assert_eq!(report.handle, ServiceHandle { pid: 4242 });
    assert_eq!(report.previous, StopOutcome::NotRunning);
    assert!(!report.log_rotated);

    let recorded = std::fs::read_to_string(&config.pid_file).expect("pid file");
    assert_eq!(ServiceHandle::parse(&recorded), Some(report.handle));
    #[cfg(unix)]
    assert_eq!(crate::helpers::file_mode(&config.pid_file), 0o600);

    let spawned = processes.spawned();
    assert_eq!(spawned, vec![launch_command(&config)]);
    assert_eq!(spawned[0].program, config.venv_python());
    assert_eq!(
        spawned[0].args,
        vec!["run_ui.py", "--host", "127.0.0.1", "--port", "7860"]
    );
    assert_eq!(spawned[0].cwd, config.install_dir);

    let log = std::fs::read_to_string(&config.log_file).expect("log");
    assert!(log.contains("starting Agent Zero"), "banner missing: {log}");
}

#[tokio::test]
async fn test_start_replaces_running_instance() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    write_pid_file(&config, "777\n");
    let processes = FakeProcesses::with_running(777);

    let report = start_service(&LocalFs, &processes, &NoopReporter, &config, fast_timings())
        .await
        .expect("start");

    assert_eq!(report.previous, StopOutcome::Terminated);
    assert_eq!(processes.alive(), vec![report.handle.pid]);
}

#[tokio::test]
async fn test_start_detects_process_that_exits_immediately() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.install_dir).expect("install dir");
    let processes = FakeProcesses::new().exiting_on_start();

    let err = start_service(&LocalFs, &processes, &NoopReporter, &config, fast_timings())
        .await
        .expect_err("dead child must fail the start");

    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::ExitedOnStart { log }) if *log == config.log_file
    ));
    assert!(!config.pid_file.exists(), "no pid file for a dead service");
}

#[tokio::test]
async fn test_start_rotates_oversized_log() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.install_dir).expect("install dir");
    let big = std::fs::File::create(&config.log_file).expect("log");
    big.set_len(LOG_ROTATE_BYTES + 1).expect("grow log");
    drop(big);

    let report = start_service(
        &LocalFs,
        &FakeProcesses::new(),
        &NoopReporter,
        &config,
        fast_timings(),
    )
    .await
    .expect("start");

    assert!(report.log_rotated);
    let rotated = config.install_dir.join("agent-zero.log.old");
    assert_eq!(
        std::fs::metadata(&rotated).expect("rotated log").len(),
        LOG_ROTATE_BYTES + 1
    );
    assert!(std::fs::metadata(&config.log_file).expect("new log").len() < 1024);
}
