//! `agent-zero-install` — install or update Agent Zero and start it.

use std::path::Path;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::environment_check::OS_RELEASE_PATH;
use crate::application::services::install::{InstallSummary, Installer};
use crate::application::services::repository::CheckoutOutcome;
use crate::application::services::runtime_env::VenvOutcome;
use crate::domain::{ProbePolicy, StopOutcome, SupervisorTimings, resolve};
use crate::infra::apt::AptPackageManager;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::fs::LocalFs;
use crate::infra::git::GitClient;
use crate::infra::network::{ReqwestHttpProbe, TcpPortProbe};
use crate::infra::process::SystemProcessControl;
use crate::output::{OutputContext, TerminalReporter};

/// Run the full install sequence against the real system.
///
/// Configuration and secrets are resolved from the environment snapshot
/// before any adapter is built, so a bad environment fails with nothing
/// installed, cloned or written.
///
/// # Errors
///
/// Returns the first configuration, validation, provisioning or service
/// error.
pub async fn run(app: &AppContext) -> Result<()> {
    let (config, secrets) = resolve(&app.env)?;
    tracing::debug!(?config, ?secrets, "resolved configuration");

    let ctx = &app.output;
    ctx.header("Agent Zero installer");

    let commands = TokioCommandRunner::default();
    let packages = AptPackageManager::new(TokioCommandRunner::default());
    let repository = GitClient::new(TokioCommandRunner::default());
    let processes = SystemProcessControl::new(TokioCommandRunner::default());
    let http = ReqwestHttpProbe::new()?;
    let reporter = TerminalReporter::new(ctx);

    let installer = Installer {
        commands: &commands,
        packages: &packages,
        repository: &repository,
        processes: &processes,
        ports: &TcpPortProbe,
        http: &http,
        fs: &LocalFs,
        reporter: &reporter,
        os_release: Path::new(OS_RELEASE_PATH),
        timings: SupervisorTimings::default(),
        probe: ProbePolicy::default(),
    };
    let summary = installer.run(&config, &secrets).await;
    drop(reporter);

    print_summary(ctx, &summary?);
    Ok(())
}

fn print_summary(ctx: &OutputContext, summary: &InstallSummary) {
    println!();
    ctx.header("Agent Zero is running");
    ctx.kv("url", &summary.url);
    ctx.kv("pid", &summary.service.handle.pid.to_string());
    ctx.kv("log", &summary.log_file.display().to_string());
    ctx.kv("config", &summary.config_file.display().to_string());
    ctx.kv("python", &summary.environment.python.to_string());
    println!();

    let checkout = match summary.checkout {
        CheckoutOutcome::Cloned => "fresh clone",
        CheckoutOutcome::Updated => "updated checkout",
    };
    let venv = match summary.venv {
        VenvOutcome::Reused => "reused environment",
        VenvOutcome::Created => "new environment",
        VenvOutcome::Recreated => "rebuilt environment",
    };
    ctx.info(&format!("{checkout}, {venv}"));
    match summary.service.previous {
        StopOutcome::Terminated | StopOutcome::Killed => {
            ctx.info("previous instance was stopped and replaced");
        }
        StopOutcome::StaleHandle => ctx.info("stale pid file from an earlier run was cleared"),
        StopOutcome::NotRunning => {}
    }
    ctx.info(&format!("stop with: kill {}", summary.service.handle.pid));
}
