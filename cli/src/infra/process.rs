//! Infrastructure implementation of the `ProcessControl` port.
//!
//! Liveness, command lines and signals go through `ps(1)` and `kill(1)` via a
//! `CommandRunner`, which keeps the crate free of `unsafe` libc calls and lets
//! tests substitute a fake runner.

use std::fs::OpenOptions;
use std::process::Stdio;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, ProcessControl};
use crate::domain::service::is_live_ps_state;
use crate::domain::{LaunchCommand, Signal};

/// Production `ProcessControl` for Unix hosts.
pub struct SystemProcessControl<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> SystemProcessControl<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> ProcessControl for SystemProcessControl<R> {
    async fn is_alive(&self, pid: u32) -> Result<bool> {
        let pid = pid.to_string();
        let output = self.runner.run("ps", &["-o", "stat=", "-p", &pid]).await?;
        if !output.status.success() {
            return Ok(false);
        }
        Ok(is_live_ps_state(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn command_line(&self, pid: u32) -> Result<Option<String>> {
        let pid = pid.to_string();
        let output = self.runner.run("ps", &["-o", "args=", "-p", &pid]).await?;
        if !output.status.success() {
            return Ok(None);
        }
        let args = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!args.is_empty()).then_some(args))
    }

    async fn signal(&self, pid: u32, signal: Signal) -> Result<()> {
        let pid_str = pid.to_string();
        let output = self
            .runner
            .run("kill", &[signal.as_kill_arg(), &pid_str])
            .await?;
        if output.status.success() || !self.is_alive(pid).await? {
            return Ok(());
        }
        anyhow::bail!(
            "cannot send {} to pid {pid}: {}",
            signal.as_kill_arg(),
            String::from_utf8_lossy(&output.stderr).trim()
        )
    }

    #[allow(clippy::zombie_processes)] // detached: the service outlives the installer
    fn spawn_detached(&self, launch: &LaunchCommand) -> Result<u32> {
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&launch.log_file)
            .with_context(|| format!("opening log {}", launch.log_file.display()))?;
        let log_err = log.try_clone().context("duplicating log handle")?;

        let mut cmd = std::process::Command::new(&launch.program);
        cmd.args(&launch.args)
            .current_dir(&launch.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err));

        // Own process group so terminal signals aimed at the installer
        // (Ctrl-C) do not reach the service.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn {}", launch.program.display()))?;
        Ok(child.id())
    }
}
