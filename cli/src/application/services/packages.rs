//! Application service — Python dependency installation.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Runs the virtual environment's own interpreter, which is what activating it
//! would put first on PATH.

use std::process::Output;

use anyhow::Result;

use crate::application::ports::{CommandRunner, LONG_RUNNING_TIMEOUT, LocalFs, ProgressReporter};
use crate::domain::error::output_tail;
use crate::domain::{ProvisionError, RuntimeConfig};

/// Dependency declaration file at the checkout root.
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// What `install_packages` did beyond upgrading the tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackagesReport {
    /// `requirements.txt` was found and installed.
    pub requirements_installed: bool,
    /// Playwright was present and its Chromium backend was provisioned.
    pub browser_provisioned: bool,
}

/// Upgrade pip tooling, install `requirements.txt`, and provision Playwright.
///
/// Output is captured; only the tail of a failing step is surfaced.
///
/// # Errors
///
/// Returns [`ProvisionError::Pip`] for the first failing step.
pub async fn install_packages(
    cmd_runner: &impl CommandRunner,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    config: &RuntimeConfig,
) -> Result<PackagesReport> {
    let python = config.venv_python();
    let python = python.to_string_lossy();

    reporter.step("upgrading pip...");
    run_step(
        cmd_runner,
        &python,
        &["-m", "pip", "install", "-q", "--upgrade", "pip", "setuptools", "wheel"],
        "Upgrading pip",
    )
    .await?;

    let requirements = config.install_dir.join(REQUIREMENTS_FILE);
    let requirements_installed = if fs.exists(&requirements) {
        reporter.step("installing Python dependencies (this can take a while)...");
        let req = requirements.to_string_lossy();
        run_step(
            cmd_runner,
            &python,
            &["-m", "pip", "install", "-q", "-r", &req],
            "Installing requirements.txt",
        )
        .await?;
        true
    } else {
        reporter.warn(&format!(
            "{} not found, skipping dependency install",
            requirements.display()
        ));
        false
    };

    let has_playwright = cmd_runner
        .run(&python, &["-m", "pip", "show", "-q", "playwright"])
        .await
        .is_ok_and(|o| o.status.success());
    if has_playwright {
        reporter.step("installing Playwright browser...");
        run_step(
            cmd_runner,
            &python,
            &["-m", "playwright", "install", "chromium"],
            "Installing Playwright Chromium",
        )
        .await?;
    }

    reporter.success("Python dependencies installed");
    Ok(PackagesReport {
        requirements_installed,
        browser_provisioned: has_playwright,
    })
}

async fn run_step(
    cmd_runner: &impl CommandRunner,
    program: &str,
    args: &[&str],
    step: &'static str,
) -> Result<Output> {
    let output = cmd_runner
        .run_with_timeout(program, args, LONG_RUNNING_TIMEOUT)
        .await?;
    if output.status.success() {
        return Ok(output);
    }
    let detail = if output.stderr.is_empty() {
        output_tail(&output.stdout, 20)
    } else {
        output_tail(&output.stderr, 20)
    };
    Err(ProvisionError::Pip { step, detail }.into())
}
