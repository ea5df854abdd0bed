//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors raised while resolving the runtime configuration from the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a port number between 1 and 65535, got '{value}'")]
    InvalidPort { var: &'static str, value: String },

    #[error("GUI_PORT and API_PORT must differ, both are {port}")]
    PortClash { port: u16 },

    #[error("{var} must not contain whitespace, got '{value}'")]
    InvalidBindAddress { var: &'static str, value: String },

    #[error("Cannot determine home directory. Set AGENT_ZERO_DIR to an absolute path.")]
    NoHomeDir,
}

// ── Secret errors ─────────────────────────────────────────────────────────────

/// Why a required secret was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretProblem {
    /// Variable is unset or empty.
    Missing,
    /// Variable holds a known placeholder value.
    Placeholder,
}

/// One or more required secrets are unusable.
///
/// Carries every offending variable name so the operator can fix them all in
/// one pass.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{}", describe_secrets(.problems))]
pub struct SecretsError {
    /// Offending variable names with the reason each was rejected.
    pub problems: Vec<(&'static str, SecretProblem)>,
}

impl SecretsError {
    /// Names rejected for the given reason, in declaration order.
    #[must_use]
    pub fn names(&self, problem: SecretProblem) -> Vec<&'static str> {
        self.problems
            .iter()
            .filter(|(_, p)| *p == problem)
            .map(|(name, _)| *name)
            .collect()
    }
}

fn describe_secrets(problems: &[(&'static str, SecretProblem)]) -> String {
    let missing: Vec<&str> = problems
        .iter()
        .filter(|(_, p)| *p == SecretProblem::Missing)
        .map(|(n, _)| *n)
        .collect();
    let placeholder: Vec<&str> = problems
        .iter()
        .filter(|(_, p)| *p == SecretProblem::Placeholder)
        .map(|(n, _)| *n)
        .collect();

    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing: {}", missing.join(", ")));
    }
    if !placeholder.is_empty() {
        parts.push(format!("placeholder value: {}", placeholder.join(", ")));
    }
    format!(
        "Required secrets are not set ({}). Export them before running the installer.",
        parts.join("; ")
    )
}

// ── Environment errors ────────────────────────────────────────────────────────

/// Host prerequisite violations found by the environment validator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvironmentError {
    #[error("python3 not found on PATH. Install Python {required} or newer.")]
    PythonMissing { required: String },

    #[error("Python {found} is too old (need ≥ {required}). Install a newer python3.")]
    PythonTooOld { found: String, required: String },

    #[error("Port {port} is already in use by another process. Set {var} to a free port and re-run.")]
    PortInUse { port: u16, var: &'static str },

    #[error(
        "Low disk space on {}: {available_mib} MiB available, need {required_mib} MiB.",
        .path.display()
    )]
    InsufficientDisk {
        path: PathBuf,
        available_mib: u64,
        required_mib: u64,
    },
}

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Failures of the mutating setup steps (packages, clone, venv, pip).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProvisionError {
    #[error("Package installation failed for: {packages}\n{detail}")]
    PackageInstall { packages: String, detail: String },

    #[error("Cloning {url} failed\n{detail}")]
    Clone { url: String, detail: String },

    #[error(
        "Local checkout at {} has diverged from upstream and cannot be fast-forwarded. \
         Resolve it manually (git -C {} status) and re-run.",
        .path.display(),
        .path.display()
    )]
    NotFastForward { path: PathBuf },

    #[error("Updating {} failed\n{detail}", .path.display())]
    Update { path: PathBuf, detail: String },

    #[error(
        "{} exists but is not a git checkout. Move it aside or set AGENT_ZERO_DIR elsewhere.",
        .path.display()
    )]
    InstallDirOccupied { path: PathBuf },

    #[error("Creating virtual environment at {} failed\n{detail}", .path.display())]
    Venv { path: PathBuf, detail: String },

    #[error("{step} failed\n{detail}")]
    Pip { step: &'static str, detail: String },
}

// ── Service errors ────────────────────────────────────────────────────────────

/// Failures launching or health-checking the Agent Zero service.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Agent Zero exited right after launch. Check the log: {}", .log.display())]
    ExitedOnStart { log: PathBuf },

    #[error("Agent Zero (pid {pid}) crashed while starting up. Check the log: {}", .log.display())]
    Crashed { pid: u32, log: PathBuf },

    #[error(
        "Agent Zero did not answer on {url} after {attempts} attempts. Check the log: {}",
        .log.display()
    )]
    HealthTimeout {
        url: String,
        attempts: u32,
        log: PathBuf,
    },
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Last `max_lines` non-empty lines of captured command output.
///
/// Used to attach a short diagnostic to failures without dumping the whole
/// installer log.
#[must_use]
pub fn output_tail(bytes: &[u8], max_lines: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
