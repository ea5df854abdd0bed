//! Runtime configuration and secret resolution.
//!
//! Pure functions only — no I/O, no async, no filesystem access. The process
//! environment is passed in as an [`EnvMap`] so resolution is a function of
//! its input alone.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::domain::error::{ConfigError, SecretProblem, SecretsError};

// ── Constants ────────────────────────────────────────────────────────────────

/// Snapshot of environment variables, keyed by name.
pub type EnvMap = BTreeMap<String, String>;

pub const ENV_INSTALL_DIR: &str = "AGENT_ZERO_DIR";
pub const ENV_GUI_PORT: &str = "GUI_PORT";
pub const ENV_API_PORT: &str = "API_PORT";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_FORCE_RECREATE: &str = "FORCE_RECREATE";

pub const DEFAULT_INSTALL_DIR_NAME: &str = "agent-zero";
pub const DEFAULT_GUI_PORT: u16 = 7860;
pub const DEFAULT_API_PORT: u16 = 5005;
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Secrets that must be exported before the installer will touch the host.
pub const REQUIRED_SECRETS: &[&str] = &[
    "API_KEY_OPENAI",
    "API_KEY_ANTHROPIC",
    "AUTH_LOGIN",
    "AUTH_PASSWORD",
    "RFC_PASSWORD",
];

/// Values copied from sample `.env` files that must never reach a real config.
pub const PLACEHOLDER_MARKERS: &[&str] = &[
    "changeme",
    "change_me",
    "your_api_key_here",
    "your-api-key",
    "placeholder",
    "dummy",
    "xxx",
    "todo",
    "<secret>",
];

// ── RuntimeConfig ────────────────────────────────────────────────────────────

/// Every path, port and flag the installer needs, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Checkout root, e.g. `~/agent-zero`.
    pub install_dir: PathBuf,
    /// Agent working directory inside the checkout.
    pub workspace_dir: PathBuf,
    /// Python virtual environment.
    pub venv_dir: PathBuf,
    /// Generated `.env` file read by Agent Zero.
    pub config_file: PathBuf,
    /// Service stdout/stderr log.
    pub log_file: PathBuf,
    /// Process-id file of the running service.
    pub pid_file: PathBuf,
    /// Web UI port.
    pub gui_port: u16,
    /// API port.
    pub api_port: u16,
    /// Address the web UI binds to.
    pub bind_addr: String,
    /// Discard and rebuild the virtual environment.
    pub force_recreate: bool,
}

impl RuntimeConfig {
    /// Build the configuration from an environment snapshot.
    ///
    /// Unset or empty optional variables fall back to their defaults. `HOME`
    /// is read from the same map to expand `~` and to build the default
    /// install directory.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a port is not a number in `1..=65535`,
    /// both ports are equal, the bind address is malformed, or no home
    /// directory is known when one is needed.
    pub fn from_env(env: &EnvMap) -> Result<Self, ConfigError> {
        let home = lookup(env, "HOME").map(PathBuf::from);

        let install_dir = match lookup(env, ENV_INSTALL_DIR) {
            Some(raw) => expand_home(raw, home.as_deref())?,
            None => home
                .as_deref()
                .ok_or(ConfigError::NoHomeDir)?
                .join(DEFAULT_INSTALL_DIR_NAME),
        };

        let gui_port = parse_port(env, ENV_GUI_PORT, DEFAULT_GUI_PORT)?;
        let api_port = parse_port(env, ENV_API_PORT, DEFAULT_API_PORT)?;
        if gui_port == api_port {
            return Err(ConfigError::PortClash { port: gui_port });
        }

        let bind_addr = lookup(env, ENV_BIND_ADDR).unwrap_or(DEFAULT_BIND_ADDR);
        if bind_addr.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidBindAddress {
                var: ENV_BIND_ADDR,
                value: bind_addr.to_string(),
            });
        }

        let force_recreate = lookup(env, ENV_FORCE_RECREATE).is_some_and(parse_flag);

        Ok(Self {
            workspace_dir: install_dir.join("work_dir"),
            venv_dir: install_dir.join(".venv"),
            config_file: install_dir.join(".env"),
            log_file: install_dir.join("agent-zero.log"),
            pid_file: install_dir.join("agent-zero.pid"),
            install_dir,
            gui_port,
            api_port,
            bind_addr: bind_addr.to_string(),
            force_recreate,
        })
    }

    /// Python interpreter inside the virtual environment.
    #[must_use]
    pub fn venv_python(&self) -> PathBuf {
        self.venv_dir.join("bin").join("python")
    }

    /// Host used to reach the web UI from this machine.
    ///
    /// Wildcard bind addresses are not connectable, so they map to loopback.
    #[must_use]
    pub fn probe_host(&self) -> &str {
        match self.bind_addr.as_str() {
            "0.0.0.0" => "127.0.0.1",
            "::" | "[::]" => "[::1]",
            other => other,
        }
    }

    /// Root URL of the web UI.
    #[must_use]
    pub fn gui_url(&self) -> String {
        let host = self.probe_host();
        if host.contains(':') && !host.starts_with('[') {
            format!("http://[{host}]:{}", self.gui_port)
        } else {
            format!("http://{host}:{}", self.gui_port)
        }
    }
}

// ── SecretBundle ─────────────────────────────────────────────────────────────

/// The validated set of required secrets.
///
/// Values are only reachable through [`SecretBundle::iter`]; `Debug` prints
/// names with redacted values so the bundle is safe to log.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretBundle {
    entries: Vec<(&'static str, String)>,
}

impl SecretBundle {
    /// Collect and validate [`REQUIRED_SECRETS`] from an environment snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`SecretsError`] listing every secret that is unset, empty,
    /// or set to a placeholder marker.
    pub fn from_env(env: &EnvMap) -> Result<Self, SecretsError> {
        let mut entries = Vec::with_capacity(REQUIRED_SECRETS.len());
        let mut problems = Vec::new();

        for &name in REQUIRED_SECRETS {
            match lookup(env, name) {
                None => problems.push((name, SecretProblem::Missing)),
                Some(value) if is_placeholder(value) => {
                    problems.push((name, SecretProblem::Placeholder));
                }
                Some(value) => entries.push((name, value.to_string())),
            }
        }

        if problems.is_empty() {
            Ok(Self { entries })
        } else {
            Err(SecretsError { problems })
        }
    }

    /// `(name, value)` pairs in [`REQUIRED_SECRETS`] order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl fmt::Debug for SecretBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, _)| (k, "<redacted>")))
            .finish()
    }
}

// ── Resolution ───────────────────────────────────────────────────────────────

/// Resolve the configuration and the secrets from one environment snapshot.
///
/// Configuration errors are reported before secret errors. The error keeps
/// its typed source ([`ConfigError`] or [`SecretsError`]) for downcasting.
///
/// # Errors
///
/// Returns the first configuration error, or every unusable secret at once.
pub fn resolve(env: &EnvMap) -> anyhow::Result<(RuntimeConfig, SecretBundle)> {
    let config = RuntimeConfig::from_env(env)?;
    let secrets = SecretBundle::from_env(env)?;
    Ok((config, secrets))
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Returns `true` when `value` matches a placeholder marker (trimmed, case-insensitive).
#[must_use]
pub fn is_placeholder(value: &str) -> bool {
    let v = value.trim().to_ascii_lowercase();
    PLACEHOLDER_MARKERS.iter().any(|m| v == *m)
}

/// Parses a boolean-like flag: `1`, `true`, `yes`, `on` (case-insensitive).
#[must_use]
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Non-empty, trimmed value of `key`.
fn lookup<'a>(env: &'a EnvMap, key: &str) -> Option<&'a str> {
    env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_port(env: &EnvMap, var: &'static str, default: u16) -> Result<u16, ConfigError> {
    let Some(raw) = lookup(env, var) else {
        return Ok(default);
    };
    match raw.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort {
            var,
            value: raw.to_string(),
        }),
    }
}

fn expand_home(raw: &str, home: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if raw == "~" {
        return home.map(Path::to_path_buf).ok_or(ConfigError::NoHomeDir);
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        return home
            .map(|h| h.join(rest))
            .ok_or(ConfigError::NoHomeDir);
    }
    Ok(PathBuf::from(raw))
}

// ── Unit tests ───────────────────────────────────────────────────────────────
