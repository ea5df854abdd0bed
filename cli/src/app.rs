//! Application context — the state shared by the command handler.
//!
//! `AppContext` is built once in `main` from a snapshot of the process
//! environment, so everything downstream reads configuration from one
//! immutable map instead of calling `std::env` itself.

use crate::domain::EnvMap;
use crate::output::OutputContext;

/// Unified application context passed to the command handler.
pub struct AppContext {
    /// Terminal output context (colors, TTY detection).
    pub output: OutputContext,
    /// Environment snapshot taken at startup.
    pub env: EnvMap,
}

impl AppContext {
    /// Build a context from an explicit environment map.
    ///
    /// Colors are disabled when `NO_COLOR` is set to a non-empty value.
    #[must_use]
    pub fn new(env: EnvMap) -> Self {
        let no_color = env.get("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self {
            output: OutputContext::new(no_color),
            env,
        }
    }

    /// Build a context from the current process environment.
    #[must_use]
    pub fn from_process_env() -> Self {
        Self::new(env_snapshot())
    }
}

/// Capture the process environment as an [`EnvMap`].
///
/// Variables that are not valid UTF-8 are skipped. When `HOME` is unset it is
/// filled in from the platform's notion of the home directory.
#[must_use]
pub fn env_snapshot() -> EnvMap {
    let mut env: EnvMap = std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect();
    if !env.contains_key("HOME")
        && let Some(home) = dirs::home_dir().and_then(|h| h.to_str().map(str::to_owned))
    {
        env.insert("HOME".to_string(), home);
    }
    env
}
