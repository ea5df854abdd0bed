//! Application service — Agent Zero `.env` generation.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::{LocalFs, ProgressReporter};
use crate::domain::config_file::render_env_file;
use crate::domain::{RuntimeConfig, SecretBundle};

/// Create the workspace directory and replace the `.env` file.
///
/// The file is owner read/write only from the moment it exists; secrets are
/// never logged.
///
/// # Errors
///
/// Returns an error if the directory or the file cannot be written.
pub fn write_config(
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    config: &RuntimeConfig,
    secrets: &SecretBundle,
) -> Result<PathBuf> {
    fs.create_dir_all(&config.workspace_dir)
        .context("creating workspace directory")?;

    let contents = render_env_file(config, secrets);
    fs.write_private_atomic(&config.config_file, &contents)
        .with_context(|| format!("writing {}", config.config_file.display()))?;

    reporter.success(&format!("wrote {}", config.config_file.display()));
    Ok(config.config_file.clone())
}
