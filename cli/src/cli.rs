//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::Parser;

use crate::app::AppContext;
use crate::commands;

/// Install, update and start Agent Zero on this machine
#[derive(Parser)]
#[command(
    name = "agent-zero-install",
    version,
    after_help = "\
Required environment:
  API_KEY_OPENAI, API_KEY_ANTHROPIC, AUTH_LOGIN, AUTH_PASSWORD, RFC_PASSWORD

Optional environment:
  AGENT_ZERO_DIR   install directory (default ~/agent-zero)
  GUI_PORT         web UI port (default 7860)
  API_PORT         API port (default 5005)
  BIND_ADDR        listen address (default 127.0.0.1)
  FORCE_RECREATE   rebuild the virtual environment (1/true/yes/on)
  RUST_LOG         diagnostic log filter (default warn)"
)]
pub struct Cli {}

impl Cli {
    /// Run the install sequence.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error of the run.
    pub async fn run(self, app: &AppContext) -> Result<()> {
        commands::install::run(app).await
    }
}
