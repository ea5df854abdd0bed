//! Agent Zero installer - one-shot bootstrap of a local Agent Zero instance

use agent_zero_installer::app::AppContext;
use agent_zero_installer::cli::Cli;
use agent_zero_installer::infra::logging::init_tracing;
use clap::Parser;

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let app = AppContext::from_process_env();
    if let Err(e) = cli.run(&app).await {
        app.output.error(&format!("Error: {e:#}"));
        std::process::exit(1);
    }
}
