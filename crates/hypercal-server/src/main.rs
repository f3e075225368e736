use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use hypercal_core::tracing::{TracingConfig, init_tracing};
use hypercal_server::cli::Cli;
use hypercal_server::{ServerConfig, run};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::daemon()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let mut config = ServerConfig::load_or_init(&cli.config);
    if let Some(port) = cli.port {
        config = config.with_port(port);
    }
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "Starting hypercal"
    );

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
