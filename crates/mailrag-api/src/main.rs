//! mailrag CLI and HTTP API entry point.
//!
//! Binary name: `mailrag`
//!
//! Parses CLI arguments, sets up tracing, resolves configuration once, then
//! dispatches to the ingestion job or starts the summarization server.

mod cli;
mod http;
mod settings;
mod state;

use clap::Parser;
use clap_complete::generate;

use mailrag_observe::tracing_setup::{
    TracingOptions, filter_for_verbosity, init_tracing, shutdown_tracing,
};

use cli::{Cli, Commands};
use settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or configuration
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "mailrag", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(&TracingOptions {
        default_filter: filter_for_verbosity(cli.verbose, cli.quiet).to_string(),
        format: cli.log_format,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(&cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = Settings::resolve(cli.overrides()).await?;

    match &cli.command {
        Commands::Serve { .. } => cli::serve::serve(&settings, cli.json, cli.quiet).await?,
        Commands::Ingest { .. } => {
            cli::ingest::ingest(&settings, cli.json, cli.quiet).await?;
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
