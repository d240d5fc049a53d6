//! CLI command definitions for the `mailrag` binary.
//!
//! Uses clap derive macros for argument parsing. Flags that override
//! configuration also read their environment variable (`env` feature), so
//! precedence is flag > environment > config file > built-in default.

pub mod ingest;
pub mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use mailrag_observe::tracing_setup::LogFormat;
use mailrag_types::config::{OnError, StoreBackend};

use crate::settings::Overrides;

/// Retrieval-augmented email summarization.
#[derive(Parser)]
#[command(name = "mailrag", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format.
    #[arg(long, global = true, default_value = "text", value_parser = clap::value_parser!(LogFormat))]
    pub log_format: LogFormat,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// TOML configuration file.
    #[arg(long, global = true, env = "MAILRAG_CONFIG")]
    pub config: Option<PathBuf>,

    /// OpenAI API key.
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, global = true, env = "OPENAI_BASE_URL")]
    pub openai_base_url: Option<String>,

    /// PostgreSQL connection string.
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Store backend (postgres or memory).
    #[arg(long, global = true, env = "MAILRAG_STORE")]
    pub store: Option<StoreBackend>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the summarization HTTP server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Host to bind to.
        #[arg(long)]
        host: Option<String>,

        /// Directory of a built web front-end to serve.
        #[arg(long)]
        web_dir: Option<PathBuf>,
    },

    /// Embed a JSON-lines batch file and store it.
    Ingest {
        /// Batch file to ingest.
        #[arg(env = "DATA_FILE")]
        file: Option<PathBuf>,

        /// What to do when a record fails (abort or skip).
        #[arg(long)]
        on_error: Option<OnError>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

impl Cli {
    /// Configuration overrides taken from flags and environment.
    pub fn overrides(&self) -> Overrides {
        let mut overrides = Overrides {
            config_path: self.config.clone(),
            api_key: self.openai_api_key.clone(),
            openai_base_url: self.openai_base_url.clone(),
            database_url: self.database_url.clone(),
            store_backend: self.store,
            ..Overrides::default()
        };
        match &self.command {
            Commands::Serve {
                port,
                host,
                web_dir,
            } => {
                overrides.port = *port;
                overrides.host = host.clone();
                overrides.web_dir = web_dir.clone();
            }
            Commands::Ingest { file, on_error } => {
                overrides.data_file = file.clone();
                overrides.on_error = *on_error;
            }
            Commands::Completions { .. } => {}
        }
        overrides
    }
}
