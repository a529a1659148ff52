//! ShadowMesh - strangler-fig migration toolkit
//!
//! # Usage
//!
//! ```bash
//! # Split reads between the monolith and the replica service
//! shadowmesh gateway --config configs/shadowmesh.toml
//!
//! # Register the CDC connector and mirror changes into the replica
//! shadowmesh ingest
//!
//! # Register the connector once and exit
//! shadowmesh register
//!
//! # Serve reads from the replica store
//! shadowmesh replica --port 5001
//! ```

mod cmd;

use std::fs::OpenOptions;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shadowmesh_config::{LogConfig, LogFormat, LogOutput};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// ShadowMesh - strangler-fig migration toolkit
#[derive(Parser, Debug)]
#[command(name = "shadowmesh")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level or filter directive. Overrides RUST_LOG and the config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the read gateway
    Gateway(cmd::gateway::GatewayArgs),

    /// Register the CDC connector and run the ingestion pipeline
    Ingest(cmd::ingest::IngestArgs),

    /// Register the CDC connector (or show its status) and exit
    Register(cmd::register::RegisterArgs),

    /// Serve product, review and analytics reads from the replica store
    Replica(cmd::replica::ReplicaArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = cmd::load_config(cli.config.as_deref())?;
    init_logging(&config.log, cli.log_level.as_deref())?;

    match cli.command {
        Command::Gateway(args) => cmd::gateway::run(args, config).await,
        Command::Ingest(args) => cmd::ingest::run(args, config).await,
        Command::Register(args) => cmd::register::run(args, config).await,
        Command::Replica(args) => cmd::replica::run(args, config).await,
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(config: &LogConfig, cli_level: Option<&str>) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let directive = config.filter_directive(cli_level, rust_log.as_deref());
    let filter = EnvFilter::try_new(&directive)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let ansi = config.output.is_terminal();
    let writer = match &config.output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path))?;
            BoxMakeWriter::new(Arc::new(file))
        }
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Console => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).with(filter).init();

    Ok(())
}
