mod commands;

use clap::Parser;
use mnemos::errors::Error;
use mnemos::output::{print_json, ErrorResponse};
use mnemos::{embedding, Config, MemoryStore};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Commands;

/// mnemos - A small semantic memory store
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Config file (default: $XDG_CONFIG_HOME/mnemos/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays parseable in --json mode.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mnemos=warn")),
        )
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            if cli.json {
                print_json(&ErrorResponse {
                    error: e.to_string(),
                });
            } else {
                eprintln!("Error: {}", e);
            }
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, Error> {
    if !cli.command.needs_store() {
        return commands::handle_version(cli.json);
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.ensure_directories()?;

    let embedder = embedding::from_config(&config)?;
    let mut store = MemoryStore::open(&config.database_path, embedder)?;

    commands::execute(&cli.command, &mut store, &config, cli.json)
}
