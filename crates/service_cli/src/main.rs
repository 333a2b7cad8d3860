//! `neutryx-mc` binary entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use service_cli::commands::{self, run::RunOverrides};
use service_cli::config::{build_config, CliArgs};
use service_cli::{CliError, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sharded Monte Carlo option pricer
#[derive(Parser, Debug)]
#[command(name = "neutryx-mc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (TOML format)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Concurrent shard attempts (0 = CPU count)
    #[arg(long, global = true)]
    worker_threads: Option<usize>,

    /// Attempts per shard including the first
    #[arg(long, global = true)]
    max_attempts: Option<u32>,

    /// Overall orchestration deadline in seconds
    #[arg(long, global = true)]
    deadline_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a simulation request and print the result JSON
    Run {
        /// Path to the request file (JSON)
        #[arg(short, long)]
        request: PathBuf,

        /// Maximum shards in flight (0 = unlimited)
        #[arg(long)]
        max_concurrency: Option<usize>,

        /// Master seed override
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the shard layout of a request without simulating
    Plan {
        /// Path to the request file (JSON)
        #[arg(short, long)]
        request: PathBuf,
    },

    /// Run the reference 200,000-path European call
    Demo,
}

impl From<&Cli> for CliArgs {
    fn from(cli: &Cli) -> Self {
        CliArgs {
            config_file: cli.config.clone(),
            log_level: cli.log_level.clone(),
            worker_threads: cli.worker_threads,
            max_attempts: cli.max_attempts,
            deadline_secs: cli.deadline_secs,
        }
    }
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)
}

fn run(cli: Cli) -> Result<()> {
    let config = build_config(&CliArgs::from(&cli))?;
    init_tracing(config.log_level.as_filter_str());

    tracing::info!(
        log_level = %config.log_level,
        worker_threads = config.engine.resolved_worker_threads(),
        max_attempts = config.engine.max_attempts,
        "neutryx-mc v{}",
        env!("CARGO_PKG_VERSION")
    );

    match cli.command {
        Commands::Plan { request } => print_json(&commands::plan::run(&config, &request)?),
        Commands::Run {
            request,
            max_concurrency,
            seed,
        } => {
            let overrides = RunOverrides {
                max_concurrency,
                seed,
            };
            let report = runtime()?.block_on(commands::run::run(&config, &request, overrides))?;
            print_json(&report)
        }
        Commands::Demo => print_json(&runtime()?.block_on(commands::demo::run(&config))?),
    }
}

fn main() -> anyhow::Result<()> {
    run(Cli::parse())?;
    Ok(())
}
