use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use roster_core::config::Config;
use roster_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use roster_core::metrics::init_metrics;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

mod scenario;

use scenario::{Replay, Scenario};

#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(author, version, about = "Replay group membership scenarios", long_about = None)]
struct Args {
    /// Set the log level (trace, debug, info, warn, error), overriding the config
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Configuration file; ROSTER_* environment variables are used otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a TOML scenario to a fresh group and print its events as JSON lines
    Replay {
        /// Scenario file
        script: PathBuf,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::from_env().context("invalid ROSTER_* environment")?,
    };

    if let Some(level) = &args.log_level {
        if LogLevel::from_str(level).is_some() {
            config.logging.level = level.clone();
        } else {
            eprintln!("Invalid log level '{}', using '{}'", level, config.logging.level);
        }
    }
    if args.json_logs {
        config.logging.json_format = true;
    }

    // Logs go to stderr so stdout carries only events
    let log_config = LogConfig::try_from(&config.logging)?;
    init_logging_with_config(log_config)?;

    if config.metrics.enabled {
        init_metrics();
    }

    info!("roster started");

    match args.command {
        Command::Replay { script } => {
            let scenario = Scenario::from_file(&script)?;
            let mut replay = Replay::new(&scenario, &config.group)?;

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let summary = replay.run(&scenario.steps, &mut out)?;
            out.flush()?;

            if summary.failed > 0 {
                warn!(failed = summary.failed, "some steps failed");
            }
            let (members, local, remote) = replay.group().all_members();
            info!(
                members = members.len(),
                local_pending = local.len(),
                remote_pending = remote.len(),
                "final group state"
            );
        }
        Command::Config => {
            let rendered = toml::to_string_pretty(&config)?;
            print!("{}", rendered);
        }
    }

    info!("roster finished");

    Ok(())
}
