//! CLI entry point for the transfer planner.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use rebalance_transfers::command::{self, CalculateOptions};
use rebalance_transfers::config::Config;

const DEFAULT_CONFIG: &str = "rebalance.toml";

#[derive(Parser)]
#[command(name = "rebalance")]
#[command(about = "Minimal-volume transfers to reach a target portfolio allocation")]
#[command(version)]
struct Cli {
    /// Path to config file [default: rebalance.toml, optional]
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Work with cached Avanza account data
    Avanza {
        /// Username the cache was fetched for (overrides config)
        #[arg(long)]
        username: Option<String>,

        #[command(subcommand)]
        command: AvanzaCommand,
    },

    /// Print version information
    Version,
}

#[derive(Subcommand)]
enum AvanzaCommand {
    /// Calculate transfers that rebalance an account to its monthly savings distribution
    Calculate {
        /// Id of the account to calculate rebalancing transfers for
        #[arg(long)]
        account_id: String,

        /// Print the plan as JSON instead of a report
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path),
        None => Config::load_or_default(Path::new(DEFAULT_CONFIG)),
    };
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Avanza {
            username,
            command: AvanzaCommand::Calculate { account_id, json },
        } => {
            let Some(username) = username.or_else(|| config.cache.username.clone()) else {
                eprintln!("Error: --username is required (or set cache.username in config)");
                process::exit(1);
            };
            let opts = CalculateOptions {
                username,
                account_id,
                json,
            };
            command::calculate(&config, &opts)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(if e.is_planning() { 2 } else { 1 });
    }
}
