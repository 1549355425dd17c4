//! isstrack CLI - Command-line interface
//!
//! Live ISS tracking from the terminal plus one-shot position, place-name and
//! pass lookups.

mod commands;
mod console;
mod error;
mod runner;

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::track::TrackArgs;
use error::CliError;
use runner::ObserverArgs;

#[derive(Parser)]
#[command(name = "isstrack")]
#[command(version = isstrack::VERSION)]
#[command(about = "Live International Space Station tracking", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.isstrack/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Observer location flags shared by several commands.
#[derive(Debug, clap::Args)]
struct ObserverFlags {
    /// Observer latitude in degrees (overrides config)
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Observer longitude in degrees (overrides config)
    #[arg(long, allow_hyphen_values = true)]
    lng: Option<f64>,
}

impl From<ObserverFlags> for ObserverArgs {
    fn from(flags: ObserverFlags) -> Self {
        ObserverArgs {
            lat: flags.lat,
            lng: flags.lng,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Track the ISS live, printing snapshots and camera moves
    Track {
        #[command(flatten)]
        observer: ObserverFlags,

        /// Stop after this many seconds instead of waiting for Ctrl+C
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Print the current ISS position once
    Position,

    /// Resolve the observer's place name
    Locate {
        #[command(flatten)]
        observer: ObserverFlags,
    },

    /// Predict the next pass over the observer
    Pass {
        #[command(flatten)]
        observer: ObserverFlags,
    },

    /// Manage configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = run(cli);

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Track { observer, duration } => commands::track::run(TrackArgs {
            config: cli.config,
            observer: observer.into(),
            duration: duration.map(Duration::from_secs),
        }),
        Commands::Position => commands::lookup::run_position(cli.config),
        Commands::Locate { observer } => commands::lookup::run_locate(cli.config, observer.into()),
        Commands::Pass { observer } => commands::lookup::run_pass(cli.config, observer.into()),
        Commands::Config { command } => commands::config::run(command, cli.config),
    }
}
