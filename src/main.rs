//! LGP CLI - train and inspect linear genetic programs.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// LGP - linear genetic programming
#[derive(Parser, Debug)]
#[command(name = "lgp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log per-generation progress (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the default configuration as JSON
    Config,

    /// Validate a configuration file
    Validate {
        /// Configuration file (JSON)
        #[arg(required = true)]
        config: std::path::PathBuf,
    },

    /// Evolve programs on a dataset
    Train(cli::train::TrainArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = if verbose {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let result = match args.command {
        Commands::Config => cli::config::print_default(),
        Commands::Validate { config } => cli::config::validate(config),
        Commands::Train(train) => cli::train::execute(train),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
