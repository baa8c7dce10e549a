//! bootstage CLI - staged bootstrap build orchestrator

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, RunArgs};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.global.verbose {
        EnvFilter::new("bootstage=debug")
    } else if cli.global.quiet {
        EnvFilter::new("bootstage=warn")
    } else {
        EnvFilter::new("bootstage=info")
    };

    // stdout is reserved for JSON events and listings.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Some(Commands::Run(args)) => commands::run::execute(&cli.global, args),
        Some(Commands::Clean) => commands::clean::execute(&cli.global),
        Some(Commands::Buildinfo) => commands::buildinfo::execute(&cli.global),
        Some(Commands::List) => commands::list::execute(&cli.global),
        None => commands::run::execute(&cli.global, RunArgs::default()),
    }
}
