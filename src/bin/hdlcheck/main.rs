//! hdlcheck CLI - Uniform front end for HDL compilers and linters

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

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
    let filter = if cli.verbose {
        EnvFilter::new("hdlcheck=debug")
    } else {
        EnvFilter::new("hdlcheck=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Build(args) => commands::build::execute(args, cli.no_color),
        Commands::Builders(args) => commands::builders::execute(args, cli.no_color),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
