//! # actorflow CLI
//!
//! Runs, checks and converts flow files and documents the available actor and
//! condition classes.
//!
//! ## Usage
//!
//! ```bash
//! # Execute a flow, Ctrl-C stops it cooperatively
//! actorflow run counting.yaml
//!
//! # Validate a flow without running it
//! actorflow check counting.yaml
//!
//! # Show the registered classes and the options of one of them
//! actorflow list sources
//! actorflow help sources.ForLoop
//!
//! # Re-serialize a flow
//! actorflow convert counting.json counting.yaml
//! ```
//!
//! Flow names without a path are looked up in the `flows_dir` configured in
//! `config.yaml`. The log filter comes from the same file unless `RUST_LOG`
//! is set.

use actorflow::{
    cli::{Cli, Commands, commands},
    config::Settings
};
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)))
        .with(fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Run { file } => commands::handle_run_command(&file, &settings),
        Commands::Check { file } => commands::handle_check_command(&file, &settings),
        Commands::List { filter } => commands::handle_list_command(filter.as_deref()),
        Commands::Help { class } => commands::handle_help_command(&class),
        Commands::Convert { input, output, all } => commands::handle_convert_command(&input, &output, all, &settings)
    }
}
