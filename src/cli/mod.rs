pub mod config;
pub mod generate;
pub mod stdlib;

use crate::errors::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "reqpin",
    version,
    about = "Pin the third-party imports of Python sources into requirements.txt"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Pin the imports of a single source file
    File(generate::GenerateArgs),
    /// Pin the imports of every source file under a directory
    Dir(generate::GenerateArgs),
    /// List the standard-library module names that are never pinned
    Stdlib(stdlib::StdlibArgs),
    /// Inspect resolved configuration
    Config(config::ConfigArgs),
}

/// Dispatch to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::File(args) => generate::run(&args, generate::Workflow::File),
        Commands::Dir(args) => generate::run(&args, generate::Workflow::Directory),
        Commands::Stdlib(args) => stdlib::run(&args),
        Commands::Config(args) => config::run(&args),
    }
}
