mod cli;
mod config;
mod logger;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    logger::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Obfuscate {
            project,
            mapping,
            config,
            packages,
            manifest,
            dry_run,
        } => cli::obfuscate_command(project, mapping, config, packages, manifest, dry_run),
        Commands::Inspect { mapping } => cli::inspect_command(mapping),
    }
}
