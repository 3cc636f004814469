//! Kitforge CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kitforge::cli::{commands, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render {
            inputs,
            archive,
            output,
            config,
        } => commands::render(&inputs, archive.as_deref(), &output, &config)?,
        Commands::Export {
            inputs,
            output,
            config,
        } => commands::export(&inputs, &output, &config)?,
        Commands::Import {
            archive,
            extract_to,
        } => commands::import(&archive, extract_to.as_deref())?,
        Commands::Inspect { inputs } => commands::inspect(&inputs)?,
    }

    Ok(())
}
