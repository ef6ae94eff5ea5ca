//! Boxcutter - headless live HTML previews.

mod cli;

use anyhow::Result;
use boxcutter::PreviewConfig;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    boxcutter::logger::set_verbose(cli.verbose);

    let config = PreviewConfig::load_or_default(&cli.config)?;
    boxcutter::debug!("config"; "{:?}", config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Commands::Replay { steps } => cli::replay::run(config, &steps).await,
            Commands::Watch { file, id } => cli::watch::run(config, &file, id).await,
        }
    })
}
