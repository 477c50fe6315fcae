//! Kiln - a static asset pipeline: ordered rules, transform chains,
//! fingerprinted bundles.

mod asset;
mod cli;
mod config;
mod core;
mod hooks;
mod logger;
mod pipeline;
mod rule;
mod transform;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands, build::build_assets, serve::serve_assets};
use config::BundleConfig;

fn main() -> Result<()> {
    // Ctrl+C before anything blocks
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors detects the TTY
    }

    let config = BundleConfig::load(&cli)?;

    match &cli.command {
        Commands::Build { .. } => build_assets(&config, false).map(|_| ()),
        Commands::Serve { .. } => serve_assets(&cli, &config),
    }
}
