//! modbench - An HTTP/2 asset server for browser module-loading benchmarks.

mod catalog;
mod cli;
mod config;
mod logger;
mod serve;
mod utils;

use anyhow::{Context, Result};
use catalog::AssetCatalog;
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::ServerConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = ServerConfig::load(&cli)?;
    log_mode(&config);

    let catalog = AssetCatalog::load(&config.build, config.serve.preload).with_context(|| {
        format!(
            "failed to load assets from {}",
            config.build.dist.display()
        )
    })?;

    serve::run(&config, catalog)
}

/// Announce the protocol and delivery strategy before loading.
fn log_mode(config: &ServerConfig) {
    let serve = &config.serve;
    log!("serve"; "running in {} mode", serve.protocol);
    if serve.push_enabled() {
        log!("serve"; "using HTTP/2 push");
    }
    if serve.preload {
        log!("serve"; "using <link rel=preload>");
    }
}
