//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::{net::IpAddr, path::PathBuf};

/// HTTP/2 push and preload benchmark server for browser module loading
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (optional; defaults apply when it does not exist)
    #[arg(short = 'C', long, default_value = "modbench.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Build output directory containing the projects and root documents
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub dist: Option<PathBuf>,

    /// Manifest listing each project's module files (default: <dist>/filelist.json)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub manifest: Option<PathBuf>,

    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<IpAddr>,

    /// Port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Serve plain-text HTTP/1.1 instead of HTTP/2 over TLS
    #[arg(long)]
    pub http1: bool,

    /// Use HTTP/2 push to push dependencies with the JS entry point
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub push: Option<bool>,

    /// Add <link rel="preload"> to HTML for all JS dependencies
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub preload: Option<bool>,

    /// TLS certificate chain (PEM)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub cert: Option<PathBuf>,

    /// TLS private key (PEM)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub key: Option<PathBuf>,

    /// Log every request and push
    #[arg(short, long)]
    pub verbose: bool,
}
