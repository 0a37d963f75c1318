//! Server configuration management for `modbench.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── build.rs       # [build]: dist dir, manifest, root documents
//! ├── serve.rs       # [serve]: listener, protocol, push, preload, TLS
//! ├── error.rs       # ConfigError, ConfigDiagnostics
//! └── mod.rs         # ServerConfig (this file)
//! ```
//!
//! Resolution order: defaults, then the config file (if present), then CLI
//! flags. The result is validated once and never changes afterwards.

mod build;
mod error;
mod serve;

pub use build::{BuildConfig, MANIFEST_FILE};
pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use serve::{Protocol, ServeConfig};

use crate::{cli::Cli, debug, log};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing modbench.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path of the config file that was read, if any (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Listener and delivery settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Build output location
    #[serde(default)]
    pub build: BuildConfig,
}

impl ServerConfig {
    /// Load configuration from CLI arguments.
    ///
    /// A missing config file is not an error: defaults plus CLI flags are
    /// enough to run the benchmark.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = if cli.config.is_file() {
            let mut config = Self::from_path(&cli.config)?;
            config.config_path = Some(cli.config.clone());
            config
        } else {
            debug!("config"; "`{}` not found, using defaults", cli.config.display());
            Self::default()
        };

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply CLI overrides on top of file values.
    fn apply_cli(&mut self, cli: &Cli) {
        Self::update_option(&mut self.build.dist, cli.dist.as_ref());
        if cli.manifest.is_some() {
            self.build.manifest = cli.manifest.clone();
        }

        Self::update_option(&mut self.serve.interface, cli.interface.as_ref());
        Self::update_option(&mut self.serve.port, cli.port.as_ref());
        Self::update_option(&mut self.serve.push, cli.push.as_ref());
        Self::update_option(&mut self.serve.preload, cli.preload.as_ref());
        Self::update_option(&mut self.serve.cert, cli.cert.as_ref());
        Self::update_option(&mut self.serve.key, cli.key.as_ref());

        if cli.http1 {
            self.serve.protocol = Protocol::Http1;
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.serve.validate(&mut diag);
        self.build.validate(&mut diag);

        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ServerConfig {
    let (parsed, ignored) = ServerConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
