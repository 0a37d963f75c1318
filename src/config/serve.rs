//! `[serve]` section configuration.
//!
//! Contains listener, protocol and delivery-strategy settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 44333                # Listening port number
//! protocol = "h2"             # "h2" or "http1"
//! push = false                # HTTP/2 push of entry point dependencies
//! preload = false             # <link rel="preload"> hints in unbundled HTML
//! cert = "cert.pem"           # TLS certificate chain (PEM), h2 only
//! key = "key.pem"             # TLS private key (PEM), h2 only
//! ```

use std::{
    fmt,
    net::{IpAddr, Ipv4Addr},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};

use super::ConfigDiagnostics;

/// Transport protocol floor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// HTTP/2 over TLS, negotiated with ALPN `h2`.
    #[default]
    H2,
    /// Plain-text HTTP/1.1, no TLS.
    Http1,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::H2 => f.write_str("HTTP/2"),
            Self::Http1 => f.write_str("HTTP/1.1"),
        }
    }
}

/// Server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    pub interface: IpAddr,

    /// Listening port number.
    pub port: u16,

    /// Protocol floor.
    pub protocol: Protocol,

    /// Push the entry point's dependencies along with it.
    pub push: bool,

    /// Inject preload hints into unbundled markup.
    pub preload: bool,

    /// TLS certificate chain. Unused by HTTP/1.1.
    pub cert: PathBuf,

    /// TLS private key. Unused by HTTP/1.1.
    pub key: PathBuf,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 44333,
            protocol: Protocol::H2,
            push: false,
            preload: false,
            cert: PathBuf::from("cert.pem"),
            key: PathBuf::from("key.pem"),
        }
    }
}

impl ServeConfig {
    /// Whether pushes are actually attempted. Push has no HTTP/1.1 equivalent.
    pub fn push_enabled(&self) -> bool {
        self.push && self.protocol == Protocol::H2
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.port == 0 {
            diag.error("serve.port", "port must be between 1 and 65535");
        }

        if self.protocol == Protocol::H2 {
            self.validate_tls_material(diag);
        }

        if self.push && self.protocol == Protocol::Http1 {
            diag.warn("serve.push", "no push support on HTTP/1.1, push disabled");
        }
    }

    /// HTTP/1.1 is served in plain text and needs neither file.
    fn validate_tls_material(&self, diag: &mut ConfigDiagnostics) {
        for (field, path) in [("serve.cert", &self.cert), ("serve.key", &self.key)] {
            if !path.is_file() {
                diag.error_with_hint(
                    field,
                    format!("`{}` not found", path.display()),
                    "generate a self-signed pair with `openssl req -x509 -newkey rsa:2048 -nodes -keyout key.pem -out cert.pem -subj /CN=localhost`",
                );
            }
        }
    }
}
