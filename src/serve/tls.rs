//! TLS material for the HTTP/2 listener.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use thiserror::Error;
use tokio_rustls::rustls::{
    self,
    crypto::ring,
    pki_types::{CertificateDer, PrivateKeyDer, pem::PemObject},
};

use crate::config::ServeConfig;

/// ALPN identifier for HTTP/2 over TLS.
pub const ALPN_H2: &[u8] = b"h2";

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read PEM file `{}`", path.display())]
    Pem {
        path: PathBuf,
        #[source]
        source: rustls::pki_types::pem::Error,
    },

    #[error("no certificates found in `{}`", .0.display())]
    NoCertificates(PathBuf),

    #[error("invalid TLS configuration")]
    Rustls(#[from] rustls::Error),
}

impl TlsError {
    fn pem(path: &Path, source: rustls::pki_types::pem::Error) -> Self {
        Self::Pem {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Read every certificate in a PEM chain.
pub fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let certs = CertificateDer::pem_file_iter(path)
        .map_err(|e| TlsError::pem(path, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TlsError::pem(path, e))?;

    if certs.is_empty() {
        return Err(TlsError::NoCertificates(path.to_path_buf()));
    }
    Ok(certs)
}

/// Read the first private key (PKCS#8, PKCS#1 or SEC1) in a PEM file.
pub fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    PrivateKeyDer::from_pem_file(path).map_err(|e| TlsError::pem(path, e))
}

/// Server config offering only `h2` over ALPN.
pub fn server_config(serve: &ServeConfig) -> Result<Arc<rustls::ServerConfig>, TlsError> {
    let certs = load_certs(&serve.cert)?;
    let key = load_key(&serve.key)?;

    let mut config = rustls::ServerConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![ALPN_H2.to_vec()];

    Ok(Arc::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_cert_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cert.pem");
        let err = load_certs(&path).unwrap_err();
        assert!(matches!(err, TlsError::Pem { .. }));
        assert!(err.to_string().contains("cert.pem"));
    }

    #[test]
    fn test_cert_file_without_certificates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cert.pem");
        fs::write(&path, "not a certificate\n").unwrap();
        assert!(matches!(
            load_certs(&path).unwrap_err(),
            TlsError::NoCertificates(_)
        ));
    }

    #[test]
    fn test_key_file_without_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.pem");
        fs::write(&path, "").unwrap();
        assert!(matches!(load_key(&path).unwrap_err(), TlsError::Pem { .. }));
    }
}
