// TLS acceptor module
// Loads a PEM certificate chain and private key for the TLS listeners

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

use crate::error::StartupError;

/// Build a `TlsAcceptor` from PEM files
///
/// Every failure is fatal for startup: missing files, an empty certificate
/// chain, no usable key or a key that does not match the certificate.
pub fn load_tls_acceptor(cert_path: &str, key_path: &str) -> Result<TlsAcceptor, StartupError> {
    let mut cert_file = BufReader::new(File::open(cert_path).map_err(|e| {
        StartupError::Tls(format!("Failed to open certificate file {cert_path}: {e}"))
    })?);
    let mut key_file = BufReader::new(File::open(key_path).map_err(|e| {
        StartupError::Tls(format!("Failed to open private key file {key_path}: {e}"))
    })?);

    let certs = rustls_pemfile::certs(&mut cert_file)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StartupError::Tls(format!("Failed to read certificate: {e}")))?;
    if certs.is_empty() {
        return Err(StartupError::Tls(format!(
            "No valid certificate found in {cert_path}"
        )));
    }

    let key = rustls_pemfile::private_key(&mut key_file)
        .map_err(|e| StartupError::Tls(format!("Failed to read private key: {e}")))?
        .ok_or_else(|| StartupError::Tls(format!("No valid private key found in {key_path}")))?;

    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| StartupError::Tls(format!("Failed to create TLS config: {e}")))?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(TlsAcceptor::from(Arc::new(config)))
}
