// Transport configuration for building the shared reqwest::Client.
//
// TLS mode and timeout are decided once, at client construction; the
// request executor never touches builder settings again. Note there is
// no cookie jar here: the session cookie is owned by SessionState and
// replayed explicitly on each request.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// TLS verification strategy.
#[derive(Debug, Clone, Default)]
pub enum TlsVerification {
    /// Use the system certificate store (strict).
    SystemDefaults,
    /// Trust a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate. Default for self-signed local controllers.
    #[default]
    DangerAcceptInvalid,
}

/// Transport settings shared by every request the client sends.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("unipulse/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsVerification::SystemDefaults => {}
            TlsVerification::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Certificate(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Certificate(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsVerification::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Certificate(format!("failed to build HTTP client: {e}")))
    }
}
