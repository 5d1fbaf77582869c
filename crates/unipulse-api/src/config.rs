// ── Runtime connection configuration ──
//
// Describes *how* to reach a controller. Carries credential data and
// transport tuning, but never touches disk -- the unipulse-config crate
// constructs a `ControllerConfig` from profiles and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::transport::TlsVerification;

/// Configuration for connecting to a single controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller base URL (e.g., `https://192.168.1.1:8443`).
    pub url: Url,
    /// Login username.
    pub username: String,
    /// Login password.
    pub password: SecretString,
    /// Site to operate on (defaults to "default").
    pub site: String,
    /// Ask the controller for a long-lived session at login.
    pub remember: bool,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            url: "https://192.168.1.1:8443"
                .parse()
                .expect("default controller URL is valid"),
            username: "admin".into(),
            password: SecretString::from(String::new()),
            site: "default".into(),
            remember: true,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }
}
