//! Transport configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SamlError, SamlResult};

/// HTTP transport settings fixed when the transport is built.
///
/// Can be loaded from TOML:
///
/// ```toml
/// verify = true
/// ca_bundle = "/etc/saml/idp-ca.pem"
/// cert_file = "/etc/saml/sp.crt"
/// key_file = "/etc/saml/sp.key"
/// allow_redirects = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Verify the server's TLS certificate.
    #[serde(default = "default_verify")]
    pub verify: bool,

    /// PEM bundle of trusted CA certificates, replacing the built-in roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_bundle: Option<PathBuf>,

    /// PEM client certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_file: Option<PathBuf>,

    /// PEM private key of the client certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,

    /// Follow redirects unless a request says otherwise.
    #[serde(default)]
    pub allow_redirects: bool,
}

fn default_verify() -> bool {
    true
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            verify: default_verify(),
            ca_bundle: None,
            cert_file: None,
            key_file: None,
            allow_redirects: false,
        }
    }
}

impl TransportConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> SamlResult<Self> {
        toml::from_str(text)
            .map_err(|e| SamlError::Config(format!("failed to parse transport config: {e}")))
    }

    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> SamlResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SamlError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Returns the client certificate and key paths, if configured.
    ///
    /// A key without a certificate is rejected.
    pub fn client_identity(&self) -> SamlResult<Option<(&Path, &Path)>> {
        match (self.cert_file.as_deref(), self.key_file.as_deref()) {
            (Some(cert), Some(key)) => Ok(Some((cert, key))),
            (None, Some(key)) => Err(SamlError::Config(format!(
                "key_file {} given without cert_file",
                key.display()
            ))),
            _ => Ok(None),
        }
    }
}
