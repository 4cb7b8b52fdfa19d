// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolver configuration, loaded from TOML.
//!
//! ```toml
//! sources = ["transport", "header"]
//! header_name = "x-ssl-client-cert"
//! anonymous_common_name = "anonymous"
//! ```
//!
//! Every key is optional; missing keys take the defaults shown above.

use std::path::{Path, PathBuf};

use http::header::{HeaderName, InvalidHeaderName};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_HEADER_NAME: &str = "x-ssl-client-cert";
pub const DEFAULT_ANONYMOUS_COMMON_NAME: &str = "anonymous";

/// Where the resolver looks for a client certificate chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainSourceKind {
    /// Peer certificates attached to the request by the TLS acceptor.
    Transport,
    /// Base64 chain forwarded by a TLS-terminating proxy in a request header.
    Header,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    /// Chain sources, consulted in order; the first one present wins.
    pub sources: Vec<ChainSourceKind>,
    pub header_name: String,
    /// Common name treated as "no certificate" by `X509Identity::has_cert`.
    pub anonymous_common_name: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            sources: vec![ChainSourceKind::Transport, ChainSourceKind::Header],
            header_name: DEFAULT_HEADER_NAME.to_string(),
            anonymous_common_name: DEFAULT_ANONYMOUS_COMMON_NAME.to_string(),
        }
    }
}

impl IdentityConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        self.header_name()?;
        Ok(())
    }

    /// The configured header name, parsed for use with `http`.
    pub fn header_name(&self) -> Result<HeaderName, ConfigError> {
        HeaderName::from_bytes(self.header_name.as_bytes()).map_err(|source| {
            ConfigError::InvalidHeaderName {
                name: self.header_name.clone(),
                source,
            }
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("at least one chain source must be configured")]
    NoSources,

    #[error("invalid header name {name:?}: {source}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: InvalidHeaderName,
    },
}
