// Access URL - the address a particular client used to reach the server

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::{Host, Url};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessUrlError {
    #[error("Invalid access URL {0:?}: {1}")]
    Invalid(String, url::ParseError),
    #[error("Unsupported access URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("Access URL has no host: {0}")]
    MissingHost(String),
}

/// A parsed client access address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessUrl {
    scheme: String,
    host: String,
    port: u16,
}

impl AccessUrl {
    /// Parse an absolute `http` or `https` URL. A missing port falls back to
    /// the scheme default.
    pub fn parse(text: &str) -> Result<Self, AccessUrlError> {
        let url = Url::parse(text).map_err(|e| AccessUrlError::Invalid(text.to_string(), e))?;
        Self::from_url(&url)
    }

    pub fn from_url(url: &Url) -> Result<Self, AccessUrlError> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(AccessUrlError::UnsupportedScheme(scheme.to_string()));
        }

        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => return Err(AccessUrlError::MissingHost(url.to_string())),
        };
        if host.is_empty() {
            return Err(AccessUrlError::MissingHost(url.to_string()));
        }

        let port = url
            .port_or_known_default()
            .unwrap_or(if scheme == "https" { 443 } else { 80 });

        Ok(Self {
            scheme: scheme.to_string(),
            host,
            port,
        })
    }

    /// Build directly from parts. Used where the address was already split.
    pub fn from_parts(scheme: &str, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.to_string(),
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Relays reached through a plain-HTTP access URL must be dialed
    /// without TLS.
    pub fn force_http(&self) -> bool {
        self.scheme == "http"
    }
}

impl fmt::Display for AccessUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}://[{}]:{}", self.scheme, self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
        }
    }
}

impl FromStr for AccessUrl {
    type Err = AccessUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
