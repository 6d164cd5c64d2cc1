// Shared transport configuration for building reqwest::Client instances.
//
// The web-panel agent talks plain HTTP to devices on a management LAN;
// there is no TLS layer to configure, only timeouts and identification.

use std::time::Duration;

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout. A device that does not answer within this
    /// bound is treated as unreachable.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("fenceline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| crate::error::Error::Connection {
                reason: format!("failed to build HTTP client: {e}"),
            })
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
