// One-shot authenticated HTTP fetcher for the web control panel.
//
// No retries and no redirect following at this layer: the agent decides
// whether a non-200 page is fatal, and the single dialect-resolution
// redirect hop is handled there too.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};
use crate::transport::TransportConfig;

/// One fetched control-panel page.
///
/// A non-200 exchange still produces a `Page` — the status code plus the
/// server's reason text — so callers can branch on the discriminant
/// instead of catching transport errors. Only connection-level failures
/// (DNS, refused, timeout) surface as [`Error::Connection`].
#[derive(Debug, Clone)]
pub struct Page {
    /// HTTP status code of the exchange.
    pub status: u16,
    /// Trimmed response body on success, reason text otherwise.
    pub body: String,
}

impl Page {
    /// Whether the exchange completed with HTTP 200.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Convert a failed exchange into the matching error.
    pub fn into_http_error(self) -> Error {
        Error::Http {
            status: self.status,
            reason: self.body,
        }
    }
}

/// Basic-auth HTTP client scoped to one device.
pub struct PanelClient {
    http: reqwest::Client,
    host: String,
    username: String,
    password: SecretString,
}

impl PanelClient {
    /// Create a client for the device at `host` (address, or address:port).
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self> {
        Ok(Self {
            http: transport.build_client()?,
            host: host.into(),
            username: username.into(),
            password,
        })
    }

    /// The device address this client talks to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Build the absolute URL for a panel path (`path` starts with `/`).
    fn panel_url(&self, path: &str) -> Result<Url> {
        let full = format!("http://{}{path}", self.host);
        Url::parse(&full).map_err(|e| Error::Connection {
            reason: format!("invalid device URL {full:?}: {e}"),
        })
    }

    /// Fetch one panel page with basic auth.
    ///
    /// Returns the status and trimmed body on a completed exchange (200
    /// or not); returns [`Error::Connection`] when the device could not
    /// be reached at all.
    pub async fn fetch(&self, path: &str) -> Result<Page> {
        let url = self.panel_url(path)?;
        debug!(%url, "GET");

        let response = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await
            .map_err(|e| Error::Connection {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let reason = status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string();
            trace!(status = status.as_u16(), %reason, "non-200 exchange");
            return Ok(Page {
                status: status.as_u16(),
                body: reason,
            });
        }

        let body = response.text().await.map_err(|e| Error::Connection {
            reason: format!("failed to read response body: {e}"),
        })?;

        Ok(Page {
            status: status.as_u16(),
            body: body.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_discriminants() {
        let ok = Page {
            status: 200,
            body: "<html>".into(),
        };
        assert!(ok.is_ok());

        let denied = Page {
            status: 401,
            body: "Unauthorized".into(),
        };
        assert!(!denied.is_ok());
        let err = denied.into_http_error();
        assert!(matches!(err, Error::Http { status: 401, .. }));
    }
}
