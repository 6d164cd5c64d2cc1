// Web-panel fencing agent: resolves the outlet's control page, caches
// the command-URL dialect for the invocation, and issues fire-and-forget
// command GETs.

use async_trait::async_trait;
use secrecy::SecretString;
use tracing::{debug, info};

use crate::action::{FenceDevice, PowerStatus};
use crate::error::{Error, Result};
use crate::transport::TransportConfig;
use crate::web::client::PanelClient;
use crate::web::dialect::{self, CommandUrls, Dialect};

/// Fencing agent for HTTP control-panel devices.
///
/// Status is re-scraped before every decision, but the dialect — old or
/// new command-URL scheme — is resolved at most once per invocation and
/// reused for every subsequent command against the outlet.
pub struct WebPanelAgent {
    client: PanelClient,
    outlet: String,
    dialect: Option<Dialect>,
}

impl WebPanelAgent {
    /// Create an agent for one outlet on the device at `host`.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
        outlet: impl Into<String>,
        transport: &TransportConfig,
    ) -> Result<Self> {
        Ok(Self {
            client: PanelClient::new(host, username, password, transport)?,
            outlet: outlet.into(),
            dialect: None,
        })
    }

    /// The outlet identifier this agent controls.
    pub fn outlet(&self) -> &str {
        &self.outlet
    }

    /// Fetch the outlet-control document, following the panel's
    /// meta-refresh indirection exactly once.
    async fn control_page(&self) -> Result<String> {
        let page = self.client.fetch("/").await?;
        if !page.is_ok() {
            return Err(page.into_http_error());
        }

        let body = page.body;
        if !dialect::needs_redirect(&body) {
            return Ok(body);
        }

        // Control page moved: follow the single indirection hop. An empty
        // root body carries no target, so it falls straight through to
        // the empty-page failure below.
        let body = match dialect::redirect_target(&body) {
            Some(target) => {
                debug!(target, "control page moved, re-fetching");
                let page = self.client.fetch(target).await?;
                if !page.is_ok() {
                    return Err(page.into_http_error());
                }
                page.body
            }
            None => body,
        };

        // An empty final body means the outlet can never be resolved:
        // same terminal class as an unparsable state marker.
        if body.is_empty() {
            debug!(host = self.client.host(), "control page empty");
            return Err(Error::UnparsableStatus {
                outlet: self.outlet.clone(),
            });
        }
        Ok(body)
    }

    /// Scrape the outlet's current status, resolving and caching the
    /// dialect on first contact.
    async fn scrape_status(&mut self) -> Result<PowerStatus> {
        let body = self.control_page().await?;
        let (status, dialect) = dialect::parse_status(&body, &self.outlet)?;

        // Resolved once per invocation, never re-resolved.
        if self.dialect.is_none() {
            debug!(?dialect, outlet = %self.outlet, "dialect resolved");
            self.dialect = Some(dialect);
        }

        Ok(status)
    }

    /// The command URLs for this outlet, resolving the dialect first if
    /// no status scrape has happened yet.
    async fn command_urls(&mut self) -> Result<CommandUrls> {
        let dialect = match self.dialect {
            Some(dialect) => dialect,
            None => {
                self.scrape_status().await?;
                // scrape_status caches the dialect or fails out.
                self.dialect.ok_or_else(|| Error::OutletNotFound {
                    outlet: self.outlet.clone(),
                })?
            }
        };
        Ok(CommandUrls::for_outlet(dialect, &self.outlet))
    }

    /// Issue one command URL. Fire-and-forget relative to verification:
    /// the exchange must complete with 200, but the outlet state is not
    /// re-polled afterwards.
    async fn issue(&self, path: &str) -> Result<()> {
        info!(outlet = %self.outlet, path, "issuing command");
        let page = self.client.fetch(path).await?;
        if !page.is_ok() {
            return Err(page.into_http_error());
        }
        Ok(())
    }
}

#[async_trait]
impl FenceDevice for WebPanelAgent {
    async fn status(&mut self) -> Result<PowerStatus> {
        self.scrape_status().await
    }

    async fn power_on(&mut self) -> Result<()> {
        let urls = self.command_urls().await?;
        self.issue(&urls.on).await
    }

    async fn power_off(&mut self) -> Result<()> {
        let urls = self.command_urls().await?;
        self.issue(&urls.off).await
    }

    async fn power_cycle(&mut self) -> Result<()> {
        let urls = self.command_urls().await?;
        self.issue(&urls.cycle).await
    }

    // Both panel generations expose a combined cycle command.
    fn supports_cycle(&self) -> bool {
        true
    }
}
