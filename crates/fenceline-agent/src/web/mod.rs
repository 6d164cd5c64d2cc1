//! HTTP control-panel transport (DLI PC8000 family).
//!
//! The device exposes its outlets on a plain-HTTP web panel protected by
//! basic auth. Status is scraped out of the panel markup; commands are
//! fire-and-forget GETs of dialect-specific command URLs.

pub mod agent;
pub mod client;
pub mod dialect;

pub use agent::WebPanelAgent;
pub use client::{Page, PanelClient};
pub use dialect::{CommandUrls, Dialect};
