//! fenceline-agent: power-fencing device drivers.
//!
//! Fencing forcibly isolates a failed cluster node by cutting power to its
//! outlet on a remote power-distribution or management device. This crate
//! implements the shared action protocol — read the outlet's current state,
//! decide whether the requested action is a no-op, perform the transition,
//! report the result — over two interchangeable transports:
//!
//! - [`web`]: one-shot authenticated HTTP scraping of a PDU control panel
//!   (DLI PC8000 family), including old/new command-URL dialect detection.
//! - [`console`]: a persistent telnet/ssh session driven expect-style
//!   through a menu protocol (Fujitsu-Siemens RSB family).
//!
//! The [`action::run_action`] engine is written once against the
//! [`FenceDevice`] trait and is transport-agnostic.
//!
//! # Example
//!
//! ```no_run
//! use fenceline_agent::{PowerAction, WebPanelAgent, run_action};
//! use fenceline_agent::transport::TransportConfig;
//! use secrecy::SecretString;
//!
//! # async fn example() -> Result<(), fenceline_agent::Error> {
//! let mut agent = WebPanelAgent::new(
//!     "192.168.0.200",
//!     "admin",
//!     SecretString::from("secret".to_string()),
//!     "7",
//!     &TransportConfig::default(),
//! )?;
//!
//! let outcome = run_action(&mut agent, PowerAction::Reboot).await?;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod console;
pub mod error;
pub mod transport;
pub mod web;

pub use action::{ActionOutcome, FenceDevice, PowerAction, PowerStatus, run_action};
pub use console::agent::{ConsoleAgent, ConsoleConfig};
pub use error::Error;
pub use web::agent::WebPanelAgent;
