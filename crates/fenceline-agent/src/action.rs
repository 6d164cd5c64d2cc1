//! The shared action protocol: device capability trait, the
//! (status, action) decision engine, and structured outcomes.
//!
//! Both transports implement [`FenceDevice`]; [`run_action`] is written
//! once against the trait and never inspects transport internals.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Observed power state of an outlet.
///
/// An outlet that cannot be located or whose state text is unparsable
/// never reaches this type — that condition is terminal and surfaces as
/// [`Error::OutletNotFound`] / [`Error::UnparsableStatus`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerStatus {
    /// Outlet is powered on.
    On,
    /// Outlet is powered off.
    Off,
}

impl fmt::Display for PowerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerStatus::On => write!(f, "on"),
            PowerStatus::Off => write!(f, "off"),
        }
    }
}

/// Requested fencing action, validated against the fixed set before any
/// command is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    /// Report the current status; never issues a transition command.
    Status,
    /// Ensure the outlet is powered on.
    On,
    /// Ensure the outlet is powered off.
    Off,
    /// Power-cycle the outlet (or just power on if currently off).
    Reboot,
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerAction::Status => write!(f, "status"),
            PowerAction::On => write!(f, "on"),
            PowerAction::Off => write!(f, "off"),
            PowerAction::Reboot => write!(f, "reboot"),
        }
    }
}

impl FromStr for PowerAction {
    type Err = Error;

    /// Parse an action name, rejecting anything outside the fixed set
    /// before any transport I/O happens.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "status" => Ok(Self::Status),
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "reboot" => Ok(Self::Reboot),
            other => Err(Error::InvalidAction {
                action: other.to_string(),
            }),
        }
    }
}

/// Power-management capability of one fencing device.
///
/// Implementations own the transport-specific details (HTTP scraping,
/// interactive menus). `status` must always reflect a fresh observation:
/// the engine calls it immediately before every decision and no caching
/// across actions is permitted.
#[async_trait]
pub trait FenceDevice: Send {
    /// Observe the outlet's current power state.
    async fn status(&mut self) -> Result<PowerStatus>;

    /// Switch the outlet on.
    async fn power_on(&mut self) -> Result<()>;

    /// Switch the outlet off.
    async fn power_off(&mut self) -> Result<()>;

    /// Power-cycle the outlet in one device-side operation.
    ///
    /// Only called when [`supports_cycle`](Self::supports_cycle) is true;
    /// devices without a combined cycle command get off-then-on from the
    /// engine instead.
    async fn power_cycle(&mut self) -> Result<()>;

    /// Whether the device exposes a combined power-cycle command.
    fn supports_cycle(&self) -> bool;
}

/// Outcome of one completed invocation, formatted for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// A `status` query: the observed state is the whole answer.
    Status(PowerStatus),
    /// The outlet was already in the requested state; no command sent.
    AlreadyInState(PowerStatus),
    /// The transition command sequence completed.
    Completed(PowerAction),
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Status(status) => write!(f, "Status: {status}"),
            ActionOutcome::AlreadyInState(status) => {
                write!(f, "Success: outlet already {status}")
            }
            ActionOutcome::Completed(action) => {
                write!(f, "Success: action '{action}' complete")
            }
        }
    }
}

/// Run one fencing action against a device.
///
/// The decision table (current status × requested action):
///
/// | current | action | effect                                          |
/// |---------|--------|-------------------------------------------------|
/// | off     | off    | no-op                                           |
/// | on      | on     | no-op                                           |
/// | on      | off    | off-command                                     |
/// | off     | on     | on-command                                      |
/// | on      | reboot | cycle-command, or off-then-on without one       |
/// | off     | reboot | on-command only (nothing to power down)         |
/// | any     | status | no command                                      |
///
/// Status is fetched freshly here, immediately before the decision. An
/// outlet that resolves INVALID fails out of `device.status()` and no
/// command is ever issued.
pub async fn run_action<D>(device: &mut D, action: PowerAction) -> Result<ActionOutcome>
where
    D: FenceDevice + ?Sized,
{
    let current = device.status().await?;
    debug!(%current, %action, "deciding action");

    match (current, action) {
        (status, PowerAction::Status) => Ok(ActionOutcome::Status(status)),

        (PowerStatus::Off, PowerAction::Off) | (PowerStatus::On, PowerAction::On) => {
            info!(%current, "outlet already in requested state");
            Ok(ActionOutcome::AlreadyInState(current))
        }

        (PowerStatus::On, PowerAction::Off) => {
            info!("outlet on, switching off");
            device.power_off().await?;
            Ok(ActionOutcome::Completed(action))
        }

        (PowerStatus::Off, PowerAction::On) => {
            info!("outlet off, switching on");
            device.power_on().await?;
            Ok(ActionOutcome::Completed(action))
        }

        (PowerStatus::On, PowerAction::Reboot) => {
            if device.supports_cycle() {
                info!("outlet on, issuing power cycle");
                device.power_cycle().await?;
            } else {
                info!("outlet on, cycling via off then on");
                device.power_off().await?;
                device.power_on().await?;
            }
            Ok(ActionOutcome::Completed(action))
        }

        // Nothing to power down: a reboot of an off outlet is just "on".
        (PowerStatus::Off, PowerAction::Reboot) => {
            info!("outlet off, switching on");
            device.power_on().await?;
            Ok(ActionOutcome::Completed(action))
        }
    }
}
