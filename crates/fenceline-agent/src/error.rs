use thiserror::Error;

/// Top-level error type for the `fenceline-agent` crate.
///
/// Covers every failure mode across both transports: connection-level
/// failures, HTTP protocol errors, unlocatable or unparsable outlets,
/// expect timeouts, and action validation. The CLI maps these into
/// user-facing diagnostics and exit codes.
///
/// Every variant is fatal — the crate never retries. A fencing
/// coordinator that wants a retry re-runs the whole invocation.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Connection-level failure (DNS, refused, unreachable).
    #[error("Connection failed: {reason}")]
    Connection { reason: String },

    /// The device answered with a non-200 HTTP status.
    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    /// An interactive expect exceeded its timeout bound.
    #[error("Timed out after {seconds}s waiting for {waiting_for:?}")]
    Timeout { seconds: u64, waiting_for: String },

    // ── Authentication ──────────────────────────────────────────────
    /// Interactive login failed (bad credentials or unexpected banner).
    #[error("Login failed: {message}")]
    Login { message: String },

    // ── Outlet resolution ───────────────────────────────────────────
    /// The outlet id appears nowhere on the device's control surface.
    #[error("Outlet '{outlet}' not found on control page")]
    OutletNotFound { outlet: String },

    /// The outlet's state could not be determined: the control page was
    /// empty, or the state text matched neither the ON nor the OFF
    /// marker.
    #[error("Could not determine power status of outlet '{outlet}'")]
    UnparsableStatus { outlet: String },

    // ── Protocol ────────────────────────────────────────────────────
    /// The interactive session produced a response outside the menu
    /// protocol (e.g. status line missing after the status query).
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    // ── Validation ──────────────────────────────────────────────────
    /// Action outside {on, off, reboot, status}. Raised before any
    /// transport I/O.
    #[error("Invalid action '{action}' (expected on, off, reboot, or status)")]
    InvalidAction { action: String },

    // ── I/O ─────────────────────────────────────────────────────────
    /// Raw I/O error from the interactive session.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if the outlet could not be resolved to a usable
    /// state — the INVALID condition that short-circuits an invocation
    /// before any command is sent.
    pub fn is_invalid_outlet(&self) -> bool {
        matches!(
            self,
            Self::OutletNotFound { .. } | Self::UnparsableStatus { .. }
        )
    }

    /// Returns `true` if the device was unreachable or unresponsive.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Timeout { .. } | Self::Io(_)
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_reason_text() {
        let err = Error::Connection {
            reason: "connection refused".into(),
        };
        assert_eq!(err.to_string(), "Connection failed: connection refused");

        let err = Error::Http {
            status: 401,
            reason: "Unauthorized".into(),
        };
        assert_eq!(err.to_string(), "HTTP 401: Unauthorized");
    }

    #[test]
    fn invalid_outlet_predicate() {
        assert!(
            Error::OutletNotFound {
                outlet: "7".into()
            }
            .is_invalid_outlet()
        );
        assert!(
            Error::UnparsableStatus {
                outlet: "7".into()
            }
            .is_invalid_outlet()
        );
        assert!(
            !Error::InvalidAction {
                action: "explode".into()
            }
            .is_invalid_outlet()
        );
    }

    #[test]
    fn unreachable_predicate() {
        assert!(
            Error::Timeout {
                seconds: 3,
                waiting_for: "to quit:".into()
            }
            .is_unreachable()
        );
        assert!(
            !Error::Http {
                status: 500,
                reason: "oops".into()
            }
            .is_unreachable()
        );
    }
}
