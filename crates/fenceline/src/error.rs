//! CLI error types with miette diagnostics.
//!
//! Maps `fenceline_agent::Error` variants into user-facing errors with
//! actionable help text and stable process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use fenceline_agent::Error as AgentError;

/// Exit codes. A fencing coordinator keys off these: 0 means the outlet
/// reached (or already had) the requested state, anything else means
/// the node must be assumed un-fenced.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const OUTLET: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach device at {address}")]
    #[diagnostic(
        code(fenceline::connection_failed),
        help(
            "Check that the device is powered and reachable on the management network.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { address: String, reason: String },

    #[error("Device did not respond within {seconds}s (waiting for {waiting_for:?})")]
    #[diagnostic(
        code(fenceline::timeout),
        help("Increase --timeout / --shell-timeout / --power-timeout, or check the device.")
    )]
    Timeout { seconds: u64, waiting_for: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(fenceline::auth_failed),
        help("Verify the username and password for this device.")
    )]
    AuthFailed { message: String },

    // ── Outlet resolution ────────────────────────────────────────────
    #[error("Outlet '{outlet}' not found on the device's control page")]
    #[diagnostic(
        code(fenceline::outlet_not_found),
        help("Check the outlet id against the device's web panel. No command was sent.")
    )]
    OutletNotFound { outlet: String },

    #[error("Could not determine the state of outlet '{outlet}'")]
    #[diagnostic(
        code(fenceline::unparsable_status),
        help("The control page did not carry a recognizable state marker. No command was sent.")
    )]
    UnparsableStatus { outlet: String },

    // ── Device protocol ──────────────────────────────────────────────
    #[error("Device error: {message}")]
    #[diagnostic(code(fenceline::device))]
    Device { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Missing required option --{option}")]
    #[diagnostic(
        code(fenceline::missing_option),
        help("Pass --{option}, set FENCELINE_{env} in the environment, or add it to a profile.")
    )]
    MissingOption { option: String, env: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fenceline::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(fenceline::profile_not_found),
        help("Create one with: fenceline config init")
    )]
    ProfileNotFound { name: String },

    #[error(transparent)]
    #[diagnostic(code(fenceline::config))]
    Config(Box<figment::Error>),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to a process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::OutletNotFound { .. } | Self::UnparsableStatus { .. } => exit_code::OUTLET,
            Self::MissingOption { .. } | Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── AgentError → CliError mapping ────────────────────────────────────

impl From<AgentError> for CliError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Connection { reason } => CliError::ConnectionFailed {
                address: "device".into(),
                reason,
            },

            AgentError::Http { status, reason } if status == 401 || status == 403 => {
                CliError::AuthFailed {
                    message: format!("HTTP {status}: {reason}"),
                }
            }

            AgentError::Http { status, reason } => CliError::Device {
                message: format!("HTTP {status}: {reason}"),
            },

            AgentError::Timeout {
                seconds,
                waiting_for,
            } => CliError::Timeout {
                seconds,
                waiting_for,
            },

            AgentError::Login { message } => CliError::AuthFailed { message },

            AgentError::OutletNotFound { outlet } => CliError::OutletNotFound { outlet },

            AgentError::UnparsableStatus { outlet } => CliError::UnparsableStatus { outlet },

            AgentError::Protocol { message } => CliError::Device { message },

            AgentError::InvalidAction { action } => CliError::Validation {
                field: "action".into(),
                reason: format!("'{action}' is not one of on, off, reboot, status"),
            },

            AgentError::Io(e) => CliError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_distinguish_failure_classes() {
        let err = CliError::from(AgentError::OutletNotFound {
            outlet: "7".into(),
        });
        assert_eq!(err.exit_code(), exit_code::OUTLET);

        let err = CliError::from(AgentError::Timeout {
            seconds: 3,
            waiting_for: "to quit:".into(),
        });
        assert_eq!(err.exit_code(), exit_code::TIMEOUT);

        let err = CliError::from(AgentError::Connection {
            reason: "refused".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
    }

    #[test]
    fn http_auth_statuses_map_to_auth_failures() {
        let err = CliError::from(AgentError::Http {
            status: 401,
            reason: "Unauthorized".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);

        let err = CliError::from(AgentError::Http {
            status: 500,
            reason: "Internal Server Error".into(),
        });
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }
}
