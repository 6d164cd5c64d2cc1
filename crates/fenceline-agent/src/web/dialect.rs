//! Pure parsing over control-panel markup: redirect indirection, old/new
//! command-URL dialect detection, and outlet status extraction.
//!
//! The device family shipped two generations of panel firmware. The new
//! one drives an outlet through `outlet?<id>=ON|OFF|CCL`; the old one
//! through `outleton<id>`, `outletoff<id>`, `outletccl<id>`. Which one a
//! device speaks is decided by scanning the control page for the first
//! matching outlet-reference marker. No HTML parser is needed — the
//! contract is three literal markers located in priority order.

use crate::action::PowerStatus;
use crate::error::{Error, Result};

/// Command-URL convention spoken by a device's panel firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `outletoff?P` / `outleton?P` / `outletccl?P`
    Old,
    /// `outlet?P=OFF|ON|CCL`
    New,
}

/// The three command URLs for one outlet under one dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandUrls {
    pub off: String,
    pub on: String,
    pub cycle: String,
}

impl CommandUrls {
    /// Compose the power-management command URLs for `outlet`.
    pub fn for_outlet(dialect: Dialect, outlet: &str) -> Self {
        match dialect {
            Dialect::Old => Self {
                off: format!("/outletoff?{outlet}"),
                on: format!("/outleton?{outlet}"),
                cycle: format!("/outletccl?{outlet}"),
            },
            Dialect::New => Self {
                off: format!("/outlet?{outlet}=OFF"),
                on: format!("/outlet?{outlet}=ON"),
                cycle: format!("/outlet?{outlet}=CCL"),
            },
        }
    }
}

/// Extract the target path of the panel's meta-refresh indirection.
///
/// Panels that moved their outlet table answer the root fetch with a
/// tiny page carrying `URL=<path>">`; the caller re-fetches that path
/// exactly once. Returns `None` when the body carries no indirection
/// marker (including the empty-body case).
pub fn redirect_target(body: &str) -> Option<&str> {
    let start = body.find("URL=")? + "URL=".len();
    let end = body[start..].find("\">")?;
    Some(&body[start..start + end])
}

/// Whether the fetched root is not the outlet table itself.
pub fn needs_redirect(body: &str) -> bool {
    body.is_empty() || body.contains("URL=/")
}

/// Locate `outlet` on the control page.
///
/// Scans for the three reference markers in priority order — new-dialect
/// first, then the two old-dialect spellings — and returns the dialect
/// plus the byte offset just past the matched marker. `None` means the
/// outlet is absent from the control surface entirely.
pub fn find_outlet(body: &str, outlet: &str) -> Option<(Dialect, usize)> {
    let markers = [
        (format!("outlet?{outlet}="), Dialect::New),
        (format!("outletoff{outlet}="), Dialect::Old),
        (format!("outleton{outlet}="), Dialect::Old),
    ];

    for (marker, dialect) in markers {
        if let Some(pos) = body.find(&marker) {
            return Some((dialect, pos + marker.len()));
        }
    }
    None
}

/// Extract the current status of `outlet` from the control page.
///
/// The span between the outlet marker and the next literal `>Switch`
/// names the *available* action, not the current state: the panel offers
/// "Switch ON" for an outlet that is currently off. That inversion is
/// load-bearing — `ON` in the span means status OFF, `OFF` means ON.
pub fn parse_status(body: &str, outlet: &str) -> Result<(PowerStatus, Dialect)> {
    let (dialect, span_start) = find_outlet(body, outlet).ok_or_else(|| Error::OutletNotFound {
        outlet: outlet.to_string(),
    })?;

    let span_end = body[span_start..]
        .find(">Switch")
        .ok_or_else(|| Error::UnparsableStatus {
            outlet: outlet.to_string(),
        })?;
    let control_span = &body[span_start..span_start + span_end];

    // "ON" never occurs inside "OFF", so checking it first is safe.
    let status = if control_span.contains("ON") {
        PowerStatus::Off
    } else if control_span.contains("OFF") {
        PowerStatus::On
    } else {
        return Err(Error::UnparsableStatus {
            outlet: outlet.to_string(),
        });
    };

    Ok((status, dialect))
}
