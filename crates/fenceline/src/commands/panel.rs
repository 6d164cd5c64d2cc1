//! Fence through an HTTP web-panel PDU.

use fenceline_agent::transport::TransportConfig;
use fenceline_agent::{WebPanelAgent, run_action};
use tracing::info;

use crate::cli::{GlobalOpts, PanelArgs};
use crate::config::Target;
use crate::error::CliError;

pub async fn handle(
    args: PanelArgs,
    global: &GlobalOpts,
    mut target: Target,
) -> Result<(), CliError> {
    let outlet = target.outlet.clone().ok_or(CliError::MissingOption {
        option: "outlet".into(),
        env: "OUTLET".into(),
    })?;
    let password = target.password.take().ok_or(CliError::MissingOption {
        option: "password".into(),
        env: "PASSWORD".into(),
    })?;

    let transport = TransportConfig::default().with_timeout(target.timeout);
    let mut agent = WebPanelAgent::new(
        target.ip.clone(),
        target.username.clone(),
        password,
        outlet,
        &transport,
    )?;

    info!(ip = %target.ip, outlet = %agent.outlet(), "checking outlet status");

    let outcome = run_action(&mut agent, args.action.into())
        .await
        .map_err(|e| annotate_address(e, &target.ip))?;

    if !global.quiet {
        println!("{outcome}");
    }
    Ok(())
}

/// Attach the device address to connection failures, which the agent
/// reports without knowing what it was pointed at.
fn annotate_address(err: fenceline_agent::Error, address: &str) -> CliError {
    match err {
        fenceline_agent::Error::Connection { reason } => CliError::ConnectionFailed {
            address: address.to_string(),
            reason,
        },
        other => other.into(),
    }
}
