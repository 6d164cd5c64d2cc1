//! Fence through a telnet/ssh management console.

use std::time::Duration;

use fenceline_agent::console::{ssh, telnet};
use fenceline_agent::{ConsoleAgent, ConsoleConfig, run_action};
use tracing::info;

use crate::cli::{ConsoleArgs, GlobalOpts};
use crate::config::Target;
use crate::error::CliError;

pub async fn handle(
    args: ConsoleArgs,
    global: &GlobalOpts,
    target: Target,
) -> Result<(), CliError> {
    let port = args.port.or(target.port).unwrap_or(if args.ssh {
        ssh::DEFAULT_PORT
    } else {
        telnet::DEFAULT_PORT
    });

    let config = ConsoleConfig {
        command_prompt: args.command_prompt.clone(),
        shell_timeout: Duration::from_secs(args.shell_timeout),
        power_timeout: Duration::from_secs(args.power_timeout),
        ..ConsoleConfig::default()
    };

    info!(ip = %target.ip, port, ssh = args.ssh, "connecting to console");

    let session = if args.ssh {
        ssh::connect(&target.ip, port, &target.username)?
    } else {
        telnet::connect(&target.ip, port, target.timeout).await?
    };

    let mut agent = ConsoleAgent::new(session, config);

    // The session must be released on every path, so the action result
    // is held while logout runs.
    let result = async {
        if !args.ssh {
            let password = target.password.as_ref().ok_or_else(|| {
                fenceline_agent::Error::Login {
                    message: "no password available for telnet login".into(),
                }
            })?;
            agent.login(&target.username, password).await?;
        }
        run_action(&mut agent, args.action.into()).await
    }
    .await;

    agent.logout().await;

    let outcome = result?;
    if !global.quiet {
        println!("{outcome}");
    }
    Ok(())
}
