// Console fencing agent: the RSB menu protocol over an expect session.
//
// Menu map (device firmware): "2" enters the power-status/control menu,
// "0" returns to the top menu, "1" powers off, "4" powers on, "yes"
// confirms a destructive action, an empty line dismisses the "any key
// to continue" pause. The command prompt defaults to "to quit:".

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::action::{FenceDevice, PowerStatus};
use crate::console::expect::{Pattern, Session};
use crate::error::{Error, Result};

/// Menu selection that powers the server off.
const MENU_POWER_OFF: &str = "1";
/// Menu selection that powers the server on.
const MENU_POWER_ON: &str = "4";
/// Enter the power-status/control menu.
const MENU_POWER_CONTROL: &str = "2";
/// Return to the top menu.
const MENU_TOP: &str = "0";

/// Timeouts and prompt configuration for one console invocation.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// The device's command prompt. Matched as a substring.
    pub command_prompt: String,
    /// Bound for ordinary command acknowledgement.
    pub shell_timeout: Duration,
    /// Bound for the device's own power-transition wait. Distinct from
    /// and typically much longer than the shell timeout.
    pub power_timeout: Duration,
    /// Bound for the login exchange.
    pub login_timeout: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            command_prompt: "to quit:".into(),
            shell_timeout: Duration::from_secs(3),
            power_timeout: Duration::from_secs(20),
            login_timeout: Duration::from_secs(5),
        }
    }
}

/// Fencing agent for menu-driven management consoles.
///
/// Owns the [`Session`] exclusively. Every command leaves the console
/// back at the top menu, so the conversation stays navigable across
/// successive operations within one invocation.
pub struct ConsoleAgent {
    session: Session,
    config: ConsoleConfig,
    prompt: Pattern,
    status_re: Regex,
}

impl ConsoleAgent {
    /// Wrap an established session (telnet or ssh).
    pub fn new(session: Session, config: ConsoleConfig) -> Self {
        let prompt = Pattern::literal(config.command_prompt.clone());
        // Fixed pattern, compiled once per invocation.
        let status_re = Regex::new(r"(?i)Power Status\s*:\s*(on|off)")
            .expect("power status pattern is valid");
        Self {
            session,
            config,
            prompt,
            status_re,
        }
    }

    /// Authenticate on a telnet session: answer the login and password
    /// prompts, then wait for the command prompt.
    pub async fn login(&mut self, username: &str, password: &SecretString) -> Result<()> {
        debug!(%username, "logging in");

        self.session
            .expect(
                &[Pattern::literal("ogin:"), Pattern::literal("sername")],
                self.config.login_timeout,
            )
            .await?;
        self.session.send_line(username).await?;

        self.session
            .expect(&[Pattern::literal("assword")], self.config.login_timeout)
            .await?;
        self.session.send_line(password.expose_secret()).await?;

        // No command prompt after the password means the device bounced
        // the credentials (or fell back to another login round).
        match self.expect_prompt(self.config.login_timeout).await {
            Ok(()) => Ok(()),
            Err(Error::Timeout { .. }) => Err(Error::Login {
                message: "no command prompt after password".into(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Leave the console at the top menu and tear the session down.
    /// Best-effort: invoked on every exit path, including failures, so
    /// the device is never left half-authenticated.
    pub async fn logout(mut self) {
        debug!("logging out");
        let _ = self.session.send_line(MENU_TOP).await;
        self.session.close().await;
    }

    async fn expect_prompt(&mut self, timeout: Duration) -> Result<()> {
        let prompt = self.prompt.clone();
        self.session.expect(&[prompt], timeout).await?;
        Ok(())
    }

    /// Run one power transition through the control menu: select the
    /// action, confirm it, wait out the device's own power timeout, and
    /// navigate back to the top menu.
    async fn transition(&mut self, menu_code: &str) -> Result<()> {
        info!(menu_code, "issuing power transition");

        self.session.send(MENU_POWER_CONTROL).await?;
        self.expect_prompt(self.config.shell_timeout).await?;

        self.session.send_line(menu_code).await?;
        self.session
            .expect(
                &[
                    Pattern::literal("want to power off"),
                    Pattern::literal("'yes' or 'no'"),
                ],
                self.config.shell_timeout,
            )
            .await?;
        self.session.send_line("yes").await?;

        // The device sits silent until its own power sequence finishes;
        // this wait gets the long timeout tier.
        self.session
            .expect(
                &[Pattern::literal("any key to continue")],
                self.config.power_timeout,
            )
            .await?;
        self.session.send_line("").await?;
        self.expect_prompt(self.config.shell_timeout).await?;

        self.session.send_line(MENU_TOP).await?;
        self.expect_prompt(self.config.shell_timeout).await?;

        Ok(())
    }
}

#[async_trait]
impl FenceDevice for ConsoleAgent {
    /// Query the power-status menu and parse the `Power Status : on|off`
    /// line out of the response, then return to the top menu so the
    /// session stays in a known state.
    async fn status(&mut self) -> Result<PowerStatus> {
        self.session.send(MENU_POWER_CONTROL).await?;
        self.expect_prompt(self.config.shell_timeout).await?;

        let captured = self
            .status_re
            .captures(self.session.before())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_ascii_lowercase());

        self.session.send(MENU_TOP).await?;
        self.expect_prompt(self.config.shell_timeout).await?;

        match captured.as_deref() {
            Some("on") => Ok(PowerStatus::On),
            Some("off") => Ok(PowerStatus::Off),
            _ => Err(Error::Protocol {
                message: "power status line missing from menu response".into(),
            }),
        }
    }

    async fn power_on(&mut self) -> Result<()> {
        self.transition(MENU_POWER_ON).await
    }

    async fn power_off(&mut self) -> Result<()> {
        self.transition(MENU_POWER_OFF).await
    }

    async fn power_cycle(&mut self) -> Result<()> {
        self.power_off().await?;
        self.power_on().await
    }

    /// The firmware has no combined cycle command; the action engine
    /// performs off-then-on instead.
    fn supports_cycle(&self) -> bool {
        false
    }
}
