//! Clap derive structures for the `fenceline` CLI.
//!
//! Defines the command tree, global device/credential flags, and the
//! action argument. Clap itself enforces the fixed action set, so an
//! unknown action is rejected with a usage error before any transport
//! I/O can happen.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use fenceline_agent::PowerAction;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fenceline -- power-fencing agent for remote power devices
#[derive(Debug, Parser)]
#[command(
    name = "fenceline",
    version,
    about = "Fence cluster nodes by forcing their power outlet on, off, or through a reboot",
    long_about = "A power-fencing agent: connects to a remote power-distribution or \
        management device and forces a node's outlet into a known state so a failed \
        cluster member can be safely removed.\n\n\
        Two device families are supported: HTTP web-panel PDUs (panel) and \
        menu-driven management consoles reached over telnet or ssh (console).",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile from the config file
    #[arg(long, short = 'p', env = "FENCELINE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file path (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Device address (hostname or IP, optionally with :port for panel devices)
    #[arg(long, short = 'a', env = "FENCELINE_IP", global = true)]
    pub ip: Option<String>,

    /// Login username
    #[arg(long, short = 'l', env = "FENCELINE_USERNAME", global = true)]
    pub username: Option<String>,

    /// Login password (prompted interactively when omitted)
    #[arg(
        long,
        env = "FENCELINE_PASSWORD",
        global = true,
        hide_env = true
    )]
    pub password: Option<String>,

    /// Outlet identifier on the device (a socket id, not a network port)
    #[arg(long, short = 'n', env = "FENCELINE_OUTLET", global = true)]
    pub outlet: Option<String>,

    /// Connection/request timeout in seconds
    #[arg(long, env = "FENCELINE_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Action argument ──────────────────────────────────────────────────

/// The fixed fencing action set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActionArg {
    /// Report the outlet's current power state
    Status,
    /// Ensure the outlet is powered on
    On,
    /// Ensure the outlet is powered off
    Off,
    /// Power-cycle the outlet
    Reboot,
}

impl From<ActionArg> for PowerAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Status => PowerAction::Status,
            ActionArg::On => PowerAction::On,
            ActionArg::Off => PowerAction::Off,
            ActionArg::Reboot => PowerAction::Reboot,
        }
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fence through an HTTP web-panel PDU (DLI PC8000 family)
    #[command(alias = "web")]
    Panel(PanelArgs),

    /// Fence through a telnet/ssh management console (RSB family)
    #[command(alias = "rsb")]
    Console(ConsoleArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct PanelArgs {
    /// Action to perform
    #[arg(value_enum)]
    pub action: ActionArg,
}

#[derive(Debug, Args)]
pub struct ConsoleArgs {
    /// Action to perform
    #[arg(value_enum)]
    pub action: ActionArg,

    /// Console TCP port (defaults to 3172 for telnet, 22 for ssh)
    #[arg(long)]
    pub port: Option<u16>,

    /// Connect over ssh instead of telnet (key/agent auth)
    #[arg(long)]
    pub ssh: bool,

    /// Command prompt to wait for
    #[arg(long, default_value = "to quit:")]
    pub command_prompt: String,

    /// Command-acknowledgement timeout in seconds
    #[arg(long, default_value = "3")]
    pub shell_timeout: u64,

    /// Power-action-completed timeout in seconds
    #[arg(long, default_value = "20")]
    pub power_timeout: u64,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a starter config file
    Init,
    /// Print the resolved configuration (passwords redacted)
    Show,
    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
