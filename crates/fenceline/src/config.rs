//! CLI-owned configuration: TOML device profiles and credential
//! resolution.
//!
//! The agent library never sees these types -- it receives pre-built
//! hosts, credentials, and timeouts. Precedence for every option:
//! CLI flag, then `FENCELINE_*` environment variable, then the active
//! profile, then (for the password only) an interactive prompt.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── TOML config structs ──────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when --profile is not specified.
    pub default_profile: Option<String>,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// One fencing device, as stored in the config file.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Device address (hostname or IP).
    pub ip: Option<String>,

    /// Login username.
    pub username: Option<String>,

    /// Login password (plaintext -- prefer the env var or the prompt).
    pub password: Option<String>,

    /// Outlet identifier.
    pub outlet: Option<String>,

    /// Console port override.
    pub port: Option<u16>,

    /// Request/connect timeout in seconds.
    pub timeout: Option<u64>,
}

// ── Paths & loading ──────────────────────────────────────────────────

/// Platform config file path: e.g. `~/.config/fenceline/config.toml`.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "fenceline")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("fenceline.toml"))
}

/// Load the config file merged with `FENCELINE_*` env overrides.
/// A missing file yields the defaults -- not an error.
pub fn load(path_override: Option<&PathBuf>) -> Result<Config, CliError> {
    let path = path_override.cloned().unwrap_or_else(config_path);

    let config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FENCELINE_CONFIG_"))
        .extract()?;

    Ok(config)
}

/// The profile name in effect: --profile flag, then the file's
/// default_profile, then "default".
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

// ── Resolution ───────────────────────────────────────────────────────

/// Fully-resolved connection target for one invocation.
#[derive(Debug)]
pub struct Target {
    pub ip: String,
    pub username: String,
    /// `None` only for transports that authenticate without one (ssh
    /// consoles with key auth).
    pub password: Option<SecretString>,
    pub outlet: Option<String>,
    pub timeout: Duration,
    pub port: Option<u16>,
}

/// Merge CLI flags over the active profile into a connection target.
///
/// `prompt_password` controls whether a missing password falls through
/// to an interactive prompt (disabled for ssh consoles, which use key
/// auth and never need one).
pub fn resolve_target(
    global: &GlobalOpts,
    config: &Config,
    prompt_password: bool,
) -> Result<Target, CliError> {
    let name = active_profile_name(global, config);
    let profile = config.profiles.get(&name);

    // An explicitly requested profile must exist; the implicit
    // "default" may be absent when everything comes from flags.
    if profile.is_none() && global.profile.is_some() {
        return Err(CliError::ProfileNotFound { name });
    }

    let ip = global
        .ip
        .clone()
        .or_else(|| profile.and_then(|p| p.ip.clone()))
        .ok_or_else(|| missing("ip", "IP"))?;

    let username = global
        .username
        .clone()
        .or_else(|| profile.and_then(|p| p.username.clone()))
        .ok_or_else(|| missing("username", "USERNAME"))?;

    let password = resolve_password(global, profile, &username, prompt_password)?;

    let outlet = global
        .outlet
        .clone()
        .or_else(|| profile.and_then(|p| p.outlet.clone()));

    let timeout = profile
        .and_then(|p| p.timeout)
        .map_or(global.timeout, |profile_timeout| {
            // A flag explicitly different from the default wins.
            if global.timeout == 30 { profile_timeout } else { global.timeout }
        });

    Ok(Target {
        ip,
        username,
        password,
        outlet,
        timeout: Duration::from_secs(timeout),
        port: profile.and_then(|p| p.port),
    })
}

fn resolve_password(
    global: &GlobalOpts,
    profile: Option<&Profile>,
    username: &str,
    prompt: bool,
) -> Result<Option<SecretString>, CliError> {
    if let Some(password) = global
        .password
        .clone()
        .or_else(|| profile.and_then(|p| p.password.clone()))
    {
        return Ok(Some(SecretString::from(password)));
    }

    if prompt {
        let entered = rpassword::prompt_password(format!("Password for {username}: "))?;
        return Ok(Some(SecretString::from(entered)));
    }

    Ok(None)
}

fn missing(option: &str, env: &str) -> CliError {
    CliError::MissingOption {
        option: option.into(),
        env: env.into(),
    }
}

/// Starter config written by `fenceline config init`.
pub const STARTER_CONFIG: &str = r#"# fenceline configuration
#
# default_profile = "lab-pdu"
#
# [profiles.lab-pdu]
# ip = "192.168.0.200"
# username = "admin"
# # password: prefer FENCELINE_PASSWORD or the interactive prompt
# outlet = "7"
#
# [profiles.node1-rsb]
# ip = "192.168.0.50"
# username = "admin"
# port = 3172
"#;
