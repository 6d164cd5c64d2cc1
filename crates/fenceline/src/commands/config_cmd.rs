//! `fenceline config` -- inspect and initialize the config file.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Init => {
            let path = global
                .config
                .clone()
                .unwrap_or_else(config::config_path);
            if path.exists() {
                return Err(CliError::Validation {
                    field: "config".into(),
                    reason: format!("{} already exists", path.display()),
                });
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, config::STARTER_CONFIG)?;
            if !global.quiet {
                println!("Wrote {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global.config.as_ref())?;
            let profile = config::active_profile_name(global, &cfg);
            println!("config file: {}", config::config_path().display());
            println!("active profile: {profile}");
            for (name, p) in &cfg.profiles {
                println!("\n[profiles.{name}]");
                if let Some(ip) = &p.ip {
                    println!("ip = {ip:?}");
                }
                if let Some(username) = &p.username {
                    println!("username = {username:?}");
                }
                if p.password.is_some() {
                    println!("password = \"<redacted>\"");
                }
                if let Some(outlet) = &p.outlet {
                    println!("outlet = {outlet:?}");
                }
                if let Some(port) = p.port {
                    println!("port = {port}");
                }
                if let Some(timeout) = p.timeout {
                    println!("timeout = {timeout}");
                }
            }
            Ok(())
        }
    }
}
