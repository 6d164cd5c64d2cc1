mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose, cli.global.quiet);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, quiet: bool) {
    let filter = if quiet {
        "error"
    } else {
        match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands never touch a device.
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "fenceline", &mut std::io::stdout());
            Ok(())
        }

        Command::Panel(args) => {
            let target = resolve(&cli.global, true)?;
            commands::panel::handle(args, &cli.global, target).await
        }

        Command::Console(args) => {
            // ssh consoles authenticate with keys; only the telnet path
            // can use a prompted password.
            let target = resolve(&cli.global, !args.ssh)?;
            commands::console::handle(args, &cli.global, target).await
        }
    }
}

fn resolve(global: &cli::GlobalOpts, prompt_password: bool) -> Result<config::Target, CliError> {
    let cfg = config::load(global.config.as_ref())?;
    config::resolve_target(global, &cfg, prompt_password)
}
