mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use freesleep_core::{Coordinator, CoordinatorConfig};

use crate::cli::{Cli, Command, WatchArgs};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
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
        // Config commands don't need a pod
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "freesleep", &mut std::io::stdout());
            Ok(())
        }

        // All other commands talk to the pod
        cmd => {
            let coordinator_config = build_coordinator_config(&cli.global, &cmd)?;
            let coordinator = Coordinator::new(coordinator_config)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &coordinator, &cli.global).await;
            coordinator.shutdown().await;
            result
        }
    }
}

/// Build a `CoordinatorConfig` from the config file, profile, and CLI overrides.
fn build_coordinator_config(
    global: &cli::GlobalOpts,
    cmd: &Command,
) -> Result<CoordinatorConfig, CliError> {
    let cfg = config::load_config()?;
    let mut coordinator_config = config::resolve_coordinator_config(global, &cfg)?;

    if let Command::Watch(WatchArgs {
        interval: Some(secs),
    }) = cmd
    {
        if *secs == 0 {
            return Err(CliError::Validation {
                field: "interval".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        coordinator_config.poll_interval = Duration::from_secs(*secs);
    }
    Ok(coordinator_config)
}
