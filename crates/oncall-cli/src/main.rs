//! oncall CLI entry point.

use std::io;
use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use clap::error::ErrorKind;
use tracing::debug;

use oncall_cli::cli::{Cli, Command, ConfigAction};
use oncall_cli::commands;
use oncall_cli::config::ClientConfig;
use oncall_cli::error::{ClientResult, EX_OK, EX_USAGE};
use oncall_core::{TracingConfig, init_tracing};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EX_USAGE),
            };
        }
    };

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn tracing_config(cli: &Cli, config: &ClientConfig) -> TracingConfig {
    let tracing = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default()
    };

    match config.oncall.log_file() {
        Some(path) if !cli.stdout => tracing.with_log_file(path),
        _ => tracing,
    }
}

/// Runs the command and returns the exit code to leave with.
async fn run(cli: Cli) -> ClientResult<u8> {
    let config = ClientConfig::load(cli.config.as_deref())?;
    init_tracing(tracing_config(&cli, &config))?;

    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    debug!(path = %config_path.display(), command = ?cli.command, "starting");

    let mut out = io::stdout().lock();

    let result = match cli.command {
        Command::Exec { shell, command } => {
            let mut calendar = commands::open_calendar(&config)?;
            return commands::exec::run_at(&mut calendar, &command, shell, Utc::now()).await;
        }
        Command::Sync => commands::shifts::sync(&config, cli.verbose, &mut out).await,
        Command::Current { field } => {
            let mut calendar = commands::open_calendar(&config)?;
            commands::shifts::current_at(&mut calendar, field, Utc::now(), &mut out).await
        }
        Command::LastShift => {
            let mut calendar = commands::open_calendar(&config)?;
            commands::shifts::last_shift_at(&mut calendar, Utc::now(), cli.verbose, &mut out)
                .await
        }
        Command::Calendars => commands::auth::calendars(&config, &mut out).await,
        Command::Auth { force } => commands::auth::google(&config, force, &mut out).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path, &mut out),
            ConfigAction::Validate => commands::config::validate(&config, &mut out),
            ConfigAction::Path => commands::config::path(&config_path, &mut out),
        },
    };
    result.map(|()| EX_OK)
}
