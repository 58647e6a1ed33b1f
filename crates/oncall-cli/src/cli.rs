//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// oncall - who is on call right now
#[derive(Debug, Parser)]
#[command(name = "oncall")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "ONCALL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Make the command a bit more talkative
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log to the terminal instead of the configured log file
    #[arg(long = "stdout", short = 'o', global = true)]
    pub stdout: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sync shifts and contacts from Google
    Sync,

    /// Print a field of the person on call now
    Current {
        /// Field to print
        #[arg(value_enum)]
        field: PersonField,
    },

    /// Print the number of days until the last known shift ends
    LastShift,

    /// List calendars available to the account
    Calendars,

    /// Run a command with ONCALL_EMAIL_ADDRESS and ONCALL_PHONE arguments
    /// replaced by the current on-call person's details
    Exec {
        /// Run the command line through `sh -c`
        #[arg(long)]
        shell: bool,

        /// The command and its arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Authenticate with Google
    Auth {
        /// Force re-authentication even if already authenticated
        #[arg(long, short)]
        force: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Person fields `current` can print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PersonField {
    Email,
    Phone,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
