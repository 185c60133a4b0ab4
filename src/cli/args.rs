//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Host resource monitor
///
/// Watches CPU, memory and disk usage and posts a webhook alert when a
/// metric stays above its threshold for the sustained period.
#[derive(Parser, Debug)]
#[command(name = "hostwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "HOSTWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the state file
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Webhook URL (overrides the configuration file)
    #[arg(long, global = true, env = "HOSTWATCH_WEBHOOK_URL", hide_env_values = true)]
    pub webhook_url: Option<String>,

    /// Disk partition to monitor (repeatable, replaces the configured list)
    #[arg(long = "partition", global = true, value_name = "PATH")]
    pub partitions: Vec<String>,

    // No subcommand runs `check`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one check cycle and exit
    Check,

    /// Check continuously until interrupted
    Run(RunArgs),

    /// Send a status message with current readings to the webhook
    TestWebhook,

    /// Show current readings without touching monitor state
    Status,

    /// Inspect or reset persisted monitor state
    State(StateArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the continuous mode
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Seconds between check cycles (overrides the configuration file)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,
}

/// Arguments for state commands
#[derive(Parser, Debug)]
pub struct StateArgs {
    #[command(subcommand)]
    pub command: StateCommands,
}

/// State subcommands
#[derive(Subcommand, Debug)]
pub enum StateCommands {
    /// Print breach and alert history
    Show,

    /// Delete the state file
    Reset,
}

/// Arguments for config commands
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
