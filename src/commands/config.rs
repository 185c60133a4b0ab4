//! Config command implementation

use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::cli::output::{print_output, ConfigView, Message};
use crate::cli::Cli;
use crate::commands::load_config;
use crate::config::{Config, ConfigFile};
use crate::error::{ConfigError, Result};

/// Execute a config subcommand
pub fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init { force } => {
            let path = cli.config.clone().unwrap_or_else(ConfigFile::user_path);
            if path.exists() && !force {
                return Err(ConfigError::AlreadyExists(path.display().to_string()).into());
            }

            ConfigFile::save(&Config::default(), &path)?;
            print_output(
                &Message::ok(format!("Wrote default configuration to {}", path.display())),
                cli.format,
            )?;
        }
        ConfigCommands::Show => {
            let (config, source) = load_config(cli, None)?;
            print_output(&ConfigView { source, config }, cli.format)?;
        }
    }

    Ok(())
}
