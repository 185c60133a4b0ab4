//! Run command implementation
//!
//! Runs check cycles continuously until SIGINT/SIGTERM.

use crate::cli::args::RunArgs;
use crate::cli::output::print_output;
use crate::cli::Cli;
use crate::commands::{build_monitor, load_config};
use crate::error::Result;
use crate::services::Shutdown;
use crate::state::StateStore;

/// Execute the continuous monitor
pub fn run_continuous(cli: &Cli, args: &RunArgs) -> Result<()> {
    let (config, _) = load_config(cli, args.interval)?;

    let lock = StateStore::new(config.state_path()).lock()?;
    log::debug!("Holding {}", lock.path().display());

    let shutdown = Shutdown::new();
    shutdown.install_signal_handler()?;

    let mut monitor = build_monitor(&config)?;
    let format = cli.format;
    monitor.run(&shutdown, |report| {
        if let Err(e) = print_output(report, format) {
            log::warn!("Failed to print cycle report: {}", e);
        }
    });

    Ok(())
}
