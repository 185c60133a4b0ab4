//! Check command implementation
//!
//! Runs a single check cycle, the mode used from cron.

use crate::cli::output::print_output;
use crate::cli::Cli;
use crate::commands::{build_monitor, load_config};
use crate::error::Result;
use crate::state::StateStore;

/// Execute one check cycle and print the outcome
pub fn run_check(cli: &Cli) -> Result<()> {
    let (config, _) = load_config(cli, None)?;

    // Hold the state lock before loading so a running daemon's state is not
    // overwritten by a stale copy
    let _lock = StateStore::new(config.state_path()).lock()?;

    let mut monitor = build_monitor(&config)?;
    let report = monitor.run_cycle();
    print_output(&report, cli.format)?;

    Ok(())
}
