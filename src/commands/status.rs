//! Status command implementation

use crate::cli::output::print_output;
use crate::cli::Cli;
use crate::commands::{build_readonly_monitor, load_config};
use crate::error::Result;

/// Print current readings without recording anything
pub fn run_status(cli: &Cli) -> Result<()> {
    let (config, _) = load_config(cli, None)?;
    let mut monitor = build_readonly_monitor(&config)?;
    let report = monitor.status_report();
    print_output(&report, cli.format)?;
    Ok(())
}
