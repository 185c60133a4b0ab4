//! State command implementation

use crate::cli::args::{StateArgs, StateCommands};
use crate::cli::output::{print_output, Message, StateView};
use crate::cli::Cli;
use crate::commands::load_config;
use crate::error::Result;
use crate::state::StateStore;

/// Execute a state subcommand
pub fn run_state(cli: &Cli, args: &StateArgs) -> Result<()> {
    let (config, _) = load_config(cli, None)?;
    let store = StateStore::new(config.state_path());

    match args.command {
        StateCommands::Show => {
            // Report a damaged file instead of quietly showing nothing
            let state = store.try_load()?.unwrap_or_default();
            let view = StateView {
                path: store.path().to_path_buf(),
                state,
                now: chrono::Utc::now(),
            };
            print_output(&view, cli.format)?;
        }
        StateCommands::Reset => {
            let _lock = store.lock()?;
            let msg = if store.reset()? {
                Message::ok(format!("Removed {}", store.path().display()))
            } else {
                Message::ok(format!("No state file at {}", store.path().display()))
            };
            print_output(&msg, cli.format)?;
        }
    }

    Ok(())
}
