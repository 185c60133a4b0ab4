//! hostwatch - host resource monitor
//!
//! Checks CPU, memory and disk usage once (for cron) or continuously, and
//! alerts through a webhook on sustained breaches.

use clap::Parser;
use hostwatch::cli::args::{generate_completions, Cli, Commands};
use hostwatch::commands::{
    run_check, run_config, run_continuous, run_state, run_status, run_test_webhook,
};
use hostwatch::error::{AppError, ConfigError, DeliveryError, PersistenceError};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Set log level based on verbose flag
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    // Run the appropriate command
    let result = run(&cli);

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    match &cli.command {
        None | Some(Commands::Check) => run_check(cli),

        Some(Commands::Run(args)) => run_continuous(cli, args),

        Some(Commands::TestWebhook) => run_test_webhook(cli),

        Some(Commands::Status) => run_status(cli),

        Some(Commands::State(args)) => run_state(cli, args),

        Some(Commands::Config(args)) => run_config(cli, args),

        Some(Commands::Completions { shell }) => {
            generate_completions(*shell);
            Ok(())
        }
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::Delivery(DeliveryError::NotConfigured) => {
            eprintln!();
            eprintln!("Hint: Set notifier.webhook_url in the configuration file,");
            eprintln!("      or pass --webhook-url / HOSTWATCH_WEBHOOK_URL.");
        }
        AppError::Persistence(PersistenceError::Locked(_)) => {
            eprintln!();
            eprintln!("Hint: Another hostwatch process is using this state file.");
            eprintln!("      Stop it first, or pass --state to use a different file.");
        }
        AppError::Persistence(PersistenceError::Json { .. })
        | AppError::Persistence(PersistenceError::SchemaMismatch { .. }) => {
            eprintln!();
            eprintln!("Hint: Run 'hostwatch state reset' to start with empty state.");
        }
        AppError::Config(ConfigError::FileNotFound(_)) => {
            eprintln!();
            eprintln!("Hint: Create one with 'hostwatch config init'.");
        }
        AppError::Config(ConfigError::AlreadyExists(_)) => {}
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Hint: Fix the value in the configuration file, or regenerate it");
            eprintln!("      with 'hostwatch config init --force'.");
        }
        _ => {}
    }
}
