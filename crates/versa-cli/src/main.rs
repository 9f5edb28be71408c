//! Versa CLI - Command-line interface for API version negotiation
//!
//! This is the main entry point for the Versa CLI application, providing
//! commands for inspecting the served versions, negotiating and routing
//! requests, and migrating records between versions.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    control::set_override(cli.use_color());

    // The config file may carry a logging section, so read it first
    let config = Config::load_with_file(cli.config.as_deref());

    if let Err(e) = init_logging(&cli, config.as_ref().ok()) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip(cli, config), fields(command = ?cli.command))]
async fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let use_color = cli.use_color() && config.output.color;
    control::set_override(use_color);
    let mut output = OutputWriter::new(cli.output, use_color, cli.quiet);

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        config = ?config.source,
        "Executing command"
    );

    match cli.command {
        Commands::Versions => handlers::handle_versions(&config, &mut output).await,
        Commands::Negotiate(args) => handlers::handle_negotiate(args, &config, &mut output).await,
        Commands::Route(args) => handlers::handle_route(args, &config, &mut output).await,
        Commands::Migrate(args) => handlers::handle_migrate(args, &config, &mut output).await,
        Commands::Compat(args) => handlers::handle_compat(args, &config, &mut output).await,
        Commands::Features(args) => handlers::handle_features(args, &config, &mut output).await,
        Commands::Cursor(args) => handlers::handle_cursor(args, &config, &mut output).await,
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output).await,
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: Option<&Config>) -> Result<()> {
    // -v flags win over the config file's logging section
    let mut logging_config = match config {
        Some(config) if cli.verbosity_level() == 0 => config.logging.clone(),
        _ => LoggingConfig::from_verbosity(cli.verbosity_level()),
    };

    logging_config.merge_with_env();

    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}
