//! Orasible - Oracle database modules for Ansible
//!
//! This is the main entry point for the Orasible CLI. Installed under a
//! module's name it behaves as an Ansible binary module.

mod cli;

use anyhow::Result;
use cli::commands::{self, CommandContext};
use cli::{Cli, Commands, LogFormat};
use orasible::config::{Config, LoggingConfig};
use orasible::modules::ModuleRegistry;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // Ansible runs binary modules as `<module> <args-file>`
    let registry = ModuleRegistry::with_builtins();
    if let Some((name, args_file)) = cli::binary_module_invocation(&args, |n| registry.contains(n)) {
        let (config, load_error) = load_config(None);
        init_logging(0, &config.logging, None);
        if let Some(e) = load_error {
            warn!("Failed to load config: {:#}", e);
        }
        let ctx = CommandContext::new(config);
        let exit_code = commands::module::run_module(&ctx, &name, &args_file, false)?;
        std::process::exit(exit_code);
    }

    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let (config, load_error) = load_config(cli.config.as_ref());

    // Initialize logging based on verbosity
    init_logging(cli.verbosity(), &config.logging, cli.log_format);
    if let Some(e) = load_error {
        warn!("Failed to load config: {:#}", e);
    }

    let ctx = CommandContext::new(config);

    // Execute the appropriate command
    let exit_code = match &cli.command {
        Commands::Module(args) => args.execute(&ctx)?,
        Commands::Env(args) => args.execute(&ctx)?,
        Commands::Ps(args) => args.execute(&ctx)?,
        Commands::ListModules => commands::list_modules(&ctx),
    };

    std::process::exit(exit_code);
}

/// Load configuration, keeping the defaults when it cannot be read
fn load_config(path: Option<&PathBuf>) -> (Config, Option<anyhow::Error>) {
    match Config::load(path) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    }
}

/// Initialize logging on stderr; stdout carries the module envelope
fn init_logging(verbosity: u8, logging: &LoggingConfig, format: Option<LogFormat>) {
    let filter = match verbosity {
        0 => logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let format = format.unwrap_or_else(|| LogFormat::from_config(&logging.format));
    let (text, json) = match format {
        LogFormat::Text => (
            Some(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(verbosity >= 3),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(fmt::layer().json().with_writer(std::io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(text)
        .with(json)
        .with(env_filter)
        .init();
}
