//! CLI module for Orasible
//!
//! This module provides the command-line interface for Orasible: argument
//! parsing and subcommand handling, plus detection of the Ansible
//! binary-module calling convention.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

/// Orasible - Oracle database modules for Ansible
///
/// Runs the Oracle modules directly or as Ansible binary modules.
#[derive(Parser, Debug, Clone)]
#[command(name = "orasible")]
#[command(author = "Orasible Contributors")]
#[command(version)]
#[command(about = "Oracle database modules for Ansible", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "ORASIBLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format (logs always go to stderr)
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Parse the format named in configuration, falling back to text
    pub fn from_config(name: &str) -> Self {
        if name.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a module with an Ansible arguments file
    Module(commands::module::ModuleArgs),

    /// Show the Oracle environment resolved for a SID
    Env(commands::env::EnvArgs),

    /// List processes by command pattern or owner
    Ps(commands::ps::PsArgs),

    /// List the available modules
    #[command(name = "list-modules")]
    ListModules,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }
}

/// Detect the Ansible binary-module convention.
///
/// When the executable is installed under a module's name (a symlink such
/// as `library/sqlplus`) Ansible runs it with the arguments file as the only
/// argument. Returns the module name and arguments file in that case.
pub fn binary_module_invocation(
    args: &[String],
    is_module: impl Fn(&str) -> bool,
) -> Option<(String, PathBuf)> {
    let [program, args_file] = args else {
        return None;
    };
    let stem = Path::new(program).file_stem()?.to_str()?;
    if stem == "orasible" || !is_module(stem) {
        return None;
    }
    Some((stem.to_string(), PathBuf::from(args_file)))
}
