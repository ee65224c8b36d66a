//! Subcommands module for Orasible CLI
//!
//! This module contains all the subcommand implementations.

pub mod env;
pub mod module;
pub mod ps;

use orasible::config::Config;
use orasible::modules::{ModuleContext, ModuleRegistry};
use orasible::runner::{CommandRunner, SystemRunner};
use std::sync::Arc;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Runs the Oracle client tools
    pub runner: Arc<dyn CommandRunner>,
    /// Available modules
    pub registry: ModuleRegistry,
}

impl CommandContext {
    /// Create a new command context
    pub fn new(config: Config) -> Self {
        Self {
            config,
            runner: Arc::new(SystemRunner::new()),
            registry: ModuleRegistry::with_builtins(),
        }
    }

    /// Module execution context sharing this command's runner and config
    pub fn module_context(&self, check_mode: bool) -> ModuleContext {
        ModuleContext::new()
            .with_check_mode(check_mode)
            .with_runner(Arc::clone(&self.runner))
            .with_config(self.config.clone())
    }
}

/// Print the module list
pub fn list_modules(ctx: &CommandContext) -> i32 {
    for name in ctx.registry.names() {
        if let Some(module) = ctx.registry.get(name) {
            println!("{:<20} {}", name, module.description());
        }
    }
    0
}
