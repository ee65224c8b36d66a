//! Env command - show the resolved Oracle environment

use super::CommandContext;
use anyhow::{Context, Result};
use clap::Parser;
use orasible::oracle::EnvironmentResolver;

/// Arguments for the env command
#[derive(Parser, Debug, Clone)]
pub struct EnvArgs {
    /// Database identifier (ORACLE_SID)
    pub sid: String,

    /// Print as a JSON object instead of shell assignments
    #[arg(long)]
    pub json: bool,
}

impl EnvArgs {
    /// Execute the env command
    pub fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let resolver = EnvironmentResolver::from_config(&ctx.config.oracle);
        let env = resolver
            .resolve(&self.sid, ctx.runner.as_ref())
            .with_context(|| format!("Failed to resolve environment for {}", self.sid))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&env)?);
        } else {
            for (key, value) in env.vars() {
                println!("export {}={}", key, shell_words::quote(value));
            }
        }
        Ok(0)
    }
}
