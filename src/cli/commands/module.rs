//! Module command - run one module against an arguments file
//!
//! The arguments file is what Ansible hands a binary module: a JSON object,
//! optionally wrapped in `ANSIBLE_MODULE_ARGS`. Old-style `key=value`
//! files are accepted too. The response envelope is always printed as JSON
//! on stdout, even when the arguments cannot be read.

use super::CommandContext;
use anyhow::{bail, Context, Result};
use clap::Parser;
use orasible::modules::{ModuleOutput, ModuleParams};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Arguments for the module command
#[derive(Parser, Debug, Clone)]
pub struct ModuleArgs {
    /// Module to run
    pub name: String,

    /// File holding the module arguments
    pub args_file: PathBuf,

    /// Run in check mode (report what would run)
    #[arg(long = "check")]
    pub check_mode: bool,
}

impl ModuleArgs {
    /// Execute the module command
    pub fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        run_module(ctx, &self.name, &self.args_file, self.check_mode)
    }
}

/// Run `name` with the arguments in `args_file` and print its envelope.
pub fn run_module(ctx: &CommandContext, name: &str, args_file: &Path, check_mode: bool) -> Result<i32> {
    let output = match load_args(args_file) {
        Ok(params) => {
            debug!(module = %name, params = params.len(), "Loaded module arguments");
            ctx.registry
                .run(name, &params, &ctx.module_context(check_mode))
        }
        Err(e) => {
            error!(error = %e, "Unable to load module arguments");
            ModuleOutput::failed(format!("{:#}", e))
        }
    };

    println!(
        "{}",
        serde_json::to_string(&output).context("Failed to serialize module output")?
    );

    Ok(i32::from(output.failed))
}

/// Read an Ansible arguments file.
pub fn load_args(path: &Path) -> Result<ModuleParams> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read arguments file: {}", path.display()))?;
    parse_args(&content)
}

/// Parse arguments as JSON, falling back to `key=value` pairs.
pub fn parse_args(content: &str) -> Result<ModuleParams> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(ModuleParams::new());
    }

    if trimmed.starts_with('{') {
        let value: serde_json::Value =
            serde_json::from_str(trimmed).context("Failed to parse JSON arguments")?;
        let value = match value {
            serde_json::Value::Object(mut map) => match map.remove("ANSIBLE_MODULE_ARGS") {
                Some(inner) => inner,
                None => serde_json::Value::Object(map),
            },
            other => other,
        };
        return match value {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            _ => bail!("Module arguments must be a JSON object"),
        };
    }

    let words = shell_words::split(trimmed).context("Failed to split key=value arguments")?;
    let mut params = ModuleParams::new();
    for word in words {
        let Some((key, value)) = word.split_once('=') else {
            bail!("Expected key=value, found '{}'", word);
        };
        params.insert(key.to_string(), serde_json::Value::String(value.to_string()));
    }
    Ok(params)
}
