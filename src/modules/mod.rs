//! Module system for Orasible
//!
//! This module provides the trait, envelope and registry for the Oracle
//! modules. A module takes the parameters an automation host passes in,
//! drives the Oracle core, and answers with a fixed JSON envelope:
//!
//! ```json
//! {"changed": false, "msg": "...", "rc": 0, "stdout": "", "stderr": "", "resultset": ...}
//! ```
//!
//! Failures use the same envelope with `"failed": true`.

pub mod sqlplus;
pub mod table_dictionary;
pub mod table_list;

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::error::Error as OracleError;
use crate::oracle::{pmon_running, EnvironmentResolver, OracleEnvironment, ProcessInfo, SqlPlus};
use crate::runner::{CommandRunner, SystemRunner};

/// Errors that can occur during module execution
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("Module not found: {0}")]
    NotFound(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Cannot find {pmon}")]
    InstanceDown {
        pmon: String,
        processes: Vec<ProcessInfo>,
    },

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Result type for module operations
pub type ModuleResult<T> = Result<T, ModuleError>;

/// Status of a module execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    /// Module executed successfully but no changes were needed
    Ok,
    /// Module execution failed
    Failed,
    /// Module was skipped (e.g., check mode)
    Skipped,
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleStatus::Ok => write!(f, "ok"),
            ModuleStatus::Failed => write!(f, "failed"),
            ModuleStatus::Skipped => write!(f, "skipped"),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Response envelope returned to the automation host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleOutput {
    /// Whether the module changed anything
    pub changed: bool,
    /// Whether the module failed
    #[serde(skip_serializing_if = "is_false")]
    pub failed: bool,
    /// Whether the module did nothing (check mode)
    #[serde(skip_serializing_if = "is_false")]
    pub skipped: bool,
    /// Human-readable message about what happened
    pub msg: String,
    /// Exit code of the underlying process
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rc: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error or diagnostics
    pub stderr: String,
    /// Shaped result data
    pub resultset: serde_json::Value,
}

impl ModuleOutput {
    fn with_status(msg: impl Into<String>, status: ModuleStatus) -> Self {
        Self {
            changed: false,
            failed: status == ModuleStatus::Failed,
            skipped: status == ModuleStatus::Skipped,
            msg: msg.into(),
            rc: None,
            stdout: String::new(),
            stderr: String::new(),
            resultset: serde_json::Value::String(String::new()),
        }
    }

    /// Create a new successful output with no changes
    pub fn ok(msg: impl Into<String>) -> Self {
        Self::with_status(msg, ModuleStatus::Ok)
    }

    /// Create a failed output
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::with_status(msg, ModuleStatus::Failed).with_rc(1)
    }

    /// Create a skipped output
    pub fn skipped(msg: impl Into<String>) -> Self {
        Self::with_status(msg, ModuleStatus::Skipped)
    }

    pub fn status(&self) -> ModuleStatus {
        if self.failed {
            ModuleStatus::Failed
        } else if self.skipped {
            ModuleStatus::Skipped
        } else {
            ModuleStatus::Ok
        }
    }

    pub fn with_rc(mut self, rc: i32) -> Self {
        self.rc = Some(rc);
        self
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    /// Attach result data
    pub fn with_resultset(mut self, resultset: impl Serialize) -> Self {
        self.resultset = serde_json::to_value(resultset).unwrap_or_else(|e| {
            serde_json::Value::String(format!("unserializable result: {}", e))
        });
        self
    }

    /// Failure envelope for an error, keeping the raw process context.
    pub fn from_error(msg: impl Into<String>, error: &ModuleError) -> Self {
        let output = Self::failed(msg);
        match error {
            ModuleError::Oracle(err) => output
                .with_rc(err.exit_code())
                .with_stdout(err.stdout().unwrap_or_default())
                .with_stderr(err.stderr()),
            ModuleError::InstanceDown { processes, .. } => output
                .with_stderr(error.to_string())
                .with_resultset(processes),
            other => output.with_stderr(other.to_string()),
        }
    }
}

/// Parameters passed to a module
pub type ModuleParams = HashMap<String, serde_json::Value>;

/// Context for module execution
#[derive(Clone)]
pub struct ModuleContext {
    /// Whether to run in check mode (dry run)
    pub check_mode: bool,
    /// Runs sqlplus, orabase, pgrep and ps
    pub runner: Arc<dyn CommandRunner>,
    /// Loaded configuration
    pub config: Arc<Config>,
}

impl fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleContext")
            .field("check_mode", &self.check_mode)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for ModuleContext {
    fn default() -> Self {
        Self {
            check_mode: false,
            runner: Arc::new(SystemRunner::new()),
            config: Arc::new(Config::default()),
        }
    }
}

impl ModuleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Resolve the Oracle environment for `sid`.
    pub fn resolve_environment(&self, sid: &str) -> ModuleResult<OracleEnvironment> {
        let resolver = EnvironmentResolver::from_config(&self.config.oracle);
        Ok(resolver.resolve(sid, self.runner.as_ref())?)
    }

    /// SQL*Plus bound to this context's runner.
    pub fn sqlplus(&self) -> SqlPlus<'_> {
        SqlPlus::new(self.runner.as_ref()).with_binary(self.config.oracle.sqlplus_command.clone())
    }

    /// Fail unless the instance's PMON process is running.
    pub fn ensure_instance_running(&self, sid: &str) -> ModuleResult<()> {
        let prefix = &self.config.oracle.pmon_prefix;
        let (running, processes) = pmon_running(self.runner.as_ref(), sid, prefix)?;
        if running {
            Ok(())
        } else {
            Err(ModuleError::InstanceDown {
                pmon: format!("{}{}", prefix, sid),
                processes,
            })
        }
    }
}

/// Trait that all modules must implement
pub trait Module: Send + Sync {
    /// Returns the name of the module
    fn name(&self) -> &'static str;

    /// Returns a description of what the module does
    fn description(&self) -> &'static str;

    /// Alternative parameter names as `(alias, canonical)` pairs
    fn aliases(&self) -> &[(&'static str, &'static str)] {
        &[]
    }

    /// Returns the list of required parameters
    fn required_params(&self) -> &[&'static str] {
        &[]
    }

    /// Validate the parameters before execution
    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        let _ = params;
        Ok(())
    }

    /// Execute the module with the given parameters
    fn execute(&self, params: &ModuleParams, context: &ModuleContext)
        -> ModuleResult<ModuleOutput>;
}

/// Helper trait for extracting parameters
pub trait ParamExt {
    fn get_string(&self, key: &str) -> ModuleResult<Option<String>>;
    fn get_string_required(&self, key: &str) -> ModuleResult<String>;
    fn get_bool(&self, key: &str) -> ModuleResult<Option<bool>>;
    fn get_bool_or(&self, key: &str, default: bool) -> bool;
    fn get_vec_string(&self, key: &str) -> ModuleResult<Option<Vec<String>>>;
}

impl ParamExt for ModuleParams {
    fn get_string(&self, key: &str) -> ModuleResult<Option<String>> {
        match self.get(key) {
            Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
            Some(serde_json::Value::Null) | None => Ok(None),
            Some(v) => Ok(Some(v.to_string().trim_matches('"').to_string())),
        }
    }

    fn get_string_required(&self, key: &str) -> ModuleResult<String> {
        self.get_string(key)?
            .ok_or_else(|| ModuleError::MissingParameter(key.to_string()))
    }

    fn get_bool(&self, key: &str) -> ModuleResult<Option<bool>> {
        match self.get(key) {
            Some(serde_json::Value::Bool(b)) => Ok(Some(*b)),
            Some(serde_json::Value::String(s)) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(Some(true)),
                "false" | "no" | "0" | "off" => Ok(Some(false)),
                _ => Err(ModuleError::InvalidParameter(format!(
                    "{} must be a boolean",
                    key
                ))),
            },
            Some(serde_json::Value::Null) | None => Ok(None),
            Some(_) => Err(ModuleError::InvalidParameter(format!(
                "{} must be a boolean",
                key
            ))),
        }
    }

    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).ok().flatten().unwrap_or(default)
    }

    fn get_vec_string(&self, key: &str) -> ModuleResult<Option<Vec<String>>> {
        match self.get(key) {
            Some(serde_json::Value::Array(arr)) => Ok(Some(
                arr.iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => s.clone(),
                        v => v.to_string().trim_matches('"').to_string(),
                    })
                    .collect(),
            )),
            // A bare string is one column; function calls contain commas
            Some(serde_json::Value::String(s)) => Ok(Some(vec![s.clone()])),
            Some(serde_json::Value::Null) | None => Ok(None),
            Some(_) => Err(ModuleError::InvalidParameter(format!(
                "{} must be a list",
                key
            ))),
        }
    }
}

/// Prefix of the bookkeeping keys the automation host adds to arguments
const HOST_INTERNAL_PREFIX: &str = "_ansible_";

/// Registry for looking up modules by name
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Create a registry with all built-in modules
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(sqlplus::SqlplusModule));
        registry.register(Arc::new(table_dictionary::TableDictionaryModule));
        registry.register(Arc::new(table_list::TableListModule));
        registry
    }

    /// Register a module
    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.insert(module.name().to_string(), module);
    }

    /// Get a module by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.modules.get(name).cloned()
    }

    /// Check if a module exists
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Get all module names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Canonicalise raw arguments for `module`.
    ///
    /// Host bookkeeping keys are dropped (check mode is read from them) and
    /// aliases are renamed to their canonical parameter.
    fn prepare_params(module: &dyn Module, raw: &ModuleParams) -> ModuleResult<(ModuleParams, bool)> {
        let check_mode = matches!(
            raw.get("_ansible_check_mode"),
            Some(serde_json::Value::Bool(true))
        );

        let mut params = ModuleParams::new();
        for (key, value) in raw {
            if key.starts_with(HOST_INTERNAL_PREFIX) {
                continue;
            }
            let canonical = module
                .aliases()
                .iter()
                .find(|(alias, _)| *alias == key.as_str())
                .map_or(key.as_str(), |(_, canonical)| *canonical);

            if params.insert(canonical.to_string(), value.clone()).is_some() {
                return Err(ModuleError::InvalidParameter(format!(
                    "{} was given more than once (directly or through an alias)",
                    canonical
                )));
            }
        }
        Ok((params, check_mode))
    }

    /// Execute a module by name
    pub fn execute(
        &self,
        name: &str,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let module = self
            .get(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))?;

        let (params, host_check_mode) = Self::prepare_params(module.as_ref(), params)?;

        for param in module.required_params() {
            if !params.contains_key(*param) {
                return Err(ModuleError::MissingParameter((*param).to_string()));
            }
        }

        module.validate_params(&params)?;

        let context = if host_check_mode && !context.check_mode {
            context.clone().with_check_mode(true)
        } else {
            context.clone()
        };

        debug!(module = %name, check_mode = context.check_mode, "Executing module");
        module.execute(&params, &context)
    }

    /// Execute a module and always produce an envelope.
    pub fn run(&self, name: &str, params: &ModuleParams, context: &ModuleContext) -> ModuleOutput {
        self.execute(name, params, context).unwrap_or_else(|e| {
            let msg = match &e {
                ModuleError::Oracle(OracleError::Query { .. }) => "Query failed".to_string(),
                _ => "An error has occurred".to_string(),
            };
            ModuleOutput::from_error(msg, &e)
        })
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
