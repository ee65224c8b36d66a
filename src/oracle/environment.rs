//! Environment resolution for Oracle client tools
//!
//! Given a database identifier, the resolver builds the process environment
//! that `sqlplus` and friends need:
//!
//! 1. the oratab entry supplies `ORACLE_HOME`;
//! 2. `PATH`, `ORACLE_HOME` and `ORACLE_SID` are derived from it;
//! 3. `ORACLE_BASE` comes from configuration or the `orabase` helper;
//! 4. an optional `{ORACLE_HOME}/{SID}.env` file is layered on top.
//!
//! The oratab and override files are read fresh on every call.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::lines::strip_comments;
use super::oratab::{Oratab, DEFAULT_ORATAB};
use crate::config::OracleConfig;
use crate::error::{Error, Result};
use crate::runner::{CommandRunner, RunOptions};

/// `KEY=value` with a POSIX variable name and a non-empty value
static POSIX_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)=(.+)$").expect("Invalid assignment regex")
});

/// `export` keyword preceding an assignment
static EXPORT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^export\s+").expect("Invalid export regex"));

/// System directories appended after the Oracle home directories in `PATH`
const SYSTEM_PATH: [&str; 3] = ["/usr/local/bin", "/usr/bin", "/bin"];

/// Oracle home subdirectories placed at the front of `PATH`, in order
const HOME_PATH_DIRS: [&str; 4] = ["srvm/admin", "perl/bin", "OPatch", "bin"];

/// Tokens in an override `PATH` that refer to the existing value
const PATH_SELF_REFERENCES: [&str; 2] = ["$PATH", "${PATH}"];

/// Process environment for one database
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OracleEnvironment {
    vars: IndexMap<String, String>,
}

impl OracleEnvironment {
    /// Derive the default environment for a database home.
    pub fn for_home(sid: &str, oracle_home: &Path) -> Self {
        let home = oracle_home.display().to_string();
        let path = HOME_PATH_DIRS
            .iter()
            .map(|dir| format!("{}/{}", home, dir))
            .chain(SYSTEM_PATH.iter().map(|dir| (*dir).to_string()))
            .collect::<Vec<_>>()
            .join(":");

        let mut vars = IndexMap::new();
        vars.insert("PATH".to_string(), path);
        vars.insert("ORACLE_HOME".to_string(), home);
        vars.insert("ORACLE_SID".to_string(), sid.to_string());
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn path(&self) -> Option<&str> {
        self.get("PATH")
    }

    pub fn oracle_home(&self) -> Option<&str> {
        self.get("ORACLE_HOME")
    }

    pub fn oracle_sid(&self) -> Option<&str> {
        self.get("ORACLE_SID")
    }

    pub fn oracle_base(&self) -> Option<&str> {
        self.get("ORACLE_BASE")
    }

    /// All variables in insertion order.
    pub fn vars(&self) -> &IndexMap<String, String> {
        &self.vars
    }

    /// Set a variable, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Apply one override assignment.
    ///
    /// `PATH` is extended rather than replaced; every other key overwrites.
    pub fn apply_override(&mut self, key: &str, value: &str) {
        if key != "PATH" {
            self.set(key, value);
            return;
        }

        let extra: Vec<&str> = value
            .split(':')
            .filter(|part| !part.is_empty() && !PATH_SELF_REFERENCES.contains(part))
            .collect();
        if extra.is_empty() {
            return;
        }

        let path = self.vars.entry("PATH".to_string()).or_default();
        if !path.is_empty() {
            path.push(':');
        }
        path.push_str(&extra.join(":"));
    }

    /// Run options carrying this environment.
    pub fn to_run_options(&self) -> RunOptions {
        RunOptions::new().with_envs(self.vars.clone())
    }
}

/// Parse the assignments of a per-database override file.
///
/// Lines are comment-stripped; only `[export ]KEY=value` lines with a
/// non-empty value are kept, and double quotes are removed from values.
pub fn parse_override(text: &str) -> Vec<(String, String)> {
    strip_comments(text)
        .filter_map(|line| {
            let line = EXPORT_PREFIX.replace(line, "");
            let caps = POSIX_ASSIGNMENT.captures(&line)?;
            Some((caps[1].to_string(), caps[2].replace('"', "")))
        })
        .collect()
}

/// Builds [`OracleEnvironment`]s from the oratab registry.
#[derive(Debug, Clone)]
pub struct EnvironmentResolver {
    oratab: PathBuf,
    oracle_base: Option<String>,
    orabase_command: String,
}

impl Default for EnvironmentResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ORATAB)
    }
}

impl EnvironmentResolver {
    /// Create a resolver reading the given oratab file
    pub fn new(oratab: impl Into<PathBuf>) -> Self {
        Self {
            oratab: oratab.into(),
            oracle_base: None,
            orabase_command: "orabase".to_string(),
        }
    }

    /// Create a resolver from configuration
    pub fn from_config(config: &OracleConfig) -> Self {
        Self {
            oratab: config.oratab.clone(),
            oracle_base: config.oracle_base.clone(),
            orabase_command: config.orabase_command.clone(),
        }
    }

    /// Use a fixed ORACLE_BASE instead of asking `orabase`
    pub fn with_oracle_base(mut self, oracle_base: impl Into<String>) -> Self {
        self.oracle_base = Some(oracle_base.into());
        self
    }

    /// Resolve the environment for `sid`.
    ///
    /// Fails with [`Error::DatabaseNotFound`] when the oratab has no entry.
    pub fn resolve(&self, sid: &str, runner: &dyn CommandRunner) -> Result<OracleEnvironment> {
        let oratab = Oratab::load(&self.oratab)?;
        let entry = oratab
            .get(sid)
            .ok_or_else(|| Error::database_not_found(sid))?;

        let mut env = OracleEnvironment::for_home(sid, &entry.oracle_home);

        match &self.oracle_base {
            Some(base) => env.set("ORACLE_BASE", base.clone()),
            None => {
                if let Some(base) = self.discover_oracle_base(&env, runner) {
                    env.set("ORACLE_BASE", base);
                }
            }
        }

        let override_file = entry.oracle_home.join(format!("{}.env", sid));
        if override_file.is_file() {
            let text = std::fs::read_to_string(&override_file)
                .map_err(|e| Error::io(&override_file, e))?;
            let assignments = parse_override(&text);
            debug!(file = %override_file.display(), count = assignments.len(), "Applying environment overrides");
            for (key, value) in &assignments {
                env.apply_override(key, value);
            }
        }

        debug!(sid = %sid, oracle_home = %entry.oracle_home.display(), "Resolved Oracle environment");
        Ok(env)
    }

    fn discover_oracle_base(
        &self,
        env: &OracleEnvironment,
        runner: &dyn CommandRunner,
    ) -> Option<String> {
        let argv = vec![self.orabase_command.clone()];
        match runner.run(&argv, &env.to_run_options()) {
            Ok(result) if result.success => {
                let base = result.stdout.trim();
                (!base.is_empty()).then(|| base.to_string())
            }
            Ok(result) => {
                debug!(exit_code = result.exit_code, "orabase did not report ORACLE_BASE");
                None
            }
            Err(e) => {
                warn!(error = %e, "Unable to run orabase");
                None
            }
        }
    }
}
