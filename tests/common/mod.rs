//! Shared test utilities and fixtures for the Orasible test suite.
//!
//! This module provides:
//! - A scripted [`CommandRunner`] that answers by program name
//! - Oracle home fixtures (oratab, override file) in temporary directories
//! - Canned `pgrep`/`ps`/`DESC` output
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tempfile::TempDir;

use orasible::config::Config;
use orasible::error::{Error, Result};
use orasible::modules::ModuleContext;
use orasible::runner::{CommandResult, CommandRunner, RunOptions};

// ============================================================================
// Scripted Runner
// ============================================================================

/// One recorded invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    pub argv: Vec<String>,
    pub options: RunOptions,
}

impl Invocation {
    pub fn program(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }

    pub fn stdin(&self) -> &str {
        self.options.stdin.as_deref().unwrap_or("")
    }

    pub fn env(&self, key: &str) -> Option<&str> {
        self.options.env.get(key).map(String::as_str)
    }
}

/// A runner answering from per-program queues of scripted results.
///
/// Programs without a queued answer fail to spawn, like a missing binary.
///
/// # Example
///
/// ```rust,ignore
/// let runner = ScriptedRunner::new();
/// runner.push("sqlplus", CommandResult::success("42\n", ""));
///
/// let result = runner.run(&argv(["sqlplus", "-s", "/nolog"]), &RunOptions::new()).unwrap();
/// assert_eq!(result.stdout, "42\n");
/// assert_eq!(runner.count("sqlplus"), 1);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: RwLock<Vec<(String, VecDeque<CommandResult>)>>,
    invocations: RwLock<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result for the next call to `program`.
    pub fn push(&self, program: &str, result: CommandResult) -> &Self {
        let mut responses = self.responses.write();
        match responses.iter_mut().find(|(p, _)| p == program) {
            Some((_, queue)) => queue.push_back(result),
            None => responses.push((program.to_string(), VecDeque::from([result]))),
        }
        self
    }

    /// Queue the `pgrep`/`ps` answers for a host running `pmons`.
    pub fn push_pmons(&self, pmons: &[&str]) -> &Self {
        if pmons.is_empty() {
            return self.push("pgrep", CommandResult::failure(1, "", ""));
        }
        let pids: Vec<String> = (0..pmons.len()).map(|i| (1000 + i).to_string()).collect();
        self.push("pgrep", CommandResult::success(format!("{}\n", pids.join(",")), ""));
        self.push("ps", CommandResult::success(ps_output(pmons), ""))
    }

    /// All recorded invocations, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.read().clone()
    }

    /// Invocations of one program.
    pub fn calls(&self, program: &str) -> Vec<Invocation> {
        self.invocations
            .read()
            .iter()
            .filter(|i| i.program() == program)
            .cloned()
            .collect()
    }

    pub fn count(&self, program: &str) -> usize {
        self.calls(program).len()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, argv: &[String], options: &RunOptions) -> Result<CommandResult> {
        self.invocations.write().push(Invocation {
            argv: argv.to_vec(),
            options: options.clone(),
        });

        let program = argv.first().cloned().unwrap_or_default();
        let mut responses = self.responses.write();
        responses
            .iter_mut()
            .find(|(p, _)| *p == program)
            .and_then(|(_, queue)| queue.pop_front())
            .ok_or_else(|| Error::Spawn {
                program,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not scripted"),
            })
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// `ps h -o %p, -o %u, -o cmd` output for the given commands.
pub fn ps_output(commands: &[&str]) -> String {
    commands
        .iter()
        .enumerate()
        .map(|(i, cmd)| format!("{:>7},oracle  ,{}\n", 1000 + i, cmd))
        .collect()
}

/// SQL*Plus `DESC` output for the given column names.
pub fn desc_output(columns: &[&str]) -> String {
    let mut out = String::from(
        "\n Name                                      Null?    Type\n ----------------------------------------- -------- ----------------------------\n",
    );
    for column in columns {
        out.push_str(&format!(" {:<41}          VARCHAR2(64)\n", column));
    }
    out
}

/// Rows as the generated cursor block prints them: every field quoted.
pub fn csv_rows(rows: &[&[&str]]) -> String {
    rows.iter()
        .map(|row| {
            let fields: Vec<String> = row
                .iter()
                .map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
                .collect();
            format!("{}\n", fields.join(","))
        })
        .collect()
}

/// A temporary oratab with Oracle homes underneath it.
pub struct OracleFixture {
    pub dir: TempDir,
    pub oratab: PathBuf,
}

impl OracleFixture {
    /// Create an oratab listing `sids`, each with its own home directory.
    pub fn new(sids: &[&str]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut oratab = String::from("# oratab fixture\n#\n");
        for sid in sids {
            let home = dir.path().join(format!("{}_home", sid));
            fs::create_dir_all(&home).expect("Failed to create home");
            oratab.push_str(&format!("{}:{}:N\n", sid, home.display()));
        }
        let path = dir.path().join("oratab");
        fs::write(&path, oratab).expect("Failed to write oratab");
        Self { dir, oratab: path }
    }

    /// Home directory of `sid`.
    pub fn home(&self, sid: &str) -> PathBuf {
        self.dir.path().join(format!("{}_home", sid))
    }

    /// Write `{home}/{sid}.env`.
    pub fn write_override(&self, sid: &str, content: &str) -> PathBuf {
        let path = self.home(sid).join(format!("{}.env", sid));
        fs::write(&path, content).expect("Failed to write override file");
        path
    }

    /// Configuration pointing at this oratab with a fixed ORACLE_BASE.
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.oracle.oratab = self.oratab.clone();
        config.oracle.oracle_base = Some("/u01/app/oracle".to_string());
        config
    }

    /// Module context using `runner` and this fixture's configuration.
    pub fn context(&self, runner: &Arc<ScriptedRunner>) -> ModuleContext {
        ModuleContext::new()
            .with_runner(Arc::clone(runner) as Arc<dyn CommandRunner>)
            .with_config(self.config())
    }
}

/// Build module params from a JSON object literal.
pub fn params(value: serde_json::Value) -> orasible::modules::ModuleParams {
    match value {
        serde_json::Value::Object(map) => map.into_iter().collect(),
        other => panic!("params must be a JSON object, got {other}"),
    }
}

pub fn path_str(path: &Path) -> String {
    path.display().to_string()
}
