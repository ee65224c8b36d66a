//! External process execution
//!
//! Everything Orasible learns about a database comes from running a program
//! (`sqlplus`, `orabase`, `pgrep`, `ps`) and reading its output. The
//! [`CommandRunner`] trait is the single seam for that, so the resolver and
//! the query bridge can be driven by scripted output in tests.

use indexmap::IndexMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Result of running an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Exit code of the command (0 typically indicates success).
    pub exit_code: i32,
    /// Content written to standard output.
    pub stdout: String,
    /// Content written to standard error.
    pub stderr: String,
    /// Convenience flag: `true` if `exit_code == 0`.
    pub success: bool,
}

impl CommandResult {
    /// Create a new successful command result
    pub fn success(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: stderr.into(),
            success: true,
        }
    }

    /// Create a new failed command result
    pub fn failure(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            success: false,
        }
    }
}

/// Options for a single command invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Variables layered on top of the inherited environment
    pub env: IndexMap<String, String>,
    /// Text fed to the command's standard input
    pub stdin: Option<String>,
    /// Working directory for the command
    pub cwd: Option<PathBuf>,
}

impl RunOptions {
    /// Create new run options
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Add several environment variables
    pub fn with_envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the standard input
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    /// Set the working directory
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

/// Capability to run an external program and capture its output.
///
/// A non-zero exit status is reported through [`CommandResult`], not as an
/// error; only failing to start the program is an error.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    /// Run `argv[0]` with the remaining arguments.
    fn run(&self, argv: &[String], options: &RunOptions) -> Result<CommandResult>;
}

/// Runs commands on the local host with `std::process`.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new system runner
    pub fn new() -> Self {
        Self
    }

    /// Locate the program using the PATH the command will run with.
    fn resolve_program(program: &str, options: &RunOptions) -> PathBuf {
        if program.contains('/') {
            return PathBuf::from(program);
        }

        let Some(search_path) = options.env.get("PATH") else {
            return PathBuf::from(program);
        };

        let cwd = options
            .cwd
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("/"));

        which::which_in(program, Some(search_path), cwd).unwrap_or_else(|_| PathBuf::from(program))
    }

    fn build_command(argv: &[String], options: &RunOptions) -> Result<Command> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::InvalidArgument("command cannot be empty".to_string()))?;

        let mut cmd = Command::new(Self::resolve_program(program, options));
        cmd.args(args);

        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }

        cmd.envs(&options.env);

        cmd.stdin(if options.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

        Ok(cmd)
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String], options: &RunOptions) -> Result<CommandResult> {
        debug!(command = %shell_words::join(argv), cwd = ?options.cwd, "Executing command");

        let mut cmd = Self::build_command(argv, options)?;
        let program = argv[0].clone();

        let mut child = cmd.spawn().map_err(|source| Error::Spawn {
            program: program.clone(),
            source,
        })?;

        // Feed stdin from its own thread so a chatty child cannot block on a
        // full stdout pipe while we are still writing.
        let stdin_pipe = child.stdin.take();
        let output = std::thread::scope(|s| {
            if let (Some(mut pipe), Some(input)) = (stdin_pipe, options.stdin.as_deref()) {
                s.spawn(move || {
                    if let Err(e) = pipe.write_all(input.as_bytes()) {
                        debug!(error = %e, "Failed to write command stdin");
                    }
                });
            }
            child.wait_with_output()
        })
        .map_err(|source| Error::Spawn { program, source })?;

        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        trace!(exit_code = %exit_code, stdout_len = %stdout.len(), stderr_len = %stderr.len(), "Command completed");

        if output.status.success() {
            Ok(CommandResult::success(stdout, stderr))
        } else {
            Ok(CommandResult::failure(exit_code, stdout, stderr))
        }
    }
}

/// Build an argv vector from string slices.
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}
