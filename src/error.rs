//! Error types for Orasible.
//!
//! This module defines the error kinds surfaced by the Oracle core: registry
//! lookups, SQL*Plus sessions and queries, the host-command guardrail, and
//! the plumbing errors around files and external processes.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Orasible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Message returned when SQL containing host commands is rejected.
pub const HOST_COMMANDS_DISABLED: &str = "Issuing commands to the host is disabled.";

/// The main error type for Orasible.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// The database identifier has no oratab entry.
    #[error("No oratab entry for {sid}")]
    DatabaseNotFound {
        /// Database identifier (ORACLE_SID)
        sid: String,
    },

    // ========================================================================
    // SQL*Plus Errors
    // ========================================================================
    /// SQL*Plus reported ORA-/SP2- style diagnostics.
    #[error("Query failed: {}", .diagnostics.join("; "))]
    Query {
        /// Diagnostic lines found in the output
        diagnostics: Vec<String>,
        /// Raw standard output
        stdout: String,
        /// Exit code of the SQL*Plus process
        exit_code: i32,
    },

    /// SQL*Plus wrote to stderr, usually a failure to start the session.
    #[error("SQL*Plus session failed with exit code {exit_code}: {}", .stderr.trim())]
    Session {
        /// Exit code of the SQL*Plus process
        exit_code: i32,
        /// Raw standard output
        stdout: String,
        /// Raw standard error
        stderr: String,
    },

    /// SQL text tried to run a command on the host.
    #[error("{}", HOST_COMMANDS_DISABLED)]
    HostCommandRejected,

    // ========================================================================
    // Argument and Shape Errors
    // ========================================================================
    /// Invalid argument passed to an operation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A requested column is not part of the result.
    #[error("Column '{column}' not found in {table}")]
    UnknownColumn {
        /// Requested column name
        column: String,
        /// Table being queried
        table: String,
    },

    /// A row did not carry one field per requested column.
    #[error("Expected {expected} fields but found {found} in row: {line}")]
    RowShape {
        /// Number of requested columns
        expected: usize,
        /// Number of fields parsed
        found: usize,
        /// Offending row text
        line: String,
    },

    // ========================================================================
    // Process and IO Errors
    // ========================================================================
    /// A helper command exited unsuccessfully.
    #[error("Command '{command}' failed with exit code {exit_code}: {}", .stderr.trim())]
    CommandFailed {
        /// Command line that was run
        command: String,
        /// Exit code
        exit_code: i32,
        /// Standard error
        stderr: String,
    },

    /// An external program could not be started.
    #[error("Failed to execute '{program}': {source}")]
    Spawn {
        /// Program name
        program: String,
        /// Source error
        #[source]
        source: std::io::Error,
    },

    /// Failed to read a file.
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Source error
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV row output.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Creates a new database-not-found error.
    pub fn database_not_found(sid: impl Into<String>) -> Self {
        Self::DatabaseNotFound { sid: sid.into() }
    }

    /// Creates a new IO error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short, stable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::DatabaseNotFound { .. } => "not_found",
            Error::Query { .. } => "query",
            Error::Session { .. } => "session",
            Error::HostCommandRejected => "guardrail",
            Error::InvalidArgument(_) | Error::UnknownColumn { .. } => "argument",
            Error::RowShape { .. } | Error::Csv(_) => "parse",
            Error::CommandFailed { .. } | Error::Spawn { .. } => "command",
            Error::Io { .. } => "io",
        }
    }

    /// Returns true for engine diagnostics that a caller may choose to ignore.
    pub fn is_query(&self) -> bool {
        matches!(self, Error::Query { .. })
    }

    /// Exit code reported in the module envelope.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Query { exit_code, .. }
            | Error::Session { exit_code, .. }
            | Error::CommandFailed { exit_code, .. } => {
                if *exit_code == 0 {
                    1
                } else {
                    *exit_code
                }
            }
            _ => 1,
        }
    }

    /// Raw stdout carried by the error, if any.
    pub fn stdout(&self) -> Option<&str> {
        match self {
            Error::Query { stdout, .. } | Error::Session { stdout, .. } => Some(stdout),
            _ => None,
        }
    }

    /// Text suitable for the envelope's `stderr` field.
    pub fn stderr(&self) -> String {
        match self {
            Error::Query { diagnostics, .. } => diagnostics.join("\n"),
            Error::Session { stderr, .. } | Error::CommandFailed { stderr, .. } => stderr.clone(),
            other => other.to_string(),
        }
    }
}
