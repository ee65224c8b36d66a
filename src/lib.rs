//! # Orasible - Oracle Database Modules for Ansible
//!
//! Orasible lets a playbook interrogate and change the Oracle instances on a
//! host. Each module is a short-lived process: read parameters, shell out to
//! `sqlplus`, `pgrep`/`ps` or read flat files, turn the text into structured
//! data, and answer with the JSON envelope the automation host expects.
//!
//! ## Core Concepts
//!
//! - **Oratab**: the registry mapping each SID to its Oracle home
//! - **Environment**: the variables a SQL*Plus session needs for one SID
//! - **Table queries**: PL/SQL cursor blocks that print rows as CSV
//! - **Result sets**: rows shaped as lists, flat records or keyed records
//! - **Modules**: `sqlplus`, `table_list` and `table_dictionary`
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │          CLI / Ansible binary-module entry point         │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │        Module Registry (params, envelope, aliases)       │
//! └──────────────────────────────────────────────────────────┘
//!          │                   │                    │
//!          ▼                   ▼                    ▼
//! ┌────────────────┐  ┌─────────────────┐  ┌──────────────────┐
//! │  Environment   │  │  Table queries  │  │ Process listing  │
//! │ (oratab + env) │  │   (SQL*Plus)    │  │  (pgrep + ps)    │
//! └────────────────┘  └─────────────────┘  └──────────────────┘
//!          │                   │                    │
//!          └───────────────────┼────────────────────┘
//!                              ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Command Runner                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use orasible::prelude::*;
//!
//! fn main() -> orasible::error::Result<()> {
//!     let runner = SystemRunner::new();
//!     let env = EnvironmentResolver::default().resolve("ORCL", &runner)?;
//!
//!     let query = TableQuery::new("v$database", ["name", "log_mode"]);
//!     let record = SqlPlus::new(&runner).fetch_flat(&query, &env)?;
//!
//!     println!("{:?}", record.get("LOG_MODE"));
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::config::{Config, LoggingConfig, OracleConfig};
    pub use crate::error::{Error, Result};
    pub use crate::modules::{
        Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleRegistry,
        ModuleResult, ModuleStatus, ParamExt,
    };
    pub use crate::oracle::{
        ensure_no_host_commands, find_processes, pmon_running, EnvironmentResolver,
        OracleEnvironment, Oratab, OratabEntry, ProcessFilter, ProcessInfo, Record, ResultSet,
        Scalar, SqlPlus, SqlPlusOutput, TableQuery,
    };
    pub use crate::runner::{CommandResult, CommandRunner, RunOptions, SystemRunner};
}

// ============================================================================
// Core
// ============================================================================

/// Error types shared by the Oracle core.
pub mod error;

/// External process execution behind the [`runner::CommandRunner`] trait.
///
/// Everything that shells out goes through this seam so modules can be
/// exercised against scripted output.
pub mod runner;

/// Oracle environment, table queries, SQL*Plus and process listing.
pub mod oracle;

// ============================================================================
// Module System
// ============================================================================

/// Ansible-facing modules and their response envelope.
///
/// # Example
///
/// ```rust,no_run
/// use orasible::modules::{ModuleContext, ModuleParams, ModuleRegistry};
///
/// let registry = ModuleRegistry::with_builtins();
/// let mut params = ModuleParams::new();
/// params.insert("sid".into(), serde_json::json!("ORCL"));
/// params.insert("sql".into(), serde_json::json!("SELECT COUNT(*) FROM v$session;"));
///
/// let output = registry.run("sqlplus", &params, &ModuleContext::default());
/// println!("{}", serde_json::to_string(&output).unwrap());
/// ```
pub mod modules;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration loading and merging.
///
/// Handles loading and merging configuration from multiple sources:
/// environment variables and config files.
pub mod config;

// ============================================================================
// Version Information
// ============================================================================

/// Returns the current version of Orasible.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
