//! Oracle core for Orasible
//!
//! This module provides the pieces the Oracle modules are built from:
//!
//! - `oratab`: the registry mapping a SID to its Oracle home
//! - `environment`: process environment resolution (`oraenv`)
//! - `query`: table queries rendered as PL/SQL blocks
//! - `sqlplus`: SQL*Plus sessions, diagnostics and the host-command guardrail
//! - `value`: coercion of output text and result shaping
//! - `process`: process listing and the PMON gate
//!
//! # Example
//!
//! ```rust,no_run
//! use orasible::oracle::{EnvironmentResolver, SqlPlus, TableQuery};
//! use orasible::runner::SystemRunner;
//!
//! let runner = SystemRunner::new();
//! let env = EnvironmentResolver::new("/etc/oratab").resolve("ORCL", &runner)?;
//! let record = SqlPlus::new(&runner).fetch_flat(
//!     &TableQuery::new("v$database", ["name", "log_mode"]),
//!     &env,
//! )?;
//! println!("{:?}", record.get("LOG_MODE"));
//! # Ok::<(), orasible::error::Error>(())
//! ```

pub mod environment;
pub mod lines;
pub mod oratab;
pub mod process;
pub mod query;
pub mod sqlplus;
pub mod value;

pub use environment::{parse_override, EnvironmentResolver, OracleEnvironment};
pub use oratab::{Oratab, OratabEntry, DEFAULT_ORATAB};
pub use process::{find_processes, pmon_running, ProcessFilter, ProcessInfo, DEFAULT_PMON_PREFIX};
pub use query::{FieldSpec, RenderedQuery, TableQuery};
pub use sqlplus::{ensure_no_host_commands, DescribedColumn, SqlPlus, SqlPlusOutput, DEFAULT_SQLPLUS};
pub use value::{Record, ResultSet, Scalar};
