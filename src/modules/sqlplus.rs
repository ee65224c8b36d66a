//! SQL*Plus module - run free-form SQL against a local instance
//!
//! The script is rejected before anything runs if it tries to reach the
//! host (`!cmd`, `HOST cmd`). Diagnostics fail the task unless
//! `ignore_errors` is set.

use std::path::PathBuf;
use tracing::debug;

use super::{Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleResult, ParamExt};
use crate::error::Error;
use crate::oracle::{ensure_no_host_commands, ResultSet};

const MSG: &str = "Oracle SQL*Plus for Ansible";

/// Module for running SQL*Plus scripts
pub struct SqlplusModule;

impl Module for SqlplusModule {
    fn name(&self) -> &'static str {
        "sqlplus"
    }

    fn description(&self) -> &'static str {
        "Run SQL through SQL*Plus as SYSDBA on a local instance"
    }

    fn aliases(&self) -> &[(&'static str, &'static str)] {
        &[("name", "database_name"), ("sid", "database_name")]
    }

    fn required_params(&self) -> &[&'static str] {
        &["database_name", "sql"]
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        let sql = params.get_string_required("sql")?;
        if sql.trim().is_empty() {
            return Err(ModuleError::InvalidParameter(
                "sql cannot be empty".to_string(),
            ));
        }
        params.get_bool("raw")?;
        params.get_bool("ignore_errors")?;
        Ok(())
    }

    fn execute(&self, params: &ModuleParams, context: &ModuleContext) -> ModuleResult<ModuleOutput> {
        let database_name = params.get_string_required("database_name")?;
        let sql = params.get_string_required("sql")?;
        let raw = params.get_bool_or("raw", false);
        let ignore_errors = params.get_bool_or("ignore_errors", false);
        let chdir = params.get_string("chdir")?.map(PathBuf::from);

        ensure_no_host_commands(&sql)?;

        if context.check_mode {
            return Ok(ModuleOutput::skipped(format!(
                "Would run {} line(s) of SQL against {}",
                sql.lines().count(),
                database_name
            )));
        }

        let env = context.resolve_environment(&database_name)?;
        let output = context.sqlplus().execute(&sql, &env, chdir.as_deref())?;

        if output.has_errors() && !ignore_errors {
            return Err(Error::Query {
                diagnostics: output.diagnostics,
                stdout: output.stdout,
                exit_code: output.exit_code,
            }
            .into());
        }

        debug!(sid = %database_name, raw, errors = output.diagnostics.len(), "SQL*Plus finished");

        let resultset = if raw {
            ResultSet::Raw(output.stdout.clone())
        } else {
            ResultSet::Scalar(output.coerced())
        };

        Ok(ModuleOutput::ok(MSG)
            .with_rc(output.exit_code)
            .with_stderr(output.diagnostics_text())
            .with_resultset(resultset))
    }
}
