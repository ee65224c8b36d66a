//! SQL*Plus invocation and output handling
//!
//! Every call starts `sqlplus -s /nolog` once, feeds the script on stdin and
//! waits for it to exit. Engine errors (`ORA-00942`, `SP2-0734`, ...) are
//! usually printed to stdout, so both streams are scanned for them; any
//! other text on stderr means the session itself could not be established.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, warn};

use super::environment::OracleEnvironment;
use super::query::TableQuery;
use super::value::{coerce_rows, parse_rows, shape_keyed, shape_record, shape_rows, Record, ResultSet, Scalar};
use crate::error::{Error, Result};
use crate::runner::CommandRunner;

/// Diagnostic codes: `SP2-0734:` style and `ORA-00942:` style
static DIAGNOSTIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)[A-Z]{2}\d-\d{4}:.*|[A-Z]{3}-\d{5,}:.*").expect("Invalid diagnostic regex")
});

/// Diagnostic codes plus the `*`/`ERROR at line N:` marker SQL*Plus prints
static DIAGNOSTIC_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)\*\nERROR at line \d+:|[A-Z]{2}\d-\d{4}:.*|[A-Z]{3}-\d{5,}:.*")
        .expect("Invalid diagnostic marker regex")
});

/// Lines that would run a command on the host (`!cmd`, `HOST cmd` and its
/// `HO`/`HOS` abbreviations)
static HOST_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*(!|ho(s|st)?\b)").expect("Invalid host command regex"));

/// Default SQL*Plus executable
pub const DEFAULT_SQLPLUS: &str = "sqlplus";

/// Reject scripts containing host-escape directives.
///
/// Only free-form scripts go through this check; generated table queries
/// never contain host commands.
pub fn ensure_no_host_commands(sql: &str) -> Result<()> {
    if HOST_COMMAND.is_match(sql) {
        warn!("Rejected SQL containing host commands");
        return Err(Error::HostCommandRejected);
    }
    Ok(())
}

/// All diagnostic lines found in `output`.
pub fn find_diagnostics(output: &str) -> Vec<String> {
    DIAGNOSTIC
        .find_iter(output)
        .map(|m| m.as_str().trim_end().to_string())
        .collect()
}

/// `output` with diagnostic codes and error markers removed.
pub fn strip_diagnostics(output: &str) -> String {
    DIAGNOSTIC_MARKERS.replace_all(output, "").into_owned()
}

/// Output of one SQL*Plus session that did not fail to start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlPlusOutput {
    pub exit_code: i32,
    pub stdout: String,
    /// Diagnostic lines found in stdout
    pub diagnostics: Vec<String>,
}

impl SqlPlusOutput {
    /// Classify raw stdout.
    pub fn from_stdout(exit_code: i32, stdout: String) -> Self {
        let diagnostics = find_diagnostics(&stdout);
        Self {
            exit_code,
            stdout,
            diagnostics,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Fail with [`Error::Query`] when diagnostics were reported.
    pub fn into_checked(self) -> Result<Self> {
        if self.has_errors() {
            return Err(Error::Query {
                diagnostics: self.diagnostics,
                stdout: self.stdout,
                exit_code: self.exit_code,
            });
        }
        Ok(self)
    }

    /// Stdout with diagnostic markers removed.
    pub fn cleaned(&self) -> String {
        strip_diagnostics(&self.stdout)
    }

    /// Cleaned stdout coerced as a single value.
    ///
    /// `SELECT COUNT(*) FROM v$session;` comes back as an integer.
    pub fn coerced(&self) -> Scalar {
        Scalar::coerce(&self.cleaned())
    }

    /// Diagnostics joined one per line.
    pub fn diagnostics_text(&self) -> String {
        self.diagnostics.join("\n")
    }
}

/// Column reported by `DESC`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribedColumn {
    pub name: String,
    pub nullable: bool,
    pub data_type: String,
}

/// Parse `DESC table` output into columns.
///
/// ```text
///  Name                                      Null?    Type
///  ----------------------------------------- -------- ----------------
///  DBID                                               NUMBER
///  NAME                                      NOT NULL VARCHAR2(9)
/// ```
pub fn parse_describe(output: &str) -> Vec<DescribedColumn> {
    output
        .lines()
        .skip_while(|line| !line.trim_start().starts_with('-'))
        .skip(1)
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let name = tokens.next()?;
            let rest: Vec<&str> = tokens.collect();
            let (nullable, type_tokens) = match rest.as_slice() {
                ["NOT", "NULL", tail @ ..] => (false, tail),
                tail => (true, tail),
            };
            Some(DescribedColumn {
                name: name.to_string(),
                nullable,
                data_type: type_tokens.join(" "),
            })
        })
        .collect()
}

/// SQL*Plus bound to a command runner
pub struct SqlPlus<'a> {
    runner: &'a dyn CommandRunner,
    binary: String,
}

impl<'a> SqlPlus<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            binary: DEFAULT_SQLPLUS.to_string(),
        }
    }

    /// Use a different SQL*Plus executable
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    fn argv(&self) -> Vec<String> {
        vec![self.binary.clone(), "-s".to_string(), "/nolog".to_string()]
    }

    /// Run `sql` in one session.
    ///
    /// Fails with [`Error::Session`] when stderr carries anything other
    /// than engine diagnostics. Diagnostics from either stream are returned
    /// in the output, not raised, so the caller can decide whether to
    /// ignore them.
    pub fn execute(
        &self,
        sql: &str,
        env: &OracleEnvironment,
        cwd: Option<&Path>,
    ) -> Result<SqlPlusOutput> {
        let mut options = env.to_run_options().with_stdin(sql);
        if let Some(cwd) = cwd {
            options = options.with_cwd(cwd);
        }

        debug!(sid = ?env.oracle_sid(), bytes = sql.len(), "Starting SQL*Plus session");
        let result = self.runner.run(&self.argv(), &options)?;

        let stderr_diagnostics = find_diagnostics(&result.stderr);
        if !result.stderr.trim().is_empty() && stderr_diagnostics.is_empty() {
            return Err(Error::Session {
                exit_code: result.exit_code,
                stdout: result.stdout,
                stderr: result.stderr,
            });
        }

        let mut output = SqlPlusOutput::from_stdout(result.exit_code, result.stdout);
        output.diagnostics.extend(stderr_diagnostics);
        if output.has_errors() {
            debug!(count = output.diagnostics.len(), "SQL*Plus reported diagnostics");
        }
        Ok(output)
    }

    /// Run caller-supplied SQL after the host-command check.
    pub fn run_script(
        &self,
        sql: &str,
        env: &OracleEnvironment,
        cwd: Option<&Path>,
    ) -> Result<SqlPlusOutput> {
        ensure_no_host_commands(sql)?;
        self.execute(sql, env, cwd)
    }

    /// Column names and types of `table`.
    pub fn describe(&self, table: &str, env: &OracleEnvironment) -> Result<Vec<DescribedColumn>> {
        let sql = format!("CONN / AS SYSDBA\nDESC {}\nEXIT\n", table.trim());
        let output = self.execute(&sql, env, None)?.into_checked()?;
        let columns = parse_describe(&output.stdout);
        if columns.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "no columns described for {}",
                table
            )));
        }
        Ok(columns)
    }

    /// Run a table query and return its column names and coerced rows.
    pub fn fetch_rows(
        &self,
        query: &TableQuery,
        env: &OracleEnvironment,
        cwd: Option<&Path>,
    ) -> Result<(Vec<String>, Vec<Vec<Scalar>>)> {
        let rendered = query.render()?;
        let output = self.execute(&rendered.sql, env, cwd)?.into_checked()?;
        let columns = rendered.column_names();
        let rows = parse_rows(&output.stdout, columns.len())?;
        debug!(table = %query.table, rows = rows.len(), "Fetched table rows");
        Ok((columns, coerce_rows(&rows)))
    }

    /// First row of the query as a record (empty when no rows).
    pub fn fetch_flat(&self, query: &TableQuery, env: &OracleEnvironment) -> Result<Record> {
        let (columns, rows) = self.fetch_rows(query, env, None)?;
        if rows.len() > 1 {
            warn!(table = %query.table, rows = rows.len(), "Flat fetch returned several rows, using the first");
        }
        Ok(rows
            .first()
            .map(|row| shape_record(&columns, row))
            .unwrap_or_default())
    }

    /// All rows as lists, flattened into one list when `flatten` is set.
    pub fn fetch_list(
        &self,
        query: &TableQuery,
        env: &OracleEnvironment,
        flatten: bool,
    ) -> Result<ResultSet> {
        let (_, rows) = self.fetch_rows(query, env, None)?;
        Ok(shape_rows(rows, flatten))
    }

    /// Rows keyed by the value of `key_column`; the last row wins per key.
    pub fn fetch_keyed(
        &self,
        query: &TableQuery,
        env: &OracleEnvironment,
        key_column: &str,
    ) -> Result<ResultSet> {
        let (columns, rows) = self.fetch_rows(query, env, None)?;
        shape_keyed(&columns, &rows, key_column)
            .map(ResultSet::Keyed)
            .ok_or_else(|| Error::UnknownColumn {
                column: key_column.to_string(),
                table: query.table.clone(),
            })
    }
}
