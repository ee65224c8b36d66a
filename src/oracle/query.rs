//! Table queries rendered as SQL*Plus scripts
//!
//! A [`TableQuery`] names a table, its column expressions and an optional
//! filter. Rendering produces an anonymous PL/SQL block that walks a cursor
//! and prints each row as one CSV line through `DBMS_OUTPUT`, together with
//! the ordered list of output fields the parser zips values against.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write as _;

use crate::error::{Error, Result};

/// Unquoted Oracle identifier usable as a cursor field reference
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_$#]*$").expect("Invalid identifier regex"));

/// Maximum length of one `DBMS_OUTPUT` line
const OUTPUT_BUFFER: usize = 32767;

/// One field emitted by a rendered query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Column expression as written by the caller
    pub expression: String,
    /// Name the field is referenced and reported by (upper case)
    pub alias: String,
}

impl FieldSpec {
    /// Split a column expression into expression and alias.
    ///
    /// The alias is the last whitespace-delimited token (`AS` optional), so
    /// `SUBSTR(owner, 1, 20) owner` reports as `OWNER`. Computed expressions
    /// without an alias are rejected: their output could not be named.
    pub fn parse(expression: &str) -> Result<Self> {
        let expression = expression.trim();
        let alias = expression.split_whitespace().last().ok_or_else(|| {
            Error::InvalidArgument("column expression cannot be empty".to_string())
        })?;

        if alias == "*" {
            return Err(Error::InvalidArgument(
                "'*' is not supported, list the columns explicitly".to_string(),
            ));
        }

        if !IDENTIFIER.is_match(alias) {
            return Err(Error::InvalidArgument(format!(
                "column '{}' needs an alias, e.g. '{} col_name'",
                expression, expression
            )));
        }

        Ok(Self {
            expression: expression.to_string(),
            alias: alias.to_uppercase(),
        })
    }

    /// Cursor field reference, CSV-quoted for output.
    fn output_term(&self) -> String {
        format!(
            "'\"'||REPLACE(query_row.{}, '\"', '\"\"')||'\"'",
            self.alias
        )
    }
}

/// A request for the contents of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    /// Table or view name
    pub table: String,
    /// Column expressions, in output order
    pub columns: Vec<String>,
    /// Optional `WHERE` clause body
    pub predicate: Option<String>,
}

impl TableQuery {
    pub fn new<I, S>(table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            predicate: None,
        }
    }

    /// Add a filter predicate
    pub fn with_predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    /// Output fields in column order.
    pub fn fields(&self) -> Result<Vec<FieldSpec>> {
        if self.columns.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one column is required".to_string(),
            ));
        }
        self.columns.iter().map(|c| FieldSpec::parse(c)).collect()
    }

    /// Render the SQL*Plus script for this query.
    pub fn render(&self) -> Result<RenderedQuery> {
        if self.table.trim().is_empty() {
            return Err(Error::InvalidArgument("table name cannot be empty".to_string()));
        }

        let fields = self.fields()?;

        let select_list = fields
            .iter()
            .map(|f| f.expression.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut cursor = format!(
            "CURSOR query_data IS\n        SELECT {}\n          FROM {}",
            select_list,
            self.table.trim()
        );
        if let Some(predicate) = self.predicate.as_deref().filter(|p| !p.trim().is_empty()) {
            let _ = write!(cursor, "\n         WHERE {}", predicate.trim());
        }

        let output = fields
            .iter()
            .map(FieldSpec::output_term)
            .collect::<Vec<_>>()
            .join("||','||");

        let sql = format!(
            "CONN / AS SYSDBA
SET LINES {buffer} PAGES 0 FEEDBACK OFF
SET SERVEROUTPUT ON SIZE UNLIMITED FORMAT WRAPPED
DECLARE
    {cursor};
    l_output VARCHAR2({buffer});
BEGIN
    FOR query_row IN query_data LOOP
        l_output := {output};
        DBMS_OUTPUT.put_line(l_output);
    END LOOP;
END;
/
EXIT
",
            cursor = cursor,
            buffer = OUTPUT_BUFFER,
            output = output,
        );

        Ok(RenderedQuery { sql, fields })
    }
}

/// SQL text plus the fields it emits, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedQuery {
    pub sql: String,
    pub fields: Vec<FieldSpec>,
}

impl RenderedQuery {
    /// Output column names in emission order.
    pub fn column_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.alias.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_plain_column() {
        let field = FieldSpec::parse("pdb_name").unwrap();
        assert_eq!(field.expression, "pdb_name");
        assert_eq!(field.alias, "PDB_NAME");
    }

    #[test]
    fn test_field_function_with_alias() {
        let field = FieldSpec::parse("SUBSTR(owner, 1, 20) owner").unwrap();
        assert_eq!(field.expression, "SUBSTR(owner, 1, 20) owner");
        assert_eq!(field.alias, "OWNER");

        let field = FieldSpec::parse("COUNT(*) AS total").unwrap();
        assert_eq!(field.alias, "TOTAL");
    }

    #[test]
    fn test_field_without_alias_rejected() {
        assert!(matches!(
            FieldSpec::parse("SUBSTR(owner, 1, 20)"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            FieldSpec::parse("COUNT(*)"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(FieldSpec::parse("*"), Err(Error::InvalidArgument(_))));
        assert!(matches!(FieldSpec::parse("  "), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_render_basic() {
        let rendered = TableQuery::new("v$database", ["name", "log_mode"])
            .render()
            .unwrap();

        assert!(rendered.sql.starts_with("CONN / AS SYSDBA\n"));
        assert!(rendered.sql.contains("SELECT name, log_mode\n          FROM v$database;"));
        assert!(rendered.sql.contains(
            "l_output := '\"'||REPLACE(query_row.NAME, '\"', '\"\"')||'\"'||','||'\"'||REPLACE(query_row.LOG_MODE, '\"', '\"\"')||'\"';"
        ));
        assert!(rendered.sql.contains("DBMS_OUTPUT.put_line(l_output);"));
        assert!(rendered.sql.trim_end().ends_with("/\nEXIT"));
        assert_eq!(rendered.column_names(), vec!["NAME", "LOG_MODE"]);
    }

    #[test]
    fn test_render_line_width_fits_buffer() {
        let rendered = TableQuery::new("v$parameter", ["name", "value"])
            .render()
            .unwrap();

        assert!(rendered.sql.contains("SET LINES 32767 PAGES 0 FEEDBACK OFF\n"));
        assert!(rendered
            .sql
            .contains("SET SERVEROUTPUT ON SIZE UNLIMITED FORMAT WRAPPED\n"));
        assert!(rendered.sql.contains("l_output VARCHAR2(32767);"));
        assert!(!rendered.sql.contains("LINES 1000"));
    }

    #[test]
    fn test_render_with_predicate() {
        let rendered = TableQuery::new("dba_objects", ["owner", "object_name"])
            .with_predicate("status != 'VALID'")
            .render()
            .unwrap();

        assert!(rendered
            .sql
            .contains("FROM dba_objects\n         WHERE status != 'VALID';"));
    }

    #[test]
    fn test_render_blank_predicate_ignored() {
        let rendered = TableQuery::new("dual", ["dummy"])
            .with_predicate("   ")
            .render()
            .unwrap();
        assert!(!rendered.sql.contains("WHERE"));
    }

    #[test]
    fn test_render_keeps_column_order() {
        let rendered = TableQuery::new(
            "dba_objects",
            ["SUBSTR(object_type, 1, 15) obj_type", "created", "owner"],
        )
        .render()
        .unwrap();
        assert_eq!(rendered.column_names(), vec!["OBJ_TYPE", "CREATED", "OWNER"]);
    }

    #[test]
    fn test_render_requires_columns_and_table() {
        let empty: [&str; 0] = [];
        assert!(TableQuery::new("dual", empty).render().is_err());
        assert!(TableQuery::new(" ", ["dummy"]).render().is_err());
    }
}
