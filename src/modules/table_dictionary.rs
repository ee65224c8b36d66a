//! Table dictionary module - return a table as a mapping
//!
//! Without `column_as_key` the first row comes back as a flat
//! `column -> value` record, which suits single-row views such as
//! `v$database`. With it, every row is keyed by that column's value.
//!
//! The database name is upper-cased before the oratab lookup.

use tracing::debug;

use super::{Module, ModuleContext, ModuleOutput, ModuleParams, ModuleResult, ParamExt};
use crate::oracle::{ResultSet, TableQuery};

const MSG: &str = "Table returned as dictionary object";

/// Module returning a table as a dictionary
pub struct TableDictionaryModule;

impl Module for TableDictionaryModule {
    fn name(&self) -> &'static str {
        "table_dictionary"
    }

    fn description(&self) -> &'static str {
        "Return a table as a flat or keyed dictionary"
    }

    fn aliases(&self) -> &[(&'static str, &'static str)] {
        &[
            ("name", "database_name"),
            ("sid", "database_name"),
            ("table", "table_name"),
        ]
    }

    fn required_params(&self) -> &[&'static str] {
        &["database_name", "table_name"]
    }

    fn execute(&self, params: &ModuleParams, context: &ModuleContext) -> ModuleResult<ModuleOutput> {
        let database_name = params.get_string_required("database_name")?.to_uppercase();
        let table_name = params.get_string_required("table_name")?;
        let column_as_key = params.get_string("column_as_key")?;

        let env = context.resolve_environment(&database_name)?;
        context.ensure_instance_running(&database_name)?;

        let sqlplus = context.sqlplus();
        let columns: Vec<String> = sqlplus
            .describe(&table_name, &env)?
            .into_iter()
            .map(|c| c.name)
            .collect();
        debug!(table = %table_name, columns = columns.len(), "Described table");

        let query = TableQuery::new(table_name, columns);
        let resultset = match column_as_key {
            Some(key) => sqlplus.fetch_keyed(&query, &env, &key)?,
            None => ResultSet::Record(sqlplus.fetch_flat(&query, &env)?),
        };

        Ok(ModuleOutput::ok(MSG).with_rc(0).with_resultset(resultset))
    }
}
