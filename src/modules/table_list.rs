//! Table list module - return table rows as lists

use tracing::debug;

use super::{Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleResult, ParamExt};
use crate::oracle::TableQuery;

/// Module returning selected columns of a table as a list of rows
pub struct TableListModule;

impl TableListModule {
    fn build_query(params: &ModuleParams) -> ModuleResult<TableQuery> {
        let table = params.get_string_required("table")?;
        let columns = params
            .get_vec_string("columns")?
            .ok_or_else(|| ModuleError::MissingParameter("columns".to_string()))?;

        let mut query = TableQuery::new(table, columns);
        if let Some(predicate) = params.get_string("where")? {
            query = query.with_predicate(predicate);
        }
        Ok(query)
    }
}

impl Module for TableListModule {
    fn name(&self) -> &'static str {
        "table_list"
    }

    fn description(&self) -> &'static str {
        "Return table rows as a list"
    }

    fn aliases(&self) -> &[(&'static str, &'static str)] {
        &[
            ("name", "database_name"),
            ("sid", "database_name"),
            ("table_name", "table"),
            ("table_columns", "columns"),
        ]
    }

    fn required_params(&self) -> &[&'static str] {
        &["database_name", "table", "columns"]
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        params.get_bool("flatten")?;
        Self::build_query(params)?
            .render()
            .map(|_| ())
            .map_err(|e| ModuleError::InvalidParameter(e.to_string()))
    }

    fn execute(&self, params: &ModuleParams, context: &ModuleContext) -> ModuleResult<ModuleOutput> {
        let database_name = params.get_string_required("database_name")?;
        let flatten = params.get_bool_or("flatten", false);
        let query = Self::build_query(params)?;

        let env = context.resolve_environment(&database_name)?;
        context.ensure_instance_running(&database_name)?;

        let resultset = context.sqlplus().fetch_list(&query, &env, flatten)?;
        debug!(table = %query.table, rows = resultset.len(), flatten, "Table listed");

        let msg = if resultset.is_empty() {
            "no rows selected"
        } else {
            "Table returned as list"
        };
        Ok(ModuleOutput::ok(msg).with_rc(0).with_resultset(resultset))
    }
}
