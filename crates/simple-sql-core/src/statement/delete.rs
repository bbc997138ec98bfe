//! DELETE statements.

use super::{compiled, plain_names, pushed_clause, Statement};
use crate::driver::Driver;
use crate::error::Result;
use crate::syntax::WhereSyntax;
use crate::value::SqlSyntax;

/// DELETE clause state.
#[derive(Debug)]
pub struct Delete {
    table: String,
    by_columns: Option<WhereSyntax>,
}

impl Statement<Delete> {
    /// Creates a DELETE statement.
    ///
    /// When no WHERE clause is set, the comma separated `columns` become
    /// `col=?` conditions matched against the values bound under the same
    /// names. An empty column list with no WHERE clause deletes every row.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty table name or a column that is not a
    /// bare name.
    pub fn delete(driver: Driver, table: &str, columns: &str) -> Result<Self> {
        driver.table_name(table)?;
        let names = plain_names(columns)?;
        let by_columns = if names.is_empty() {
            None
        } else {
            let syntax: Vec<String> = names
                .iter()
                .map(|name| format!("`{}`=?", name.replace('\\', "\\\\").replace('`', "\\`")))
                .collect();
            Some(WhereSyntax::parse(&syntax.join(","))?)
        };
        Ok(Self::with_kind(
            driver,
            Delete {
                table: table.to_string(),
                by_columns,
            },
        ))
    }
}

impl SqlSyntax for Statement<Delete> {
    fn syntax(&self) -> Result<String> {
        let condition = match (&self.condition, &self.kind.by_columns) {
            (Some(_), _) => self.where_syntax()?,
            (None, Some(by_columns)) => by_columns.compile(&self.context())?,
            (None, None) => None,
        };
        let mut sql = format!("DELETE FROM {}", self.driver.table_name(&self.kind.table)?);
        pushed_clause(&mut sql, "WHERE", condition);
        Ok(compiled("delete", sql))
    }
}
