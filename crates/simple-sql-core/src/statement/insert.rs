//! INSERT statements.

use super::{compiled, plain_names, Statement};
use crate::driver::Driver;
use crate::error::{Result, SyntaxError};
use crate::value::{SqlSyntax, Value};

/// INSERT clause state.
#[derive(Debug)]
pub struct Insert {
    table: String,
    columns: Vec<String>,
    replace: bool,
    on_duplicate: Vec<String>,
    conflict_target: Vec<String>,
}

impl Statement<Insert> {
    /// Creates an INSERT statement for `columns` (comma separated).
    ///
    /// Each column takes the value bound under its own name; an unbound
    /// column is inserted as NULL.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty table name, an empty column list or a
    /// column that is not a bare name.
    pub fn insert(driver: Driver, table: &str, columns: &str) -> Result<Self> {
        driver.table_name(table)?;
        let columns = plain_names(columns)?;
        if columns.is_empty() {
            return Err(SyntaxError::EmptyName("column"));
        }
        Ok(Self::with_kind(
            driver,
            Insert {
                table: table.to_string(),
                columns,
                replace: false,
                on_duplicate: Vec::new(),
                conflict_target: Vec::new(),
            },
        ))
    }

    /// Emits `REPLACE INTO` instead of `INSERT INTO`.
    #[must_use]
    pub const fn replace(mut self) -> Self {
        self.kind.replace = true;
        self
    }

    /// Columns to overwrite when the row already exists.
    ///
    /// # Errors
    ///
    /// Returns an error for a column that is not a bare name.
    pub fn on_duplicate(mut self, columns: &str) -> Result<Self> {
        self.kind.on_duplicate = plain_names(columns)?;
        Ok(self)
    }

    /// Unique columns naming the conflict, needed outside MySQL.
    ///
    /// # Errors
    ///
    /// Returns an error for a column that is not a bare name.
    pub fn conflict_target(mut self, columns: &str) -> Result<Self> {
        self.kind.conflict_target = plain_names(columns)?;
        Ok(self)
    }
}

impl SqlSyntax for Statement<Insert> {
    fn syntax(&self) -> Result<String> {
        let dialect = self.driver.dialect();
        if self.kind.replace && !dialect.supports_replace() {
            return Err(SyntaxError::Unsupported {
                operator: String::from("REPLACE"),
                dialect: dialect.name(),
            });
        }
        let columns: Vec<String> = self
            .kind
            .columns
            .iter()
            .map(|c| self.driver.quote_identifier(c))
            .collect();
        let values = self
            .kind
            .columns
            .iter()
            .map(|c| {
                self.driver
                    .value_sql(self.params.get_value(c).unwrap_or(&Value::Null))
            })
            .collect::<Result<Vec<_>>>()?;

        let verb = if self.kind.replace { "REPLACE" } else { "INSERT" };
        let mut sql = format!(
            "{verb} INTO {} ({}) VALUES ({})",
            self.driver.table_name(&self.kind.table)?,
            columns.join(", "),
            values.join(", ")
        );
        if !self.kind.on_duplicate.is_empty() {
            sql.push(' ');
            sql.push_str(&dialect.upsert(&self.kind.conflict_target, &self.kind.on_duplicate)?);
        }
        Ok(compiled("insert", sql))
    }
}
