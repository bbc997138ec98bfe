//! Distinct projection of a column set.

use simple_sql_core::{Driver, Preset, PresetContext, Result, SqlSyntax, Statement, SyntaxError};
use tracing::debug;

use crate::column_argument;

/// `SELECT DISTINCT` over the given columns of the joined table.
#[derive(Debug)]
pub struct Distinct {
    driver: Driver,
    table: String,
    columns: Vec<String>,
}

impl Distinct {
    /// Name used in join syntax.
    pub const NAME: &'static str = "Distinct";

    /// Creates an uninitialized preset over the context's table.
    #[must_use]
    pub fn new(ctx: &PresetContext<'_>) -> Self {
        Self {
            driver: ctx.driver.clone(),
            table: ctx.table.to_string(),
            columns: Vec::new(),
        }
    }
}

impl SqlSyntax for Distinct {
    fn syntax(&self) -> Result<String> {
        if self.columns.is_empty() {
            return Err(SyntaxError::PresetArguments {
                preset: Self::NAME.to_string(),
                message: String::from("no columns"),
            });
        }
        Statement::select(self.driver.clone(), &self.columns.join(", "))?
            .distinct()
            .from(&self.table)?
            .syntax()
    }
}

impl Preset for Distinct {
    fn init(&mut self, args: &[String]) -> Result<()> {
        if args.is_empty() {
            return Err(SyntaxError::PresetArguments {
                preset: Self::NAME.to_string(),
                message: String::from("expected at least one column"),
            });
        }
        self.columns = args
            .iter()
            .map(|arg| column_argument(Self::NAME, arg))
            .collect::<Result<_>>()?;
        debug!(table = %self.table, columns = ?self.columns, "configured distinct preset");
        Ok(())
    }
}
