//! Literal SQL statements.

use super::{compiled, Statement};
use crate::driver::Driver;
use crate::error::Result;
use crate::value::SqlSyntax;

/// A SQL string passed through as written.
#[derive(Debug)]
pub struct Raw {
    sql: String,
}

impl Statement<Raw> {
    /// Wraps literal SQL text.
    #[must_use]
    pub fn raw(driver: Driver, sql: impl Into<String>) -> Self {
        Self::with_kind(driver, Raw { sql: sql.into() })
    }
}

impl SqlSyntax for Statement<Raw> {
    fn syntax(&self) -> Result<String> {
        Ok(compiled("raw", self.kind.sql.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_passthrough() {
        let statement = Statement::raw(Driver::default(), "SELECT NOW()");
        assert_eq!(statement.syntax().unwrap(), "SELECT NOW()");
    }
}
