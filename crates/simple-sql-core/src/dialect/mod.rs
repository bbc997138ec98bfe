//! SQL Dialect support.
//!
//! The compilers emit MySQL-shaped SQL by default. This module provides a
//! trait for the fragments that differ between databases: identifier and
//! string quoting, boolean negation, regular expressions, JSON access, LIMIT
//! and upsert clauses.

mod mysql;
mod postgres;
mod sqlite;

use std::sync::Arc;

use serde::Deserialize;

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::error::{Result, SyntaxError};

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: std::fmt::Debug + Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character (e.g., `"` for standard SQL, `` ` `` for MySQL).
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Quotes an identifier, doubling any embedded quote character.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        let escaped = name.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    /// Quotes a string literal, doubling embedded single quotes.
    fn quote_string(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Negates a boolean expression.
    fn negate(&self, expr: &str) -> String {
        format!("NOT ({expr})")
    }

    /// Returns the regular expression match operator.
    fn regexp_operator(&self, negated: bool) -> &'static str {
        if negated {
            "NOT REGEXP"
        } else {
            "REGEXP"
        }
    }

    /// Joins string expressions into one.
    fn concat(&self, parts: &[String]) -> String {
        parts.join(" || ")
    }

    /// Returns the `ESCAPE` clause appended to LIKE patterns, empty when
    /// backslash is already the default escape character.
    fn like_escape(&self) -> &'static str {
        ""
    }

    /// Renders a column accessed through a JSON path (`$.a.b`).
    fn json_path(&self, column: &str, path: &str, unquote: bool) -> String {
        let arrow = if unquote { "->>" } else { "->" };
        format!("{column}{arrow}{}", self.quote_string(path))
    }

    /// Renders a JSON path extraction used by the path-exists operator.
    fn json_extract(&self, expr: &str, path: &str) -> String {
        format!("JSON_EXTRACT({expr}, {})", self.quote_string(path))
    }

    /// Returns whether `JSON_CONTAINS`, `JSON_SEARCH`, `JSON_KEYS` and
    /// `JSON_OVERLAPS` are available.
    fn supports_json_functions(&self) -> bool {
        false
    }

    /// Returns whether `REPLACE INTO` is available.
    fn supports_replace(&self) -> bool {
        false
    }

    /// Renders a LIMIT clause.
    fn limit(&self, offset: u64, length: u64) -> String {
        if offset > 0 {
            format!("LIMIT {length} OFFSET {offset}")
        } else {
            format!("LIMIT {length}")
        }
    }

    /// Renders the upsert tail of an INSERT statement.
    ///
    /// # Errors
    ///
    /// Returns an error if the dialect needs a conflict target and none is given.
    fn upsert(&self, target: &[String], columns: &[String]) -> Result<String> {
        if target.is_empty() {
            return Err(SyntaxError::EmptyName("conflict target column"));
        }
        let target: Vec<String> = target.iter().map(|c| self.quote_identifier(c)).collect();
        let sets: Vec<String> = columns
            .iter()
            .map(|c| {
                let column = self.quote_identifier(c);
                format!("{column} = excluded.{column}")
            })
            .collect();
        Ok(format!(
            "ON CONFLICT ({}) DO UPDATE SET {}",
            target.join(", "),
            sets.join(", ")
        ))
    }
}

/// Dialect selector used in configuration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// MySQL / MariaDB.
    #[default]
    #[serde(alias = "mariadb")]
    Mysql,
    /// PostgreSQL.
    #[serde(alias = "pgsql")]
    Postgres,
    /// SQLite.
    Sqlite,
}

impl DialectKind {
    /// Returns a shared instance of the selected dialect.
    #[must_use]
    pub fn dialect(self) -> Arc<dyn Dialect> {
        match self {
            Self::Mysql => Arc::new(MySqlDialect::new()),
            Self::Postgres => Arc::new(PostgresDialect::new()),
            Self::Sqlite => Arc::new(SqliteDialect::new()),
        }
    }
}
