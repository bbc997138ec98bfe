//! Driver abstraction: dialect, table prefix and value rendering.

use std::sync::Arc;

use serde::Deserialize;

use crate::dialect::{Dialect, DialectKind, MySqlDialect};
use crate::error::{Result, SyntaxError};
use crate::value::Value;

/// Driver configuration.
///
/// ```rust
/// use simple_sql_core::{DialectKind, DriverConfig};
///
/// let config = DriverConfig::from_json(r#"{"dialect": "sqlite", "prefix": "app_"}"#).unwrap();
/// assert_eq!(config.dialect, DialectKind::Sqlite);
/// assert_eq!(config.prefix, "app_");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Target database dialect.
    pub dialect: DialectKind,
    /// Prefix prepended to every real table name.
    pub prefix: String,
}

impl DriverConfig {
    /// Parses a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::Config`] if the document is not a valid configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// The narrow interface to the database layer used by the compilers.
#[derive(Debug, Clone)]
pub struct Driver {
    dialect: Arc<dyn Dialect>,
    prefix: String,
}

impl Driver {
    /// Creates a driver for the given dialect with no table prefix.
    #[must_use]
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            prefix: String::new(),
        }
    }

    /// Creates a driver from configuration.
    #[must_use]
    pub fn from_config(config: &DriverConfig) -> Self {
        Self::new(config.dialect.dialect()).with_prefix(config.prefix.clone())
    }

    /// Sets the table prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Returns the table prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Quotes an identifier.
    #[must_use]
    pub fn quote_identifier(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    /// Quotes a string literal.
    #[must_use]
    pub fn quote_string(&self, value: &str) -> String {
        self.dialect.quote_string(value)
    }

    /// Returns the prefixed, quoted name of a real table.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::EmptyName`] for an empty table name.
    pub fn table_name(&self, table: &str) -> Result<String> {
        if table.is_empty() {
            return Err(SyntaxError::EmptyName("table"));
        }
        Ok(self.quote_identifier(&format!("{}{table}", self.prefix)))
    }

    /// Renders a bound value as SQL literal text.
    ///
    /// This is the only place a bound value becomes SQL text: NULL, `0`/`1`
    /// for booleans, numbers verbatim, strings through the dialect's quoting,
    /// arrays and JSON documents JSON-encoded and quoted, nested statements
    /// compiled and wrapped in parentheses.
    ///
    /// # Errors
    ///
    /// Returns an error for non-finite floats and for failing nested statements.
    pub fn value_sql(&self, value: &Value) -> Result<String> {
        Ok(match value {
            Value::Null => String::from("NULL"),
            Value::Bool(b) => String::from(if *b { "1" } else { "0" }),
            Value::Int(n) => n.to_string(),
            Value::Float(f) if f.is_finite() => f.to_string(),
            Value::Float(f) => return Err(SyntaxError::InvalidOperand(f.to_string())),
            Value::Text(text) => self.quote_string(text),
            Value::Array(_) | Value::Json(_) => self.quote_string(&value.to_json()?.to_string()),
            Value::Statement(statement) => format!("({})", statement.syntax()?),
        })
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(Arc::new(MySqlDialect::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_prefix() {
        let driver = Driver::default().with_prefix("prefix_");
        assert_eq!(driver.table_name("users").unwrap(), "`prefix_users`");
        assert!(matches!(
            driver.table_name(""),
            Err(SyntaxError::EmptyName("table"))
        ));
    }

    #[test]
    fn test_value_sql() {
        let driver = Driver::default();
        assert_eq!(driver.value_sql(&Value::Null).unwrap(), "NULL");
        assert_eq!(driver.value_sql(&Value::Bool(true)).unwrap(), "1");
        assert_eq!(driver.value_sql(&Value::Bool(false)).unwrap(), "0");
        assert_eq!(driver.value_sql(&Value::Int(-3)).unwrap(), "-3");
        assert_eq!(driver.value_sql(&Value::Float(1.5)).unwrap(), "1.5");
        assert_eq!(driver.value_sql(&Value::from("it's")).unwrap(), "'it''s'");
        assert_eq!(
            driver.value_sql(&Value::from(vec!["a", "b"])).unwrap(),
            r#"'["a","b"]'"#
        );
        assert!(driver.value_sql(&Value::Float(f64::NAN)).is_err());
    }

    #[test]
    fn test_value_sql_injection_is_quoted() {
        let driver = Driver::default();
        assert_eq!(
            driver.value_sql(&Value::from("'; DROP TABLE users; --")).unwrap(),
            "'''; DROP TABLE users; --'"
        );
    }

    #[test]
    fn test_from_config() {
        let config = DriverConfig::from_json(r#"{"dialect": "postgres", "prefix": "t_"}"#).unwrap();
        let driver = Driver::from_config(&config);
        assert_eq!(driver.dialect().name(), "postgres");
        assert_eq!(driver.table_name("users").unwrap(), "\"t_users\"");
    }

    #[test]
    fn test_config_defaults_and_errors() {
        let config = DriverConfig::from_json("{}").unwrap();
        assert_eq!(config, DriverConfig::default());
        assert!(matches!(
            DriverConfig::from_json(r#"{"dialect": "oracle"}"#),
            Err(SyntaxError::Config(_))
        ));
    }
}
