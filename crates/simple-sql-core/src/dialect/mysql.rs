//! MySQL dialect.

use super::Dialect;
use crate::error::Result;

/// MySQL dialect, the default target of the compilers.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quote(&self) -> char {
        '`'
    }

    // Backslash is an escape character unless NO_BACKSLASH_ESCAPES is set.
    fn quote_string(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }

    fn negate(&self, expr: &str) -> String {
        format!("!({expr})")
    }

    fn concat(&self, parts: &[String]) -> String {
        format!("CONCAT({})", parts.join(", "))
    }

    fn supports_json_functions(&self) -> bool {
        true
    }

    fn supports_replace(&self) -> bool {
        true
    }

    fn limit(&self, offset: u64, length: u64) -> String {
        if offset > 0 {
            format!("LIMIT {offset}, {length}")
        } else {
            format!("LIMIT {length}")
        }
    }

    fn upsert(&self, _target: &[String], columns: &[String]) -> Result<String> {
        let sets: Vec<String> = columns
            .iter()
            .map(|c| {
                let column = self.quote_identifier(c);
                format!("{column} = VALUES({column})")
            })
            .collect();
        Ok(format!("ON DUPLICATE KEY UPDATE {}", sets.join(", ")))
    }
}
