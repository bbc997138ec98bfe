//! SQLite dialect.

use super::Dialect;

/// SQLite dialect.
///
/// `REGEXP` needs a user function registered on the connection; `->` and
/// `->>` need SQLite 3.38.0+ and upsert needs 3.24.0+.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn like_escape(&self) -> &'static str {
        " ESCAPE '\\'"
    }
}
