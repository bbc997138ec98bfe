//! PostgreSQL dialect.

use super::Dialect;

/// PostgreSQL dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn regexp_operator(&self, negated: bool) -> &'static str {
        if negated {
            "!~"
        } else {
            "~"
        }
    }

    fn json_path(&self, column: &str, path: &str, unquote: bool) -> String {
        let value = format!("jsonb_path_query_first({column}, {})", self.quote_string(path));
        if unquote {
            format!("({value} #>> '{{}}')")
        } else {
            value
        }
    }

    fn json_extract(&self, expr: &str, path: &str) -> String {
        self.json_path(expr, path, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_dialect() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.name(), "postgres");
        assert_eq!(dialect.quote_identifier("user"), "\"user\"");
        assert_eq!(dialect.negate("\"a\" = 1"), "NOT (\"a\" = 1)");
        assert_eq!(dialect.regexp_operator(true), "!~");
        assert!(!dialect.supports_json_functions());
    }

    #[test]
    fn test_postgres_json_path() {
        let dialect = PostgresDialect::new();
        assert_eq!(
            dialect.json_path("\"data\"", "$.a", false),
            "jsonb_path_query_first(\"data\", '$.a')"
        );
        assert_eq!(
            dialect.json_path("\"data\"", "$.a", true),
            "(jsonb_path_query_first(\"data\", '$.a') #>> '{}')"
        );
    }

    #[test]
    fn test_postgres_upsert_requires_target() {
        let dialect = PostgresDialect::new();
        assert!(dialect.upsert(&[], &[String::from("name")]).is_err());
        assert_eq!(
            dialect
                .upsert(&[String::from("id")], &[String::from("name")])
                .unwrap(),
            "ON CONFLICT (\"id\") DO UPDATE SET \"name\" = excluded.\"name\""
        );
    }

    #[test]
    fn test_postgres_limit() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.limit(5, 10), "LIMIT 10 OFFSET 5");
    }
}
