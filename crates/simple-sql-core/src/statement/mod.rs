//! Statement orchestrator using the typestate pattern.
//!
//! A [`Statement`] owns the driver, the parameter bag and the clause state of
//! exactly one statement kind. The kind is fixed by the constructor, and
//! kind-specific builder methods only exist on the matching `impl`, so a
//! statement can never be both an UPDATE and a DELETE.
//!
//! ```rust
//! use simple_sql_core::{Driver, SqlSyntax, Statement};
//!
//! let mut statement = Statement::select(Driver::default(), "id, name")
//!     .unwrap()
//!     .from("users")
//!     .unwrap()
//!     .where_clause("id=:id")
//!     .unwrap();
//! statement.assign("id", 7);
//! assert_eq!(
//!     statement.syntax().unwrap(),
//!     "SELECT `id`, `name` FROM `users` WHERE `id` = 7"
//! );
//! ```

mod delete;
mod insert;
mod raw;
mod select;
mod update;

use std::rc::Rc;

pub use delete::Delete;
pub use insert::Insert;
pub use raw::Raw;
pub use select::Select;
pub use update::Update;

use crate::driver::Driver;
use crate::error::{Result, SyntaxError};
use crate::lexer::{Token, Tokenizer};
use crate::syntax::{ColumnRef, CompileContext, WhereSyntax};
use crate::value::{Parameters, SqlSyntax, Value};

/// Marker for statement kinds that accept a WHERE clause.
pub trait Filtered {}

impl Filtered for Select {}
impl Filtered for Update {}
impl Filtered for Delete {}

/// A statement under construction.
#[derive(Debug)]
pub struct Statement<K> {
    driver: Driver,
    params: Parameters,
    condition: Option<WhereSyntax>,
    kind: K,
}

impl<K> Statement<K> {
    fn with_kind(driver: Driver, kind: K) -> Self {
        Self {
            driver,
            params: Parameters::new(),
            condition: None,
            kind,
        }
    }

    /// Returns the driver.
    #[must_use]
    pub const fn driver(&self) -> &Driver {
        &self.driver
    }

    /// Returns the parameter bag.
    #[must_use]
    pub const fn params(&self) -> &Parameters {
        &self.params
    }

    /// Binds a value to a parameter name.
    pub fn assign(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.params.assign(name, value);
        self
    }

    /// Binds several values at once.
    pub fn merge<N, V, I>(&mut self, values: I) -> &mut Self
    where
        N: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (N, V)>,
    {
        self.params.merge(values);
        self
    }

    /// Binds a nested statement, embedded as `(<its SQL>)` where referenced.
    pub fn bind(&mut self, name: impl Into<String>, statement: Rc<dyn SqlSyntax>) -> &mut Self {
        self.params.assign(name, Value::Statement(statement));
        self
    }

    /// Binds a value, builder style.
    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.assign(name, value);
        self
    }

    fn context(&self) -> CompileContext<'_> {
        CompileContext::new(&self.driver, &self.params)
    }
}

impl<K: Filtered> Statement<K> {
    /// Sets the WHERE condition.
    ///
    /// # Errors
    ///
    /// Returns an error if the condition syntax does not parse.
    pub fn where_clause(mut self, syntax: &str) -> Result<Self> {
        self.condition = Some(WhereSyntax::parse(syntax)?);
        Ok(self)
    }

    /// Compiles the WHERE condition alone, `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns the first syntax error met while compiling.
    pub fn where_syntax(&self) -> Result<Option<String>> {
        match &self.condition {
            Some(condition) => condition.compile(&self.context()),
            None => Ok(None),
        }
    }
}

/// Splits a comma separated list, keeping function arguments and groups whole.
fn split_list(text: &str) -> Result<Vec<String>> {
    let tokens = Tokenizer::new(&[","]).tokenize(text)?;
    let mut items = Vec::new();
    let mut expect_item = true;
    for token in &tokens {
        match token {
            Token::Combinator(c) if expect_item => return Err(SyntaxError::Combinator(c.clone())),
            Token::Combinator(_) => expect_item = true,
            other => {
                items.push(other.to_string());
                expect_item = false;
            }
        }
    }
    if expect_item && !tokens.is_empty() {
        return Err(SyntaxError::Combinator(String::from(",")));
    }
    Ok(items)
}

/// Parses a bare column name.
fn plain_name(text: &str) -> Result<String> {
    match ColumnRef::parse(text)? {
        Some(column) if column.is_plain() && !column.is_wildcard() => Ok(column.name),
        _ => Err(SyntaxError::InvalidOperand(text.to_string())),
    }
}

/// Parses a list of bare column names.
fn plain_names(text: &str) -> Result<Vec<String>> {
    split_list(text)?.iter().map(|c| plain_name(c)).collect()
}

fn pushed_clause(sql: &mut String, keyword: &str, clause: Option<String>) {
    if let Some(clause) = clause {
        sql.push(' ');
        sql.push_str(keyword);
        sql.push(' ');
        sql.push_str(&clause);
    }
}

fn compiled(kind: &'static str, sql: String) -> String {
    tracing::debug!(kind, sql = %sql, "compiled statement");
    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("a, COUNT(b, c) AS n,(x|y)").unwrap(),
            vec!["a", "COUNT(b, c) AS n", "(x|y)"]
        );
        assert!(split_list("").unwrap().is_empty());
        assert!(matches!(split_list("a,"), Err(SyntaxError::Combinator(_))));
        assert!(matches!(split_list(",a"), Err(SyntaxError::Combinator(_))));
    }

    #[test]
    fn test_plain_names() {
        assert_eq!(plain_names("id, `odd name`").unwrap(), vec!["id", "odd name"]);
        assert!(plain_names("a.id").is_err());
        assert!(plain_names("*").is_err());
    }

    #[test]
    fn test_parameter_methods() {
        let mut statement = Statement::raw(Driver::default(), "SELECT 1");
        statement
            .assign("a", 1)
            .merge([("b", "x"), ("c", "y")])
            .bind("d", Rc::new(Statement::raw(Driver::default(), "SELECT 2")));
        let statement = statement.with_value("e", true);
        assert_eq!(statement.params().len(), 5);
        assert_eq!(statement.params().get_value("a"), Some(&Value::Int(1)));
    }
}
