//! # simple-sql-core
//!
//! A compiler from "Simple Syntax", a compact query notation, to
//! dialect-correct SQL.
//!
//! This crate provides:
//! - A tokenizer that respects quoting, escaping and nested parentheses
//! - A condition compiler for WHERE, HAVING and join `ON` clauses
//! - A join compiler for FROM clauses, with sub-queries and presets
//! - Typestate statement builders for SELECT, INSERT, UPDATE and DELETE
//!
//! ## Conditions
//!
//! `,` means AND, `|` means OR, `!` negates and parentheses group:
//!
//! ```rust
//! use simple_sql_core::{Driver, SqlSyntax, Statement};
//!
//! let statement = Statement::select(Driver::default(), "*")
//!     .unwrap()
//!     .from("users")
//!     .unwrap()
//!     .where_clause("role|=[1,2],!(banned|name^=:prefix)")
//!     .unwrap()
//!     .with_value("prefix", "test");
//!
//! assert_eq!(
//!     statement.syntax().unwrap(),
//!     "SELECT * FROM `users` WHERE `role` IN(1, 2) AND !(`banned` OR `name` LIKE 'test%')"
//! );
//! ```
//!
//! ## Joins
//!
//! ```rust
//! use simple_sql_core::{Driver, SqlSyntax, Statement};
//!
//! let driver = Driver::default().with_prefix("app_");
//! let statement = Statement::select(driver, "a.name, b.total")
//!     .unwrap()
//!     .from("a.users<b.orders[id]")
//!     .unwrap();
//!
//! assert_eq!(
//!     statement.syntax().unwrap(),
//!     "SELECT `a`.`name`, `b`.`total` FROM `app_users` AS `a` \
//!      LEFT JOIN `app_orders` AS `b` ON `a`.`id` = `b`.`id`"
//! );
//! ```
//!
//! ## Value Escaping
//!
//! Bound values only become SQL text through [`Driver::value_sql`], which
//! quotes strings with the dialect's escaping rules.

pub mod dialect;
pub mod driver;
pub mod error;
pub mod lexer;
pub mod statement;
pub mod syntax;
pub mod value;

pub use dialect::{Dialect, DialectKind, MySqlDialect, PostgresDialect, SqliteDialect};
pub use driver::{Driver, DriverConfig};
pub use error::{Result, SyntaxError};
pub use statement::{Delete, Insert, Raw, Select, Statement, Update};
pub use syntax::{
    CompileContext, Preset, PresetContext, PresetRegistry, TableJoinSyntax, WhereSyntax,
};
pub use value::{Parameters, SqlSyntax, Value};
