//! # simple-sql-presets
//!
//! Ready-made join presets for `simple-sql-core`.
//!
//! A preset is a sub-query template referenced from join syntax as
//! `alias.table->Name(args)`. This crate provides:
//!
//! - [`Latest`]: the latest row of `table` per group, written as
//!   `->Latest(group_column, order_column)`. It compiles to a self
//!   LEFT JOIN anti-join, which every supported dialect runs.
//! - [`Distinct`]: the distinct combinations of a column set, written as
//!   `->Distinct(col1, col2, ...)`.
//!
//! ## Example
//!
//! ```rust
//! use simple_sql_core::{Driver, SqlSyntax, Statement};
//!
//! let statement = Statement::select(Driver::default(), "u.name, p.title")
//!     .unwrap()
//!     .with_presets(simple_sql_presets::registry())
//!     .from("u.users-p.posts->Latest(user_id, created_at)[?p.user_id=u.id]")
//!     .unwrap();
//!
//! assert_eq!(
//!     statement.syntax().unwrap(),
//!     "SELECT `u`.`name`, `p`.`title` FROM `users` AS `u` \
//!      JOIN (SELECT `l`.* FROM `posts` AS `l` LEFT JOIN `posts` AS `r` \
//!      ON `l`.`user_id` = `r`.`user_id` AND `l`.`created_at` < `r`.`created_at` \
//!      WHERE `r`.`created_at` IS NULL) AS `p` ON `p`.`user_id` = `u`.`id`"
//! );
//! ```

mod distinct;
mod latest;

pub use distinct::Distinct;
pub use latest::Latest;

use simple_sql_core::syntax::ColumnRef;
use simple_sql_core::{PresetRegistry, Result, SyntaxError};

/// Returns a registry holding every preset of this crate.
#[must_use]
pub fn registry() -> PresetRegistry {
    PresetRegistry::new()
        .with(Latest::NAME, |ctx| Box::new(Latest::new(ctx)))
        .with(Distinct::NAME, |ctx| Box::new(Distinct::new(ctx)))
}

/// Checks that a preset argument is a bare, unquoted column name.
fn column_argument(preset: &str, arg: &str) -> Result<String> {
    match ColumnRef::parse(arg) {
        Ok(Some(column)) if column.is_plain() && !column.is_wildcard() && column.name == arg => {
            Ok(column.name)
        }
        _ => Err(SyntaxError::PresetArguments {
            preset: preset.to_string(),
            message: format!("`{arg}` is not a column name"),
        }),
    }
}
