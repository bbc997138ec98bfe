//! Simple Syntax compilers.
//!
//! - [`WhereSyntax`] compiles conditions (`a=1,b|=[2,3]`) for WHERE, HAVING
//!   and join `ON` brackets.
//! - [`TableJoinSyntax`] compiles table joins (`a.users-b.orders[user_id]`)
//!   for FROM clauses.
//!
//! Both parse their syntax once into a tree and re-compile it on every call
//! against the current parameter values.

mod compare;
mod condition;
mod join;
mod operand;
mod preset;

pub(crate) use compare::compile_operand;
pub use compare::Operator;
pub use condition::{Expr, WhereSyntax};
pub use join::{JoinKind, JoinSource, JoinStep, TableJoinSyntax};
pub(crate) use operand::{unquote, IDENT};
pub use operand::{ColumnRef, JsonPath, Operand};
pub use preset::{Preset, PresetConstructor, PresetContext, PresetRegistry};

use crate::driver::Driver;
use crate::value::Parameters;

/// Everything a compiler reads from its owning statement.
#[derive(Debug, Clone, Copy)]
pub struct CompileContext<'a> {
    /// Quoting, dialect fragments and table prefix.
    pub driver: &'a Driver,
    /// The statement's parameter bag.
    pub params: &'a Parameters,
}

impl<'a> CompileContext<'a> {
    /// Creates a compile context.
    #[must_use]
    pub const fn new(driver: &'a Driver, params: &'a Parameters) -> Self {
        Self { driver, params }
    }
}
